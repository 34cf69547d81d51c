//! Observer seam for experiment tracking.
//!
//! The engine guarantees `observe` fires once per successful evaluation and
//! `finish` exactly once during terminate; backends implement the trait.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::problem::{EvalContext, InputBatch, OutputBatch, ProblemInfo};

/// Handle returned by [`Observer::initialize`], letting the calling
/// algorithm reconnect to the tracked run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSessionInfo {
    pub session_id: String,
}

pub trait Observer: Send {
    /// Called once before any evaluation is observed. `x0`/`y0` are absent
    /// when the black box was acquired without an initial evaluation.
    fn initialize(
        &mut self,
        info: &ProblemInfo,
        caller_info: Option<&EvalContext>,
        x0: Option<&InputBatch>,
        y0: Option<&OutputBatch>,
        seed: u64,
    ) -> Result<ObserverSessionInfo>;

    fn observe(&mut self, x: &InputBatch, y: &OutputBatch);

    fn finish(&mut self);
}

/// Built-in observer that reports evaluations through `tracing`.
#[derive(Default)]
pub struct TracingObserver {
    session_id: Option<String>,
    step: u64,
}

impl Observer for TracingObserver {
    fn initialize(
        &mut self,
        info: &ProblemInfo,
        _caller_info: Option<&EvalContext>,
        _x0: Option<&InputBatch>,
        y0: Option<&OutputBatch>,
        seed: u64,
    ) -> Result<ObserverSessionInfo> {
        let session_id = format!("{}-{}", info.name, &uuid::Uuid::new_v4().simple().to_string()[..8]);
        tracing::info!(session = %session_id, problem = %info.name, seed, ?y0, "observer session started");
        self.session_id = Some(session_id.clone());
        Ok(ObserverSessionInfo { session_id })
    }

    fn observe(&mut self, x: &InputBatch, y: &OutputBatch) {
        self.step += 1;
        tracing::info!(
            session = self.session_id.as_deref().unwrap_or("uninitialized"),
            step = self.step,
            rows = x.len(),
            ?y,
            "evaluation observed"
        );
    }

    fn finish(&mut self) {
        tracing::info!(
            session = self.session_id.as_deref().unwrap_or("uninitialized"),
            steps = self.step,
            "observer session finished"
        );
    }
}
