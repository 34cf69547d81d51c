//! Caller-owned wrapper around a black box: observer notification and
//! exactly-once teardown.

use crate::error::Result;
use crate::observer::Observer;
use crate::problem::{
    AttributeRequest, AttributeValue, BlackBox, EvalContext, InputBatch, OutputBatch, ProblemInfo,
};

/// A stateful handle over a local black box or an external proxy.
///
/// Guarantees: the attached observer sees exactly one `observe(x, y)` per
/// successful evaluation (never on failure), and `finish()` fires exactly
/// once during terminate. Teardown runs at most once; later calls are no-ops.
pub struct BlackBoxInstance {
    inner: Box<dyn BlackBox>,
    observer: Option<Box<dyn Observer>>,
    terminated: bool,
}

impl BlackBoxInstance {
    pub fn new(inner: Box<dyn BlackBox>) -> Self {
        Self {
            inner,
            observer: None,
            terminated: false,
        }
    }

    pub fn attach_observer(&mut self, observer: Box<dyn Observer>) {
        self.observer = Some(observer);
    }

    pub fn info(&self) -> &ProblemInfo {
        self.inner.info()
    }

    pub fn evaluate(
        &mut self,
        x: &InputBatch,
        context: Option<&EvalContext>,
    ) -> Result<OutputBatch> {
        let y = self.inner.evaluate(x, context)?;
        if let Some(observer) = self.observer.as_mut() {
            observer.observe(x, &y);
        }
        Ok(y)
    }

    pub fn attribute(&mut self, attr: AttributeRequest) -> Result<AttributeValue> {
        self.inner.attribute(attr)
    }

    /// Idempotent: releases the underlying black box, then finalizes the
    /// observer. Safe to call any number of times.
    pub fn terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        let released = self.inner.terminate();
        if let Some(mut observer) = self.observer.take() {
            observer.finish();
        }
        released
    }
}

impl Drop for BlackBoxInstance {
    fn drop(&mut self) {
        if !self.terminated {
            if let Err(e) = self.terminate() {
                tracing::warn!(error = %e, "black box teardown failed on drop");
            }
        }
    }
}
