//! The black-box call contract, identical for in-process and isolated paths.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::problem::ProblemInfo;

/// 2-D batch of input rows: `b` rows of tokens.
pub type InputBatch = Vec<Vec<String>>;

/// 2-D batch of output rows, one per input row.
pub type OutputBatch = Vec<Vec<f64>>;

/// Free-form context mapping forwarded to the black box on each call.
pub type EvalContext = HashMap<String, serde_json::Value>;

/// Closed set of introspectable attributes. Keeps the wire contract
/// enumerable instead of forwarding arbitrary attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRequest {
    ProblemName,
    MaxSequenceLength,
    Alphabet,
    Aligned,
}

/// Resolved attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Tokens(Vec<String>),
    /// The attribute has no value for this problem (e.g. unbounded length).
    Absent,
}

/// An evaluable function mapping a batch of input rows to one output row per
/// input row. Implementations may be stateful (seeded noise, caching).
pub trait BlackBox: Send {
    fn info(&self) -> &ProblemInfo;

    fn evaluate(
        &mut self,
        x: &InputBatch,
        context: Option<&EvalContext>,
    ) -> Result<OutputBatch>;

    /// Resolve a named attribute. The default resolves everything from
    /// [`ProblemInfo`]; the external proxy overrides this to ask the remote
    /// side when the answer is not cached locally.
    fn attribute(&mut self, attr: AttributeRequest) -> Result<AttributeValue> {
        let info = self.info();
        Ok(match attr {
            AttributeRequest::ProblemName => AttributeValue::Text(info.name.clone()),
            AttributeRequest::MaxSequenceLength => info
                .max_sequence_length
                .map(|l| AttributeValue::Number(l as f64))
                .unwrap_or(AttributeValue::Absent),
            AttributeRequest::Alphabet => AttributeValue::Tokens(info.alphabet.clone()),
            AttributeRequest::Aligned => AttributeValue::Flag(info.aligned),
        })
    }

    /// Release held resources. Local boxes usually have none; the external
    /// proxy sends QUIT and tears its channel down. Must tolerate being
    /// called more than once.
    fn terminate(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A problem plus its initial design: the black box, `x0`, and `y0 = f(x0)`.
pub struct CreatedProblem {
    pub black_box: Box<dyn BlackBox>,
    pub x0: InputBatch,
    pub y0: OutputBatch,
}

/// Constructs black boxes. One factory per problem name in the catalog; the
/// child runtime instantiates these on SETUP.
pub trait ProblemFactory: Send {
    fn info(&self) -> ProblemInfo;

    /// Build the black box and evaluate its initial input.
    fn create(&self, seed: u64) -> Result<CreatedProblem>;
}
