//! Wire messages exchanged between the caller and an isolated child.
//!
//! Request/reply pairing: `Setup`→`SetupOk`, `Query`→`Reply`,
//! `Attribute`→`AttributeOk`, `Quit`→`ShutdownOk`; any request may instead
//! be answered with `Exception`. No message follows `Quit`/`ShutdownOk` on
//! either side.

use serde::{Deserialize, Serialize};

use objbox_core::error::RemoteErrorKind;
use objbox_core::problem::{AttributeRequest, AttributeValue, EvalContext, InputBatch, OutputBatch, ProblemInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Instantiate the factory and evaluate the initial input.
    Setup { seed: u64 },
    SetupOk {
        x0: InputBatch,
        y0: OutputBatch,
        info: ProblemInfo,
    },
    Query {
        x: InputBatch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<EvalContext>,
    },
    Reply { y: OutputBatch },
    Attribute { attr: AttributeRequest },
    AttributeOk { value: AttributeValue },
    Quit,
    /// Scoped teardown completed; the child exits after sending this.
    ShutdownOk,
    /// Failure report from a live peer. The error's native type is never
    /// reconstructed on the receiving side.
    Exception {
        kind: RemoteErrorKind,
        diagnostic: String,
    },
}

impl Message {
    /// Tag name for protocol diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Setup { .. } => "setup",
            Message::SetupOk { .. } => "setup_ok",
            Message::Query { .. } => "query",
            Message::Reply { .. } => "reply",
            Message::Attribute { .. } => "attribute",
            Message::AttributeOk { .. } => "attribute_ok",
            Message::Quit => "quit",
            Message::ShutdownOk => "shutdown_ok",
            Message::Exception { .. } => "exception",
        }
    }
}
