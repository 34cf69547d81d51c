//! Error taxonomy for the objbox workspace.
//!
//! One enum covers every failure mode the engine surfaces. Channel and
//! protocol failures are fatal to the black-box instance they occur on and
//! are never retried; remote evaluation failures preserve the child's
//! diagnostic text verbatim.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed registry entry, spec file, or launch setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The external environment build tool failed.
    #[error("provisioning '{name}' failed: {detail}")]
    Provisioning { name: String, detail: String },

    /// No environment spec file at the expected repository location.
    #[error("environment spec not found: {0}")]
    SpecNotFound(PathBuf),

    /// Unexpected message type or malformed frame on the channel.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer process is gone.
    #[error("channel closed by peer")]
    ChannelClosed,

    /// An error raised by a black box during a local evaluation.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// An error raised inside an isolated process, re-raised here with the
    /// remote diagnostic preserved.
    #[error("remote evaluation failed ({kind}): {diagnostic}")]
    RemoteEvaluation {
        kind: RemoteErrorKind,
        diagnostic: String,
    },

    /// The problem is neither registered nor provisionable.
    #[error("problem '{0}' is not available: neither registered nor provisionable")]
    NotAvailable(String),

    #[error("problem '{0}' is already registered; pass force to overwrite")]
    AlreadyRegistered(String),

    #[error("problem '{0}' is not registered")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Machine-readable error kind carried across the process boundary.
///
/// The receiving side never reconstructs the original error type; it raises
/// [`Error::RemoteEvaluation`] with this kind and the diagnostic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Factory instantiation or initial evaluation failed.
    Setup,
    /// The black box raised while evaluating a query.
    Evaluation,
    /// The child was launched with a factory name missing from its catalog.
    UnknownFactory,
    /// The child received a message it cannot serve in its current state.
    Protocol,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::Setup => "setup",
            RemoteErrorKind::Evaluation => "evaluation",
            RemoteErrorKind::UnknownFactory => "unknown_factory",
            RemoteErrorKind::Protocol => "protocol",
        };
        f.write_str(s)
    }
}
