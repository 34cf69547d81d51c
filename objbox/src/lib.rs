//! ObjBox: a lightweight isolation and evaluation engine for black-box
//! objective functions.
//!
//! Callers go through [`factory::create`] or [`factory::start`]; the engine
//! decides between in-process instantiation and an isolated child process,
//! provisioning the child's runtime environment on demand.

pub mod factory;
pub mod observability;

pub use objbox_core::config::Config;
pub use objbox_core::error::{Error, Result};
