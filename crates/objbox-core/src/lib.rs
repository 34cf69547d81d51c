//! Core building blocks for objbox: the problem registry, isolated
//! environment provisioning, black-box traits and built-in factories,
//! and the observer seam.
//!
//! The IPC layer lives in `objbox-ipc`; orchestration in the `objbox` crate.

pub mod config;
pub mod env;
pub mod error;
pub mod observer;
pub mod problem;
pub mod registry;

pub use config::Config;
pub use error::{Error, Result};
