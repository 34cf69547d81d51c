//! Inter-process evaluation layer: a caller-side process wrapper and proxy,
//! a child-side runtime loop, and the authenticated message channel between
//! them.
//!
//! One request is in flight per channel at any time; the caller blocks on
//! every remote call. Channel and protocol failures are fatal to the
//! instance and are surfaced, never retried.

pub mod channel;
pub mod child;
pub mod message;
pub mod process_wrapper;
pub mod proxy;

pub use channel::MessageChannel;
pub use child::run_child;
pub use message::Message;
pub use process_wrapper::ProcessWrapper;
pub use proxy::ExternalBlackBox;
