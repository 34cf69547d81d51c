//! Tracing initialization for the objbox binary.
//!
//! `OBJBOX_QUIET=1` limits output to warnings, `OBJBOX_LOG_LEVEL` sets the
//! default filter, `OBJBOX_LOG_JSON=1` switches to JSON lines. Logs go to
//! stderr; stdout is reserved for command output.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call once at process startup.
pub fn init_tracing() {
    let quiet = std::env::var("OBJBOX_QUIET").map(|v| v == "1").unwrap_or(false);
    let level = if quiet {
        "objbox=warn".to_string()
    } else {
        std::env::var("OBJBOX_LOG_LEVEL").unwrap_or_else(|_| "objbox=info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let json = std::env::var("OBJBOX_LOG_JSON").map(|v| v == "1").unwrap_or(false);
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
