//! Compile-time catalog of directly-constructible problem factories.
//!
//! Names map to factory values through this match, never through runtime
//! code loading. Adding a problem means adding a variant here.

use crate::problem::{AlohaFactory, ProblemFactory, WhiteNoiseFactory};

/// Names of problems constructible without an isolated environment.
pub fn available_problems() -> &'static [&'static str] {
    &["aloha", "white_noise"]
}

/// Look up a factory by name.
pub fn factory_for(name: &str) -> Option<Box<dyn ProblemFactory>> {
    match name {
        "aloha" => Some(Box::new(AlohaFactory)),
        "white_noise" => Some(Box::new(WhiteNoiseFactory)),
        _ => None,
    }
}
