//! Problem metadata shared between caller and child.

use serde::{Deserialize, Serialize};

/// Basic properties of a problem, fixed at setup time. Travels over the wire
/// in the SETUP reply, so an isolated problem introspects like a local one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemInfo {
    pub name: String,
    /// `None` means unbounded input length.
    pub max_sequence_length: Option<usize>,
    /// Whether all input rows must have exactly `max_sequence_length` tokens.
    pub aligned: bool,
    pub alphabet: Vec<String>,
}

impl ProblemInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_sequence_length: None,
            aligned: false,
            alphabet: Vec::new(),
        }
    }

    pub fn with_sequence_length(mut self, length: usize, aligned: bool) -> Self {
        self.max_sequence_length = Some(length);
        self.aligned = aligned;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Vec<String>) -> Self {
        self.alphabet = alphabet;
        self
    }
}
