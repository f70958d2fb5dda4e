//! Error types for ttsdeck

use std::io;
use thiserror::Error;

/// Main error type for ttsdeck
///
/// Resource-cleanup failures are deliberately absent: a failed delete of
/// a retired artifact is logged and swallowed, never surfaced.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(crate::synth::SynthesisError),

    #[error("Playback engine error: {0}")]
    Playback(String),

    #[error("Export failed: {0}")]
    Export(crate::synth::SynthesisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ttsdeck operations
pub type Result<T> = std::result::Result<T, DeckError>;

impl From<String> for DeckError {
    fn from(s: String) -> Self {
        DeckError::Other(s)
    }
}

impl From<&str> for DeckError {
    fn from(s: &str) -> Self {
        DeckError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(e: serde_json::Error) -> Self {
        DeckError::Config(format!("JSON error: {}", e))
    }
}
