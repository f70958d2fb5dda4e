//! Speech synthesis: service interface, REST backend, worker threads

pub mod azure;
pub mod service;
pub mod worker;

pub use azure::AzureSpeech;
pub use service::{FailureReason, OutputEncoding, SpeechService, SynthesisError};
pub use worker::{spawn_export, spawn_synthesis};
