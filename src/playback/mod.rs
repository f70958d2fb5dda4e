//! Playback: audio engine abstraction and the transport state machine

pub mod controller;
pub mod engine;
pub mod rodio;

pub use controller::{Controller, PlaybackState};
pub use engine::AudioEngine;
pub use rodio::RodioEngine;
