//! ttsdeck - Text-to-speech preview and export deck
//!
//! A console-based front end for Azure neural text-to-speech. Synthesizes
//! short passages to a local cache, plays them back with pause/seek, and
//! exports finished audio to MP3.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod janitor;
pub mod params;
pub mod playback;
pub mod ssml;
pub mod synth;
pub mod voices;

pub use error::{DeckError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "ttsdeck";
