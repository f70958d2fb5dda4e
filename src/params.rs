//! Synthesis parameter snapshots
//!
//! A `SynthesisParams` value captures everything that affects synthesized
//! output. Reuse decisions compare snapshots by full field equality, so a
//! change to any field (credentials included) forces resynthesis.

use crate::{DeckError, Result};

/// Role value meaning "no role-play wrapper"
pub const NO_ROLE: &str = "none";

/// Style value meaning "no style wrapper"
pub const DEFAULT_STYLE: &str = "default";

/// Rates within this distance of 1.0 get no prosody wrapper
pub const RATE_EPSILON: f64 = 0.001;

/// Immutable snapshot of every input that determines synthesized audio
///
/// Constructed fresh from current inputs at the moment an operation
/// needs one; never mutated. Rate is compared exactly as stored, not by
/// tolerance - any slider movement is a different snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Trimmed text to speak
    pub text: String,
    /// Language tag, e.g. "en-US"
    pub language: String,
    /// Voice short name, e.g. "en-US-JennyNeural"
    pub voice: String,
    /// Role-play value, `NO_ROLE` when unset
    pub role: String,
    /// Speaking style, `DEFAULT_STYLE` when unset
    pub style: String,
    /// Speaking rate, 1.0 = normal
    pub rate: f64,
    /// Service subscription key
    pub key: String,
    /// Service region, e.g. "eastus"
    pub region: String,
}

impl SynthesisParams {
    /// Check that every field required for synthesis is present
    ///
    /// `voices_loaded` is passed in because the voice catalog lives
    /// outside the snapshot: a voice name is only meaningful once the
    /// region's list has been fetched.
    pub fn validate(&self, voices_loaded: bool) -> Result<()> {
        if self.text.is_empty() {
            return Err(DeckError::Validation("no text to speak".into()));
        }
        if self.language.is_empty() {
            return Err(DeckError::Validation("no language selected".into()));
        }
        if self.voice.is_empty() {
            return Err(DeckError::Validation("no voice selected".into()));
        }
        if self.key.is_empty() || self.region.is_empty() {
            return Err(DeckError::Validation(
                "service credentials not configured".into(),
            ));
        }
        if !voices_loaded {
            return Err(DeckError::Validation(
                "voice list not loaded - run `voices` first".into(),
            ));
        }
        Ok(())
    }

    /// Does this snapshot need a prosody (rate) wrapper?
    pub fn has_rate_wrapper(&self) -> bool {
        (self.rate - 1.0).abs() > RATE_EPSILON
    }

    /// Does this snapshot need an express-as (role/style) wrapper?
    pub fn has_expression_wrapper(&self) -> bool {
        self.role != NO_ROLE || self.style != DEFAULT_STYLE
    }
}
