//! Speech synthesis service interface
//!
//! The external service is specified only as a trait so the controller
//! and its tests never depend on the network. `AzureSpeech` is the real
//! implementation; tests script their own.

use crate::voices::VoiceInfo;
use std::fmt;
use std::path::Path;

/// Output encodings the service is asked for
///
/// Lossless PCM for preview (seekable, decodable everywhere), compressed
/// MP3 for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// RIFF 16kHz 16-bit mono PCM - preview playback
    RiffPcm16k,
    /// 16kHz 64kbit mono MP3 - file export
    Mp3_16k64k,
}

impl OutputEncoding {
    /// Wire name the service expects in the output-format header
    pub fn wire_name(self) -> &'static str {
        match self {
            OutputEncoding::RiffPcm16k => "riff-16khz-16bit-mono-pcm",
            OutputEncoding::Mp3_16k64k => "audio-16khz-64kbitrate-mono-mp3",
        }
    }
}

/// Why a synthesis attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The service cancelled the request
    Canceled,
    /// The service answered with an error
    Service,
    /// Transport-level failure before any answer
    Network,
    /// The audio could not be written locally
    Io,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::Canceled => "canceled",
            FailureReason::Service => "service error",
            FailureReason::Network => "network error",
            FailureReason::Io => "write error",
        };
        f.write_str(name)
    }
}

/// Typed synthesis failure: a reason code plus optional human detail
#[derive(Debug, Clone)]
pub struct SynthesisError {
    pub reason: FailureReason,
    pub detail: Option<String>,
}

impl SynthesisError {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn bare(reason: FailureReason) -> Self {
        Self {
            reason,
            detail: None,
        }
    }
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for SynthesisError {}

/// External speech synthesis service
///
/// `synthesize` blocks; it is only ever called from a worker thread,
/// never from the controlling thread.
pub trait SpeechService: Send + Sync {
    /// Synthesize an SSML document into `out`, returning the audio
    /// duration in seconds (0.0 when the encoding makes it unknowable)
    fn synthesize(
        &self,
        key: &str,
        region: &str,
        ssml: &str,
        encoding: OutputEncoding,
        out: &Path,
    ) -> Result<f64, SynthesisError>;

    /// Fetch the region's voice list
    fn list_voices(&self, key: &str, region: &str) -> Result<Vec<VoiceInfo>, SynthesisError>;
}
