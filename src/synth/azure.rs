//! REST backend for the Azure speech synthesis service
//!
//! Uses the plain HTTPS endpoints rather than an SDK: POST the SSML
//! document to the synthesis endpoint with the subscription key and the
//! desired output format, GET the voice list. Blocking I/O is fine here
//! because every call runs on a worker thread.

use crate::synth::service::{FailureReason, OutputEncoding, SpeechService, SynthesisError};
use crate::voices::VoiceInfo;
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

/// Bytes per second of RIFF 16kHz 16-bit mono PCM audio
const PCM_BYTES_PER_SEC: f64 = 32_000.0;

/// Size of the RIFF header preceding PCM samples
const RIFF_HEADER_LEN: usize = 44;

/// Azure Cognitive Services speech backend
pub struct AzureSpeech {
    client: reqwest::blocking::Client,
}

impl AzureSpeech {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("ttsdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }

    fn synthesis_url(region: &str) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            region
        )
    }

    fn voices_url(region: &str) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/voices/list",
            region
        )
    }

    /// Duration of a RIFF PCM body, derived from its length
    ///
    /// The REST API reports no duration, so for the preview encoding it
    /// is computed from the sample data size.
    fn pcm_duration_secs(body_len: usize) -> f64 {
        body_len.saturating_sub(RIFF_HEADER_LEN) as f64 / PCM_BYTES_PER_SEC
    }
}

impl Default for AzureSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechService for AzureSpeech {
    fn synthesize(
        &self,
        key: &str,
        region: &str,
        ssml: &str,
        encoding: OutputEncoding,
        out: &Path,
    ) -> Result<f64, SynthesisError> {
        debug!(
            "synthesizing {} bytes of SSML as {} into {}",
            ssml.len(),
            encoding.wire_name(),
            out.display()
        );

        let response = self
            .client
            .post(Self::synthesis_url(region))
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", encoding.wire_name())
            .body(ssml.to_string())
            .send()
            .map_err(|e| SynthesisError::new(FailureReason::Network, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let reason = if status.as_u16() == 429 {
                // Throttled requests come back as cancellations in the SDK
                FailureReason::Canceled
            } else {
                FailureReason::Service
            };
            return Err(SynthesisError::new(
                reason,
                format!("{}: {}", status, detail.trim()),
            ));
        }

        let body = response
            .bytes()
            .map_err(|e| SynthesisError::new(FailureReason::Network, e.to_string()))?;
        if body.is_empty() {
            return Err(SynthesisError::new(
                FailureReason::Service,
                "service returned no audio",
            ));
        }

        std::fs::write(out, &body)
            .map_err(|e| SynthesisError::new(FailureReason::Io, e.to_string()))?;

        let duration = match encoding {
            OutputEncoding::RiffPcm16k => Self::pcm_duration_secs(body.len()),
            OutputEncoding::Mp3_16k64k => 0.0,
        };
        info!(
            "synthesized {} bytes ({:.2}s) to {}",
            body.len(),
            duration,
            out.display()
        );
        Ok(duration)
    }

    fn list_voices(&self, key: &str, region: &str) -> Result<Vec<VoiceInfo>, SynthesisError> {
        debug!("fetching voice list for region {}", region);

        let response = self
            .client
            .get(Self::voices_url(region))
            .header("Ocp-Apim-Subscription-Key", key)
            .send()
            .map_err(|e| SynthesisError::new(FailureReason::Network, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(SynthesisError::new(
                FailureReason::Service,
                format!("{}: {}", status, detail.trim()),
            ));
        }

        let voices: Vec<VoiceInfo> = response
            .json()
            .map_err(|e| SynthesisError::new(FailureReason::Service, e.to_string()))?;
        info!("loaded {} voices for region {}", voices.len(), region);
        Ok(voices)
    }
}
