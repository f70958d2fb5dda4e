//! Voice catalog
//!
//! The synthesis service exposes a per-region voice list. The catalog
//! remembers which credentials fetched it, because a voice name is only
//! meaningful against the region it came from - changed credentials mean
//! the list should be reloaded.

use serde::Deserialize;

/// One voice as described by the service's voice-list endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceInfo {
    /// Unique voice identifier, e.g. "en-US-JennyNeural"
    pub short_name: String,
    /// Language tag, e.g. "en-US"
    pub locale: String,
    /// Speaking styles this voice supports, if any
    #[serde(default)]
    pub style_list: Vec<String>,
    /// Role-play values this voice supports, if any
    #[serde(default)]
    pub role_play_list: Vec<String>,
}

/// The loaded voice list plus the credentials that loaded it
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<VoiceInfo>,
    key: String,
    region: String,
}

impl VoiceCatalog {
    pub fn new(mut voices: Vec<VoiceInfo>, key: String, region: String) -> Self {
        voices.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        Self {
            voices,
            key,
            region,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Voices for a language, sorted by short name
    pub fn voices_for(&self, language: &str) -> Vec<&VoiceInfo> {
        self.voices.iter().filter(|v| v.locale == language).collect()
    }

    /// All distinct locales in the catalog, sorted
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.voices.iter().map(|v| v.locale.clone()).collect();
        langs.sort();
        langs.dedup();
        langs
    }

    pub fn find(&self, short_name: &str) -> Option<&VoiceInfo> {
        self.voices.iter().find(|v| v.short_name == short_name)
    }

    /// Was this catalog loaded with the given credentials?
    ///
    /// When false, the list may describe a different region and a reload
    /// is advisable before trusting voice names.
    pub fn matches_credentials(&self, key: &str, region: &str) -> bool {
        self.key == key && self.region == region
    }
}
