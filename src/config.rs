//! Configuration management
//!
//! Persists Azure credentials and named voice profiles in an INI file
//! at ~/.ttsdeck.cfg. Profiles capture the non-text synthesis inputs so
//! a voice setup can be restored in one command.

use crate::{DeckError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::PathBuf;

/// Prefix for profile sections, e.g. `[profile:Narrator]`
const PROFILE_PREFIX: &str = "profile:";

/// A saved voice setup (everything except the text and credentials)
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    pub language: String,
    pub voice: String,
    pub role: String,
    pub style: String,
    pub rate: f64,
}

/// Application configuration
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.ttsdeck.cfg)
    path: PathBuf,
}

impl Config {
    /// Load configuration from disk or create default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load from an explicit path (tests point this at a temp dir)
    pub fn load_from(path: PathBuf) -> Result<Self> {
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| DeckError::Config(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| DeckError::Config(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| DeckError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.ttsdeck.cfg)
    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".ttsdeck.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("credentials"))
            .set("key", "")
            .set("region", "");

        ini
    }

    /// Saved Azure credentials, if both halves are present
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = self.ini.get_from(Some("credentials"), "key")?;
        let region = self.ini.get_from(Some("credentials"), "region")?;
        if key.is_empty() || region.is_empty() {
            return None;
        }
        Some((key.to_string(), region.to_string()))
    }

    pub fn set_credentials(&mut self, key: &str, region: &str) {
        self.ini
            .with_section(Some("credentials"))
            .set("key", key)
            .set("region", region);
    }

    /// Names of all saved profiles, sorted
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ini
            .sections()
            .filter_map(|s| s?.strip_prefix(PROFILE_PREFIX))
            .map(|n| n.to_string())
            .collect();
        names.sort();
        names
    }

    /// Look up a saved profile by name
    pub fn profile(&self, name: &str) -> Option<VoiceProfile> {
        let section = format!("{}{}", PROFILE_PREFIX, name);
        let section = self.ini.section(Some(section.as_str()))?;
        Some(VoiceProfile {
            language: section.get("language").unwrap_or("").to_string(),
            voice: section.get("voice").unwrap_or("").to_string(),
            role: section
                .get("role")
                .unwrap_or(crate::params::NO_ROLE)
                .to_string(),
            style: section
                .get("style")
                .unwrap_or(crate::params::DEFAULT_STYLE)
                .to_string(),
            rate: section
                .get("rate")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Store (or overwrite) a profile under `name`
    pub fn set_profile(&mut self, name: &str, profile: &VoiceProfile) {
        let section = format!("{}{}", PROFILE_PREFIX, name);
        self.ini
            .with_section(Some(section))
            .set("language", &profile.language)
            .set("voice", &profile.voice)
            .set("role", &profile.role)
            .set("style", &profile.style)
            .set("rate", format!("{}", profile.rate));
    }

    /// Remove a profile; returns false if it did not exist
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let section = format!("{}{}", PROFILE_PREFIX, name);
        self.ini.delete(Some(section)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("ttsdeck.cfg")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_default_has_no_credentials() {
        let (_dir, config) = temp_config();
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_credentials_round_trip() {
        let (dir, mut config) = temp_config();
        config.set_credentials("abc123", "westus");
        config.save().unwrap();

        let reloaded = Config::load_from(dir.path().join("ttsdeck.cfg")).unwrap();
        assert_eq!(
            reloaded.credentials(),
            Some(("abc123".to_string(), "westus".to_string()))
        );
    }

    #[test]
    fn test_partial_credentials_are_absent() {
        let (_dir, mut config) = temp_config();
        config.set_credentials("abc123", "");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_profile_round_trip() {
        let (dir, mut config) = temp_config();
        let profile = VoiceProfile {
            language: "en-US".to_string(),
            voice: "en-US-JennyNeural".to_string(),
            role: "none".to_string(),
            style: "cheerful".to_string(),
            rate: 1.25,
        };
        config.set_profile("Narrator", &profile);
        config.save().unwrap();

        let reloaded = Config::load_from(dir.path().join("ttsdeck.cfg")).unwrap();
        assert_eq!(reloaded.profile_names(), vec!["Narrator".to_string()]);
        assert_eq!(reloaded.profile("Narrator"), Some(profile));
    }

    #[test]
    fn test_missing_profile() {
        let (_dir, config) = temp_config();
        assert!(config.profile("Nobody").is_none());
    }

    #[test]
    fn test_remove_profile() {
        let (_dir, mut config) = temp_config();
        let profile = VoiceProfile {
            language: "fr-FR".to_string(),
            voice: "fr-FR-DeniseNeural".to_string(),
            role: "none".to_string(),
            style: "default".to_string(),
            rate: 1.0,
        };
        config.set_profile("French", &profile);
        assert!(config.remove_profile("French"));
        assert!(!config.remove_profile("French"));
        assert!(config.profile_names().is_empty());
    }
}
