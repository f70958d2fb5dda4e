//! Synthesis result cache
//!
//! At most one synthesized artifact is live at any time, owned
//! exclusively by the `CacheController`. Reuse is decided by a fresh
//! comparison of the current parameter snapshot against the one that
//! produced the artifact - there is no reactive invalidation.

use crate::params::SynthesisParams;
use log::debug;
use std::path::PathBuf;

/// The most recent successfully synthesized audio file
#[derive(Debug, Clone)]
pub struct CachedArtifact {
    /// Snapshot that produced this audio
    pub params: SynthesisParams,
    /// Backing file inside the cache directory
    pub path: PathBuf,
    /// Duration reported by the synthesis worker, seconds
    pub duration_secs: f64,
}

/// Holds the last successful snapshot and decides reuse vs. resynthesis
#[derive(Debug, Default)]
pub struct CacheController {
    artifact: Option<CachedArtifact>,
}

impl CacheController {
    pub fn new() -> Self {
        Self { artifact: None }
    }

    /// May the cached artifact satisfy `current`?
    ///
    /// True only when an artifact exists, its file is still on disk, its
    /// duration is positive, the text has not been touched since the
    /// last successful synthesis, and every snapshot field matches.
    /// The text-modified flag is an independent gate: it protects
    /// against paths (undo, profile load) where the fields compare equal
    /// but staleness is intended.
    pub fn should_reuse(&self, current: &SynthesisParams, text_modified: bool) -> bool {
        let Some(artifact) = &self.artifact else {
            return false;
        };
        if text_modified {
            debug!("cache miss: text modified since last synthesis");
            return false;
        }
        if artifact.duration_secs <= 0.0 {
            debug!("cache miss: artifact has no duration");
            return false;
        }
        if !artifact.path.exists() {
            debug!("cache miss: backing file gone: {}", artifact.path.display());
            return false;
        }
        if artifact.params != *current {
            debug!("cache miss: parameters changed");
            return false;
        }
        true
    }

    /// Store a new artifact from a successful synthesis
    pub fn store(&mut self, artifact: CachedArtifact) {
        debug!(
            "caching artifact {} ({:.2}s)",
            artifact.path.display(),
            artifact.duration_secs
        );
        self.artifact = Some(artifact);
    }

    /// Clear and hand back the stored artifact, if any
    ///
    /// Called *before* a new synthesis is triggered, so a crash
    /// mid-synthesis cannot leave a stale record claiming to be valid.
    /// The caller is responsible for retiring the returned file.
    pub fn take(&mut self) -> Option<CachedArtifact> {
        self.artifact.take()
    }

    pub fn artifact(&self) -> Option<&CachedArtifact> {
        self.artifact.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DEFAULT_STYLE, NO_ROLE};

    fn params(text: &str) -> SynthesisParams {
        SynthesisParams {
            text: text.to_string(),
            language: "en-US".to_string(),
            voice: "en-US-JennyNeural".to_string(),
            role: NO_ROLE.to_string(),
            style: DEFAULT_STYLE.to_string(),
            rate: 1.0,
            key: "k".to_string(),
            region: "eastus".to_string(),
        }
    }

    fn artifact_on_disk(dir: &std::path::Path, p: &SynthesisParams) -> CachedArtifact {
        let path = dir.join("cached.wav");
        std::fs::write(&path, b"riff").unwrap();
        CachedArtifact {
            params: p.clone(),
            path,
            duration_secs: 5.0,
        }
    }

    #[test]
    fn test_empty_cache_never_reuses() {
        let cache = CacheController::new();
        assert!(!cache.should_reuse(&params("hi"), false));
    }

    #[test]
    fn test_reuse_requires_all_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let p = params("hi");
        let mut cache = CacheController::new();
        cache.store(artifact_on_disk(dir.path(), &p));

        // All conditions hold
        assert!(cache.should_reuse(&p, false));

        // Text-modified flag alone defeats reuse, even with equal fields
        assert!(!cache.should_reuse(&p, true));

        // Any field mismatch defeats reuse
        let mut changed = p.clone();
        changed.rate = 1.25;
        assert!(!cache.should_reuse(&changed, false));
        let mut changed = p.clone();
        changed.key = "k2".to_string();
        assert!(!cache.should_reuse(&changed, false));

        // Missing backing file defeats reuse
        let path = cache.artifact().unwrap().path.clone();
        std::fs::remove_file(&path).unwrap();
        assert!(!cache.should_reuse(&p, false));
    }

    #[test]
    fn test_zero_duration_defeats_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let p = params("hi");
        let mut art = artifact_on_disk(dir.path(), &p);
        art.duration_secs = 0.0;
        let mut cache = CacheController::new();
        cache.store(art);
        assert!(!cache.should_reuse(&p, false));
    }

    #[test]
    fn test_take_clears() {
        let dir = tempfile::tempdir().unwrap();
        let p = params("hi");
        let mut cache = CacheController::new();
        cache.store(artifact_on_disk(dir.path(), &p));

        let taken = cache.take();
        assert!(taken.is_some());
        assert!(cache.artifact().is_none());
        assert!(cache.take().is_none());
        assert!(!cache.should_reuse(&p, false));
    }
}
