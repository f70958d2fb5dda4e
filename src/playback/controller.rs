//! Playback state machine
//!
//! The `Controller` is the single owner of all playback, cache, and
//! artifact state. External callers (the shell, worker completions)
//! interact only through its public operations; everything inside runs
//! on the controlling thread, so no locking is needed anywhere.
//!
//! A reuse decision is computed freshly from current inputs at the
//! moment play is pressed - there is no invalidation side channel. At
//! most one synthesis worker is ever in flight, enforced by refusing to
//! start a run while the state is `Synthesizing`.

use crate::cache::{CacheController, CachedArtifact};
use crate::clock::ProgressClock;
use crate::config::VoiceProfile;
use crate::event::DeckEvent;
use crate::janitor::CacheDir;
use crate::params::{SynthesisParams, DEFAULT_STYLE, NO_ROLE};
use crate::playback::engine::AudioEngine;
use crate::synth::{self, SpeechService, SynthesisError};
use crate::voices::VoiceCatalog;
use crate::{DeckError, Result};
use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

/// Transport states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Never played, or cache invalidated to nothing
    Idle,
    /// A synthesis worker is in flight; transport is refused
    Synthesizing,
    Playing,
    Paused,
    /// Explicitly stopped; artifact retained for replay
    StoppedByUser,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Synthesizing => "synthesizing",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::StoppedByUser => "stopped",
        };
        f.write_str(name)
    }
}

/// Current user inputs, mutated through controller setters
#[derive(Debug, Clone)]
pub struct Inputs {
    pub text: String,
    pub language: String,
    pub voice: String,
    pub role: String,
    pub style: String,
    pub rate: f64,
    pub key: String,
    pub region: String,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            text: String::new(),
            language: String::new(),
            voice: String::new(),
            role: NO_ROLE.to_string(),
            style: DEFAULT_STYLE.to_string(),
            rate: 1.0,
            key: String::new(),
            region: String::new(),
        }
    }
}

/// The synthesis-cache-and-playback controller
pub struct Controller {
    state: PlaybackState,
    inputs: Inputs,
    /// Set on any text edit, cleared only by a successful synthesis
    text_modified: bool,
    cache: CacheController,
    janitor: CacheDir,
    clock: ProgressClock,
    engine: Box<dyn AudioEngine>,
    service: Arc<dyn SpeechService>,
    events: Sender<DeckEvent>,
    catalog: Option<VoiceCatalog>,
    /// `Some(was_playing)` while a seek gesture is held
    seeking: Option<bool>,
    export_in_flight: bool,
}

impl Controller {
    pub fn new(
        engine: Box<dyn AudioEngine>,
        service: Arc<dyn SpeechService>,
        janitor: CacheDir,
        events: Sender<DeckEvent>,
    ) -> Self {
        Self {
            state: PlaybackState::Idle,
            inputs: Inputs::default(),
            text_modified: false,
            cache: CacheController::new(),
            janitor,
            clock: ProgressClock::new(),
            engine,
            service,
            events,
            catalog: None,
            seeking: None,
            export_in_flight: false,
        }
    }

    // ========== Input updates ==========

    /// Record a text edit; always marks the text as modified, even when
    /// the new content equals the old (an undo that restores the
    /// original text still invalidates the cache)
    pub fn on_text_changed(&mut self, text: &str) {
        self.inputs.text = text.to_string();
        self.text_modified = true;
    }

    pub fn set_language(&mut self, language: &str) {
        self.inputs.language = language.to_string();
    }

    pub fn set_voice(&mut self, voice: &str) {
        self.inputs.voice = voice.to_string();
    }

    pub fn set_role(&mut self, role: &str) {
        self.inputs.role = if role.is_empty() {
            NO_ROLE.to_string()
        } else {
            role.to_string()
        };
    }

    pub fn set_style(&mut self, style: &str) {
        self.inputs.style = if style.is_empty() {
            DEFAULT_STYLE.to_string()
        } else {
            style.to_string()
        };
    }

    /// Set the speaking rate; rejects non-positive or non-finite values
    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DeckError::Validation(format!("invalid rate: {}", rate)));
        }
        self.inputs.rate = rate;
        Ok(())
    }

    pub fn set_credentials(&mut self, key: &str, region: &str) {
        if let Some(catalog) = &self.catalog {
            if !catalog.matches_credentials(key, region) {
                warn!("credentials differ from the loaded voice list; reload voices");
            }
        }
        self.inputs.key = key.to_string();
        self.inputs.region = region.to_string();
    }

    /// Install a freshly loaded voice catalog
    pub fn set_catalog(&mut self, catalog: VoiceCatalog) {
        info!("voice catalog installed: {} voices", catalog.len());
        self.catalog = Some(catalog);
    }

    /// Apply a saved voice profile
    ///
    /// A profile load always forces resynthesis: the artifact is
    /// retired and the text-modified gate is set, even when every field
    /// the profile carries matches the current inputs.
    pub fn apply_profile(&mut self, profile: &VoiceProfile) {
        info!("applying profile: voice {}", profile.voice);
        self.inputs.language = profile.language.clone();
        self.inputs.voice = profile.voice.clone();
        self.inputs.role = profile.role.clone();
        self.inputs.style = profile.style.clone();
        self.inputs.rate = profile.rate;
        self.invalidate_artifact();
        self.clock.clear();
        self.text_modified = true;
        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::StoppedByUser
        ) {
            self.state = PlaybackState::Idle;
        }
    }

    // ========== Observers ==========

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn catalog(&self) -> Option<&VoiceCatalog> {
        self.catalog.as_ref()
    }

    pub fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    /// Displayed (elapsed, total) seconds
    pub fn progress(&self) -> (f64, f64) {
        match self.state {
            PlaybackState::Synthesizing => (0.0, 0.0),
            PlaybackState::StoppedByUser | PlaybackState::Idle => (0.0, self.clock.total()),
            _ => (self.clock.elapsed(), self.clock.total()),
        }
    }

    /// Snapshot of everything that affects synthesized output, built
    /// freshly from current inputs
    pub fn snapshot(&self) -> SynthesisParams {
        SynthesisParams {
            text: self.inputs.text.trim().to_string(),
            language: self.inputs.language.clone(),
            voice: self.inputs.voice.clone(),
            role: self.inputs.role.clone(),
            style: self.inputs.style.clone(),
            rate: self.inputs.rate,
            key: self.inputs.key.clone(),
            region: self.inputs.region.clone(),
        }
    }

    fn voices_loaded(&self) -> bool {
        self.catalog.as_ref().is_some_and(|c| !c.is_empty())
    }

    // ========== Transport operations ==========

    /// Play/pause button
    pub fn on_play_pause(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                self.engine.pause()?;
                self.clock.pause();
                self.state = PlaybackState::Paused;
                debug!("paused at {:.2}s", self.clock.elapsed());
                Ok(())
            }
            PlaybackState::Paused => {
                // A resume is only a resume while the paused audio is
                // still current; an edit made during the pause means the
                // press starts a fresh run instead
                let params = self.snapshot();
                if !self.cache.should_reuse(&params, self.text_modified) {
                    debug!("inputs changed while paused, resynthesizing");
                    return self.start_fresh_play();
                }
                self.engine.unpause()?;
                self.clock.resume();
                self.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Synthesizing => {
                // At most one worker in flight; further presses are no-ops
                debug!("play ignored: synthesis in flight");
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::StoppedByUser => self.start_fresh_play(),
        }
    }

    fn start_fresh_play(&mut self) -> Result<()> {
        let params = self.snapshot();

        if self.cache.should_reuse(&params, self.text_modified) {
            info!("reusing cached audio");
            return self.start_cached_playback();
        }

        if let Err(e) = params.validate(self.voices_loaded()) {
            // A rejected request ends the session wherever it came from
            self.state = PlaybackState::Idle;
            return Err(e);
        }

        // Clear the cache record before anything else so a crash during
        // synthesis cannot leave a stale record claiming to be valid
        self.invalidate_artifact();
        self.clock.clear();

        let path = self.janitor.allocate();
        self.state = PlaybackState::Synthesizing;
        info!("starting synthesis into {}", path.display());
        synth::spawn_synthesis(self.service.clone(), params, path, self.events.clone());
        Ok(())
    }

    /// Load and play the cached artifact from the start
    fn start_cached_playback(&mut self) -> Result<()> {
        let Some(artifact) = self.cache.artifact() else {
            self.state = PlaybackState::Idle;
            return Err(DeckError::Playback("no cached audio to play".to_string()));
        };
        let path = artifact.path.clone();
        let duration = artifact.duration_secs;

        if let Err(e) = self.engine.load(&path).and_then(|_| self.engine.play()) {
            // A file the engine cannot load is presumed unusable
            return Err(self.engine_failed(e));
        }
        self.clock.begin(duration);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Stop button: halt playback, reset position, keep the artifact
    pub fn on_stop(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        if let Err(e) = self.engine.stop() {
            debug!("engine stop failed (ignored): {}", e);
        }
        if let Err(e) = self.engine.unload() {
            debug!("engine unload failed (ignored): {}", e);
        }
        self.clock.stop();
        self.seeking = None;
        self.state = PlaybackState::StoppedByUser;
        debug!("stopped; duration {:.2}s retained", self.clock.total());
    }

    /// Periodic tick while the loop is idle; drives end-of-playback
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Tick with an explicit "now", for deterministic tests
    pub fn tick_at(&mut self, now: Instant) {
        if self.state != PlaybackState::Playing || self.seeking.is_some() {
            return;
        }
        if self.clock.finished_at(now) || !self.engine.is_busy() {
            debug!("playback finished");
            self.on_stop();
        }
    }

    // ========== Seek gesture ==========

    /// Seek gesture started (slider grabbed)
    ///
    /// Ignored unless a valid artifact backs the session.
    pub fn on_seek_begin(&mut self) {
        if self.seeking.is_some() {
            return;
        }
        let artifact_valid = self
            .cache
            .artifact()
            .is_some_and(|a| a.duration_secs > 0.0 && a.path.exists());
        if !artifact_valid
            || !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
        {
            debug!("seek ignored: no valid artifact or wrong state");
            return;
        }

        let was_playing = self.state == PlaybackState::Playing;
        if was_playing {
            if let Err(e) = self.engine.pause() {
                debug!("engine pause for seek failed (ignored): {}", e);
            }
            self.clock.pause();
        }
        self.seeking = Some(was_playing);
    }

    /// Seek position dragged; returns the clamped position for display
    pub fn on_seek_change(&self, position: f64) -> f64 {
        position.clamp(0.0, self.clock.total())
    }

    /// Seek gesture released: reposition and resume the prior state
    ///
    /// The engine seeks by stop, reload, set-position - arbitrary-offset
    /// starts are not assumed reliable for the preview encoding.
    pub fn on_seek_end(&mut self, position: f64) -> Result<()> {
        let Some(was_playing) = self.seeking.take() else {
            return Ok(());
        };
        let Some(artifact) = self.cache.artifact() else {
            self.state = PlaybackState::Idle;
            return Ok(());
        };
        let path = artifact.path.clone();
        let target = position.clamp(0.0, artifact.duration_secs);

        if let Err(e) = self.reposition_engine(&path, target) {
            return Err(self.engine_failed(e));
        }

        self.clock.seek(target);
        if was_playing {
            self.state = PlaybackState::Playing;
        } else {
            if let Err(e) = self.engine.pause() {
                return Err(self.engine_failed(e));
            }
            self.clock.pause();
            self.state = PlaybackState::Paused;
        }
        debug!("seeked to {:.2}s ({})", target, self.state);
        Ok(())
    }

    fn reposition_engine(&mut self, path: &std::path::Path, target: f64) -> Result<()> {
        self.engine.stop()?;
        self.engine.load(path)?;
        self.engine.play()?;
        self.engine.set_position(target)
    }

    // ========== Worker completions ==========

    /// A synthesis worker reported its outcome
    pub fn on_synthesis_done(
        &mut self,
        params: SynthesisParams,
        path: PathBuf,
        outcome: std::result::Result<f64, SynthesisError>,
    ) -> Result<()> {
        if self.state != PlaybackState::Synthesizing {
            // Cannot happen under the at-most-one rule, but a stray
            // message must not clobber current state
            warn!("unexpected synthesis completion in state {}", self.state);
            self.janitor.retire(self.engine.as_mut(), &path);
            return Ok(());
        }

        match outcome {
            Ok(duration_secs) => {
                self.cache.store(CachedArtifact {
                    params,
                    path,
                    duration_secs,
                });
                self.text_modified = false;
                info!("synthesis complete ({:.2}s), starting playback", duration_secs);
                self.start_cached_playback()
            }
            Err(e) => {
                self.state = PlaybackState::Idle;
                self.clock.clear();
                // The service may have partially written the file
                self.janitor.retire(self.engine.as_mut(), &path);
                Err(DeckError::Synthesis(e))
            }
        }
    }

    // ========== Export ==========

    /// Kick off an MP3 export to `target`
    ///
    /// Runs as an independent worker against a distinct path; playback
    /// state and the cached artifact are untouched.
    pub fn on_export(&mut self, target: PathBuf) -> Result<()> {
        if self.export_in_flight {
            return Err(DeckError::Validation(
                "an export is already running".to_string(),
            ));
        }
        let params = self.snapshot();
        params.validate(self.voices_loaded())?;

        self.export_in_flight = true;
        info!("exporting to {}", target.display());
        synth::spawn_export(self.service.clone(), params, target, self.events.clone());
        Ok(())
    }

    /// An export worker reported its outcome
    pub fn on_export_done(
        &mut self,
        path: PathBuf,
        outcome: std::result::Result<(), SynthesisError>,
    ) -> Result<()> {
        self.export_in_flight = false;
        match outcome {
            Ok(()) => {
                info!("export saved to {}", path.display());
                Ok(())
            }
            Err(e) => Err(DeckError::Export(e)),
        }
    }

    // ========== Lifecycle ==========

    /// Retire the cached artifact, if any (stop engine, delete file)
    ///
    /// Idempotent: a second call with the record already cleared is a
    /// no-op.
    fn invalidate_artifact(&mut self) {
        if let Some(artifact) = self.cache.take() {
            self.janitor.retire(self.engine.as_mut(), &artifact.path);
        }
    }

    /// Engine-level failure: the artifact is presumed corrupt/unusable
    fn engine_failed(&mut self, e: DeckError) -> DeckError {
        warn!("engine failure, discarding artifact: {}", e);
        self.invalidate_artifact();
        self.clock.clear();
        self.seeking = None;
        self.state = PlaybackState::Idle;
        e
    }

    /// Process shutdown: release the engine and delete the artifact
    pub fn shutdown(&mut self) {
        debug!("controller shutting down");
        self.invalidate_artifact();
        if let Err(e) = self.engine.unload() {
            debug!("engine unload at shutdown failed (ignored): {}", e);
        }
        self.state = PlaybackState::Idle;
    }
}
