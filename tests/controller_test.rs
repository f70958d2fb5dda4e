//! Integration tests for the playback controller
//!
//! The engine and synthesis service are scripted, so every transition
//! runs without audio hardware or network. Worker threads are real; the
//! tests pump their completion messages into the controller by hand.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use ttsdeck::event::DeckEvent;
use ttsdeck::janitor::CacheDir;
use ttsdeck::playback::{AudioEngine, Controller, PlaybackState};
use ttsdeck::synth::{FailureReason, OutputEncoding, SpeechService, SynthesisError};
use ttsdeck::voices::{VoiceCatalog, VoiceInfo};
use ttsdeck::{DeckError, Result};

#[derive(Default)]
struct EngineState {
    loaded: Option<PathBuf>,
    playing: bool,
    drained: bool,
    positions: Vec<f64>,
    fail_load: bool,
}

/// Engine double writing its activity into shared state
struct MockEngine(Arc<Mutex<EngineState>>);

impl AudioEngine for MockEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut s = self.0.lock().unwrap();
        if s.fail_load {
            return Err(DeckError::Playback("mock load failure".to_string()));
        }
        s.loaded = Some(path.to_path_buf());
        s.playing = false;
        s.drained = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.0.lock().unwrap().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.0.lock().unwrap().playing = false;
        Ok(())
    }

    fn unpause(&mut self) -> Result<()> {
        self.0.lock().unwrap().playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut s = self.0.lock().unwrap();
        s.playing = false;
        s.drained = true;
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        self.0.lock().unwrap().loaded = None;
        Ok(())
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        self.0.lock().unwrap().positions.push(seconds);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        let s = self.0.lock().unwrap();
        s.loaded.is_some() && !s.drained
    }
}

/// Service double that writes a placeholder file and counts calls
struct MockService {
    calls: AtomicUsize,
    duration: f64,
    fail_next: Mutex<Option<SynthesisError>>,
}

impl MockService {
    fn new(duration: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            duration,
            fail_next: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_next(&self, e: SynthesisError) {
        *self.fail_next.lock().unwrap() = Some(e);
    }
}

impl SpeechService for MockService {
    fn synthesize(
        &self,
        _key: &str,
        _region: &str,
        _ssml: &str,
        _encoding: OutputEncoding,
        out: &Path,
    ) -> std::result::Result<f64, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.fail_next.lock().unwrap().take() {
            return Err(e);
        }
        std::fs::write(out, b"RIFFfake")
            .map_err(|e| SynthesisError::new(FailureReason::Io, e.to_string()))?;
        Ok(self.duration)
    }

    fn list_voices(
        &self,
        _key: &str,
        _region: &str,
    ) -> std::result::Result<Vec<VoiceInfo>, SynthesisError> {
        Ok(vec![jenny()])
    }
}

fn jenny() -> VoiceInfo {
    VoiceInfo {
        short_name: "en-US-JennyNeural".to_string(),
        locale: "en-US".to_string(),
        style_list: vec!["cheerful".to_string()],
        role_play_list: vec![],
    }
}

struct Harness {
    controller: Controller,
    rx: Receiver<DeckEvent>,
    engine: Arc<Mutex<EngineState>>,
    service: Arc<MockService>,
    cache_root: PathBuf,
    dir: tempfile::TempDir,
}

impl Harness {
    /// Feed the next worker completion into the controller
    fn pump(&mut self) -> Result<()> {
        match self
            .rx
            .recv_timeout(Duration::from_secs(2))
            .expect("worker never reported")
        {
            DeckEvent::SynthesisDone {
                params,
                path,
                outcome,
            } => self.controller.on_synthesis_done(params, path, outcome),
            DeckEvent::ExportDone { path, outcome } => {
                self.controller.on_export_done(path, outcome)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    fn cached_files(&self) -> usize {
        std::fs::read_dir(&self.cache_root).unwrap().count()
    }
}

/// Harness with credentials and catalog, but no text or voice selection
fn bare_harness(duration: f64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let cache_root = dir.path().join("cache");
    let janitor = CacheDir::init(cache_root.clone()).unwrap();
    let engine = Arc::new(Mutex::new(EngineState::default()));
    let service = Arc::new(MockService::new(duration));
    let (tx, rx) = mpsc::channel();
    let controller = Controller::new(
        Box::new(MockEngine(engine.clone())),
        service.clone(),
        janitor,
        tx,
    );
    Harness {
        controller,
        rx,
        engine,
        service,
        cache_root,
        dir,
    }
}

/// Harness fully configured and ready to synthesize
fn harness(duration: f64) -> Harness {
    let mut h = bare_harness(duration);
    h.controller.set_credentials("key", "eastus");
    h.controller.set_language("en-US");
    h.controller.set_voice("en-US-JennyNeural");
    h.controller.on_text_changed("Hello there");
    h.controller.set_catalog(VoiceCatalog::new(
        vec![jenny()],
        "key".to_string(),
        "eastus".to_string(),
    ));
    h
}

#[test]
fn test_first_play_synthesizes_then_plays() {
    let mut h = harness(5.0);

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);

    h.pump().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.service.calls(), 1);
    assert!(h.engine.lock().unwrap().playing);
    let (_, total) = h.controller.progress();
    assert_eq!(total, 5.0);
}

#[test]
fn test_replay_after_stop_reuses_cache() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();

    h.controller.on_stop();
    assert_eq!(h.controller.state(), PlaybackState::StoppedByUser);
    // Position resets, duration stays for display
    assert_eq!(h.controller.progress(), (0.0, 5.0));

    // Nothing changed: replay starts immediately from the cached file
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.service.calls(), 1);
}

#[test]
fn test_rate_change_forces_resynthesis() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_stop();

    h.controller.set_rate(1.25).unwrap();
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);
    h.pump().unwrap();
    assert_eq!(h.service.calls(), 2);
    // The superseded artifact is gone; only the new one remains
    assert_eq!(h.cached_files(), 1);
}

#[test]
fn test_rewriting_identical_text_forces_resynthesis() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_stop();

    // Same content, but the edit itself marks the text dirty
    h.controller.on_text_changed("Hello there");
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);
    h.pump().unwrap();
    assert_eq!(h.service.calls(), 2);
}

#[test]
fn test_text_edit_while_paused_resynthesizes() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Paused);

    // Editing during the pause makes the next press a fresh run,
    // not a resume
    h.controller.on_text_changed("Hello edited");
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);

    h.pump().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.service.calls(), 2);
}

#[test]
fn test_rate_change_while_paused_resynthesizes() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_play_pause().unwrap();

    h.controller.set_rate(1.5).unwrap();
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);
    h.pump().unwrap();
    assert_eq!(h.service.calls(), 2);
}

#[test]
fn test_unchanged_resume_from_pause_does_not_resynthesize() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_play_pause().unwrap();

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.service.calls(), 1);
}

#[test]
fn test_validation_failure_leaves_state_unchanged() {
    let mut h = harness(5.0);
    h.controller.on_text_changed("   ");

    let err = h.controller.on_play_pause().unwrap_err();
    assert!(matches!(err, DeckError::Validation(_)));
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert_eq!(h.service.calls(), 0);
}

#[test]
fn test_validation_failure_from_stopped_goes_idle() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_stop();
    assert_eq!(h.controller.state(), PlaybackState::StoppedByUser);

    h.controller.on_text_changed("");
    let err = h.controller.on_play_pause().unwrap_err();
    assert!(matches!(err, DeckError::Validation(_)));
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert_eq!(h.service.calls(), 1);
}

#[test]
fn test_play_without_voice_catalog_is_rejected() {
    let mut h = bare_harness(5.0);
    h.controller.set_credentials("key", "eastus");
    h.controller.set_language("en-US");
    h.controller.set_voice("en-US-JennyNeural");
    h.controller.on_text_changed("Hello");

    let err = h.controller.on_play_pause().unwrap_err();
    assert!(matches!(err, DeckError::Validation(_)));
    assert_eq!(h.service.calls(), 0);
}

#[test]
fn test_play_during_synthesis_is_ignored() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);

    // Mashing the button while a worker runs starts nothing new
    h.controller.on_play_pause().unwrap();
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);

    h.pump().unwrap();
    assert_eq!(h.service.calls(), 1);
    assert_eq!(h.controller.state(), PlaybackState::Playing);
}

#[test]
fn test_synthesis_failure_returns_to_idle() {
    let mut h = harness(5.0);
    h.service
        .fail_next(SynthesisError::new(FailureReason::Service, "quota"));

    h.controller.on_play_pause().unwrap();
    let err = h.pump().unwrap_err();
    assert!(matches!(err, DeckError::Synthesis(_)));
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    // No partial artifact lingers
    assert_eq!(h.cached_files(), 0);

    // Recovery: the next play attempt synthesizes again
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.service.calls(), 2);
}

#[test]
fn test_engine_load_failure_discards_artifact() {
    let mut h = harness(5.0);
    h.engine.lock().unwrap().fail_load = true;

    h.controller.on_play_pause().unwrap();
    let err = h.pump().unwrap_err();
    assert!(matches!(err, DeckError::Playback(_)));
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert_eq!(h.cached_files(), 0);
}

#[test]
fn test_pause_and_resume() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    assert!(!h.engine.lock().unwrap().playing);

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert!(h.engine.lock().unwrap().playing);
}

#[test]
fn test_seek_past_end_clamps_then_finishes() {
    let mut h = harness(10.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();

    h.controller.on_seek_begin();
    assert_eq!(h.controller.on_seek_change(15.0), 10.0);
    h.controller.on_seek_end(15.0).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(*h.engine.lock().unwrap().positions.last().unwrap(), 10.0);

    // Sitting at the end, the next tick finishes playback
    h.controller.tick_at(Instant::now());
    assert_eq!(h.controller.state(), PlaybackState::StoppedByUser);
    assert_eq!(h.controller.progress(), (0.0, 10.0));
}

#[test]
fn test_seek_while_paused_stays_paused() {
    let mut h = harness(10.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Paused);

    h.controller.on_seek_begin();
    h.controller.on_seek_end(4.0).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    assert!(!h.engine.lock().unwrap().playing);
    // Clock position is wall-clock derived; allow scheduling slack
    let (pos, _) = h.controller.progress();
    assert!((pos - 4.0).abs() < 0.05, "position was {}", pos);
}

#[test]
fn test_seek_without_artifact_is_ignored() {
    let mut h = harness(10.0);
    h.controller.on_seek_begin();
    h.controller.on_seek_end(3.0).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(h.engine.lock().unwrap().positions.is_empty());
}

#[test]
fn test_tick_when_engine_drains_finishes_playback() {
    let mut h = harness(300.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();

    // Engine ran out of audio ahead of the nominal duration
    h.engine.lock().unwrap().drained = true;
    h.controller.tick_at(Instant::now());
    assert_eq!(h.controller.state(), PlaybackState::StoppedByUser);
}

#[test]
fn test_tick_while_paused_does_nothing() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_play_pause().unwrap();

    h.controller
        .tick_at(Instant::now() + Duration::from_secs(60));
    assert_eq!(h.controller.state(), PlaybackState::Paused);
}

#[test]
fn test_profile_application_forces_resynthesis() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    h.controller.on_stop();

    // A profile carrying the exact current values still invalidates
    let profile = ttsdeck::config::VoiceProfile {
        language: "en-US".to_string(),
        voice: "en-US-JennyNeural".to_string(),
        role: "none".to_string(),
        style: "default".to_string(),
        rate: 1.0,
    };
    h.controller.apply_profile(&profile);
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert_eq!(h.cached_files(), 0);

    h.controller.on_play_pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Synthesizing);
    h.pump().unwrap();
    assert_eq!(h.service.calls(), 2);
}

#[test]
fn test_export_runs_independently_of_playback() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Playing);

    let target = h.dir.path().join("out.mp3");
    h.controller.on_export(target.clone()).unwrap();
    assert!(h.controller.export_in_flight());

    // Only one export at a time
    let err = h.controller.on_export(target.clone()).unwrap_err();
    assert!(matches!(err, DeckError::Validation(_)));

    h.pump().unwrap();
    assert!(!h.controller.export_in_flight());
    assert!(target.exists());
    // The preview session never noticed
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.cached_files(), 1);
}

#[test]
fn test_export_failure_is_reported() {
    let mut h = harness(5.0);
    h.service
        .fail_next(SynthesisError::bare(FailureReason::Network));

    let target = h.dir.path().join("out.mp3");
    h.controller.on_export(target).unwrap();
    let err = h.pump().unwrap_err();
    assert!(matches!(err, DeckError::Export(_)));
    assert!(!h.controller.export_in_flight());
}

#[test]
fn test_shutdown_deletes_artifact() {
    let mut h = harness(5.0);
    h.controller.on_play_pause().unwrap();
    h.pump().unwrap();
    assert_eq!(h.cached_files(), 1);

    h.controller.shutdown();
    assert_eq!(h.cached_files(), 0);
    assert!(h.engine.lock().unwrap().loaded.is_none());
}
