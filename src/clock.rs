//! Progress clock for playback position
//!
//! Elapsed time is never queried from the audio engine. Instead the
//! clock keeps an accumulated marker (seconds played before the last
//! pause or seek) plus the monotonic instant playback last resumed, and
//! derives display time from wall clock. The controlling loop ticks the
//! clock every 100ms while playing.

use std::time::{Duration, Instant};

/// Tick cadence for the controlling loop while playing
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Slack before the nominal end at which playback counts as finished
///
/// Absorbs tick granularity and the engine's end-of-stream lag.
const END_EPSILON: f64 = 0.15;

/// Tracks elapsed playback time against wall clock
#[derive(Debug)]
pub struct ProgressClock {
    /// Seconds accumulated up to the last pause or seek
    marker: f64,
    /// When playback last resumed; `None` while paused or stopped
    started: Option<Instant>,
    /// Total duration of the loaded artifact, seconds
    total: f64,
}

impl ProgressClock {
    pub fn new() -> Self {
        Self {
            marker: 0.0,
            started: None,
            total: 0.0,
        }
    }

    /// Begin timing a fresh playback of `total` seconds from zero
    pub fn begin(&mut self, total: f64) {
        self.marker = 0.0;
        self.total = total.max(0.0);
        self.started = Some(Instant::now());
    }

    /// Fold running time into the marker and stop the running segment
    pub fn pause(&mut self) {
        self.marker = self.elapsed_at(Instant::now());
        self.started = None;
    }

    /// Resume timing from the current marker
    pub fn resume(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Jump to `position` (clamped) and start a running segment there
    ///
    /// Returns the clamped position actually applied.
    pub fn seek(&mut self, position: f64) -> f64 {
        let clamped = position.clamp(0.0, self.total);
        self.marker = clamped;
        self.started = Some(Instant::now());
        clamped
    }

    /// Reset position to zero, keeping the total for replay display
    pub fn stop(&mut self) {
        self.marker = 0.0;
        self.started = None;
    }

    /// Forget the duration entirely (cache invalidated to nothing)
    pub fn clear(&mut self) {
        self.marker = 0.0;
        self.started = None;
        self.total = 0.0;
    }

    /// Elapsed seconds, clamped to `[0, total]`
    pub fn elapsed(&self) -> f64 {
        self.elapsed_at(Instant::now())
    }

    /// Elapsed seconds as of `now`, clamped to `[0, total]`
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        let running = self
            .started
            .map(|s| now.saturating_duration_since(s).as_secs_f64())
            .unwrap_or(0.0);
        let raw = self.marker + running;
        if self.total > 0.0 {
            raw.clamp(0.0, self.total)
        } else {
            raw.max(0.0)
        }
    }

    /// Has playback reached the end (within the finish epsilon)?
    pub fn finished_at(&self, now: Instant) -> bool {
        self.total > 0.0 && self.elapsed_at(now) >= self.total - END_EPSILON
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

impl Default for ProgressClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Format seconds as mm:ss for transport display
pub fn format_time(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "00:00".to_string();
    }
    let total = seconds as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
