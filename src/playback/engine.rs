//! Audio playback engine interface
//!
//! The controller drives playback through this trait so tests can script
//! an engine and the real backend stays swappable. Seeking is done as
//! stop, reload, set-position: starting a file at an arbitrary offset is
//! not assumed reliable for the preview encoding.

use crate::Result;
use std::path::Path;

/// Audio playback engine
///
/// All operations are synchronous and cheap; the engine plays in the
/// background once `play` returns. Implementations may hold a read lock
/// on the loaded file until `unload`.
pub trait AudioEngine {
    /// Load an audio file, replacing anything previously loaded
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Start playing the loaded file from its current position
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Resume after a pause
    fn unpause(&mut self) -> Result<()>;

    /// Stop playback and discard the position
    fn stop(&mut self) -> Result<()>;

    /// Release the loaded file and any lock on it
    fn unload(&mut self) -> Result<()>;

    /// Move the playback position, in seconds from the start
    fn set_position(&mut self, seconds: f64) -> Result<()>;

    /// Is audio currently queued or playing?
    fn is_busy(&self) -> bool;
}
