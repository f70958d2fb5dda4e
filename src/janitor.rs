//! Temp artifact lifecycle
//!
//! `CacheDir` owns the directory preview artifacts live in. It is wiped
//! and recreated at process start (failure to wipe is a warning, not
//! fatal), hands out unique file paths, and deletes retired artifacts
//! with bounded retries, because a playback engine may still hold a lock
//! on the file for a moment after unload.

use crate::playback::AudioEngine;
use crate::Result;
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Delete attempts for a busy/locked file
const DELETE_ATTEMPTS: u32 = 3;

/// Backoff before retry `n` (1-based): 100ms, 200ms
const DELETE_BACKOFF: Duration = Duration::from_millis(100);

/// Monotonic suffix so two artifacts created in the same millisecond
/// still get distinct names
static ALLOC_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Owns the preview artifact directory
#[derive(Debug)]
pub struct CacheDir {
    dir: PathBuf,
}

impl CacheDir {
    /// Wipe any previous contents and (re)create the directory
    ///
    /// A leftover directory from a crashed run may hold orphaned audio;
    /// failing to remove it is tolerated with a warning so startup never
    /// aborts over stale temp files.
    pub fn init(dir: PathBuf) -> Result<Self> {
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(
                    "could not wipe cache directory {}: {} (stale files may remain)",
                    dir.display(),
                    e
                );
            }
        }
        std::fs::create_dir_all(&dir)?;
        debug!("cache directory ready at {}", dir.display());
        Ok(Self { dir })
    }

    /// Produce a fresh, unique artifact path inside the cache directory
    ///
    /// Names never repeat within a run, so a new artifact can never
    /// collide with a file the engine is still releasing.
    pub fn allocate(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let id = ALLOC_COUNTER.fetch_add(1, Ordering::SeqCst);
        self.dir.join(format!("tts_{}_{}.wav", millis, id))
    }

    /// Retire an artifact file: release the engine's handle, then delete
    ///
    /// Engines may hold an exclusive lock while a file is loaded, so the
    /// engine is stopped and unloaded first. Deletion failures are
    /// logged and swallowed - an orphaned file is an accepted cost, and
    /// cleanup must never block a state transition. Idempotent: a path
    /// that is already gone counts as success.
    pub fn retire(&self, engine: &mut dyn AudioEngine, path: &Path) {
        if let Err(e) = engine.stop() {
            debug!("engine stop before retire failed (ignored): {}", e);
        }
        if let Err(e) = engine.unload() {
            debug!("engine unload before retire failed (ignored): {}", e);
        }
        delete_with_retry(path, |p: &Path| std::fs::remove_file(p), std::thread::sleep);
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Bounded-retry delete with injectable filesystem and sleep hooks
///
/// Retries only the busy/locked error class (`PermissionDenied`), with
/// increasing backoff. "Already gone" is success. Any other OS error
/// aborts the loop, leaving the file orphaned. Returns whether the file
/// is gone afterwards.
fn delete_with_retry<R, S>(path: &Path, mut remove: R, mut sleep: S) -> bool
where
    R: FnMut(&Path) -> io::Result<()>,
    S: FnMut(Duration),
{
    for attempt in 1..=DELETE_ATTEMPTS {
        match remove(path) {
            Ok(()) => {
                debug!("retired artifact {}", path.display());
                return true;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("artifact {} already gone", path.display());
                return true;
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                if attempt < DELETE_ATTEMPTS {
                    debug!(
                        "artifact {} busy (attempt {}), backing off",
                        path.display(),
                        attempt
                    );
                    sleep(DELETE_BACKOFF * attempt);
                } else {
                    warn!(
                        "could not delete {} after {} attempts, leaving it orphaned",
                        path.display(),
                        DELETE_ATTEMPTS
                    );
                }
            }
            Err(e) => {
                warn!(
                    "unexpected error deleting {}: {} (leaving it orphaned)",
                    path.display(),
                    e
                );
                return false;
            }
        }
    }
    false
}
