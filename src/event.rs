//! Messages delivered to the controlling thread
//!
//! All state in the controller is single-writer: worker threads and the
//! shell's stdin reader never touch it directly, they send a `DeckEvent`
//! over an mpsc channel and the controlling loop processes events on its
//! own turn.

use crate::params::SynthesisParams;
use crate::synth::SynthesisError;
use std::path::PathBuf;

/// One message into the controlling thread's event loop
#[derive(Debug)]
pub enum DeckEvent {
    /// A command line typed into the shell
    Input(String),

    /// A synthesis worker finished
    ///
    /// `path` is where the worker wrote (or tried to write) audio; on
    /// failure the controller retires the possibly-partial file.
    SynthesisDone {
        params: SynthesisParams,
        path: PathBuf,
        outcome: Result<f64, SynthesisError>,
    },

    /// An export worker finished
    ExportDone {
        path: PathBuf,
        outcome: Result<(), SynthesisError>,
    },

    /// Input source closed; the loop should wind down
    ///
    /// The controller keeps a sender for its workers, so the channel
    /// never disconnects on its own.
    Shutdown,
}
