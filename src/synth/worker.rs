//! Background synthesis and export workers
//!
//! Each worker is a one-shot thread: build the SSML document, make the
//! single blocking service call, report the outcome back to the
//! controlling thread as a `DeckEvent`. The controller enforces that at
//! most one synthesis worker is ever in flight.

use crate::event::DeckEvent;
use crate::params::SynthesisParams;
use crate::ssml;
use crate::synth::service::{OutputEncoding, SpeechService};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Spawn a preview synthesis run for `params`, writing to `path`
///
/// The completion message carries the snapshot so the controller can
/// cache it against the produced audio.
pub fn spawn_synthesis(
    service: Arc<dyn SpeechService>,
    params: SynthesisParams,
    path: PathBuf,
    events: Sender<DeckEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("synthesis worker started for {}", path.display());
        let document = ssml::build(&params);
        let outcome = service.synthesize(
            &params.key,
            &params.region,
            &document,
            OutputEncoding::RiffPcm16k,
            &path,
        );
        let message = DeckEvent::SynthesisDone {
            params,
            path,
            outcome,
        };
        if events.send(message).is_err() {
            warn!("controlling thread gone, dropping synthesis result");
        }
    })
}

/// Spawn an MP3 export run for `params`, writing to the user's `path`
///
/// Runs independently of the preview cache: distinct target, compressed
/// encoding, and no artifact bookkeeping on completion.
pub fn spawn_export(
    service: Arc<dyn SpeechService>,
    params: SynthesisParams,
    path: PathBuf,
    events: Sender<DeckEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("export worker started for {}", path.display());
        let document = ssml::build(&params);
        let outcome = service
            .synthesize(
                &params.key,
                &params.region,
                &document,
                OutputEncoding::Mp3_16k64k,
                &path,
            )
            .map(|_| ());
        if events.send(DeckEvent::ExportDone { path, outcome }).is_err() {
            warn!("controlling thread gone, dropping export result");
        }
    })
}
