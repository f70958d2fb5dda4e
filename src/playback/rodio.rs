//! rodio-backed audio engine
//!
//! A fresh `Sink` is created per load so a stopped sink never lingers in
//! a half-drained state. The `OutputStream` must outlive every sink, so
//! the engine owns it for its whole lifetime.

use crate::playback::engine::AudioEngine;
use crate::{DeckError, Result};
use log::debug;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Audio engine playing through the default output device
pub struct RodioEngine {
    // Dropping the stream kills all audio; keep it alive
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioEngine {
    /// Open the default audio output device
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| DeckError::Playback(format!("no audio output device: {}", e)))?;
        debug!("audio output stream opened");
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    fn sink(&self) -> Result<&Sink> {
        self.sink
            .as_ref()
            .ok_or_else(|| DeckError::Playback("no audio loaded".to_string()))
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        debug!("loading {}", path.display());
        // Replace any previous sink wholesale
        self.sink = None;

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| DeckError::Playback(format!("cannot decode {}: {}", path.display(), e)))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| DeckError::Playback(format!("cannot open sink: {}", e)))?;
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.sink()?.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.sink()?.pause();
        Ok(())
    }

    fn unpause(&mut self) -> Result<()> {
        self.sink()?.play();
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        if self.sink.take().is_some() {
            debug!("audio unloaded");
        }
        Ok(())
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        let target = Duration::from_secs_f64(seconds.max(0.0));
        self.sink()?
            .try_seek(target)
            .map_err(|e| DeckError::Playback(format!("seek failed: {}", e)))
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty())
    }
}
