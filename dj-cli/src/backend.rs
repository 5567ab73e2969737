//! Headless media backend
//!
//! Stands in for an audio/waveform stack: stems keep their position, play
//! state and volume in memory and every change is logged.

use dj_core::player::{MediaBackend, PlayerError};
use dj_core::sync::{PlaybackHandle, StemKind, WaveformCursor};
use tracing::{debug, info};

/// Playback handle that only tracks state
#[derive(Debug)]
pub struct LoggedHandle {
    stem: StemKind,
    url: String,
    position: f64,
    paused: bool,
    volume: f32,
}

impl PlaybackHandle for LoggedHandle {
    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, secs: f64) {
        info!("[{}] position {:.2}s -> {:.2}s", self.stem.as_str(), self.position, secs);
        self.position = secs;
    }

    fn play(&mut self) {
        debug!("[{}] play {} (volume {:.2})", self.stem.as_str(), self.url, self.volume);
        self.paused = false;
    }

    fn pause(&mut self) {
        debug!("[{}] pause", self.stem.as_str());
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_volume(&mut self, volume: f32) {
        debug!("[{}] volume {:.2}", self.stem.as_str(), volume);
        self.volume = volume;
    }
}

/// Waveform cursor that logs where it is moved
#[derive(Debug)]
pub struct LoggedCursor {
    stem: StemKind,
    fraction: f64,
}

impl WaveformCursor for LoggedCursor {
    fn seek_to(&mut self, fraction: f64) {
        debug!("[{}] cursor {:.4} -> {:.4}", self.stem.as_str(), self.fraction, fraction);
        self.fraction = fraction;
    }
}

#[derive(Debug, Default)]
pub struct LoggingBackend;

impl MediaBackend for LoggingBackend {
    fn open_stream(
        &mut self,
        stem: StemKind,
        url: &str,
    ) -> Result<Box<dyn PlaybackHandle>, PlayerError> {
        info!("[{}] stream {}", stem.as_str(), url);
        Ok(Box::new(LoggedHandle {
            stem,
            url: url.to_string(),
            position: 0.0,
            paused: true,
            volume: 1.0,
        }))
    }

    fn render_waveform(
        &mut self,
        stem: StemKind,
        peaks: &[f32],
        duration_secs: f64,
    ) -> Box<dyn WaveformCursor> {
        debug!("[{}] waveform: {} peaks over {}s", stem.as_str(), peaks.len(), duration_secs);
        Box::new(LoggedCursor { stem, fraction: 0.0 })
    }
}
