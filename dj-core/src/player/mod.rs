//! Player Controller
//!
//! Loads tracks from the API, opens their stems through a media backend and
//! wires user seek gestures into a [`PlaybackSynchronizer`](crate::sync::PlaybackSynchronizer).

mod controller;
mod timing;
mod volume;

pub use controller::*;
pub use timing::*;
pub use volume::*;

use thiserror::Error;

use crate::api::ApiError;
use crate::preferences::PreferencesError;
use crate::sync::{PlaybackHandle, StemKind, SyncError, WaveformCursor};

/// Errors surfaced by the player controller
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Synchronizer error: {0}")]
    Sync(#[from] SyncError),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No track loaded")]
    NothingLoaded,

    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),
}

/// Creates playback handles and waveform cursors for the stems of a track
pub trait MediaBackend {
    /// Attach a playback handle to the stem playlist at `url`
    fn open_stream(
        &mut self,
        stem: StemKind,
        url: &str,
    ) -> Result<Box<dyn PlaybackHandle>, PlayerError>;

    /// Render a waveform from its peaks and return its cursor
    fn render_waveform(
        &mut self,
        stem: StemKind,
        peaks: &[f32],
        duration_secs: f64,
    ) -> Box<dyn WaveformCursor>;
}

/// Events the UI forwards into the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// User is dragging one of the waveforms to `time_secs`
    Seeking { stem: StemKind, time_secs: f64 },
    /// Instrumental stream started playing
    Playing,
    /// Instrumental stream paused
    Paused,
}
