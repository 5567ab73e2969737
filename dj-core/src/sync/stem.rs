//! Stem handles and the traits media backends implement

use serde::{Deserialize, Serialize};

/// Maximum drift (seconds) tolerated before a playback handle is re-positioned
pub const SYNC_THRESHOLD_SECS: f64 = 0.1;

/// Which stem of a track a handle or event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StemKind {
    Instrumental,
    Vocal,
}

impl StemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StemKind::Instrumental => "instrumental",
            StemKind::Vocal => "vocal",
        }
    }
}

/// A seekable media source provided by a playback backend
pub trait PlaybackHandle: Send {
    /// Current playback position in seconds
    fn position(&self) -> f64;

    /// Move the playback position (seconds)
    fn set_position(&mut self, secs: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);
}

/// Visual seek position over a rendered waveform
pub trait WaveformCursor: Send {
    /// Move the cursor to a fraction of the total duration
    fn seek_to(&mut self, fraction: f64);

    /// Start advancing the cursor along with playback
    fn play(&mut self) {}

    /// Stop advancing the cursor
    fn pause(&mut self) {}
}

/// A playback handle paired with the waveform cursor that displays it
pub struct Stem {
    pub handle: Box<dyn PlaybackHandle>,
    pub cursor: Box<dyn WaveformCursor>,
}

impl Stem {
    pub fn new(handle: Box<dyn PlaybackHandle>, cursor: Box<dyn WaveformCursor>) -> Self {
        Self { handle, cursor }
    }

    /// Bring this stem to `time` / `fraction`.
    ///
    /// The handle is only written when it has drifted further than
    /// [`SYNC_THRESHOLD_SECS`]; the cursor is always moved. Returns whether
    /// the handle was re-positioned.
    pub fn sync_to(&mut self, time: f64, fraction: f64) -> bool {
        let drift = (self.handle.position() - time).abs();
        let reposition = drift > SYNC_THRESHOLD_SECS;
        if reposition {
            self.handle.set_position(time);
        }
        self.cursor.seek_to(fraction);
        reposition
    }
}

impl std::fmt::Debug for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stem")
            .field("position", &self.handle.position())
            .field("paused", &self.handle.is_paused())
            .finish()
    }
}

/// The optional vocal pair of a track.
///
/// A handle without a cursor (or the reverse) cannot be represented.
#[derive(Debug, Default)]
pub enum VocalStem {
    /// Track has no vocal stem
    #[default]
    Absent,
    /// Vocal handle and its cursor
    Present(Stem),
}

impl VocalStem {
    /// Build from independently optional parts; both must be present
    pub fn from_parts(
        handle: Option<Box<dyn PlaybackHandle>>,
        cursor: Option<Box<dyn WaveformCursor>>,
    ) -> Self {
        match (handle, cursor) {
            (Some(handle), Some(cursor)) => VocalStem::Present(Stem::new(handle, cursor)),
            _ => VocalStem::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, VocalStem::Present(_))
    }

    pub fn as_mut(&mut self) -> Option<&mut Stem> {
        match self {
            VocalStem::Present(stem) => Some(stem),
            VocalStem::Absent => None,
        }
    }
}
