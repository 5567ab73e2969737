//! Recording doubles for playback handles, cursors and media backends

use std::sync::Arc;

use parking_lot::Mutex;

use crate::player::{MediaBackend, PlayerError};
use crate::sync::{PlaybackHandle, StemKind, WaveformCursor};

#[derive(Debug, Default)]
struct HandleState {
    position: f64,
    writes: Vec<f64>,
    playing: bool,
    volume: f32,
}

/// Playback handle that records every position write
#[derive(Debug, Clone, Default)]
pub struct MockHandle(Arc<Mutex<HandleState>>);

impl MockHandle {
    pub fn at(position: f64) -> Self {
        Self(Arc::new(Mutex::new(HandleState {
            position,
            volume: 1.0,
            ..Default::default()
        })))
    }

    pub fn position(&self) -> f64 {
        self.0.lock().position
    }

    pub fn writes(&self) -> Vec<f64> {
        self.0.lock().writes.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.0.lock().playing
    }

    pub fn volume(&self) -> f32 {
        self.0.lock().volume
    }
}

impl PlaybackHandle for MockHandle {
    fn position(&self) -> f64 {
        self.0.lock().position
    }

    fn set_position(&mut self, secs: f64) {
        let mut state = self.0.lock();
        state.position = secs;
        state.writes.push(secs);
    }

    fn play(&mut self) {
        self.0.lock().playing = true;
    }

    fn pause(&mut self) {
        self.0.lock().playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.0.lock().playing
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.lock().volume = volume;
    }
}

#[derive(Debug, Default)]
struct CursorState {
    seeks: Vec<f64>,
    playing: bool,
}

/// Waveform cursor that records every seek
#[derive(Debug, Clone, Default)]
pub struct MockCursor(Arc<Mutex<CursorState>>);

impl MockCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.0.lock().seeks.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.0.lock().playing
    }
}

impl WaveformCursor for MockCursor {
    fn seek_to(&mut self, fraction: f64) {
        self.0.lock().seeks.push(fraction);
    }

    fn play(&mut self) {
        self.0.lock().playing = true;
    }

    fn pause(&mut self) {
        self.0.lock().playing = false;
    }
}

/// Media backend handing out mocks and remembering what it opened
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    pub opened: Arc<Mutex<Vec<(StemKind, String)>>>,
    pub rendered: Arc<Mutex<Vec<(StemKind, usize, f64)>>>,
    pub handles: Arc<Mutex<Vec<(StemKind, MockHandle)>>>,
    pub cursors: Arc<Mutex<Vec<(StemKind, MockCursor)>>>,
    pub fail_streams: bool,
}

impl MockBackend {
    pub fn handle(&self, kind: StemKind) -> Option<MockHandle> {
        self.handles
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, h)| h.clone())
    }

    pub fn cursor(&self, kind: StemKind) -> Option<MockCursor> {
        self.cursors
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| c.clone())
    }
}

impl MediaBackend for MockBackend {
    fn open_stream(
        &mut self,
        stem: StemKind,
        url: &str,
    ) -> Result<Box<dyn PlaybackHandle>, PlayerError> {
        if self.fail_streams {
            return Err(PlayerError::Stream(format!("cannot open {}", url)));
        }
        let handle = MockHandle::at(0.0);
        self.opened.lock().push((stem, url.to_string()));
        self.handles.lock().push((stem, handle.clone()));
        Ok(Box::new(handle))
    }

    fn render_waveform(
        &mut self,
        stem: StemKind,
        peaks: &[f32],
        duration_secs: f64,
    ) -> Box<dyn WaveformCursor> {
        let cursor = MockCursor::new();
        self.rendered.lock().push((stem, peaks.len(), duration_secs));
        self.cursors.lock().push((stem, cursor.clone()));
        Box::new(cursor)
    }
}
