//! Debounced seek propagation across stems
//!
//! Dragging a waveform produces a stream of seek requests. Applying each one
//! to the media handles causes audible stutter, so requests are collapsed
//! into a single trailing-edge update and handles are only re-positioned
//! when they have actually drifted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use super::stem::{Stem, StemKind, VocalStem};

/// Quiet period after the last seek request before it is applied
pub const SEEK_DEBOUNCE: Duration = Duration::from_millis(50);

/// Errors raised when constructing a synchronizer
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Track duration must be a positive number of seconds (got {0})")]
    InvalidDuration(f64),

    #[error("No tokio runtime available for the seek timer")]
    NoRuntime,
}

/// Round to hundredths of a second
fn round_hundredths(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Debounce bookkeeping. Never held while stem callbacks run.
#[derive(Debug, Default)]
struct SeekTimer {
    /// Latest requested target, consumed by the flush
    target: Option<f64>,
    seeking: bool,
    /// Bumped on every request; a timer only flushes its own generation
    generation: u64,
    pending: Option<JoinHandle<()>>,
    flushes: u64,
}

impl SeekTimer {
    /// Disarm the pending timer and invalidate any that already woke
    fn disarm(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// The stems of one track and how a seek maps onto them
#[derive(Debug)]
struct Stems {
    instrumental: Stem,
    vocal: VocalStem,
    /// Authoritative: when set, the vocal pair is never touched
    instrumental_only: bool,
    duration_secs: f64,
}

impl Stems {
    fn active_vocal(&mut self) -> Option<&mut Stem> {
        if self.instrumental_only {
            return None;
        }
        self.vocal.as_mut()
    }

    fn apply(&mut self, target: f64) {
        let time = round_hundredths(target).clamp(0.0, self.duration_secs);
        let fraction = time / self.duration_secs;

        let moved_instrumental = self.instrumental.sync_to(time, fraction);
        let moved_vocal = self
            .active_vocal()
            .map(|vocal| vocal.sync_to(time, fraction));

        debug!(
            "Seek applied: target={:.2}s fraction={:.5} instrumental_moved={} vocal_moved={:?}",
            time, fraction, moved_instrumental, moved_vocal
        );
    }
}

/// Apply the target armed under `generation`, if it is still the latest.
///
/// The timer lock is released before the stems are touched, so a handle or
/// cursor that requests another seek from inside the flush just re-arms the
/// debounce.
fn flush(timer: &Mutex<SeekTimer>, stems: &Mutex<Stems>, generation: u64) {
    let target = {
        let mut timer = timer.lock();
        if timer.generation != generation {
            // Superseded after the timer already woke
            return;
        }
        timer.pending = None;
        timer.target.take()
    };

    if let Some(target) = target {
        stems.lock().apply(target);
    }

    let mut timer = timer.lock();
    if target.is_some() {
        timer.flushes += 1;
    }
    if timer.generation == generation {
        timer.seeking = false;
    }
}

/// Propagates seek requests to every stem of one loaded track.
///
/// Owned by the player controller for the lifetime of a single track. The
/// owner must call [`PlaybackSynchronizer::cancel`] before discarding it.
#[derive(Clone)]
pub struct PlaybackSynchronizer {
    timer: Arc<Mutex<SeekTimer>>,
    stems: Arc<Mutex<Stems>>,
    runtime: Handle,
}

impl PlaybackSynchronizer {
    /// Create a synchronizer for a track of `duration_secs` seconds.
    ///
    /// Must be called from within a tokio runtime; the seek timer is spawned
    /// onto it.
    pub fn new(
        instrumental: Stem,
        instrumental_only: bool,
        duration_secs: f64,
        vocal: VocalStem,
    ) -> Result<Self, SyncError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(SyncError::InvalidDuration(duration_secs));
        }
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;

        debug!(
            "Synchronizer created: duration={}s instrumental_only={} vocal={}",
            duration_secs,
            instrumental_only,
            vocal.is_present()
        );

        Ok(Self {
            timer: Arc::new(Mutex::new(SeekTimer::default())),
            stems: Arc::new(Mutex::new(Stems {
                instrumental,
                vocal,
                instrumental_only,
                duration_secs,
            })),
            runtime,
        })
    }

    /// Request a seek to `target_secs`.
    ///
    /// Supersedes any pending request and re-arms the debounce timer; the
    /// latest target is applied once the requests stop for [`SEEK_DEBOUNCE`].
    /// Non-finite targets are ignored.
    pub fn request_seek(&self, target_secs: f64) {
        if !target_secs.is_finite() {
            debug!("Ignoring non-finite seek target {}", target_secs);
            return;
        }

        let mut timer = self.timer.lock();
        timer.disarm();
        timer.target = Some(target_secs);
        timer.seeking = true;

        let generation = timer.generation;
        let shared_timer = Arc::clone(&self.timer);
        let shared_stems = Arc::clone(&self.stems);
        timer.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(SEEK_DEBOUNCE).await;
            flush(&shared_timer, &shared_stems, generation);
        }));
    }

    /// Drop any pending request without applying it
    pub fn cancel(&self) {
        let mut timer = self.timer.lock();
        if timer.pending.is_some() {
            debug!("Pending seek cancelled");
        }
        timer.disarm();
        timer.target = None;
        timer.seeking = false;
    }

    /// Whether a seek is waiting for the debounce window to close
    pub fn is_seeking(&self) -> bool {
        self.timer.lock().seeking
    }

    /// Target of the pending seek, if any
    pub fn pending_target(&self) -> Option<f64> {
        self.timer.lock().target
    }

    /// Number of seeks applied so far
    pub fn flush_count(&self) -> u64 {
        self.timer.lock().flushes
    }

    pub fn duration_secs(&self) -> f64 {
        self.stems.lock().duration_secs
    }

    pub fn is_instrumental_only(&self) -> bool {
        self.stems.lock().instrumental_only
    }

    /// Whether the vocal stem takes part in synchronization
    pub fn has_active_vocal(&self) -> bool {
        self.stems.lock().active_vocal().is_some()
    }

    /// Run `f` against one stem. Returns `None` if that stem is not active.
    pub fn with_stem<R>(&self, kind: StemKind, f: impl FnOnce(&mut Stem) -> R) -> Option<R> {
        let mut stems = self.stems.lock();
        match kind {
            StemKind::Instrumental => Some(f(&mut stems.instrumental)),
            StemKind::Vocal => stems.active_vocal().map(f),
        }
    }

    /// Start the waveform cursors (instrumental stream reported playing)
    pub fn play_cursors(&self) {
        let mut stems = self.stems.lock();
        stems.instrumental.cursor.play();
        if let Some(vocal) = stems.active_vocal() {
            vocal.cursor.play();
        }
    }

    pub fn pause_cursors(&self) {
        let mut stems = self.stems.lock();
        stems.instrumental.cursor.pause();
        if let Some(vocal) = stems.active_vocal() {
            vocal.cursor.pause();
        }
    }
}

impl std::fmt::Debug for PlaybackSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timer = self.timer.lock();
        f.debug_struct("PlaybackSynchronizer")
            .field("seeking", &timer.seeking)
            .field("target", &timer.target)
            .field("flushes", &timer.flushes)
            .finish()
    }
}
