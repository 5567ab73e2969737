//! Player controller owning the currently loaded track

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{stream_url, DjClient, Track};
use crate::config::DjConfig;
use crate::preferences::PreferenceStore;
use crate::sync::{PlaybackSynchronizer, Stem, StemKind, VocalStem};

use super::timing::{format_clock, SessionDuration};
use super::volume::{clamp_slider, output_volume};
use super::{MediaBackend, PlayerError, PlayerEvent};

/// The loaded track and the synchronizer driving its stems
#[derive(Debug)]
pub struct CurrentlyPlaying {
    pub track: Track,
    pub duration: SessionDuration,
    pub synchronizer: PlaybackSynchronizer,
}

/// Loads tracks and routes playback, seek and volume controls to their stems
pub struct Player<B: MediaBackend> {
    config: DjConfig,
    api: DjClient,
    backend: B,
    preferences: PreferenceStore,
    current: Option<CurrentlyPlaying>,
    muted: bool,
}

impl<B: MediaBackend> Player<B> {
    pub fn new(config: DjConfig, api: DjClient, backend: B, preferences: PreferenceStore) -> Self {
        Self {
            config,
            api,
            backend,
            preferences,
            current: None,
            muted: false,
        }
    }

    /// Fetch and load a track; a random unheard one when no id is given
    pub async fn load_track(&mut self, track_id: Option<&str>) -> Result<&CurrentlyPlaying, PlayerError> {
        let track = match track_id {
            Some(id) => self.api.track(id).await?,
            None => {
                let anon_id = self.preferences.anonymous_id()?;
                self.api.random_track(anon_id.as_str()).await?
            }
        };
        self.load(track)
    }

    /// Set up stems, waveforms and the synchronizer for `track`, replacing
    /// whatever was loaded before
    pub fn load(&mut self, track: Track) -> Result<&CurrentlyPlaying, PlayerError> {
        self.unload();

        let duration = SessionDuration::from_length(track.info.length);
        let secs = duration.as_secs();

        let instrumental_cursor =
            self.backend
                .render_waveform(StemKind::Instrumental, &track.info.instrumental_waveform, secs);
        let vocal_cursor = track
            .vocal_peaks()
            .map(|peaks| self.backend.render_waveform(StemKind::Vocal, peaks, secs));

        let instrumental_url = stream_url(&self.config.static_url, &track.saved_instrumental_folder_path);
        let instrumental_handle = self.backend.open_stream(StemKind::Instrumental, &instrumental_url)?;

        let vocal_handle = match track.vocal_folder() {
            Some(folder) => {
                let url = stream_url(&self.config.static_url, folder);
                Some(self.backend.open_stream(StemKind::Vocal, &url)?)
            }
            None => None,
        };

        let synchronizer = PlaybackSynchronizer::new(
            Stem::new(instrumental_handle, instrumental_cursor),
            track.info.instrumental,
            secs,
            VocalStem::from_parts(vocal_handle, vocal_cursor),
        )?;

        info!(
            "Loaded {} - {} ({}, instrumental={})",
            track.info.artist, track.info.title, duration, track.info.instrumental
        );

        self.current = Some(CurrentlyPlaying {
            track,
            duration,
            synchronizer,
        });
        self.apply_volumes();

        self.current.as_ref().ok_or(PlayerError::NothingLoaded)
    }

    /// Stop and discard the loaded track, cancelling any pending seek
    pub fn unload(&mut self) {
        if let Some(previous) = self.current.take() {
            debug!("Unloading track {}", previous.track.id);
            previous.synchronizer.cancel();
            previous.synchronizer.pause_cursors();
            for stem in [StemKind::Instrumental, StemKind::Vocal] {
                previous.synchronizer.with_stem(stem, |s| s.handle.pause());
            }
        }
    }

    pub fn current(&self) -> Option<&CurrentlyPlaying> {
        self.current.as_ref()
    }

    fn loaded(&self) -> Result<&CurrentlyPlaying, PlayerError> {
        self.current.as_ref().ok_or(PlayerError::NothingLoaded)
    }

    /// React to a UI event
    pub fn handle_event(&mut self, event: PlayerEvent) -> Result<(), PlayerError> {
        let current = self.loaded()?;
        match event {
            PlayerEvent::Seeking { stem, time_secs } => {
                debug!("Seek gesture on {} waveform: {:.3}s", stem.as_str(), time_secs);
                current.synchronizer.request_seek(time_secs);
            }
            PlayerEvent::Playing => current.synchronizer.play_cursors(),
            PlayerEvent::Paused => current.synchronizer.pause_cursors(),
        }
        Ok(())
    }

    /// Handle events until the sender side is dropped
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<PlayerEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event) {
                warn!("Dropping player event: {}", e);
            }
        }
        debug!("Player event channel closed");
    }

    /// Start both stems together
    pub fn play(&mut self) -> Result<(), PlayerError> {
        let sync = &self.loaded()?.synchronizer;
        for stem in [StemKind::Instrumental, StemKind::Vocal] {
            sync.with_stem(stem, |s| s.handle.play());
        }
        sync.play_cursors();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        let sync = &self.loaded()?.synchronizer;
        for stem in [StemKind::Instrumental, StemKind::Vocal] {
            sync.with_stem(stem, |s| s.handle.pause());
        }
        sync.pause_cursors();
        Ok(())
    }

    /// Whether the instrumental stem is paused (true when nothing is loaded)
    pub fn is_paused(&self) -> bool {
        self.current
            .as_ref()
            .and_then(|c| c.synchronizer.with_stem(StemKind::Instrumental, |s| s.handle.is_paused()))
            .unwrap_or(true)
    }

    /// Toggle play/pause; returns whether playback is now paused
    pub fn toggle_play(&mut self) -> Result<bool, PlayerError> {
        if self.is_paused() {
            self.play()?;
            Ok(false)
        } else {
            self.pause()?;
            Ok(true)
        }
    }

    /// Move a stem's volume slider and persist it
    pub fn set_volume(&mut self, stem: StemKind, slider: f32) -> Result<(), PlayerError> {
        let slider = clamp_slider(slider);
        self.preferences.set_volume(stem, slider)?;
        if !self.muted {
            self.apply_volume(stem, output_volume(stem, slider));
        }
        Ok(())
    }

    /// Stored slider value for a stem
    pub fn volume(&self, stem: StemKind) -> f32 {
        self.preferences.volume(stem)
    }

    /// Toggle mute; returns whether the player is now muted.
    ///
    /// Muting does not touch the stored slider values.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.apply_volumes();
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn apply_volumes(&self) {
        for stem in [StemKind::Instrumental, StemKind::Vocal] {
            let volume = if self.muted {
                0.0
            } else {
                output_volume(stem, self.preferences.volume(stem))
            };
            self.apply_volume(stem, volume);
        }
    }

    fn apply_volume(&self, stem: StemKind, volume: f32) {
        if let Some(current) = &self.current {
            current.synchronizer.with_stem(stem, |s| s.handle.set_volume(volume));
        }
    }

    /// `m:ss` label for the instrumental position
    pub fn elapsed_clock(&self) -> String {
        let position = self
            .current
            .as_ref()
            .and_then(|c| c.synchronizer.with_stem(StemKind::Instrumental, |s| s.handle.position()))
            .unwrap_or(0.0);
        format_clock(position)
    }

    /// `m:ss` label for the track length
    pub fn duration_clock(&self) -> String {
        format_clock(self.current.as_ref().map(|c| c.track.info.length).unwrap_or(0.0))
    }

    /// Cover image URL of the loaded track
    pub fn cover_url(&self) -> Option<String> {
        self.current.as_ref().map(|c| {
            format!(
                "{}/{}",
                self.config.static_url.trim_end_matches('/'),
                c.track.cover.trim_start_matches('/')
            )
        })
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::TrackInfo;
    use crate::testing::MockBackend;

    fn track(instrumental: bool) -> Track {
        Track {
            id: "t1".to_string(),
            cover: "Blue Train/cover.jpg".to_string(),
            info: TrackInfo {
                title: "Locomotion".to_string(),
                artist: "John Coltrane".to_string(),
                album: "Blue Train".to_string(),
                length: 200.0,
                genre: "Jazz".to_string(),
                vocal_waveform: Some(vec![0.1, 0.2]),
                instrumental_waveform: vec![0.3, 0.4, 0.5],
                tempo: 120.0,
                instrumental,
                key: "Bb".to_string(),
            },
            saved_album_name: "Blue Train".to_string(),
            cover_extension: "jpg".to_string(),
            saved_vocal_folder_path: Some("Blue Train/vocals".to_string()),
            saved_instrumental_folder_path: "Blue Train/instrumental".to_string(),
        }
    }

    fn player() -> Player<MockBackend> {
        let config = DjConfig::default()
            .with_static_url("https://static.example.com")
            .with_preferences_path(None);
        let api = DjClient::new("http://127.0.0.1:9").unwrap();
        Player::new(config, api, MockBackend::default(), PreferenceStore::in_memory())
    }

    #[tokio::test]
    async fn test_load_with_vocals() {
        let mut p = player();
        let current = p.load(track(false)).unwrap();
        assert_eq!(current.duration.as_secs(), 192.0);
        assert!(current.synchronizer.has_active_vocal());

        let opened = p.backend().opened.lock().clone();
        assert_eq!(
            opened,
            vec![
                (
                    StemKind::Instrumental,
                    "https://static.example.com/Blue Train/instrumental/playlist.m3u8".to_string()
                ),
                (
                    StemKind::Vocal,
                    "https://static.example.com/Blue Train/vocals/playlist.m3u8".to_string()
                ),
            ]
        );
        let rendered = p.backend().rendered.lock().clone();
        assert_eq!(rendered, vec![(StemKind::Instrumental, 3, 192.0), (StemKind::Vocal, 2, 192.0)]);
        assert_eq!(p.cover_url().as_deref(), Some("https://static.example.com/Blue Train/cover.jpg"));
        assert_eq!(p.duration_clock(), "3:20");
    }

    #[tokio::test]
    async fn test_load_instrumental_only() {
        let mut p = player();
        let current = p.load(track(true)).unwrap();
        assert!(!current.synchronizer.has_active_vocal());
        assert!(current.synchronizer.is_instrumental_only());

        assert_eq!(p.backend().opened.lock().len(), 1);
        assert_eq!(p.backend().rendered.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_failure_propagates() {
        let mut p = player();
        p.backend.fail_streams = true;
        assert!(matches!(p.load(track(false)), Err(PlayerError::Stream(_))));
        assert!(p.current().is_none());
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let mut p = player();
        let mut t = track(true);
        t.info.length = 0.0;
        assert!(matches!(p.load(t), Err(PlayerError::Sync(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_events_forwarded() {
        let mut p = player();
        p.load(track(false)).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(PlayerEvent::Seeking { stem: StemKind::Vocal, time_secs: 20.0 }).unwrap();
        tx.send(PlayerEvent::Seeking { stem: StemKind::Instrumental, time_secs: 96.0 }).unwrap();
        tx.send(PlayerEvent::Playing).unwrap();
        drop(tx);
        p.run(rx).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        let instrumental = p.backend().handle(StemKind::Instrumental).unwrap();
        let vocal = p.backend().handle(StemKind::Vocal).unwrap();
        assert_eq!(instrumental.writes(), vec![96.0]);
        assert_eq!(vocal.writes(), vec![96.0]);
        assert_eq!(p.backend().cursor(StemKind::Vocal).unwrap().seeks(), vec![0.5]);
        assert!(p.backend().cursor(StemKind::Instrumental).unwrap().is_playing());
        assert_eq!(p.elapsed_clock(), "1:36");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_cancels_pending_seek() {
        let mut p = player();
        p.load(track(false)).unwrap();
        p.handle_event(PlayerEvent::Seeking { stem: StemKind::Instrumental, time_secs: 50.0 })
            .unwrap();
        let first = p.backend().handle(StemKind::Instrumental).unwrap();

        p.load(track(true)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(first.writes().is_empty());
    }

    #[tokio::test]
    async fn test_play_pause_both_stems() {
        let mut p = player();
        assert!(p.is_paused());
        assert!(matches!(p.play(), Err(PlayerError::NothingLoaded)));

        p.load(track(false)).unwrap();
        assert!(!p.toggle_play().unwrap());
        let instrumental = p.backend().handle(StemKind::Instrumental).unwrap();
        let vocal = p.backend().handle(StemKind::Vocal).unwrap();
        assert!(instrumental.is_playing());
        assert!(vocal.is_playing());

        assert!(p.toggle_play().unwrap());
        assert!(!instrumental.is_playing());
        assert!(!vocal.is_playing());
    }

    #[tokio::test]
    async fn test_volume_and_mute() {
        let mut p = player();
        p.load(track(false)).unwrap();
        let instrumental = p.backend().handle(StemKind::Instrumental).unwrap();
        let vocal = p.backend().handle(StemKind::Vocal).unwrap();

        // Defaults applied on load
        assert!((instrumental.volume() - 1.0 / 1.3).abs() < 1e-6);
        assert_eq!(vocal.volume(), 1.0);

        p.set_volume(StemKind::Vocal, 0.5).unwrap();
        assert!((vocal.volume() - 0.65).abs() < 1e-6);
        assert_eq!(p.volume(StemKind::Vocal), 0.5);

        assert!(p.toggle_mute());
        assert_eq!(instrumental.volume(), 0.0);
        assert_eq!(vocal.volume(), 0.0);
        assert_eq!(p.volume(StemKind::Vocal), 0.5);

        // Slider moves while muted are stored but stay silent
        p.set_volume(StemKind::Instrumental, 0.26).unwrap();
        assert_eq!(instrumental.volume(), 0.0);

        assert!(!p.toggle_mute());
        assert!((instrumental.volume() - 0.2).abs() < 1e-6);
        assert!((vocal.volume() - 0.65).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_events_without_track() {
        let mut p = player();
        assert!(matches!(
            p.handle_event(PlayerEvent::Playing),
            Err(PlayerError::NothingLoaded)
        ));
        assert_eq!(p.elapsed_clock(), "0:00");
        assert!(p.cover_url().is_none());
    }
}
