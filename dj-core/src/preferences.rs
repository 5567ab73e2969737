//! Persisted listener preferences
//!
//! Stores the anonymous listener id, the stem volume sliders and whether the
//! first-visit warning was shown, as a small JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::listener::AnonymousId;
use crate::sync::StemKind;

/// Slider value used when nothing is stored
pub const DEFAULT_VOLUME: f32 = 1.0;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Preferences I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Values kept between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub anonymous_id: Option<String>,

    #[serde(default)]
    pub instrument_volume: Option<f32>,

    #[serde(default)]
    pub vocal_volume: Option<f32>,

    #[serde(default)]
    pub warning_shown: bool,
}

/// Preferences backed by an optional file.
///
/// Without a path the store lives in memory only.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferenceStore {
    /// In-memory store, nothing is persisted
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is
    /// replaced by defaults on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let prefs = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring malformed preferences at {}: {}", path.display(), e);
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded preferences from {}", path.display());
        Ok(Self {
            path: Some(path),
            prefs,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Write the current values to disk (no-op for in-memory stores)
    pub fn save(&self) -> Result<(), PreferencesError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.prefs)?)?;
        Ok(())
    }

    /// The stored listener id, generating and persisting one on first use
    pub fn anonymous_id(&mut self) -> Result<AnonymousId, PreferencesError> {
        if let Some(id) = self.prefs.anonymous_id.as_deref().and_then(AnonymousId::parse) {
            return Ok(id);
        }
        let id = AnonymousId::random();
        debug!("Generated anonymous id {}", id);
        self.prefs.anonymous_id = Some(id.as_str().to_string());
        self.save()?;
        Ok(id)
    }

    /// Stored slider value for a stem
    pub fn volume(&self, stem: StemKind) -> f32 {
        let stored = match stem {
            StemKind::Instrumental => self.prefs.instrument_volume,
            StemKind::Vocal => self.prefs.vocal_volume,
        };
        stored.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn set_volume(&mut self, stem: StemKind, volume: f32) -> Result<(), PreferencesError> {
        let slot = match stem {
            StemKind::Instrumental => &mut self.prefs.instrument_volume,
            StemKind::Vocal => &mut self.prefs.vocal_volume,
        };
        *slot = Some(volume);
        self.save()
    }

    pub fn warning_shown(&self) -> bool {
        self.prefs.warning_shown
    }

    pub fn mark_warning_shown(&mut self) -> Result<(), PreferencesError> {
        self.prefs.warning_shown = true;
        self.save()
    }
}
