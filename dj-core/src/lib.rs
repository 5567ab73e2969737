//! DJ Player - Core Library
//!
//! This library provides the client side of the DJ player: a typed client
//! for the track API, and a player that streams a track's instrumental and
//! vocal stems while keeping them and their waveforms in sync.

pub mod api;
pub mod config;
pub mod listener;
pub mod logging;
pub mod player;
pub mod preferences;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use api::{DjClient, Track};
pub use config::DjConfig;
pub use player::{MediaBackend, Player, PlayerError, PlayerEvent};
pub use sync::{PlaybackSynchronizer, StemKind};
