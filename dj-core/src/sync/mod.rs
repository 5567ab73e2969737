//! Stem Synchronization
//!
//! Keeps the instrumental and vocal streams of a track, and their waveform
//! cursors, on the same position while the user seeks.

mod stem;
mod synchronizer;

pub use stem::*;
pub use synchronizer::*;
