//! DJ API Client
//!
//! Client for the DJ backend's REST API (tracks, albums, random picks).

mod client;
mod types;

pub use client::{stream_url, ApiError, DjClient};
pub use types::*;
