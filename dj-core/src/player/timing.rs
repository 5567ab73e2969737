//! Track duration and clock labels

use std::fmt;

/// Duration the player runs a track's session with.
///
/// Derived from the backend's `length` the way the web player always has:
/// whole minutes plus the remainder scaled by 0.6 and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDuration {
    pub minutes: u32,
    pub seconds: u32,
}

impl SessionDuration {
    pub fn from_length(length: f64) -> Self {
        let length = if length.is_finite() { length.max(0.0) } else { 0.0 };
        let minutes = (length / 60.0).floor();
        let seconds = ((length % 60.0) * 0.6).round();
        Self {
            minutes: minutes as u32,
            seconds: seconds as u32,
        }
    }

    pub fn as_secs(&self) -> f64 {
        f64::from(self.minutes) * 60.0 + f64::from(self.seconds)
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// `m:ss` label for a position in seconds
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let minutes = (secs / 60.0).floor() as u64;
    let seconds = (secs % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, seconds)
}
