//! Anonymous listener identity
//!
//! The backend tracks listening history per anonymous id so that random
//! picks avoid repeats. The id is generated once and kept in preferences.

use std::fmt;

use rand::Rng;

const PREFIX: &str = "user_";

/// Characters used in the random part of the id (base-36, lowercase)
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part
const ID_LENGTH: usize = 7;

/// An anonymous listener id such as `user_k3f9x0a`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousId(String);

impl AnonymousId {
    /// Generate a fresh random id
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();

        let mut id = String::with_capacity(PREFIX.len() + ID_LENGTH);
        id.push_str(PREFIX);
        for _ in 0..ID_LENGTH {
            let idx = rng.gen_range(0..ALPHABET.len());
            id.push(ALPHABET[idx] as char);
        }
        AnonymousId(id)
    }

    /// Accept a previously stored id. Any non-empty value is kept as-is so
    /// existing listening history stays attached to it.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(AnonymousId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
