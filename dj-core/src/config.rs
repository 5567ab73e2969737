//! Player configuration

use std::env;
use std::path::PathBuf;

use tracing::debug;

/// Default DJ API endpoint
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default static host serving stem playlists and covers
pub const DEFAULT_STATIC_URL: &str = "http://localhost:8081";

pub const ENV_API_URL: &str = "DJ_API_URL";
pub const ENV_STATIC_URL: &str = "DJ_STATIC_URL";
pub const ENV_PREFERENCES: &str = "DJ_PREFERENCES";
pub const ENV_UPLOAD_USERNAME: &str = "DJ_UPLOAD_USERNAME";
pub const ENV_UPLOAD_PASSWORD: &str = "DJ_UPLOAD_PASSWORD";

/// Basic-auth login for the admin upload endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCredentials {
    pub username: String,
    pub password: String,
}

impl UploadCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for UploadCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the player finds the API, the static host and its preferences
#[derive(Debug, Clone, PartialEq)]
pub struct DjConfig {
    pub api_url: String,
    pub static_url: String,
    /// `None` keeps preferences in memory only
    pub preferences_path: Option<PathBuf>,
    /// Only needed for uploads; set when both username and password are given
    pub upload_credentials: Option<UploadCredentials>,
}

impl DjConfig {
    /// Platform default location of the preferences file
    pub fn default_preferences_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dj").join("preferences.json"))
    }

    /// Defaults overridden by `DJ_API_URL`, `DJ_STATIC_URL`, `DJ_PREFERENCES`
    /// and the `DJ_UPLOAD_USERNAME` / `DJ_UPLOAD_PASSWORD` pair
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            api_url: non_empty(ENV_API_URL).unwrap_or(defaults.api_url),
            static_url: non_empty(ENV_STATIC_URL).unwrap_or(defaults.static_url),
            preferences_path: non_empty(ENV_PREFERENCES)
                .map(PathBuf::from)
                .or(defaults.preferences_path),
            upload_credentials: non_empty(ENV_UPLOAD_USERNAME)
                .zip(non_empty(ENV_UPLOAD_PASSWORD))
                .map(|(username, password)| UploadCredentials { username, password }),
        };
        debug!("Config: {:?}", config);
        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_static_url(mut self, url: impl Into<String>) -> Self {
        self.static_url = url.into();
        self
    }

    pub fn with_preferences_path(mut self, path: Option<PathBuf>) -> Self {
        self.preferences_path = path;
        self
    }
}

impl Default for DjConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            static_url: DEFAULT_STATIC_URL.to_string(),
            preferences_path: Self::default_preferences_path(),
            upload_credentials: None,
        }
    }
}
