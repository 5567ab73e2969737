//! DJ API HTTP Client

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::types::*;
use crate::config::UploadCredentials;

/// Default connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (waveform payloads can be large)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Name of the HLS playlist inside every stem folder
const PLAYLIST_FILE: &str = "playlist.m3u8";

/// Errors that can occur when talking to the DJ backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No tracks available")]
    NoTracks,

    #[error("Unexpected response (HTTP {status}): {message}")]
    Unexpected { status: u16, message: String },

    #[error("Rejected upload credentials")]
    Unauthorized,

    #[error("Upload credentials are not configured")]
    MissingCredentials,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// URL of a stem's HLS playlist on the static host
pub fn stream_url(static_url: &str, folder: &str) -> String {
    format!(
        "{}/{}/{}",
        static_url.trim_end_matches('/'),
        folder.trim_matches('/'),
        PLAYLIST_FILE
    )
}

/// Client for the DJ backend's REST API
#[derive(Debug, Clone)]
pub struct DjClient {
    http: Client,
    base_url: String,
    credentials: Option<UploadCredentials>,
}

impl DjClient {
    /// Create a client for the API at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(CONNECTION_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Set the basic-auth credentials used by admin uploads
    pub fn with_credentials(mut self, credentials: UploadCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Turn a non-success response into an [`ApiError`]
    async fn ensure_success(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // Backend errors come as {"error": "..."} or plain text
        let body = resp.text().await?;
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.trim().to_string());

        warn!("API error: HTTP {} - {}", status.as_u16(), message);

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::BAD_REQUEST if message.contains("No tracks") => ApiError::NoTracks,
            _ => ApiError::Unexpected {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Check the status, then decode the JSON body
    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = Self::ensure_success(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Check that the backend is up
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn health(&self) -> Result<(), ApiError> {
        let resp = self.request(Method::GET, "/").send().await?;
        debug!("Health response: {}", resp.status());

        match resp.status() {
            StatusCode::OK => Ok(()),
            status => Err(ApiError::Unexpected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Fetch a track by id
    #[instrument(skip(self))]
    pub async fn track(&self, track_id: &str) -> Result<Track, ApiError> {
        let resp = self
            .request(Method::GET, &format!("/track/{}", track_id))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Pick a random track this listener has not heard yet.
    ///
    /// The backend clears the listener's history once every track was played.
    #[instrument(skip(self))]
    pub async fn random_track(&self, anon_id: &str) -> Result<Track, ApiError> {
        let resp = self
            .request(Method::POST, "/track/random")
            .json(&RandomTrackRequest {
                anon_id: anon_id.to_string(),
            })
            .send()
            .await?;
        let track: Track = Self::decode(resp).await?;
        debug!("Random track: {} - {}", track.info.artist, track.info.title);
        Ok(track)
    }

    /// List albums, one page at a time (pages start at 1)
    #[instrument(skip(self))]
    pub async fn albums(&self, page: u32, limit: u32) -> Result<AlbumPage, ApiError> {
        let resp = self
            .request(Method::GET, "/albums")
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// List the tracks of an album
    #[instrument(skip(self))]
    pub async fn album_tracks(&self, album_id: &str) -> Result<AlbumTracks, ApiError> {
        let resp = self
            .request(Method::GET, &format!("/track/album/{}", album_id))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Ids of albums whose tracks match `query` by title, artist, album or genre
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let resp = self
            .request(Method::GET, "/search")
            .query(&[("q", query)])
            .send()
            .await?;
        let ids: Option<Vec<String>> = Self::decode(resp).await?;
        Ok(ids.unwrap_or_default())
    }

    /// Artist directory: one row per (artist, album)
    #[instrument(skip(self))]
    pub async fn artists_albums(
        &self,
        query: &ArtistAlbumsQuery,
    ) -> Result<Vec<ArtistAlbum>, ApiError> {
        let req = match query {
            ArtistAlbumsQuery::Paged { page, per_page } => self
                .request(Method::POST, "/artists-albums")
                .query(&[
                    ("paged", "true".to_string()),
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ]),
            ArtistAlbumsQuery::Albums(ids) => self
                .request(Method::POST, "/artists-albums")
                .query(&[("paged", "false")])
                .json(ids),
        };
        let rows: Option<Vec<ArtistAlbum>> = Self::decode(req.send().await?).await?;
        Ok(rows.unwrap_or_default())
    }

    /// Artist photo as raw image bytes (JPEG)
    #[instrument(skip(self))]
    pub async fn artist_photo(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .request(Method::GET, "/artist/photo")
            .query(&[("name", name)])
            .send()
            .await?;
        let bytes = Self::ensure_success(resp).await?.bytes().await?;
        debug!("Artist photo: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Insert tracks through the admin endpoint (basic auth).
    ///
    /// Every track must name its album in `metadata["Album"]`; the backend
    /// creates missing albums on the fly.
    #[instrument(skip(self, tracks), fields(count = tracks.len()))]
    pub async fn upload_tracks(&self, tracks: &[UploadTrack]) -> Result<Vec<UploadedTrack>, ApiError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ApiError::MissingCredentials)?;

        if let Some(index) = tracks.iter().position(|t| t.album_name().is_none()) {
            return Err(ApiError::InvalidUpload(format!(
                "track {} has no \"Album\" in its metadata",
                index
            )));
        }

        let resp = self
            .request(Method::POST, "/admin/albums/upload")
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(tracks)
            .send()
            .await?;
        let body = Self::ensure_success(resp).await?.text().await?;
        let uploaded = parse_uploaded(&body)?;

        info!("Uploaded {} of {} tracks", uploaded.len(), tracks.len());
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DjClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/track/abc"), "http://localhost:8080/track/abc");
    }

    #[test]
    fn test_stream_url() {
        assert_eq!(
            stream_url("https://static.example.com/", "Blue Train/instrumental"),
            "https://static.example.com/Blue Train/instrumental/playlist.m3u8"
        );
        assert_eq!(
            stream_url("https://static.example.com", "/a/vocals/"),
            "https://static.example.com/a/vocals/playlist.m3u8"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Port 9 (discard) is not expected to serve HTTP
        let client = DjClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.health().await, Err(ApiError::Http(_))));
    }

    fn upload(album: Option<&str>) -> UploadTrack {
        let mut metadata = serde_json::Map::new();
        metadata.insert("Title".to_string(), "So What".into());
        if let Some(album) = album {
            metadata.insert("Album".to_string(), album.into());
        }
        UploadTrack {
            metadata,
            key: "D".to_string(),
            tempo: 136.0,
            length: 562.0,
            instrumental_folder_path: "Kind of Blue/instrumental".to_string(),
            instrumental: true,
            vocal_folder_path: None,
            instrumental_waveform: vec![0.1],
            vocal_waveform: None,
        }
    }

    #[tokio::test]
    async fn test_upload_requires_credentials() {
        let client = DjClient::new("http://127.0.0.1:9").unwrap();
        let result = client.upload_tracks(&[upload(Some("Kind of Blue"))]).await;
        assert!(matches!(result, Err(ApiError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_upload_rejects_track_without_album() {
        let client = DjClient::new("http://127.0.0.1:9")
            .unwrap()
            .with_credentials(UploadCredentials::new("admin", "secret"));
        let result = client
            .upload_tracks(&[upload(Some("Kind of Blue")), upload(None)])
            .await;
        match result {
            Err(ApiError::InvalidUpload(message)) => assert!(message.contains("track 1")),
            other => panic!("expected InvalidUpload, got {:?}", other),
        }
    }

    #[test]
    fn test_client_debug_hides_password() {
        let client = DjClient::new("http://localhost:8080")
            .unwrap()
            .with_credentials(UploadCredentials::new("admin", "hunter2"));
        let debug = format!("{:?}", client);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
