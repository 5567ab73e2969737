//! Types for DJ API requests and responses

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treat a JSON `null` array as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<f32>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Album as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "coverExtension")]
    pub cover_extension: String,
}

/// Descriptive and analysis data for a track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default)]
    pub album: String,

    /// Length as reported by the backend
    pub length: f64,

    #[serde(default)]
    pub genre: String,

    /// Peaks for the vocal waveform (absent for instrumental tracks)
    #[serde(default, alias = "vocalWaveform")]
    pub vocal_waveform: Option<Vec<f32>>,

    /// Peaks for the instrumental waveform
    #[serde(default, alias = "instrumentalWaveform", deserialize_with = "null_as_empty")]
    pub instrumental_waveform: Vec<f32>,

    /// Tempo in BPM
    #[serde(default)]
    pub tempo: f64,

    /// Whether the track has no vocal stem
    #[serde(default)]
    pub instrumental: bool,

    /// Musical key
    #[serde(default)]
    pub key: String,
}

/// A playable track with the folders holding its stem playlists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,

    /// Cover image path relative to the static host
    #[serde(default)]
    pub cover: String,

    pub info: TrackInfo,

    #[serde(default, alias = "savedAlbumName")]
    pub saved_album_name: String,

    #[serde(default, alias = "coverExtension")]
    pub cover_extension: String,

    #[serde(default, alias = "savedVocalFolderPath")]
    pub saved_vocal_folder_path: Option<String>,

    #[serde(alias = "savedInstrumentalFolderPath")]
    pub saved_instrumental_folder_path: String,
}

impl Track {
    /// Folder of the vocal playlist, if this track plays a vocal stem
    pub fn vocal_folder(&self) -> Option<&str> {
        if self.info.instrumental {
            return None;
        }
        self.saved_vocal_folder_path
            .as_deref()
            .filter(|path| !path.is_empty())
    }

    /// Peaks of the vocal waveform, if this track renders one
    pub fn vocal_peaks(&self) -> Option<&[f32]> {
        if self.info.instrumental {
            return None;
        }
        self.info
            .vocal_waveform
            .as_deref()
            .filter(|peaks| !peaks.is_empty())
    }
}

/// One page of albums
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumPage {
    pub albums: Vec<Album>,
    pub total: u64,
}

/// A track entry in an album listing
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumTrack {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Duration in seconds
    pub duration: f64,
}

/// Track listing for an album
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumTracks {
    #[serde(default, deserialize_with = "null_as_empty_tracks")]
    pub tracks: Vec<AlbumTrack>,
    /// Base64 encoded, optimized cover image
    #[serde(default)]
    pub cover: String,
}

fn null_as_empty_tracks<'de, D>(deserializer: D) -> Result<Vec<AlbumTrack>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AlbumTrack>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One album in the artist directory
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistAlbum {
    pub artist: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(alias = "albumId")]
    pub album_id: String,
    #[serde(alias = "albumName")]
    pub album_name: String,
    /// Tracks by this artist across all albums
    #[serde(default, alias = "trackCount")]
    pub track_count: u64,
}

/// Which slice of the artist directory to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ArtistAlbumsQuery {
    /// Ordered by artist then album name; pages start at 1
    Paged { page: u32, per_page: u32 },
    /// Only these albums (e.g. search hits)
    Albums(Vec<String>),
}

/// A track to insert through the admin upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTrack {
    /// Free-form tags (Title, Artist, Album, Genre, ...)
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub tempo: f64,

    pub length: f64,

    #[serde(rename = "instrumentalFolderPath")]
    pub instrumental_folder_path: String,

    #[serde(default)]
    pub instrumental: bool,

    #[serde(default, rename = "vocalFolderPath")]
    pub vocal_folder_path: Option<String>,

    #[serde(default, rename = "waveform")]
    pub instrumental_waveform: Vec<f32>,

    #[serde(default, rename = "vocalWaveform")]
    pub vocal_waveform: Option<Vec<f32>>,
}

impl UploadTrack {
    /// Album the backend files this track under
    pub fn album_name(&self) -> Option<&str> {
        self.metadata
            .get("Album")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// A track row created by an upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedTrack {
    pub id: String,
    #[serde(alias = "albumId")]
    pub album_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadedBatch {
    Many(Vec<UploadedTrack>),
    One(UploadedTrack),
}

/// Parse an upload response.
///
/// The backend writes one JSON object per inserted track back to back, so the
/// body is read as a stream of values rather than a single document.
pub fn parse_uploaded(body: &str) -> Result<Vec<UploadedTrack>, serde_json::Error> {
    let mut uploaded = Vec::new();
    for batch in serde_json::Deserializer::from_str(body).into_iter::<UploadedBatch>() {
        match batch? {
            UploadedBatch::Many(tracks) => uploaded.extend(tracks),
            UploadedBatch::One(track) => uploaded.push(track),
        }
    }
    Ok(uploaded)
}

/// Request body for the random-track endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RandomTrackRequest {
    #[serde(rename = "anonId")]
    pub anon_id: String,
}

/// Error body returned by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
