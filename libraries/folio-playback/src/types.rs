//! Core types for the playback engine

use serde::{Deserialize, Deserializer, Serialize};

/// A playable track
///
/// Immutable once handed to a playlist; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier (numeric ids in documents become strings)
    #[serde(deserialize_with = "deserialize_track_id")]
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// URI handed to the media resource
    #[serde(alias = "src")]
    pub source_uri: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            source_uri: source_uri.into(),
        }
    }
}

fn deserialize_track_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No track loaded (initial, or empty playlist)
    Idle,

    /// A track was selected and its source is loading
    Loading,

    /// Currently playing
    Playing,

    /// Paused (by the user, or by a rejected autoplay attempt)
    Paused,

    /// The current source failed to load or decode
    Error,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Rendered geometry of the progress bar, in the same units as click offsets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarGeometry {
    pub left: f64,
    pub width: f64,
}

impl BarGeometry {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

/// Read-only view of the engine, rebuilt on demand for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub current_track: Option<Track>,
    /// `None` when the playlist is empty
    pub current_index: Option<usize>,
    pub total_tracks: usize,
    /// Reported as 0 until the duration is known
    pub position_seconds: f64,
    /// `None` until the media resource reports metadata
    pub duration_seconds: Option<f64>,
    pub volume: f64,
    pub muted: bool,
    pub progress_fraction: f64,
    pub user_paused: bool,
    pub is_loading: bool,
}

impl PlaybackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}
