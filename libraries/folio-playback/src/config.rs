//! Player configuration and playlist documents

use crate::error::{PlaybackError, Result};
use crate::types::Track;
use crate::volume::DEFAULT_VOLUME;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Attempt playback without a user gesture (default: false)
    #[serde(default)]
    pub auto_play: bool,

    /// Track to start on (default: 0)
    #[serde(default)]
    pub initial_index: usize,

    /// Initial volume, 0.0-1.0 (default: 0.7)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Start muted (default: false)
    #[serde(default)]
    pub muted: bool,
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            auto_play: false,
            initial_index: 0,
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

impl PlayerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::Config(format!(
                "volume must be between 0 and 1, got {}",
                self.volume
            )));
        }
        Ok(())
    }
}

/// Serialization format of a playlist document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistFormat {
    Toml,
    Json,
}

impl PlaylistFormat {
    /// Guess the format from a file extension (`.json`, otherwise TOML)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => PlaylistFormat::Json,
            _ => PlaylistFormat::Toml,
        }
    }
}

/// A named, ordered list of tracks as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDocument {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl PlaylistDocument {
    pub fn parse(text: &str, format: PlaylistFormat) -> Result<Self> {
        let document: Self = match format {
            PlaylistFormat::Toml => toml::from_str(text)?,
            PlaylistFormat::Json => serde_json::from_str(text)?,
        };
        document.validate()?;
        Ok(document)
    }

    /// Reject documents where two tracks share an id
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for track in &self.tracks {
            if !seen.insert(track.id.as_str()) {
                return Err(PlaybackError::DuplicateTrackId(track.id.clone()));
            }
        }
        Ok(())
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}
