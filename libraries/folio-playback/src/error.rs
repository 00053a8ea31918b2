//! Error types for the playback engine
//!
//! Transport intents never fail: rejected playback becomes `Paused`, media
//! errors become `Error` status, invalid selections are ignored. These types
//! cover construction-time failures and the adapter boundary.

use thiserror::Error;

/// Errors from loading playlists and configuration
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Two tracks share an id
    #[error("Duplicate track id: {0}")]
    DuplicateTrackId(String),

    /// Playlist document could not be parsed
    #[error("Invalid playlist document: {0}")]
    InvalidPlaylist(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures reported by a media resource
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The platform refused playback that did not come from a user gesture
    #[error("Playback not allowed: {0}")]
    NotAllowed(String),

    /// A pending `play()` was interrupted by a pause or a new load
    #[error("Playback aborted: {0}")]
    Aborted(String),

    /// The source could not be fetched or decoded
    #[error("Source error: {0}")]
    Source(String),
}

impl MediaError {
    /// Whether this is the routine autoplay refusal rather than a fault
    pub fn is_autoplay_block(&self) -> bool {
        matches!(self, MediaError::NotAllowed(_))
    }
}

impl From<serde_json::Error> for PlaybackError {
    fn from(err: serde_json::Error) -> Self {
        PlaybackError::InvalidPlaylist(err.to_string())
    }
}

impl From<toml::de::Error> for PlaybackError {
    fn from(err: toml::de::Error) -> Self {
        PlaybackError::InvalidPlaylist(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_become_invalid_playlist() {
        let err: PlaybackError = toml::from_str::<toml::Value>("tracks = [")
            .unwrap_err()
            .into();
        assert!(matches!(err, PlaybackError::InvalidPlaylist(_)));

        let err: PlaybackError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Invalid playlist document"));
    }

    #[test]
    fn only_not_allowed_is_an_autoplay_block() {
        assert!(MediaError::NotAllowed("gesture".into()).is_autoplay_block());
        assert!(!MediaError::Aborted("load".into()).is_autoplay_block());
        assert!(!MediaError::Source("404".into()).is_autoplay_block());
    }
}
