//! Playback Events
//!
//! Event-based communication for UI synchronization. The engine queues these
//! as it transitions; the host drains them once per render tick.

use crate::types::PlaybackStatus;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Transport status changed
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// The current track changed (navigation, natural end, playlist switch, retry)
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
        /// Index of the new track in the playlist
        index: usize,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// Position or duration changed
    PositionUpdate {
        position_seconds: f64,
        duration_seconds: Option<f64>,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0.0-1.0)
        level: f64,
        /// Whether audio is muted
        muted: bool,
    },

    /// The platform refused an automatic play attempt
    AutoplayBlocked {
        track_id: String,
        reason: String,
    },

    /// The playlist was replaced
    PlaylistChanged {
        /// New playlist length
        length: usize,
    },

    /// The current source failed to load or decode
    Error {
        track_id: Option<String>,
        message: String,
    },
}
