//! Folio - Playback Engine
//!
//! Platform-agnostic engine behind the floating music player.
//!
//! This crate provides:
//! - Playlist navigation with wraparound
//! - A transport state machine (idle, loading, playing, paused, error)
//! - An autoplay policy that tolerates platform autoplay restrictions
//! - Progress, seek and volume control
//! - Time formatting helpers for display
//!
//! # Architecture
//!
//! `folio-playback` never decodes audio itself. The host supplies a
//! [`MediaResource`] (an audio element in the browser, [`sim::SimulatedMedia`]
//! headless), and the [`Player`] drives it:
//!
//! ```text
//! UI intents ──▶ Player ──▶ PlaybackMachine (decides)
//!                  │              ▲
//!                  ▼              │ play results, media events
//!             MediaResource ──────┘ (tagged with a generation)
//! ```
//!
//! Every track change bumps a generation. Listener bindings and pending
//! `play()` calls carry the generation they were made for, so anything that
//! resolves after the user moved on is discarded.
//!
//! # Example
//!
//! ```rust
//! use folio_playback::{sim::SimulatedMedia, PlaybackStatus, Player, PlayerConfig, Track};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let tracks = vec![
//!     Track::new("1", "Kataware Doki", "Radwimps", "/music/1.m4a"),
//!     Track::new("2", "Do voskhoda", "Unknown", "/music/2.m4a"),
//! ];
//! let config = PlayerConfig {
//!     auto_play: true,
//!     ..PlayerConfig::default()
//! };
//!
//! let player = Player::new(SimulatedMedia::new(), tracks, config);
//! player.mount().await;
//!
//! // The resource reports it is ready; the deferred autoplay attempt fires
//! player.media().finish_loading();
//! player.dispatch_pending().await;
//! assert_eq!(player.snapshot().status, PlaybackStatus::Playing);
//!
//! player.set_volume(1.8);
//! assert_eq!(player.snapshot().volume, 1.0);
//! # });
//! ```

mod autoplay;
mod config;
mod error;
mod events;
mod format;
mod machine;
mod media;
mod navigator;
mod player;
pub mod sim;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use autoplay::{AutoplayPolicy, AutoplayTrigger};
pub use config::{PlayerConfig, PlaylistDocument, PlaylistFormat};
pub use error::{MediaError, PlaybackError, Result};
pub use events::PlaybackEvent;
pub use format::{format_time, progress_fraction, seek_fraction};
pub use machine::{
    EventOutcome, PlayOrigin, PlayTicket, PlaybackMachine, Toggle, TrackChange, TrackLoad,
};
pub use media::{EventSink, Generation, ListenerId, MediaEvent, MediaResource, TaggedEvent};
pub use navigator::{next_index, prev_index, select_index, Playlist};
pub use player::Player;
pub use types::{BarGeometry, PlaybackSnapshot, PlaybackStatus, Track};
pub use volume::{Volume, DEFAULT_VOLUME};
