//! Playback state machine
//!
//! Owns the snapshot state and decides every transition. It never touches the
//! media resource: each intent returns what the platform layer has to do next
//! (pause, play under a ticket, load a track), and asynchronous results come
//! back through [`PlaybackMachine::play_resolved`] and
//! [`PlaybackMachine::handle_event`].
//!
//! ```text
//! Idle ──load──▶ Loading ──play ok──▶ Playing ──pause──▶ Paused
//!                   │  └──rejected──▶ Paused ◀──────────────┘
//!                   └──error event──▶ Error ──retry/track change──▶ Loading
//! ```
//!
//! Stale results are filtered with two counters: the generation changes on
//! every track change, the intent sequence on every explicit play/pause.

use crate::{
    autoplay::{AutoplayPolicy, AutoplayTrigger},
    config::PlayerConfig,
    error::MediaError,
    events::PlaybackEvent,
    format::{progress_fraction, seek_fraction},
    media::{Generation, MediaEvent, TaggedEvent},
    navigator::Playlist,
    types::{BarGeometry, PlaybackSnapshot, PlaybackStatus, Track},
    volume::Volume,
};
use tracing::{debug, error, info, warn};

/// Who asked for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOrigin {
    /// Issued by the autoplay policy
    Autoplay,
    /// Issued by an explicit user intent
    User,
}

/// A `play()` request whose resolution must be reported back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    generation: Generation,
    intent: u64,
    track_id: String,
    origin: PlayOrigin,
}

impl PlayTicket {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn origin(&self) -> PlayOrigin {
        self.origin
    }
}

/// A track the platform must load, with an optional follow-up play
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLoad {
    pub generation: Generation,
    pub track: Track,
    pub autoplay: Option<PlayTicket>,
}

/// Navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackChange {
    Next,
    Prev,
    Select(usize),
}

/// Result of a play/pause toggle
#[derive(Debug, Clone, PartialEq)]
pub enum Toggle {
    /// Pause the media resource
    Pause,
    /// Call `play()` and report the result
    Play(PlayTicket),
    /// The current track errored; load it again
    Reload(TrackLoad),
    /// Nothing to do (empty playlist)
    Ignored,
}

/// Result of a media event
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Applied,
    /// Event came from a superseded binding or does not apply
    Ignored,
    /// The track ended; navigate to the next one
    Advance,
    /// The resource is ready and autoplay wants to start
    Play(PlayTicket),
}

/// Central playback state
pub struct PlaybackMachine {
    // State
    playlist: Playlist,
    status: PlaybackStatus,
    position: f64,
    duration: Option<f64>,
    volume: Volume,
    user_paused: bool,
    is_loading: bool,

    // Staleness tracking
    generation: Generation,
    intent: u64,
    play_in_flight: bool,
    // Set by shutdown; every later intent is ignored
    torn_down: bool,

    autoplay: AutoplayPolicy,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackMachine {
    pub fn new(tracks: Vec<Track>, config: &PlayerConfig) -> Self {
        let mut volume = Volume::new(config.volume);
        volume.set_muted(config.muted);

        Self {
            playlist: Playlist::new(tracks, config.initial_index),
            status: PlaybackStatus::Idle,
            position: 0.0,
            duration: None,
            volume,
            user_paused: false,
            is_loading: false,
            generation: Generation::default(),
            intent: 0,
            play_in_flight: false,
            torn_down: false,
            autoplay: AutoplayPolicy::new(config.auto_play),
            pending_events: Vec::new(),
        }
    }

    // ===== Lifecycle =====

    /// Load the initial track; autoplay waits for the resource to be ready
    pub fn mount(&mut self) -> Option<TrackLoad> {
        if self.torn_down {
            return None;
        }
        let load = self.load_current(None, AutoplayTrigger::Mount);
        if load.is_none() {
            debug!("Mounted with an empty playlist");
        }
        load
    }

    /// Invalidate everything in flight; called when the engine is torn down
    pub fn shutdown(&mut self) {
        self.torn_down = true;
        self.generation = self.generation.next();
        self.play_in_flight = false;
        self.is_loading = false;
        self.set_status(PlaybackStatus::Idle);
    }

    // ===== Transport =====

    /// Play/pause intent
    pub fn toggle(&mut self) -> Toggle {
        if self.torn_down || self.playlist.is_empty() {
            return Toggle::Ignored;
        }

        match self.status {
            PlaybackStatus::Playing => {
                self.intent += 1;
                self.play_in_flight = false;
                self.user_paused = true;
                self.set_status(PlaybackStatus::Paused);
                Toggle::Pause
            }
            PlaybackStatus::Error => match self.reload_current() {
                Some(load) => Toggle::Reload(load),
                None => Toggle::Ignored,
            },
            PlaybackStatus::Idle | PlaybackStatus::Loading | PlaybackStatus::Paused => {
                self.intent += 1;
                Toggle::Play(self.issue_ticket(PlayOrigin::User))
            }
        }
    }

    /// Apply the outcome of a `play()` call
    ///
    /// Returns false when the ticket was superseded by a track change or a
    /// later play/pause intent, in which case nothing changes.
    pub fn play_resolved(
        &mut self,
        ticket: PlayTicket,
        result: std::result::Result<(), MediaError>,
    ) -> bool {
        if self.torn_down || ticket.generation != self.generation {
            debug!(
                "Discarding play result for {} (generation {} superseded by {})",
                ticket.track_id,
                ticket.generation.value(),
                self.generation.value()
            );
            return false;
        }
        if ticket.intent != self.intent {
            debug!(
                "Discarding play result for {} (superseded by a later intent)",
                ticket.track_id
            );
            return false;
        }

        self.play_in_flight = false;
        if self.status == PlaybackStatus::Error {
            return false;
        }
        self.is_loading = false;

        match result {
            Ok(()) => {
                if ticket.origin == PlayOrigin::User {
                    self.user_paused = false;
                }
                self.set_status(PlaybackStatus::Playing);
            }
            Err(err) => {
                if err.is_autoplay_block() {
                    warn!("Playback of {} blocked by the platform: {}", ticket.track_id, err);
                } else {
                    debug!("Playback of {} rejected: {}", ticket.track_id, err);
                }
                if ticket.origin == PlayOrigin::Autoplay {
                    self.pending_events.push(PlaybackEvent::AutoplayBlocked {
                        track_id: ticket.track_id,
                        reason: err.to_string(),
                    });
                }
                self.set_status(PlaybackStatus::Paused);
            }
        }
        true
    }

    // ===== Navigation =====

    /// Next/previous/select intent
    ///
    /// Invalid selections and empty playlists return `None` and change nothing.
    /// Selecting the current track is a no-op unless it errored.
    pub fn change_track(&mut self, change: TrackChange) -> Option<TrackLoad> {
        if self.torn_down {
            return None;
        }
        let previous = self.current_track_id();

        let moved = match change {
            TrackChange::Next => self.playlist.advance(),
            TrackChange::Prev => self.playlist.retreat(),
            TrackChange::Select(index) => {
                if self.restart_if_selected(index).is_some() {
                    return None;
                }
                let selected = self.playlist.select(index);
                if selected.is_none() {
                    debug!(
                        "Ignoring selection of index {} ({} tracks)",
                        index,
                        self.playlist.len()
                    );
                }
                selected
            }
        };
        moved?;

        // Navigating is an intent to keep listening
        self.user_paused = false;
        self.load_current(previous, AutoplayTrigger::TrackChange)
    }

    /// Rewind to the start when `index` is already the current track
    ///
    /// Returns the new position for the media resource, or `None` when the
    /// selection is a real track change (or the current track errored and
    /// needs a reload instead).
    pub fn restart_if_selected(&mut self, index: usize) -> Option<f64> {
        if self.torn_down
            || self.playlist.current_index() != Some(index)
            || self.status == PlaybackStatus::Error
        {
            return None;
        }
        debug!("Track {} already selected, restarting", index);
        self.apply_seek(0.0)
    }

    /// Reload the current track after an error
    pub fn retry(&mut self) -> Option<TrackLoad> {
        if self.torn_down || self.status != PlaybackStatus::Error {
            return None;
        }
        self.user_paused = false;
        let previous = self.current_track_id();
        self.load_current(previous, AutoplayTrigger::TrackChange)
    }

    /// Replace the playlist and load its current track
    ///
    /// The user's pause intent carries over, so switching lists while paused
    /// does not start playback.
    pub fn replace_playlist(&mut self, tracks: Vec<Track>, initial_index: usize) -> Option<TrackLoad> {
        if self.torn_down {
            return None;
        }
        let previous = self.current_track_id();
        self.playlist = Playlist::new(tracks, initial_index);
        self.pending_events.push(PlaybackEvent::PlaylistChanged {
            length: self.playlist.len(),
        });
        info!("Playlist replaced ({} tracks)", self.playlist.len());

        if self.playlist.is_empty() {
            self.generation = self.generation.next();
            self.play_in_flight = false;
            self.is_loading = false;
            self.position = 0.0;
            self.duration = None;
            self.set_status(PlaybackStatus::Idle);
            return None;
        }

        self.load_current(previous, AutoplayTrigger::TrackChange)
    }

    // ===== Media events =====

    pub fn handle_event(&mut self, tagged: TaggedEvent) -> EventOutcome {
        if self.torn_down || tagged.generation != self.generation {
            debug!(
                "Ignoring {:?} from superseded generation {}",
                tagged.event,
                tagged.generation.value()
            );
            return EventOutcome::Ignored;
        }

        match tagged.event {
            MediaEvent::LoadedMetadata { duration } => {
                self.duration = (duration.is_finite() && duration >= 0.0).then_some(duration);
                self.position = self.clamp_position(self.position);
                self.emit_position_update();
                EventOutcome::Applied
            }
            MediaEvent::TimeUpdate { position } => {
                if position.is_nan() {
                    return EventOutcome::Ignored;
                }
                self.position = self.clamp_position(position);
                self.emit_position_update();
                EventOutcome::Applied
            }
            MediaEvent::CanPlay => {
                if self.status == PlaybackStatus::Error {
                    return EventOutcome::Ignored;
                }
                if self.autoplay.decide(AutoplayTrigger::MediaReady, self.user_paused) {
                    return EventOutcome::Play(self.issue_ticket(PlayOrigin::Autoplay));
                }
                if !self.play_in_flight {
                    self.is_loading = false;
                    if self.status == PlaybackStatus::Loading {
                        self.set_status(PlaybackStatus::Paused);
                    }
                }
                EventOutcome::Applied
            }
            MediaEvent::Ended => {
                if let Some(track_id) = self.current_track_id() {
                    debug!("Track {} ended", track_id);
                    self.pending_events
                        .push(PlaybackEvent::TrackFinished { track_id });
                }
                EventOutcome::Advance
            }
            MediaEvent::Error { message } => {
                let track_id = self.current_track_id();
                error!(
                    "Media error for track {}: {}",
                    track_id.as_deref().unwrap_or("<none>"),
                    message
                );
                self.play_in_flight = false;
                self.is_loading = false;
                self.set_status(PlaybackStatus::Error);
                self.pending_events
                    .push(PlaybackEvent::Error { track_id, message });
                EventOutcome::Applied
            }
        }
    }

    // ===== Seek =====

    /// Seek from a click on the progress bar; returns the new position
    pub fn seek(&mut self, click_x: f64, bar: BarGeometry) -> Option<f64> {
        let fraction = seek_fraction(click_x, bar)?;
        self.seek_to_fraction(fraction)
    }

    /// Seek by fraction of the duration (clamped to `[0, 1]`)
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Option<f64> {
        if fraction.is_nan() {
            return None;
        }
        let duration = self.seekable_duration()?;
        self.apply_seek(fraction.clamp(0.0, 1.0) * duration)
    }

    /// Seek to an absolute time (clamped to the duration)
    pub fn seek_to_seconds(&mut self, seconds: f64) -> Option<f64> {
        if seconds.is_nan() {
            return None;
        }
        let duration = self.seekable_duration()?;
        self.apply_seek(seconds.clamp(0.0, duration))
    }

    fn seekable_duration(&self) -> Option<f64> {
        if self.torn_down || self.playlist.is_empty() || self.status == PlaybackStatus::Error {
            return None;
        }
        self.duration.filter(|duration| *duration > 0.0)
    }

    fn apply_seek(&mut self, position: f64) -> Option<f64> {
        self.position = position;
        self.emit_position_update();
        Some(position)
    }

    // ===== Volume =====

    /// Set volume; returns the level to hand to the media resource
    pub fn set_volume(&mut self, level: f64) -> f64 {
        self.volume.set_level(level);
        self.emit_volume_changed();
        self.volume.output()
    }

    pub fn set_muted(&mut self, muted: bool) -> f64 {
        self.volume.set_muted(muted);
        self.emit_volume_changed();
        self.volume.output()
    }

    pub fn toggle_mute(&mut self) -> f64 {
        self.volume.toggle_mute();
        self.emit_volume_changed();
        self.volume.output()
    }

    /// Level the media resource should currently be set to
    pub fn volume_output(&self) -> f64 {
        self.volume.output()
    }

    // ===== State Queries =====

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let duration = self.duration;
        let position = if duration.is_some() { self.position } else { 0.0 };

        PlaybackSnapshot {
            status: self.status,
            current_track: self.playlist.current().cloned(),
            current_index: self.playlist.current_index(),
            total_tracks: self.playlist.len(),
            position_seconds: position,
            duration_seconds: duration,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            progress_fraction: progress_fraction(position, duration.unwrap_or(0.0)),
            user_paused: self.user_paused,
            is_loading: self.is_loading,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn user_paused(&self) -> bool {
        self.user_paused
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay.set_enabled(enabled);
    }

    /// Take all queued UI events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn current_track_id(&self) -> Option<String> {
        self.playlist.current().map(|track| track.id.clone())
    }

    fn reload_current(&mut self) -> Option<TrackLoad> {
        let mut load = self.retry()?;
        // Toggling out of an error is an explicit play request
        if load.autoplay.is_none() {
            load.autoplay = Some(self.issue_ticket(PlayOrigin::User));
        }
        Some(load)
    }

    fn load_current(
        &mut self,
        previous_track_id: Option<String>,
        trigger: AutoplayTrigger,
    ) -> Option<TrackLoad> {
        let track = self.playlist.current()?.clone();
        let index = self.playlist.current_index()?;

        self.generation = self.generation.next();
        self.intent += 1;
        self.play_in_flight = false;
        self.position = 0.0;
        self.duration = None;
        self.is_loading = true;
        self.set_status(PlaybackStatus::Loading);

        info!("Loading track {} ({}) at index {}", track.id, track.title, index);
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
            index,
        });

        let autoplay = if self.autoplay.decide(trigger, self.user_paused) {
            Some(self.issue_ticket(PlayOrigin::Autoplay))
        } else {
            None
        };

        Some(TrackLoad {
            generation: self.generation,
            track,
            autoplay,
        })
    }

    fn issue_ticket(&mut self, origin: PlayOrigin) -> PlayTicket {
        self.play_in_flight = true;
        PlayTicket {
            generation: self.generation,
            intent: self.intent,
            track_id: self.current_track_id().unwrap_or_default(),
            origin,
        }
    }

    fn clamp_position(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            debug!("Status {} -> {}", self.status, status);
            self.status = status;
            self.pending_events
                .push(PlaybackEvent::StateChanged { status });
        }
    }

    fn emit_position_update(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_seconds: self.position,
            duration_seconds: self.duration,
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Artist", format!("/music/{id}.m4a"))
    }

    fn machine(auto_play: bool) -> PlaybackMachine {
        let config = PlayerConfig {
            auto_play,
            ..PlayerConfig::default()
        };
        PlaybackMachine::new(
            vec![
                create_test_track("a"),
                create_test_track("b"),
                create_test_track("c"),
            ],
            &config,
        )
    }

    fn event(machine: &PlaybackMachine, event: MediaEvent) -> TaggedEvent {
        TaggedEvent {
            generation: machine.generation(),
            event,
        }
    }

    #[test]
    fn starts_idle() {
        let machine = machine(false);
        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(snapshot.total_tracks, 3);
        assert_eq!(snapshot.volume, 0.7);
    }

    #[test]
    fn mount_defers_autoplay_until_can_play() {
        let mut machine = machine(true);
        let load = machine.mount().unwrap();
        assert_eq!(load.track.id, "a");
        assert!(load.autoplay.is_none());
        assert_eq!(machine.status(), PlaybackStatus::Loading);

        let outcome = machine.handle_event(event(&machine, MediaEvent::CanPlay));
        let EventOutcome::Play(ticket) = outcome else {
            panic!("expected autoplay attempt, got {outcome:?}");
        };
        assert_eq!(ticket.origin(), PlayOrigin::Autoplay);

        assert!(machine.play_resolved(ticket, Ok(())));
        assert_eq!(machine.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn can_play_without_autoplay_settles_paused() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::CanPlay));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Paused);
        assert!(!snapshot.is_loading);
        assert!(!snapshot.user_paused);
    }

    #[test]
    fn toggle_pauses_and_marks_user_intent() {
        let mut machine = machine(false);
        machine.mount();
        let Toggle::Play(ticket) = machine.toggle() else {
            panic!("expected play");
        };
        machine.play_resolved(ticket, Ok(()));

        assert_eq!(machine.toggle(), Toggle::Pause);
        assert_eq!(machine.status(), PlaybackStatus::Paused);
        assert!(machine.user_paused());
    }

    #[test]
    fn rejected_toggle_stays_paused_without_error() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::CanPlay));

        let Toggle::Play(ticket) = machine.toggle() else {
            panic!("expected play");
        };
        machine.play_resolved(ticket, Err(MediaError::NotAllowed("gesture required".into())));

        assert_eq!(machine.status(), PlaybackStatus::Paused);
        assert!(machine
            .drain_events()
            .iter()
            .all(|event| !matches!(event, PlaybackEvent::Error { .. })));
    }

    #[test]
    fn autoplay_rejection_leaves_user_paused_false() {
        let mut machine = machine(true);
        let load = machine.change_track(TrackChange::Next).unwrap();
        let ticket = load.autoplay.unwrap();

        machine.play_resolved(ticket, Err(MediaError::NotAllowed("blocked".into())));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Paused);
        assert!(!snapshot.user_paused);
        assert!(machine
            .drain_events()
            .iter()
            .any(|event| matches!(event, PlaybackEvent::AutoplayBlocked { track_id, .. } if track_id == "b")));
    }

    #[test]
    fn stale_resolution_is_discarded_after_track_change() {
        let mut machine = machine(false);
        machine.mount();
        let Toggle::Play(stale) = machine.toggle() else {
            panic!("expected play");
        };

        machine.change_track(TrackChange::Next);
        assert!(!machine.play_resolved(stale, Ok(())));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Loading);
        assert_eq!(snapshot.current_index, Some(1));
    }

    #[test]
    fn earlier_play_superseded_by_later_intent() {
        let mut machine = machine(false);
        machine.mount();
        let Toggle::Play(first) = machine.toggle() else {
            panic!("expected play");
        };
        let Toggle::Play(second) = machine.toggle() else {
            panic!("expected play");
        };

        assert!(!machine.play_resolved(first, Ok(())));
        assert!(machine.play_resolved(second, Ok(())));
        assert_eq!(machine.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn navigation_resets_position_and_user_pause() {
        let mut machine = machine(true);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 200.0 }));
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 42.0 }));
        let Toggle::Play(ticket) = machine.toggle() else {
            panic!("expected play");
        };
        machine.play_resolved(ticket, Ok(()));
        assert_eq!(machine.snapshot().position_seconds, 42.0);

        assert_eq!(machine.toggle(), Toggle::Pause);
        assert!(machine.user_paused());

        let load = machine.change_track(TrackChange::Next).unwrap();
        assert!(load.autoplay.is_some());

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.position_seconds, 0.0);
        assert_eq!(snapshot.duration_seconds, None);
        assert!(!snapshot.user_paused);
        assert!(snapshot.is_loading);
    }

    #[test]
    fn select_out_of_range_is_noop() {
        let mut machine = machine(false);
        machine.mount();
        let generation = machine.generation();

        assert!(machine.change_track(TrackChange::Select(3)).is_none());
        assert!(machine.change_track(TrackChange::Select(0)).is_none());
        assert_eq!(machine.generation(), generation);
        assert_eq!(machine.snapshot().current_index, Some(0));

        let load = machine.change_track(TrackChange::Select(2)).unwrap();
        assert_eq!(load.track.id, "c");
    }

    #[test]
    fn selecting_current_track_rewinds_without_reload() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 200.0 }));
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 42.0 }));
        let generation = machine.generation();
        machine.drain_events();

        assert_eq!(machine.restart_if_selected(0), Some(0.0));
        assert_eq!(machine.snapshot().position_seconds, 0.0);
        assert_eq!(machine.generation(), generation);
        assert!(machine.drain_events().contains(&PlaybackEvent::PositionUpdate {
            position_seconds: 0.0,
            duration_seconds: Some(200.0),
        }));

        // Through the navigation entry point as well
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 30.0 }));
        assert!(machine.change_track(TrackChange::Select(0)).is_none());
        assert_eq!(machine.snapshot().position_seconds, 0.0);

        assert_eq!(machine.restart_if_selected(1), None);
    }

    #[test]
    fn prev_resets_position() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 200.0 }));
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 90.0 }));

        machine.change_track(TrackChange::Prev).unwrap();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 120.0 }));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.current_index, Some(2));
        assert_eq!(snapshot.position_seconds, 0.0);
    }

    #[test]
    fn shutdown_ignores_later_intents() {
        let mut machine = machine(true);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 200.0 }));
        machine.shutdown();
        let generation = machine.generation();

        assert!(machine.is_torn_down());
        assert_eq!(machine.toggle(), Toggle::Ignored);
        assert!(machine.change_track(TrackChange::Next).is_none());
        assert!(machine.change_track(TrackChange::Select(2)).is_none());
        assert!(machine.retry().is_none());
        assert!(machine.replace_playlist(vec![create_test_track("x")], 0).is_none());
        assert!(machine.mount().is_none());
        assert_eq!(machine.seek_to_fraction(0.5), None);

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(machine.generation(), generation);
    }

    #[test]
    fn prev_wraps_to_last_track() {
        let mut machine = machine(false);
        machine.mount();
        let load = machine.change_track(TrackChange::Prev).unwrap();
        assert_eq!(load.track.id, "c");
        assert_eq!(machine.snapshot().current_index, Some(2));
    }

    #[test]
    fn events_from_old_generation_are_ignored() {
        let mut machine = machine(false);
        machine.mount();
        let old = machine.generation();
        machine.change_track(TrackChange::Next);

        let outcome = machine.handle_event(TaggedEvent {
            generation: old,
            event: MediaEvent::Ended,
        });
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(machine.snapshot().current_index, Some(1));
    }

    #[test]
    fn ended_requests_advance() {
        let mut machine = machine(true);
        machine.mount();
        let outcome = machine.handle_event(event(&machine, MediaEvent::Ended));
        assert_eq!(outcome, EventOutcome::Advance);
    }

    #[test]
    fn media_error_is_terminal_until_retry() {
        let mut machine = machine(true);
        machine.mount();
        machine.handle_event(event(
            &machine,
            MediaEvent::Error {
                message: "decode failed".into(),
            },
        ));
        assert_eq!(machine.status(), PlaybackStatus::Error);

        // Readiness after an error does not resurrect the track
        let outcome = machine.handle_event(event(&machine, MediaEvent::CanPlay));
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(machine.status(), PlaybackStatus::Error);

        let load = machine.retry().unwrap();
        assert_eq!(load.track.id, "a");
        assert!(load.autoplay.is_some());
        assert_eq!(machine.status(), PlaybackStatus::Loading);
    }

    #[test]
    fn toggle_in_error_reloads_with_play() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(
            &machine,
            MediaEvent::Error {
                message: "404".into(),
            },
        ));

        let Toggle::Reload(load) = machine.toggle() else {
            panic!("expected reload");
        };
        assert_eq!(load.autoplay.unwrap().origin(), PlayOrigin::User);
    }

    #[test]
    fn play_rejection_after_error_keeps_error() {
        let mut machine = machine(true);
        let load = machine.change_track(TrackChange::Next).unwrap();
        machine.handle_event(event(
            &machine,
            MediaEvent::Error {
                message: "unsupported".into(),
            },
        ));

        machine.play_resolved(load.autoplay.unwrap(), Err(MediaError::Source("unsupported".into())));
        assert_eq!(machine.status(), PlaybackStatus::Error);
    }

    #[test]
    fn seek_clamps_to_bar_and_duration() {
        let mut machine = machine(false);
        machine.mount();
        let bar = BarGeometry::new(10.0, 100.0);

        // Unknown duration: nothing to seek into
        assert_eq!(machine.seek(60.0, bar), None);

        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 200.0 }));
        assert_eq!(machine.seek(60.0, bar), Some(100.0));
        assert_eq!(machine.snapshot().position_seconds, 100.0);
        assert_eq!(machine.snapshot().progress_fraction, 0.5);

        assert_eq!(machine.seek(500.0, bar), Some(200.0));
        assert_eq!(machine.seek_to_seconds(-4.0), Some(0.0));
    }

    #[test]
    fn time_update_is_clamped_to_duration() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::LoadedMetadata { duration: 30.0 }));
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 31.5 }));
        assert_eq!(machine.snapshot().position_seconds, 30.0);
    }

    #[test]
    fn position_reads_zero_before_metadata() {
        let mut machine = machine(false);
        machine.mount();
        machine.handle_event(event(&machine, MediaEvent::TimeUpdate { position: 3.0 }));

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.duration_seconds, None);
        assert_eq!(snapshot.position_seconds, 0.0);
        assert_eq!(snapshot.progress_fraction, 0.0);
    }

    #[test]
    fn volume_is_clamped_and_mute_silences_output() {
        let mut machine = machine(false);
        assert_eq!(machine.set_volume(1.8), 1.0);
        assert_eq!(machine.set_volume(-0.5), 0.0);
        machine.set_volume(0.6);

        assert_eq!(machine.toggle_mute(), 0.0);
        let snapshot = machine.snapshot();
        assert_eq!(snapshot.volume, 0.6);
        assert!(snapshot.muted);
    }

    #[test]
    fn empty_playlist_ignores_transport() {
        let mut machine = PlaybackMachine::new(Vec::new(), &PlayerConfig::default());
        assert!(machine.mount().is_none());
        assert_eq!(machine.toggle(), Toggle::Ignored);
        assert!(machine.change_track(TrackChange::Next).is_none());
        assert!(machine.change_track(TrackChange::Prev).is_none());
        assert!(machine.seek_to_fraction(0.5).is_none());

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert!(snapshot.current_track.is_none());
        assert_eq!(snapshot.current_index, None);
    }

    #[test]
    fn replace_playlist_keeps_user_pause() {
        let mut machine = machine(true);
        machine.mount();
        let Toggle::Play(ticket) = machine.toggle() else {
            panic!("expected play");
        };
        machine.play_resolved(ticket, Ok(()));
        machine.toggle();

        let load = machine
            .replace_playlist(vec![create_test_track("x"), create_test_track("y")], 1)
            .unwrap();
        assert_eq!(load.track.id, "y");
        assert!(load.autoplay.is_none());
        assert!(machine.user_paused());
        assert_eq!(machine.snapshot().total_tracks, 2);
    }

    #[test]
    fn replace_with_empty_playlist_goes_idle() {
        let mut machine = machine(false);
        machine.mount();
        assert!(machine.replace_playlist(Vec::new(), 0).is_none());
        assert_eq!(machine.status(), PlaybackStatus::Idle);
        assert_eq!(machine.snapshot().current_index, None);
    }

    #[test]
    fn track_change_queues_ui_events() {
        let mut machine = machine(false);
        machine.mount();
        machine.drain_events();

        machine.change_track(TrackChange::Next);
        let events = machine.drain_events();
        assert!(events.contains(&PlaybackEvent::TrackChanged {
            track_id: "b".into(),
            previous_track_id: Some("a".into()),
            index: 1,
        }));
        assert!(!machine.has_pending_events());
    }
}
