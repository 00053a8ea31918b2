//! Player - wires the state machine to a media resource
//!
//! The player exclusively owns the media resource. Intents go through the
//! [`PlaybackMachine`] first; whatever it decides is then carried out on the
//! resource. Asynchronous results (`play()` resolutions, media events) are
//! fed back into the machine, which filters out anything stale.
//!
//! All methods take `&self` so a single player can be shared by the UI and
//! the event loop on one thread. The machine is never borrowed across an
//! `.await`.

use crate::{
    config::PlayerConfig,
    events::PlaybackEvent,
    machine::{EventOutcome, PlayTicket, PlaybackMachine, Toggle, TrackChange, TrackLoad},
    media::{EventSink, ListenerId, MediaEvent, MediaResource, TaggedEvent},
    types::{BarGeometry, PlaybackSnapshot, Track},
};
use std::cell::{Cell, RefCell};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Playback engine bound to one media resource
pub struct Player<M: MediaResource> {
    media: M,
    machine: RefCell<PlaybackMachine>,

    // Listener binding for the current generation
    listener: Cell<Option<ListenerId>>,

    // Media events flow adapter -> sink -> channel -> player
    events_tx: RefCell<Option<mpsc::UnboundedSender<TaggedEvent>>>,
    events_rx: Mutex<mpsc::UnboundedReceiver<TaggedEvent>>,
}

impl<M: MediaResource> Player<M> {
    /// Create a player; nothing is loaded until [`Player::mount`]
    pub fn new(media: M, tracks: Vec<Track>, config: PlayerConfig) -> Self {
        let machine = PlaybackMachine::new(tracks, &config);
        media.set_volume(machine.volume_output());

        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            media,
            machine: RefCell::new(machine),
            listener: Cell::new(None),
            events_tx: RefCell::new(Some(tx)),
            events_rx: Mutex::new(rx),
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    // ===== Lifecycle =====

    /// Load the initial track
    ///
    /// Autoplay, if enabled, waits for the resource to report `canplay`.
    pub async fn mount(&self) {
        let load = self.machine.borrow_mut().mount();
        if let Some(load) = load {
            self.apply_load(load).await;
        }
    }

    /// Bind listeners for the current generation, replacing any previous binding
    pub fn attach(&self) {
        self.detach();

        let generation = self.machine.borrow().generation();
        let tx = self.events_tx.borrow().clone();
        let Some(tx) = tx else {
            debug!("Player torn down, not attaching listeners");
            return;
        };

        let id = self.media.add_listener(EventSink::new(generation, tx));
        self.listener.set(Some(id));
        debug!("Attached listeners for generation {}", generation.value());
    }

    /// Remove the current listener binding, if any
    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.media.remove_listener(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listener.get().is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.machine.borrow().is_torn_down()
    }

    /// Stop playback, detach listeners and close the event channel
    ///
    /// Intents issued afterwards are ignored.
    pub fn teardown(&self) {
        self.machine.borrow_mut().shutdown();
        self.media.pause();
        self.detach();
        self.events_tx.borrow_mut().take();
        debug!("Player torn down");
    }

    // ===== Intents =====

    pub async fn toggle_play_pause(&self) {
        let toggle = self.machine.borrow_mut().toggle();
        match toggle {
            Toggle::Pause => self.media.pause(),
            Toggle::Play(ticket) => self.play(ticket).await,
            Toggle::Reload(load) => self.apply_load(load).await,
            Toggle::Ignored => {}
        }
    }

    pub async fn next(&self) {
        self.change_track(TrackChange::Next).await;
    }

    pub async fn prev(&self) {
        self.change_track(TrackChange::Prev).await;
    }

    /// Jump to `index`; out-of-range indices are ignored
    ///
    /// Selecting the track that is already playing rewinds it.
    pub async fn select_track(&self, index: usize) {
        let restart = self.machine.borrow_mut().restart_if_selected(index);
        if let Some(position) = restart {
            self.media.set_current_time(position);
            return;
        }
        self.change_track(TrackChange::Select(index)).await;
    }

    /// Reload the current track after a media error
    pub async fn retry(&self) {
        let load = self.machine.borrow_mut().retry();
        if let Some(load) = load {
            self.apply_load(load).await;
        }
    }

    /// Replace the playlist
    ///
    /// Playback is paused first as an explicit user pause, so the new list
    /// does not start on its own.
    pub async fn switch_playlist(&self, tracks: Vec<Track>, initial_index: usize) {
        if self.is_torn_down() {
            return;
        }
        if self.snapshot().is_playing() {
            self.toggle_play_pause().await;
        }

        let load = self
            .machine
            .borrow_mut()
            .replace_playlist(tracks, initial_index);
        match load {
            Some(load) => self.apply_load(load).await,
            None => {
                self.media.pause();
                self.detach();
            }
        }
    }

    /// Seek from a click at `click_x` on a progress bar with the given geometry
    pub fn seek_to(&self, click_x: f64, bar: BarGeometry) {
        let position = self.machine.borrow_mut().seek(click_x, bar);
        if let Some(position) = position {
            self.media.set_current_time(position);
        }
    }

    pub fn seek_to_fraction(&self, fraction: f64) {
        let position = self.machine.borrow_mut().seek_to_fraction(fraction);
        if let Some(position) = position {
            self.media.set_current_time(position);
        }
    }

    pub fn seek_to_seconds(&self, seconds: f64) {
        let position = self.machine.borrow_mut().seek_to_seconds(seconds);
        if let Some(position) = position {
            self.media.set_current_time(position);
        }
    }

    /// Set volume, clamped to `[0, 1]`
    pub fn set_volume(&self, level: f64) {
        let output = self.machine.borrow_mut().set_volume(level);
        self.media.set_volume(output);
    }

    pub fn set_muted(&self, muted: bool) {
        let output = self.machine.borrow_mut().set_muted(muted);
        self.media.set_volume(output);
    }

    pub fn toggle_mute(&self) {
        let output = self.machine.borrow_mut().toggle_mute();
        self.media.set_volume(output);
    }

    pub fn set_autoplay(&self, enabled: bool) {
        self.machine.borrow_mut().set_autoplay(enabled);
    }

    // ===== State Queries =====

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.machine.borrow().snapshot()
    }

    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.machine.borrow_mut().drain_events()
    }

    // ===== Event loop =====

    /// Process every media event queued so far; returns how many were handled
    ///
    /// Not to be mixed with [`Player::run`], which holds the receiver.
    pub async fn dispatch_pending(&self) -> usize {
        let mut handled = 0;
        loop {
            let tagged = {
                let mut rx = self.events_rx.lock().await;
                rx.try_recv().ok()
            };
            let Some(tagged) = tagged else {
                break;
            };
            self.handle_event(tagged).await;
            handled += 1;
        }
        handled
    }

    /// Wait for the next media event and handle it
    ///
    /// Returns false once the player has been torn down.
    pub async fn process_next(&self) -> bool {
        let tagged = {
            let mut rx = self.events_rx.lock().await;
            rx.recv().await
        };
        match tagged {
            Some(tagged) => {
                self.handle_event(tagged).await;
                true
            }
            None => false,
        }
    }

    /// Process media events until the player is torn down
    pub async fn run(&self) {
        while self.process_next().await {}
        debug!("Event loop finished");
    }

    async fn handle_event(&self, mut tagged: TaggedEvent) {
        // Adapters that cannot read the duration at dispatch time report NaN
        if let MediaEvent::LoadedMetadata { duration } = &mut tagged.event {
            if !duration.is_finite() {
                *duration = self.media.duration();
            }
        }

        let outcome = self.machine.borrow_mut().handle_event(tagged);
        match outcome {
            // Continuous playback: the autoplay policy decides whether the next track plays
            EventOutcome::Advance => self.next().await,
            EventOutcome::Play(ticket) => self.play(ticket).await,
            EventOutcome::Applied | EventOutcome::Ignored => {}
        }
    }

    // ===== Internal =====

    async fn change_track(&self, change: TrackChange) {
        let load = self.machine.borrow_mut().change_track(change);
        if let Some(load) = load {
            self.apply_load(load).await;
        }
    }

    async fn apply_load(&self, load: TrackLoad) {
        self.media.pause();
        // Bind before loading so every event of the new source carries the new generation
        self.attach();
        self.media.set_current_time(0.0);
        self.media.load(&load.track.source_uri);

        if let Some(ticket) = load.autoplay {
            self.play(ticket).await;
        }
    }

    async fn play(&self, ticket: PlayTicket) {
        let result = self.media.play().await;
        self.machine.borrow_mut().play_resolved(ticket, result);
    }
}
