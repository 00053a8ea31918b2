//! Headless media resource
//!
//! Stands in for a browser audio element: it keeps a clock instead of
//! decoding audio, and emits lifecycle events only when told to. Used by the
//! CLI simulator and by tests, which can also script or hold `play()` results
//! to reproduce autoplay blocking and out-of-order resolutions.

use crate::{
    error::MediaError,
    media::{EventSink, ListenerId, MediaEvent, MediaResource},
};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::oneshot;

/// Duration reported for sources without an explicit one
pub const DEFAULT_DURATION_SECS: f64 = 180.0;

type PlayResult = Result<(), MediaError>;

/// Calls made on the resource, in order
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Load(String),
    Play,
    Pause,
    SetCurrentTime(f64),
    SetVolume(f64),
}

#[derive(Debug)]
struct SimState {
    source: Option<String>,
    metadata_loaded: bool,
    current_time: f64,
    volume: f64,
    paused: bool,

    durations: HashMap<String, f64>,
    failing_sources: HashSet<String>,

    // Platform autoplay restriction
    autoplay_blocked: bool,
    user_activated: bool,

    scripted: VecDeque<PlayResult>,
    held: VecDeque<oneshot::Receiver<PlayResult>>,

    listeners: Vec<(ListenerId, EventSink)>,
    calls: Vec<MediaCall>,
}

/// Scriptable in-memory media resource
#[derive(Debug)]
pub struct SimulatedMedia {
    state: RefCell<SimState>,
    next_listener: Cell<u64>,
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedMedia {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SimState {
                source: None,
                metadata_loaded: false,
                current_time: 0.0,
                volume: 1.0,
                paused: true,
                durations: HashMap::new(),
                failing_sources: HashSet::new(),
                autoplay_blocked: false,
                user_activated: false,
                scripted: VecDeque::new(),
                held: VecDeque::new(),
                listeners: Vec::new(),
                calls: Vec::new(),
            }),
            next_listener: Cell::new(1),
        }
    }

    // ===== Scripting =====

    pub fn set_duration(&self, source_uri: &str, seconds: f64) {
        self.state
            .borrow_mut()
            .durations
            .insert(source_uri.to_string(), seconds);
    }

    /// Make `source_uri` fail to load
    pub fn fail_source(&self, source_uri: &str) {
        self.state
            .borrow_mut()
            .failing_sources
            .insert(source_uri.to_string());
    }

    /// Refuse `play()` until [`SimulatedMedia::activate`] is called
    pub fn block_autoplay(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    /// Simulate a user gesture on the page
    pub fn activate(&self) {
        self.state.borrow_mut().user_activated = true;
    }

    /// Queue the result of a future `play()` call
    pub fn push_play_result(&self, result: PlayResult) {
        self.state.borrow_mut().scripted.push_back(result);
    }

    /// Hold the next `play()` call until the returned sender resolves it
    pub fn hold_next_play(&self) -> oneshot::Sender<PlayResult> {
        let (tx, rx) = oneshot::channel();
        self.state.borrow_mut().held.push_back(rx);
        tx
    }

    // ===== Event emission =====

    /// Deliver `event` to every bound listener
    pub fn emit(&self, event: MediaEvent) {
        let sinks: Vec<EventSink> = self
            .state
            .borrow()
            .listeners
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            sink.emit(event.clone());
        }
    }

    /// Finish loading the current source: metadata then `canplay`, or `error`
    pub fn finish_loading(&self) {
        let (failed, duration) = {
            let mut state = self.state.borrow_mut();
            let Some(source) = state.source.clone() else {
                return;
            };
            if state.failing_sources.contains(&source) {
                (true, f64::NAN)
            } else {
                state.metadata_loaded = true;
                let duration = state
                    .durations
                    .get(&source)
                    .copied()
                    .unwrap_or(DEFAULT_DURATION_SECS);
                (false, duration)
            }
        };

        if failed {
            self.emit(MediaEvent::Error {
                message: "source could not be decoded".to_string(),
            });
        } else {
            self.emit(MediaEvent::LoadedMetadata { duration });
            self.emit(MediaEvent::CanPlay);
        }
    }

    /// Advance the clock while playing; emits `timeupdate` and `ended`
    ///
    /// Returns false if nothing moved (paused or not loaded).
    pub fn advance(&self, seconds: f64) -> bool {
        let (position, ended) = {
            let mut state = self.state.borrow_mut();
            if state.paused || !state.metadata_loaded {
                return false;
            }
            let duration = state.current_duration();
            state.current_time = (state.current_time + seconds).min(duration);
            let ended = state.current_time >= duration;
            if ended {
                state.paused = true;
            }
            (state.current_time, ended)
        };

        self.emit(MediaEvent::TimeUpdate { position });
        if ended {
            self.emit(MediaEvent::Ended);
        }
        true
    }

    // ===== Inspection =====

    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    pub fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    pub fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.state.borrow().calls.clone()
    }

    pub fn play_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| **call == MediaCall::Play)
            .count()
    }
}

impl SimState {
    fn current_duration(&self) -> f64 {
        self.source
            .as_ref()
            .and_then(|source| self.durations.get(source).copied())
            .unwrap_or(DEFAULT_DURATION_SECS)
    }

    fn immediate_play_result(&mut self) -> PlayResult {
        if let Some(result) = self.scripted.pop_front() {
            return result;
        }
        if let Some(source) = &self.source {
            if self.failing_sources.contains(source) {
                return Err(MediaError::Source(format!("{source} is not playable")));
            }
        }
        if self.autoplay_blocked && !self.user_activated {
            return Err(MediaError::NotAllowed(
                "play() requires a user gesture".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl MediaResource for SimulatedMedia {
    fn load(&self, source_uri: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(MediaCall::Load(source_uri.to_string()));
        state.source = Some(source_uri.to_string());
        state.metadata_loaded = false;
        state.current_time = 0.0;
        state.paused = true;
    }

    async fn play(&self) -> PlayResult {
        let held = {
            let mut state = self.state.borrow_mut();
            state.calls.push(MediaCall::Play);
            state.held.pop_front()
        };

        let result = match held {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(MediaError::Aborted("play request dropped".to_string()))),
            None => self.state.borrow_mut().immediate_play_result(),
        };

        if result.is_ok() {
            self.state.borrow_mut().paused = false;
        }
        result
    }

    fn pause(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.push(MediaCall::Pause);
        state.paused = true;
    }

    fn set_current_time(&self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.calls.push(MediaCall::SetCurrentTime(seconds));
        state.current_time = seconds;
    }

    fn set_volume(&self, volume: f64) {
        let mut state = self.state.borrow_mut();
        state.calls.push(MediaCall::SetVolume(volume));
        state.volume = volume;
    }

    fn duration(&self) -> f64 {
        let state = self.state.borrow();
        if state.metadata_loaded {
            state.current_duration()
        } else {
            f64::NAN
        }
    }

    fn add_listener(&self, sink: EventSink) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.state.borrow_mut().listeners.push((id, sink));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener, _)| *listener != id);
    }
}
