//! Media resource contract
//!
//! The host environment supplies the actual playable resource (an
//! `HtmlAudioElement` in the browser, [`crate::sim::SimulatedMedia`] headless).
//! The engine only drives it through this trait and listens to the events it
//! reports.

use crate::error::MediaError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Identifies one bound set of listeners; bumped on every track change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Handle returned by [`MediaResource::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Lifecycle events reported by a media resource
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration became known (`loadedmetadata`)
    LoadedMetadata { duration: f64 },

    /// Playback position advanced (`timeupdate`)
    TimeUpdate { position: f64 },

    /// Enough data is buffered to start (`canplay`)
    CanPlay,

    /// The track played to its end
    Ended,

    /// The source failed to load or decode
    Error { message: String },
}

/// Event tagged with the generation of the binding that delivered it
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub generation: Generation,
    pub event: MediaEvent,
}

/// Delivery end of a listener binding
///
/// Adapters call [`EventSink::emit`] from their native event callbacks.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: Generation, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Forward an event to the engine; returns false once the engine is torn down
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// A single playable audio resource
///
/// Methods take `&self` because the resource is driven from a single-threaded
/// event loop while a `play()` may still be pending.
#[async_trait(?Send)]
pub trait MediaResource {
    /// Point the resource at a new source and start loading it
    fn load(&self, source_uri: &str);

    /// Start playback; rejects when the platform refuses or the load is interrupted
    async fn play(&self) -> Result<(), MediaError>;

    fn pause(&self);

    fn set_current_time(&self, seconds: f64);

    fn set_volume(&self, volume: f64);

    /// Duration in seconds, NaN until metadata is available
    ///
    /// Read back when a `loadedmetadata` event carries no usable duration.
    fn duration(&self) -> f64;

    /// Subscribe `sink` to `timeupdate`, `loadedmetadata`, `canplay`, `ended` and `error`
    fn add_listener(&self, sink: EventSink) -> ListenerId;

    /// Remove every callback registered under `id`
    fn remove_listener(&self, id: ListenerId);
}
