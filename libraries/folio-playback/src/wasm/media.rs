//! `<audio>` element adapter

use crate::{
    error::MediaError,
    media::{EventSink, ListenerId, MediaEvent, MediaResource},
};
use async_trait::async_trait;
use js_sys::Reflect;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tracing::debug;
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAudioElement};

type Handler = Closure<dyn FnMut(Event)>;

const EVENT_NAMES: [&str; 5] = ["loadedmetadata", "timeupdate", "canplay", "ended", "error"];

/// Media resource backed by an `HtmlAudioElement`
pub struct HtmlAudioMedia {
    element: HtmlAudioElement,

    // Closures must outlive their registration on the element
    handlers: RefCell<HashMap<ListenerId, Vec<(&'static str, Handler)>>>,
    next_listener: Cell<u64>,
}

impl HtmlAudioMedia {
    /// Create a detached audio element with metadata preloading
    pub fn new() -> Result<Self, JsValue> {
        let element = HtmlAudioElement::new()?;
        element.set_preload("metadata");
        Ok(Self::from_element(element))
    }

    /// Wrap an element that already lives in the page
    pub fn from_element(element: HtmlAudioElement) -> Self {
        Self {
            element,
            handlers: RefCell::new(HashMap::new()),
            next_listener: Cell::new(1),
        }
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

fn build_handler(element: HtmlAudioElement, sink: EventSink, name: &'static str) -> Handler {
    Closure::wrap(Box::new(move |_event: Event| {
        let event = match name {
            "loadedmetadata" => MediaEvent::LoadedMetadata {
                duration: element.duration(),
            },
            "timeupdate" => MediaEvent::TimeUpdate {
                position: element.current_time(),
            },
            "canplay" => MediaEvent::CanPlay,
            "ended" => MediaEvent::Ended,
            _ => MediaEvent::Error {
                message: element
                    .error()
                    .map(|err| format!("media error code {}", err.code()))
                    .unwrap_or_else(|| "media error".to_string()),
            },
        };
        sink.emit(event);
    }) as Box<dyn FnMut(Event)>)
}

/// Map a rejected `play()` promise to a [`MediaError`] by its DOMException name
fn classify_rejection(error: &JsValue) -> MediaError {
    let field = |key: &str| {
        Reflect::get(error, &JsValue::from_str(key))
            .ok()
            .and_then(|value| value.as_string())
    };
    let message = field("message").unwrap_or_else(|| format!("{error:?}"));

    match field("name").as_deref() {
        Some("NotAllowedError") => MediaError::NotAllowed(message),
        Some("AbortError") => MediaError::Aborted(message),
        _ => MediaError::Source(message),
    }
}

#[async_trait(?Send)]
impl MediaResource for HtmlAudioMedia {
    fn load(&self, source_uri: &str) {
        self.element.set_src(source_uri);
        self.element.load();
    }

    async fn play(&self) -> Result<(), MediaError> {
        let promise = self
            .element
            .play()
            .map_err(|err| classify_rejection(&err))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| classify_rejection(&err))
    }

    fn pause(&self) {
        if let Err(err) = self.element.pause() {
            debug!("pause() failed: {:?}", err);
        }
    }

    fn set_current_time(&self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn add_listener(&self, sink: EventSink) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let mut registered = Vec::with_capacity(EVENT_NAMES.len());
        for name in EVENT_NAMES {
            let handler = build_handler(self.element.clone(), sink.clone(), name);
            match self
                .element
                .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
            {
                Ok(()) => registered.push((name, handler)),
                Err(err) => debug!("Failed to bind {} listener: {:?}", name, err),
            }
        }

        self.handlers.borrow_mut().insert(id, registered);
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some(registered) = self.handlers.borrow_mut().remove(&id) else {
            return;
        };
        for (name, handler) in registered {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
        }
    }
}

impl Drop for HtmlAudioMedia {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.handlers.borrow().keys().copied().collect();
        for id in ids {
            self.remove_listener(id);
        }
    }
}
