//! JavaScript-facing player

use super::media::HtmlAudioMedia;
use crate::{
    config::PlayerConfig,
    format::format_time,
    player::Player,
    types::{BarGeometry, Track},
};
use js_sys::{Function, Promise};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::HtmlAudioElement;

/// WASM-compatible player
///
/// Wraps [`Player`] over an audio element. Intents that may call `play()`
/// return a `Promise` that settles once the engine has applied the result.
#[wasm_bindgen]
pub struct WasmPlayer {
    inner: Rc<Player<HtmlAudioMedia>>,
    on_event: Rc<RefCell<Option<Function>>>,
}

fn parse_tracks(tracks: JsValue) -> Result<Vec<Track>, JsValue> {
    serde_wasm_bindgen::from_value(tracks)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse tracks: {}", e)))
}

fn parse_config(config: JsValue) -> Result<PlayerConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(PlayerConfig::default());
    }
    let config: PlayerConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Create a player over `element`, or a fresh audio element when omitted
    #[wasm_bindgen(constructor)]
    pub fn new(
        tracks: JsValue,
        config: JsValue,
        element: Option<HtmlAudioElement>,
    ) -> Result<WasmPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let tracks = parse_tracks(tracks)?;
        let config = parse_config(config)?;
        let media = match element {
            Some(element) => HtmlAudioMedia::from_element(element),
            None => HtmlAudioMedia::new()?,
        };

        Ok(Self {
            inner: Rc::new(Player::new(media, tracks, config)),
            on_event: Rc::new(RefCell::new(None)),
        })
    }

    // ===== Lifecycle =====

    /// Load the initial track and start the media event loop
    pub fn mount(&self) -> Promise {
        let player = Rc::clone(&self.inner);
        let on_event = Rc::clone(&self.on_event);
        spawn_local(async move {
            while player.process_next().await {
                notify(&player, &on_event);
            }
        });

        self.intent(|player| async move { player.mount().await })
    }

    /// Stop playback and release the audio element's listeners
    pub fn teardown(&self) {
        self.inner.teardown();
        self.flush();
    }

    // ===== Playback Control =====

    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) -> Promise {
        self.intent(|player| async move { player.toggle_play_pause().await })
    }

    pub fn next(&self) -> Promise {
        self.intent(|player| async move { player.next().await })
    }

    pub fn prev(&self) -> Promise {
        self.intent(|player| async move { player.prev().await })
    }

    #[wasm_bindgen(js_name = selectTrack)]
    pub fn select_track(&self, index: usize) -> Promise {
        self.intent(move |player| async move { player.select_track(index).await })
    }

    pub fn retry(&self) -> Promise {
        self.intent(|player| async move { player.retry().await })
    }

    /// Replace the playlist
    #[wasm_bindgen(js_name = switchPlaylist)]
    pub fn switch_playlist(&self, tracks: JsValue, initial_index: usize) -> Result<Promise, JsValue> {
        let tracks = parse_tracks(tracks)?;
        Ok(self.intent(move |player| async move {
            player.switch_playlist(tracks, initial_index).await
        }))
    }

    // ===== Seeking =====

    /// Seek from a click on the progress bar (viewport coordinates)
    #[wasm_bindgen(js_name = seekTo)]
    pub fn seek_to(&self, click_x: f64, bar_left: f64, bar_width: f64) {
        self.inner.seek_to(
            click_x,
            BarGeometry {
                left: bar_left,
                width: bar_width,
            },
        );
        self.flush();
    }

    #[wasm_bindgen(js_name = seekToFraction)]
    pub fn seek_to_fraction(&self, fraction: f64) {
        self.inner.seek_to_fraction(fraction);
        self.flush();
    }

    // ===== Volume Control =====

    /// Set volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, level: f64) {
        self.inner.set_volume(level);
        self.flush();
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, muted: bool) {
        self.inner.set_muted(muted);
        self.flush();
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) {
        self.inner.toggle_mute();
        self.flush();
    }

    #[wasm_bindgen(js_name = setAutoplay)]
    pub fn set_autoplay(&self, enabled: bool) {
        self.inner.set_autoplay(enabled);
    }

    // ===== State Queries =====

    /// Current state as a plain object for rendering
    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).unwrap_or(JsValue::NULL)
    }

    /// Take queued events without a callback registered
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.drain_events()).unwrap_or(JsValue::NULL)
    }

    /// Format seconds as `m:ss`
    #[wasm_bindgen(js_name = formatTime)]
    pub fn format_time(seconds: f64) -> String {
        format_time(seconds)
    }

    // ===== Event Listeners =====

    /// Register a callback receiving every engine event
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: Function) {
        *self.on_event.borrow_mut() = Some(callback);
        self.flush();
    }

    // ===== Internal =====

    fn intent<F, Fut>(&self, op: F) -> Promise
    where
        F: FnOnce(Rc<Player<HtmlAudioMedia>>) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        let player = Rc::clone(&self.inner);
        let on_event = Rc::clone(&self.on_event);
        let fut = op(Rc::clone(&player));
        future_to_promise(async move {
            fut.await;
            notify(&player, &on_event);
            Ok(JsValue::UNDEFINED)
        })
    }

    fn flush(&self) {
        notify(&self.inner, &self.on_event);
    }
}

/// Hand queued events to the registered callback, if any
fn notify(player: &Player<HtmlAudioMedia>, on_event: &RefCell<Option<Function>>) {
    let callback = on_event.borrow().clone();
    let Some(callback) = callback else {
        return;
    };
    for event in player.drain_events() {
        if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
            callback.call1(&JsValue::NULL, &value).ok();
        }
    }
}
