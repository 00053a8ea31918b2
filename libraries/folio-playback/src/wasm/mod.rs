//! WASM bindings for folio-playback
//!
//! Binds the engine to an `<audio>` element so the floating player on the
//! blog can drive it from JavaScript.

pub mod media;
pub mod player;

pub use media::HtmlAudioMedia;
pub use player::WasmPlayer;
