//! `MediaElement` over an `HtmlAudioElement`.
//!
//! Lifecycle listeners are installed as `wasm-bindgen` closures and kept
//! alive by the element wrapper until the observer is cleared.

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult,
    web::{ElementEvent, MediaElement},
    PlatformCallback,
};
use std::cell::RefCell;
use std::time::Duration;
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAudioElement, HtmlMediaElement, MediaError};

use crate::error::{js_message, WasmError};

const OBSERVED_EVENTS: [&str; 6] = [
    "playing",
    "pause",
    "ended",
    "error",
    "waiting",
    "canplaythrough",
];

type Listener = Closure<dyn FnMut(Event)>;

/// A detached `<audio>` element.
pub struct WasmAudioElement {
    audio: HtmlAudioElement,
    listeners: RefCell<Vec<(&'static str, Listener)>>,
}

impl WasmAudioElement {
    /// Create a fresh element that is not attached to the document.
    pub fn new() -> Result<Self, WasmError> {
        let audio = HtmlAudioElement::new()?;
        audio.set_preload("auto");
        Ok(Self {
            audio,
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// The underlying element, for demuxers that attach to it.
    pub fn media(&self) -> HtmlMediaElement {
        self.audio.clone().unchecked_into()
    }

    fn remove_listeners(&self) {
        for (name, listener) in self.listeners.borrow_mut().drain(..) {
            let _ = self
                .audio
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
    }

    fn translate(audio: &HtmlAudioElement, name: &str) -> Option<ElementEvent> {
        match name {
            "playing" => Some(ElementEvent::Playing),
            "pause" => Some(ElementEvent::Pause),
            "ended" => Some(ElementEvent::Ended),
            "waiting" => Some(ElementEvent::Waiting),
            "canplaythrough" => Some(ElementEvent::CanPlayThrough),
            "error" => Some(ElementEvent::Error(media_error_message(audio.error()))),
            _ => None,
        }
    }
}

impl Drop for WasmAudioElement {
    fn drop(&mut self) {
        self.remove_listeners();
    }
}

/// Names a `MediaError` the way browsers report it.
fn media_error_message(error: Option<MediaError>) -> String {
    let Some(error) = error else {
        return "MEDIA_ERR_UNKNOWN".to_string();
    };

    let code = match error.code() {
        MediaError::MEDIA_ERR_ABORTED => "MEDIA_ERR_ABORTED",
        MediaError::MEDIA_ERR_NETWORK => "MEDIA_ERR_NETWORK",
        MediaError::MEDIA_ERR_DECODE => "MEDIA_ERR_DECODE",
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => "MEDIA_ERR_SRC_NOT_SUPPORTED",
        _ => "MEDIA_ERR_UNKNOWN",
    };

    let detail = error.message();
    if detail.is_empty() {
        code.to_string()
    } else {
        format!("{}: {}", code, detail)
    }
}

/// Converts element seconds to a duration; `NaN`, infinity and values out of
/// range mean unknown.
fn finite_seconds(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds).ok()
}

#[async_trait(?Send)]
impl MediaElement for WasmAudioElement {
    fn set_observer(&self, observer: Option<PlatformCallback<ElementEvent>>) {
        self.remove_listeners();
        let Some(observer) = observer else {
            return;
        };

        let mut listeners = self.listeners.borrow_mut();
        for name in OBSERVED_EVENTS {
            let audio = self.audio.clone();
            let observer = observer.clone();
            let listener: Listener = Closure::new(move |_event: Event| {
                if let Some(event) = Self::translate(&audio, name) {
                    observer(event);
                }
            });

            if self
                .audio
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
                .is_ok()
            {
                listeners.push((name, listener));
            } else {
                debug!(event = name, "Could not observe media element event");
            }
        }
    }

    fn set_source(&self, url: &str) -> BridgeResult<()> {
        self.audio.set_src(url);
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self
            .audio
            .play()
            .map_err(|err| WasmError::Rejected(js_message(&err)))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| WasmError::Rejected(js_message(&err)).into())
    }

    fn pause(&self) {
        let _ = self.audio.pause();
    }

    fn current_time(&self) -> Duration {
        finite_seconds(self.audio.current_time()).unwrap_or_default()
    }

    fn set_current_time(&self, position: Duration) {
        self.audio.set_current_time(position.as_secs_f64());
    }

    fn duration(&self) -> Option<Duration> {
        finite_seconds(self.audio.duration())
    }

    fn is_paused(&self) -> bool {
        self.audio.paused()
    }

    fn set_volume(&self, volume: f32) {
        self.audio.set_volume(f64::from(volume.clamp(0.0, 1.0)));
    }

    fn set_playback_rate(&self, rate: f32) {
        self.audio.set_playback_rate(f64::from(rate));
    }

    fn reset(&self) {
        let _ = self.audio.remove_attribute("src");
        self.audio.load();
        self.audio.set_current_time(0.0);
    }
}
