//! WebAssembly bindings for the playback session.
//!
//! Exposes [`PlaybackSession`] to JavaScript as the `RemoteStreamer` class.
//! Commands return promises; options, snapshots and events cross the
//! boundary as plain objects through `serde-wasm-bindgen`.
//!
//! ```js
//! const streamer = new RemoteStreamer({ clientInfo: { appName: "Radio", appVersion: "1.0" } });
//! streamer.addListener("timeUpdate", (event) => console.log(event.currentTime));
//! await streamer.play("https://example.com/live.m3u8", { enableCommandCenter: true });
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::media_session::{ClientInfo, NowPlayingInfo};
use bridge_traits::time::LogLevel;
use core_runtime::config::{PlaybackSettings, StreamerConfig};
use core_runtime::events::{EventKind, ListenerHandle, PlaybackEvent};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use js_sys::{Function, Promise};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::error::PlaybackError;
use crate::session::{PlayOptions, PlaybackSession};

/// Enable Rust logging to the browser console.
///
/// Call once at startup; later calls are ignored.
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging(verbose: Option<bool>) {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();

    let level = if verbose.unwrap_or(false) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(level);

    if init_logging(config).is_err() {
        web_sys::console::debug_1(&"Console logging already enabled".into());
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsStreamerOptions {
    settings: Option<PlaybackSettings>,
    client_info: Option<ClientInfo>,
}

fn to_js_error(err: PlaybackError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn from_js<T>(value: JsValue) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| js_sys::Error::new(&format!("Invalid options: {err}")).into())
}

fn parse_event_kind(name: &str) -> Option<EventKind> {
    let kind = match name {
        "play" => EventKind::Play,
        "pause" => EventKind::Pause,
        "stop" => EventKind::Stop,
        "timeUpdate" => EventKind::TimeUpdate,
        "buffering" => EventKind::Buffering,
        "error" => EventKind::Error,
        "metadata" => EventKind::Metadata,
        _ => return None,
    };
    Some(kind)
}

/// JavaScript handle to a remote audio streaming session.
#[wasm_bindgen(js_name = RemoteStreamer)]
pub struct JsRemoteStreamer {
    session: PlaybackSession,
    listeners: RefCell<HashMap<u32, ListenerHandle>>,
    next_listener: Cell<u32>,
}

#[wasm_bindgen(js_class = RemoteStreamer)]
impl JsRemoteStreamer {
    /// Build a session on the page's `<audio>` elements and media session.
    ///
    /// `options` may carry `settings` and `clientInfo`; both are optional.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsRemoteStreamer, JsValue> {
        let options: JsStreamerOptions = from_js(options)?;
        let bridges = bridge_wasm::build_wasm_bridges()
            .map_err(|err| JsValue::from(js_sys::Error::new(&err.to_string())))?;

        let mut builder = StreamerConfig::builder()
            .platform(bridges.platform())
            .http_client(bridges.http())
            .remote_command_center(Arc::clone(&bridges.remote_command_center))
            .now_playing_center(Arc::clone(&bridges.now_playing_center));
        if let Some(settings) = options.settings {
            builder = builder.settings(settings);
        }
        if let Some(client_info) = options.client_info {
            builder = builder.client_info(client_info);
        }
        let config = builder
            .build()
            .map_err(|err| JsValue::from(js_sys::Error::new(&err.to_string())))?;

        let session = PlaybackSession::new(config).map_err(to_js_error)?;
        Ok(Self {
            session,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(1),
        })
    }

    /// Start streaming `url`, replacing any current stream.
    pub fn play(&self, url: String, options: JsValue) -> Promise {
        let session = self.session.clone();
        let options: Result<PlayOptions, JsValue> = from_js(options);
        future_to_promise(async move {
            session.play(url, options?).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn pause(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.pause().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn resume(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.resume().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn stop(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.stop().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Seek to an absolute position in seconds.
    #[wasm_bindgen(js_name = seekTo)]
    pub fn seek_to(&self, position: f64) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.seek_to(position).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Seek relative to the current position, in seconds.
    #[wasm_bindgen(js_name = seekBy)]
    pub fn seek_by(&self, offset: f64) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.seek_by(offset).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f32) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.set_volume(volume).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f32) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.set_playback_rate(rate).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves to `true` while audio is audibly advancing.
    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let playing = session.is_playing().await.map_err(to_js_error)?;
            Ok(JsValue::from_bool(playing))
        })
    }

    /// Resolves to a snapshot object (`url`, `state`, `currentTime`, ...).
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let snapshot = session.snapshot().await.map_err(to_js_error)?;
            serde_wasm_bindgen::to_value(&snapshot).map_err(JsValue::from)
        })
    }

    #[wasm_bindgen(js_name = setNowPlayingInfo)]
    pub fn set_now_playing_info(&self, info: JsValue) -> Promise {
        let session = self.session.clone();
        let info: Result<NowPlayingInfo, JsValue> = from_js(info);
        future_to_promise(async move {
            session
                .set_now_playing_info(info?)
                .await
                .map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Register `callback` for `eventName`, or for every event when the
    /// name is `"*"`. Returns an id for [`remove_listener`](Self::remove_listener).
    #[wasm_bindgen(js_name = addListener)]
    pub fn add_listener(&self, event_name: &str, callback: Function) -> Result<u32, JsValue> {
        let forward = move |event: PlaybackEvent| match serde_wasm_bindgen::to_value(&event) {
            Ok(value) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                    tracing::warn!(error = ?err, "Event listener threw");
                }
            }
            Err(err) => tracing::warn!(error = %err, "Could not convert event"),
        };

        let handle = if event_name == "*" {
            self.session.add_any_listener(Arc::new(forward))
        } else {
            let kind = parse_event_kind(event_name).ok_or_else(|| {
                JsValue::from(js_sys::Error::new(&format!("Unknown event: {event_name}")))
            })?;
            self.session.add_listener(kind, Arc::new(forward))
        };

        let id = self.next_listener.get();
        self.next_listener.set(id.wrapping_add(1));
        self.listeners.borrow_mut().insert(id, handle);
        Ok(id)
    }

    /// Returns `false` if no listener has this id.
    #[wasm_bindgen(js_name = removeListener)]
    pub fn remove_listener(&self, id: u32) -> bool {
        self.listeners
            .borrow_mut()
            .remove(&id)
            .map_or(false, |handle| handle.remove())
    }

    #[wasm_bindgen(js_name = removeAllListeners)]
    pub fn remove_all_listeners(&self) {
        self.listeners.borrow_mut().clear();
        self.session.remove_all_listeners();
    }

    /// Stop playback and release the media session. The object is unusable
    /// afterwards; commands reject with `SessionClosed`.
    pub fn shutdown(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            session.shutdown().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn event_names_match_emitted_kinds() {
        for kind in [
            EventKind::Play,
            EventKind::Pause,
            EventKind::Stop,
            EventKind::TimeUpdate,
            EventKind::Buffering,
            EventKind::Error,
            EventKind::Metadata,
        ] {
            assert_eq!(parse_event_kind(kind.as_str()), Some(kind));
        }
        assert_eq!(parse_event_kind("ended"), None);
    }

    #[wasm_bindgen_test]
    fn missing_options_use_defaults() {
        let options: PlayOptions = from_js(JsValue::UNDEFINED).expect("defaults");
        assert_eq!(options, PlayOptions::default());
    }
}
