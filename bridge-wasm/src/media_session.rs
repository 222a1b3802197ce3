//! `navigator.mediaSession` as remote command center and now-playing display.
//!
//! The Media Session API is reached through `Reflect` so the bridge degrades
//! to a no-op in browsers that lack it.

use bridge_traits::{
    media_session::{
        NowPlayingCenter, NowPlayingInfo, NowPlayingStatus, RemoteCommand, RemoteCommandCenter,
        RemoteCommandEvent,
    },
    PlatformCallback,
};
use bytes::Bytes;
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Blob, Url};

use crate::error::js_message;

type ActionHandler = Closure<dyn FnMut(JsValue)>;

/// Browser media session for the current page.
pub struct WebMediaSession {
    session: Option<JsValue>,
    handler: Rc<RefCell<Option<PlatformCallback<RemoteCommandEvent>>>>,
    actions: RefCell<HashMap<&'static str, ActionHandler>>,
    metadata: RefCell<Option<Object>>,
    artwork_url: RefCell<Option<String>>,
    duration: RefCell<Option<f64>>,
}

/// Media Session action for a remote command. Toggle has no web action.
fn action_name(command: RemoteCommand) -> Option<&'static str> {
    match command {
        RemoteCommand::Play => Some("play"),
        RemoteCommand::Pause => Some("pause"),
        RemoteCommand::TogglePlayPause => None,
        RemoteCommand::ChangePlaybackPosition => Some("seekto"),
        RemoteCommand::SkipForward => Some("nexttrack"),
        RemoteCommand::SkipBackward => Some("previoustrack"),
        RemoteCommand::SeekForward => Some("seekforward"),
        RemoteCommand::SeekBackward => Some("seekbackward"),
    }
}

fn event_for(action: &str, details: &JsValue) -> Option<RemoteCommandEvent> {
    let event = match action {
        "play" => RemoteCommandEvent::Play,
        "pause" => RemoteCommandEvent::Pause,
        "seekto" => {
            let seconds = Reflect::get(details, &JsValue::from_str("seekTime"))
                .ok()
                .and_then(|value| value.as_f64())?;
            RemoteCommandEvent::ChangePlaybackPosition(Duration::try_from_secs_f64(seconds).ok()?)
        }
        "nexttrack" => RemoteCommandEvent::SkipForward,
        "previoustrack" => RemoteCommandEvent::SkipBackward,
        "seekforward" => RemoteCommandEvent::SeekForward,
        "seekbackward" => RemoteCommandEvent::SeekBackward,
        _ => return None,
    };
    Some(event)
}

impl WebMediaSession {
    /// Bind to the page's media session, if the browser has one.
    pub fn new() -> Self {
        let session = web_sys::window()
            .map(|window| JsValue::from(window.navigator()))
            .and_then(|navigator| Reflect::get(&navigator, &JsValue::from_str("mediaSession")).ok())
            .filter(|session| !session.is_undefined() && !session.is_null());

        if session.is_none() {
            debug!("Media Session API unavailable");
        }

        Self {
            session,
            handler: Rc::new(RefCell::new(None)),
            actions: RefCell::new(HashMap::new()),
            metadata: RefCell::new(None),
            artwork_url: RefCell::new(None),
            duration: RefCell::new(None),
        }
    }

    /// Whether `navigator.mediaSession` exists.
    pub fn is_available(&self) -> bool {
        self.session.is_some()
    }

    fn call(&self, method: &str, args: &[&JsValue]) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(function) = Reflect::get(session, &JsValue::from_str(method))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
        else {
            return;
        };

        let args: Array = args.iter().copied().collect();
        if let Err(err) = function.apply(session, &args) {
            // Browsers throw for actions they do not implement.
            debug!(method, error = %js_message(&err), "Media session call failed");
        }
    }

    fn set(&self, target: &JsValue, key: &str, value: &JsValue) {
        if let Err(err) = Reflect::set(target, &JsValue::from_str(key), value) {
            warn!(key, error = %js_message(&err), "Could not set media session property");
        }
    }

    fn set_artwork_src(&self, src: &str) {
        let Some(metadata) = self.metadata.borrow().clone() else {
            return;
        };
        let image = Object::new();
        self.set(&image, "src", &JsValue::from_str(src));
        self.set(&metadata, "artwork", &Array::of1(&image));
    }

    fn revoke_artwork(&self) {
        if let Some(url) = self.artwork_url.borrow_mut().take() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}

impl Default for WebMediaSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WebMediaSession {
    fn drop(&mut self) {
        self.revoke_artwork();
    }
}

impl RemoteCommandCenter for WebMediaSession {
    fn set_enabled(&self, command: RemoteCommand, enabled: bool) {
        let Some(action) = action_name(command) else {
            return;
        };

        if !enabled {
            self.call("setActionHandler", &[&JsValue::from_str(action), &JsValue::NULL]);
            self.actions.borrow_mut().remove(action);
            return;
        }

        let handler = self.handler.clone();
        let closure: ActionHandler = Closure::new(move |details: JsValue| {
            let callback = handler.borrow().clone();
            if let (Some(callback), Some(event)) = (callback, event_for(action, &details)) {
                callback(event);
            }
        });
        self.call(
            "setActionHandler",
            &[&JsValue::from_str(action), closure.as_ref()],
        );
        self.actions.borrow_mut().insert(action, closure);
    }

    fn set_handler(&self, handler: Option<PlatformCallback<RemoteCommandEvent>>) {
        *self.handler.borrow_mut() = handler;
    }
}

impl NowPlayingCenter for WebMediaSession {
    fn update_info(&self, info: &NowPlayingInfo) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let init = Object::new();
        for (key, value) in [
            ("title", info.title.as_deref()),
            ("artist", info.artist.as_deref()),
            ("album", info.album.as_deref()),
        ] {
            if let Some(value) = value {
                self.set(&init, key, &JsValue::from_str(value));
            }
        }

        let constructor = Reflect::get(&js_sys::global(), &JsValue::from_str("MediaMetadata"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());
        let metadata = match constructor {
            Some(constructor) => Reflect::construct(&constructor, &Array::of1(&init))
                .ok()
                .and_then(|value| value.dyn_into::<Object>().ok())
                .unwrap_or(init),
            None => init,
        };

        self.set(session, "metadata", &metadata);
        *self.metadata.borrow_mut() = Some(metadata);
        *self.duration.borrow_mut() = info
            .duration
            .filter(|seconds| !info.is_live_stream && seconds.is_finite() && *seconds > 0.0);
        self.revoke_artwork();
    }

    fn set_artwork(&self, artwork: Bytes) {
        let parts = Array::of1(&Uint8Array::from(artwork.as_ref()));
        let url = Blob::new_with_u8_array_sequence(&parts)
            .and_then(|blob| Url::create_object_url_with_blob(&blob));

        match url {
            Ok(url) => {
                self.revoke_artwork();
                self.set_artwork_src(&url);
                *self.artwork_url.borrow_mut() = Some(url);
            }
            Err(err) => warn!(error = %js_message(&err), "Could not create artwork URL"),
        }
    }

    fn set_elapsed(&self, elapsed: Duration) {
        // setPositionState requires a known duration.
        let Some(duration) = *self.duration.borrow() else {
            return;
        };
        let state = Object::new();
        self.set(&state, "duration", &JsValue::from_f64(duration));
        self.set(
            &state,
            "position",
            &JsValue::from_f64(elapsed.as_secs_f64().min(duration)),
        );
        self.call("setPositionState", &[&state]);
    }

    fn set_status(&self, status: NowPlayingStatus) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let state = match status {
            NowPlayingStatus::Playing => "playing",
            NowPlayingStatus::Paused => "paused",
            NowPlayingStatus::Stopped => "none",
        };
        self.set(session, "playbackState", &JsValue::from_str(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn every_web_action_round_trips() {
        for command in RemoteCommand::ALL {
            let Some(action) = action_name(command) else {
                assert_eq!(command, RemoteCommand::TogglePlayPause);
                continue;
            };
            let details = Object::new();
            let _ = Reflect::set(&details, &"seekTime".into(), &JsValue::from_f64(3.0));
            let event = event_for(action, &details).expect("mapped action");
            assert_eq!(event.command(), command);
        }
    }

    #[wasm_bindgen_test]
    fn seek_without_time_is_ignored() {
        assert_eq!(event_for("seekto", &Object::new()), None);
    }

    #[wasm_bindgen_test]
    fn unrepresentable_seek_time_is_ignored() {
        for seconds in [1e20, -1.0, f64::NAN, f64::INFINITY] {
            let details = Object::new();
            let _ = Reflect::set(&details, &"seekTime".into(), &JsValue::from_f64(seconds));
            assert_eq!(event_for("seekto", &details), None);
        }
    }
}
