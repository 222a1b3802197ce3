//! `AdaptiveDemuxer` backed by hls.js.
//!
//! hls.js is not bundled; the host page loads it so that a global `Hls`
//! constructor exists. [`hls_available`] checks for it before anything here
//! touches the binding.

use bridge_traits::{
    error::Result as BridgeResult,
    web::{AdaptiveDemuxer, DemuxerEvent},
    PlatformCallback,
};
use bytes::Bytes;
use js_sys::{Array, Function, Reflect, Uint8Array};
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use web_sys::HtmlMediaElement;

use crate::error::{js_message, WasmError};

const MANIFEST_PARSED: &str = "hlsManifestParsed";
const FRAG_PARSING_METADATA: &str = "hlsFragParsingMetadata";
const ERROR: &str = "hlsError";

#[wasm_bindgen]
extern "C" {
    /// The hls.js player class.
    pub type Hls;

    #[wasm_bindgen(constructor, catch)]
    fn new() -> Result<Hls, JsValue>;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported)]
    fn is_supported() -> bool;

    #[wasm_bindgen(method, catch, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &HtmlMediaElement) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &Hls, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);
}

/// Whether hls.js is loaded and reports Media Source Extensions support.
pub fn hls_available() -> bool {
    let loaded = Reflect::has(&js_sys::global(), &JsValue::from_str("Hls")).unwrap_or(false);
    loaded && Hls::is_supported()
}

type Handler = Closure<dyn FnMut(JsValue, JsValue)>;

/// One hls.js instance bound to the element it will attach to.
pub struct HlsDemuxer {
    hls: Hls,
    media: HtmlMediaElement,
    handlers: RefCell<Vec<(&'static str, Handler)>>,
}

impl HlsDemuxer {
    /// Create an hls.js instance that will attach to `media`.
    pub fn new(media: HtmlMediaElement) -> Result<Self, WasmError> {
        if !hls_available() {
            return Err(WasmError::NotAvailable("hls.js".to_string()));
        }
        Ok(Self {
            hls: Hls::new()?,
            media,
            handlers: RefCell::new(Vec::new()),
        })
    }

    fn remove_handlers(&self) {
        for (name, handler) in self.handlers.borrow_mut().drain(..) {
            self.hls.off(name, handler.as_ref().unchecked_ref());
        }
    }
}

/// Raw ID3 payloads from a `hlsFragParsingMetadata` event (`data.samples[].data`).
fn metadata_samples(data: &JsValue) -> Vec<Bytes> {
    let Ok(samples) = Reflect::get(data, &JsValue::from_str("samples")) else {
        return Vec::new();
    };
    if !Array::is_array(&samples) {
        return Vec::new();
    }

    Array::from(&samples)
        .iter()
        .filter_map(|sample| Reflect::get(&sample, &JsValue::from_str("data")).ok())
        .filter(|payload| payload.is_instance_of::<Uint8Array>())
        .map(|payload| Bytes::from(Uint8Array::new(&payload).to_vec()))
        .collect()
}

/// `(fatal, details)` from a `hlsError` event.
fn error_details(data: &JsValue) -> (bool, String) {
    let fatal = Reflect::get(data, &JsValue::from_str("fatal"))
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let details = Reflect::get(data, &JsValue::from_str("details"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_else(|| "unknown".to_string());
    (fatal, details)
}

impl AdaptiveDemuxer for HlsDemuxer {
    fn set_observer(&self, observer: Option<PlatformCallback<DemuxerEvent>>) {
        self.remove_handlers();
        let Some(observer) = observer else {
            return;
        };

        let mut handlers = self.handlers.borrow_mut();
        for name in [MANIFEST_PARSED, FRAG_PARSING_METADATA, ERROR] {
            let observer = observer.clone();
            let handler: Handler = Closure::new(move |_event: JsValue, data: JsValue| {
                let event = match name {
                    MANIFEST_PARSED => DemuxerEvent::ManifestParsed,
                    FRAG_PARSING_METADATA => {
                        DemuxerEvent::FragmentMetadata(metadata_samples(&data))
                    }
                    _ => {
                        let (fatal, details) = error_details(&data);
                        DemuxerEvent::Error { fatal, details }
                    }
                };
                observer(event);
            });
            self.hls.on(name, handler.as_ref().unchecked_ref());
            handlers.push((name, handler));
        }
    }

    fn load_source(&self, url: &str) -> BridgeResult<()> {
        self.hls
            .load_source(url)
            .map_err(|err| WasmError::JavaScript(js_message(&err)).into())
    }

    fn attach_media(&self) -> BridgeResult<()> {
        self.hls
            .attach_media(&self.media)
            .map_err(|err| WasmError::JavaScript(js_message(&err)).into())
    }

    fn destroy(&self) {
        self.remove_handlers();
        self.hls.destroy();
        debug!("hls.js instance destroyed");
    }
}

impl Drop for HlsDemuxer {
    fn drop(&mut self) {
        self.remove_handlers();
    }
}
