//! `WebMediaRuntime` for browsers: `<audio>` elements, with hls.js for
//! adaptive manifests when the page provides it.

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    web::{AdaptivePipeline, MediaElement, WebMediaRuntime},
};

use crate::element::WasmAudioElement;
use crate::hls::{hls_available, HlsDemuxer};

/// Browser media runtime. Stateless; every call creates fresh elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebAudioRuntime;

impl WebAudioRuntime {
    /// Create the runtime.
    pub fn new() -> Self {
        Self
    }
}

impl WebMediaRuntime for WebAudioRuntime {
    fn supports_adaptive(&self) -> bool {
        hls_available()
    }

    fn create_element(&self) -> BridgeResult<Box<dyn MediaElement>> {
        Ok(Box::new(WasmAudioElement::new().map_err(BridgeError::from)?))
    }

    fn create_adaptive(&self) -> BridgeResult<AdaptivePipeline> {
        let element = WasmAudioElement::new().map_err(BridgeError::from)?;
        let demuxer = HlsDemuxer::new(element.media()).map_err(BridgeError::from)?;
        Ok(AdaptivePipeline {
            element: Box::new(element),
            demuxer: Box::new(demuxer),
        })
    }
}
