//! Web Media Bridge
//!
//! Contracts for browser playback: an HTML media element and an optional
//! adaptive-streaming demuxer (hls.js or equivalent) attached to it.

use bytes::Bytes;
use std::time::Duration;

use crate::{
    error::Result,
    platform::{PlatformCallback, PlatformSendSync},
};

/// Lifecycle events of an HTML media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    Playing,
    Pause,
    Ended,
    Error(String),
    Waiting,
    CanPlayThrough,
}

/// Events emitted by an adaptive demuxer.
#[derive(Debug, Clone, PartialEq)]
pub enum DemuxerEvent {
    ManifestParsed,
    /// Raw ID3 payloads found while parsing a fragment.
    FragmentMetadata(Vec<Bytes>),
    Error { fatal: bool, details: String },
}

/// An HTML media element (`<audio>`).
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaElement: PlatformSendSync {
    /// Install or clear the lifecycle observer.
    fn set_observer(&self, observer: Option<PlatformCallback<ElementEvent>>);

    fn set_source(&self, url: &str) -> Result<()>;

    /// Resolves once the element's play promise settles.
    async fn play(&self) -> Result<()>;

    fn pause(&self);

    fn current_time(&self) -> Duration;

    fn set_current_time(&self, position: Duration);

    /// `None` while the duration is unknown or infinite.
    fn duration(&self) -> Option<Duration>;

    fn is_paused(&self) -> bool;

    fn set_volume(&self, volume: f32);

    fn set_playback_rate(&self, rate: f32);

    /// Detach the source and rewind: clears `src`, reloads, zeroes the
    /// current time.
    fn reset(&self);
}

/// An adaptive demuxer bound to the element it was created with.
pub trait AdaptiveDemuxer: PlatformSendSync {
    fn set_observer(&self, observer: Option<PlatformCallback<DemuxerEvent>>);

    fn load_source(&self, url: &str) -> Result<()>;

    /// Attach the demuxer to its media element.
    fn attach_media(&self) -> Result<()>;

    fn destroy(&self);
}

/// An element together with the demuxer driving it.
pub struct AdaptivePipeline {
    pub element: Box<dyn MediaElement>,
    pub demuxer: Box<dyn AdaptiveDemuxer>,
}

/// Creates media elements and demuxers for a browser host.
pub trait WebMediaRuntime: PlatformSendSync {
    fn supports_adaptive(&self) -> bool;

    fn create_element(&self) -> Result<Box<dyn MediaElement>>;

    fn create_adaptive(&self) -> Result<AdaptivePipeline>;
}
