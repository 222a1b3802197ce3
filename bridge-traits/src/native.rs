//! Native Streaming Player Bridge
//!
//! Contract for the platform media-player framework a mobile host wraps
//! (AVPlayer on iOS, ExoPlayer on Android).
//!
//! ## Overview
//!
//! The core never polls the engine for lifecycle changes. Instead the host
//! adapter registers key-value or listener observers on its engine and
//! forwards every change as a [`NativeObservation`] through the callback it
//! receives in [`NativePlayerEngine::open`]. The core decides what each
//! observation means.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::native::{NativeObservation, NativePlayerEngine};
//!
//! // inside the host adapter, when the item status changes:
//! observer(NativeObservation::Status(ItemStatus::ReadyToPlay));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    error::Result,
    platform::{PlatformCallback, PlatformSendSync},
    playback::{TimeControlStatus, TimedMetadataItem},
};

/// Whether the engine should treat the URL as an adaptive manifest or a
/// directly decodable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NativeSourceKind {
    Manifest,
    Direct,
}

/// Everything the engine needs to open a remote stream.
#[derive(Debug, Clone)]
pub struct NativeOpenRequest {
    pub url: String,
    pub source: NativeSourceKind,
    /// HTTP headers the engine must attach to every media request.
    pub headers: HashMap<String, String>,
    /// Period of the engine's periodic time observer.
    pub tick_interval: Duration,
}

impl NativeOpenRequest {
    pub fn new(url: impl Into<String>, source: NativeSourceKind) -> Self {
        Self {
            url: url.into(),
            source,
            headers: HashMap::new(),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Status of the engine's current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(String),
}

/// Raw observation forwarded by a native engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeObservation {
    Status(ItemStatus),
    TimeControl(TimeControlStatus),
    BufferEmpty(bool),
    BufferFull(bool),
    LikelyToKeepUp(bool),
    /// Fired by the periodic time observer.
    PeriodicTime(Duration),
    PlayedToEnd,
    TimedMetadata(Vec<TimedMetadataItem>),
}

/// Creates engine instances. One engine is created per `play` request.
pub trait NativePlayerFactory: PlatformSendSync {
    fn create_player(&self) -> Result<Box<dyn NativePlayerEngine>>;

    /// Whether adaptive manifests can be played natively.
    fn supports_adaptive(&self) -> bool {
        true
    }
}

/// A single native player instance.
///
/// # Threading
///
/// The observer callback may be invoked from any thread, including while one
/// of the async methods below is still pending.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NativePlayerEngine: PlatformSendSync {
    /// Load the item and register all observers.
    async fn open(
        &self,
        request: NativeOpenRequest,
        observer: PlatformCallback<NativeObservation>,
    ) -> Result<()>;

    /// Start playback immediately at the current rate.
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn seek(&self, position: Duration) -> Result<()>;

    async fn set_volume(&self, volume: f32) -> Result<()>;

    async fn set_rate(&self, rate: f32) -> Result<()>;

    fn current_time(&self) -> Option<Duration>;

    /// Item duration; `None` while unknown or for live streams.
    fn duration(&self) -> Option<Duration>;

    fn time_control_status(&self) -> TimeControlStatus;

    /// Remove every observer and release the current item. The observer
    /// passed to [`open`](Self::open) must not be invoked afterwards.
    async fn release(&self) -> Result<()>;
}
