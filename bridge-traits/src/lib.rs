//! # Host Bridge Traits
//!
//! Capabilities a host application must provide so the streaming core can
//! drive its playback engines and system media surfaces.
//!
//! ## Overview
//!
//! The core owns lifecycle and event semantics; the host owns the engines.
//! Each trait here is the narrowest contract the core needs from one engine
//! or system service. Mobile hosts implement the native player contract,
//! browser hosts implement the web media contract (see the `bridge-wasm`
//! crate).
//!
//! ## Traits
//!
//! ### Engines
//! - [`NativePlayerFactory`](native::NativePlayerFactory) / [`NativePlayerEngine`](native::NativePlayerEngine) - AVPlayer, ExoPlayer
//! - [`WebMediaRuntime`](web::WebMediaRuntime) - creates [`MediaElement`](web::MediaElement)s and [`AdaptiveDemuxer`](web::AdaptiveDemuxer)s
//!
//! ### System media session
//! - [`RemoteCommandCenter`](media_session::RemoteCommandCenter) - lock screen / headset commands
//! - [`InterruptionSource`](media_session::InterruptionSource) - interruptions and audio focus
//! - [`NowPlayingCenter`](media_session::NowPlayingCenter) - now-playing display
//!
//! ### Utilities
//! - [`HttpClient`](http::HttpClient) - artwork fetches
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Engine contract | Implementation |
//! |----------|-----------------|----------------|
//! | iOS      | `NativePlayerEngine` | host (AVPlayer) |
//! | Android  | `NativePlayerEngine` | host (ExoPlayer) |
//! | Web      | `WebMediaRuntime`    | `bridge-wasm` |
//! | Desktop  | `HttpClient` only    | `bridge-desktop` |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert engine-specific failures into it with an actionable message.
//!
//! ## Thread Safety
//!
//! Traits are bounded by [`PlatformSendSync`](platform::PlatformSendSync):
//! `Send + Sync` on native targets, unbounded on `wasm32`.

pub mod error;
pub mod http;
pub mod media_session;
pub mod native;
pub mod platform;
pub mod playback;
pub mod time;
pub mod web;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use media_session::{
    ClientInfo, InterruptionSignal, InterruptionSource, NowPlayingCenter, NowPlayingInfo,
    NowPlayingStatus, RemoteCommand, RemoteCommandCenter, RemoteCommandEvent,
};
pub use native::{
    ItemStatus, NativeObservation, NativeOpenRequest, NativePlayerEngine, NativePlayerFactory,
    NativeSourceKind,
};
pub use platform::{PlatformCallback, PlatformSend, PlatformSendSync};
pub use playback::{MetadataValue, PlaybackPlatform, TimeControlStatus, TimedMetadataItem};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use web::{
    AdaptiveDemuxer, AdaptivePipeline, DemuxerEvent, ElementEvent, MediaElement, WebMediaRuntime,
};
