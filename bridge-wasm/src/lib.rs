//! WebAssembly Bridge Implementations
//!
//! This crate provides browser implementations of the bridge traits defined
//! in `bridge-traits`, using `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to nothing on native targets.
//!
//! # Implementations
//!
//! - `WebAudioRuntime`: `WebMediaRuntime` creating `<audio>` elements and,
//!   when the page loads hls.js, adaptive pipelines
//! - `WasmAudioElement`: `MediaElement` over `HtmlAudioElement`
//! - `HlsDemuxer`: `AdaptiveDemuxer` over hls.js
//! - `WebMediaSession`: `navigator.mediaSession` as `RemoteCommandCenter`
//!   and `NowPlayingCenter`
//! - `WasmHttpClient`: `fetch`-based `HttpClient` for artwork
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::build_wasm_bridges;
//!
//! let bridges = build_wasm_bridges()?;
//! let config = StreamerConfig::builder()
//!     .platform(bridges.platform())
//!     .http_client(bridges.http())
//!     .remote_command_center(bridges.remote_command_center.clone())
//!     .now_playing_center(bridges.now_playing_center.clone())
//!     .build()?;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod element;
pub mod error;
pub mod hls;
pub mod http;
pub mod media_session;
pub mod runtime;

// Re-export commonly used types
pub use bootstrap::{build_wasm_bridges, WasmBridgeSet};
pub use element::WasmAudioElement;
pub use error::{WasmError, WasmResult};
pub use hls::{hls_available, HlsDemuxer};
pub use http::WasmHttpClient;
pub use media_session::WebMediaSession;
pub use runtime::WebAudioRuntime;
