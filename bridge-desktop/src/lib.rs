//! # Desktop Bridge Implementations
//!
//! Default bridge implementations for native desktop targets (macOS, Windows,
//! Linux), injected by `core-runtime` when the `desktop-shims` feature is on.
//!
//! ## Overview
//!
//! Playback engines are always host-provided. The only capability the core
//! can supply by itself on desktop is the `HttpClient` used for now-playing
//! artwork, backed by `reqwest`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use core_runtime::config::StreamerConfig;
//! use std::sync::Arc;
//!
//! let http = ReqwestHttpClient::with_user_agent("Radio/4.2.0")?;
//! let config = StreamerConfig::builder()
//!     .platform(platform)
//!     .http_client(Arc::new(http))
//!     .build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
