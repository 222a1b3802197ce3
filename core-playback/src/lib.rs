//! # Playback Synchronization Core
//!
//! Drives one remote audio stream at a time on whatever engine the host
//! provides, and reports it through a single canonical event stream.
//!
//! ## Overview
//!
//! This module handles:
//! - The playback session: command serialization, lifecycle state, teardown
//! - Backend adapters for native players and web media elements, with or
//!   without an adaptive demuxer
//! - Event normalization (dedup, buffering coalescing, 1 Hz time updates,
//!   end-vs-stop resolution)
//! - Timed metadata extraction, including ID3v2 tags from stream segments
//! - Remote command routing and audio interruption handling
//! - Now-playing display updates
//!
//! ## Flow
//!
//! ```text
//! host ──> PlaybackSession ──> BackendAdapter ──> engine
//!                 ▲                                  │
//!                 └──── EventNormalizer <── signals ─┘
//! ```

pub mod backend;
pub mod error;
pub mod headers;
pub mod interruption;
pub mod metadata;
pub mod normalizer;
pub mod now_playing;
pub mod remote;
mod runtime;
pub mod selection;
pub mod session;
pub mod state;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use backend::{BackendAdapter, BackendSignal, SignalSink};
pub use error::{PlaybackError, Result};
pub use metadata::MetadataExtractor;
pub use normalizer::EventNormalizer;
pub use remote::{RemoteAction, RemoteCommandRouter};
pub use selection::{select_backend, validate_url, BackendKind};
pub use session::{PlayOptions, PlaybackSession, SessionSnapshot};
pub use state::SessionState;
