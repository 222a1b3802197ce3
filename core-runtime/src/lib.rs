//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the streaming core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Canonical playback events and the per-session emitter
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on these pieces. They carry no
//! playback logic themselves; `core-playback` builds the session on top of
//! them.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{PlaybackSettings, StreamerConfig, StreamerConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventEmitter, EventKind, EventStream, ListenerHandle, PlaybackEvent};
