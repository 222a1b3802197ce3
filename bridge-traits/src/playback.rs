//! Shared playback vocabulary used by every engine bridge.
//!
//! These types describe what a host engine reports back to the core
//! (time-control status, timed metadata) and which family of engines a host
//! provides. The concrete engine contracts live in [`crate::native`] and
//! [`crate::web`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{native::NativePlayerFactory, web::WebMediaRuntime};

/// Playback intent reported by an engine, independent of buffering flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeControlStatus {
    /// The engine is paused (explicitly or after end of media).
    Paused,
    /// Playback was requested but the engine is waiting for data.
    WaitingToPlay,
    /// Audio is actively playing.
    Playing,
}

impl TimeControlStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, TimeControlStatus::Playing)
    }
}

/// Value carried by a timed metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Binary(Vec<u8>),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<Bytes> for MetadataValue {
    fn from(value: Bytes) -> Self {
        MetadataValue::Binary(value.to_vec())
    }
}

/// A single timed metadata entry as surfaced by an engine.
///
/// Engines expose up to three ways of naming the same entry: a
/// format-independent common key (`title`, `artist`), a format-specific key
/// (`TIT2`), and a raw identifier (`id3/TIT2`). Any of them may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedMetadataItem {
    pub common_key: Option<String>,
    pub key: Option<String>,
    pub identifier: Option<String>,
    pub value: Option<MetadataValue>,
}

impl TimedMetadataItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_common_key(mut self, key: impl Into<String>) -> Self {
        self.common_key = Some(key.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<MetadataValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// The family of playback engines a host makes available.
///
/// Mobile hosts provide a native streaming player; browser hosts provide an
/// HTML media element runtime, optionally with an adaptive demuxer.
#[derive(Clone)]
pub enum PlaybackPlatform {
    Native(Arc<dyn NativePlayerFactory>),
    Web(Arc<dyn WebMediaRuntime>),
}

impl PlaybackPlatform {
    /// Whether the runtime can play adaptive manifests.
    pub fn supports_adaptive(&self) -> bool {
        match self {
            PlaybackPlatform::Native(factory) => factory.supports_adaptive(),
            PlaybackPlatform::Web(runtime) => runtime.supports_adaptive(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackPlatform::Native(_) => "native",
            PlaybackPlatform::Web(_) => "web",
        }
    }
}

impl fmt::Debug for PlaybackPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlaybackPlatform").field(&self.name()).finish()
    }
}
