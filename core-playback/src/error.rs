//! # Playback Error Types
//!
//! Errors returned by session commands. Failures that happen while a stream
//! is already playing are not returned here; they reach the host as `error`
//! and `stop` events.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Host Input Errors
    // ========================================================================
    /// The URL passed to `play` could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The engine refused to load the stream.
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// The host could not provide an engine instance.
    #[error("Playback engine unavailable: {0}")]
    EngineUnavailable(String),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The session task has shut down.
    #[error("Playback session closed")]
    SessionClosed,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Capability missing: {0}")]
    CapabilityMissing(String),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if calling `play` again may succeed without any change
    /// on the host side.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::BackendFailure(_) | PlaybackError::EngineUnavailable(_)
        )
    }

    /// Returns `true` if the host passed bad input.
    pub fn is_host_input_error(&self) -> bool {
        matches!(self, PlaybackError::InvalidUrl(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
