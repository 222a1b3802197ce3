//! URL validation and backend selection.
//!
//! A backend variant is chosen once per `play` from the URL path and the
//! platform's adaptive support. Query string and fragment never take part in
//! the decision, so signed manifest URLs select the same variant as plain
//! ones.

use crate::error::{PlaybackError, Result};
use bridge_traits::{NativeSourceKind, PlaybackPlatform};
use serde::{Deserialize, Serialize};
use url::Url;

/// Which adapter a `play` call will build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Platform player, fed a manifest or a direct file.
    Native(NativeSourceKind),
    /// Media element pointed straight at the URL.
    ProgressiveWeb,
    /// Media element fronted by an adaptive demuxer.
    AdaptiveWeb,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Native(NativeSourceKind::Manifest) => "native-manifest",
            BackendKind::Native(NativeSourceKind::Direct) => "native-direct",
            BackendKind::ProgressiveWeb => "progressive-web",
            BackendKind::AdaptiveWeb => "adaptive-web",
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(
            self,
            BackendKind::Native(NativeSourceKind::Manifest) | BackendKind::AdaptiveWeb
        )
    }
}

/// Parses `raw` as an absolute URL.
///
/// Only syntax is checked. Reachability is the engine's business.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlaybackError::InvalidUrl("URL is empty".to_string()));
    }

    Url::parse(trimmed).map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", trimmed, e)))
}

/// Returns `true` when the URL path ends with `extension`, ignoring ASCII case.
pub fn is_adaptive_url(url: &Url, extension: &str) -> bool {
    let path = url.path();
    path.len() >= extension.len()
        && path.is_char_boundary(path.len() - extension.len())
        && path[path.len() - extension.len()..].eq_ignore_ascii_case(extension)
}

/// Picks the backend variant for `url` on `platform`.
pub fn select_backend(url: &Url, platform: &PlaybackPlatform, extension: &str) -> BackendKind {
    let adaptive = platform.supports_adaptive() && is_adaptive_url(url, extension);

    match (platform, adaptive) {
        (PlaybackPlatform::Native(_), true) => BackendKind::Native(NativeSourceKind::Manifest),
        (PlaybackPlatform::Native(_), false) => BackendKind::Native(NativeSourceKind::Direct),
        (PlaybackPlatform::Web(_), true) => BackendKind::AdaptiveWeb,
        (PlaybackPlatform::Web(_), false) => BackendKind::ProgressiveWeb,
    }
}
