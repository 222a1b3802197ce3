//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host pages can use [`build_wasm_bridges`] to construct every browser
//! adapter the streaming core needs in one call. The result plays the role
//! `bridge-desktop` plays on native targets.

use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult,
    http::HttpClient,
    media_session::{NowPlayingCenter, RemoteCommandCenter},
    web::WebMediaRuntime,
    PlaybackPlatform,
};
use tracing::debug;

use crate::{http::WasmHttpClient, media_session::WebMediaSession, runtime::WebAudioRuntime};

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// `<audio>` elements, plus hls.js when the page loads it.
    pub media_runtime: Arc<dyn WebMediaRuntime>,
    /// HTTP client powered by browser `fetch`, used for artwork.
    pub http_client: Arc<dyn HttpClient>,
    /// `navigator.mediaSession` action handlers.
    pub remote_command_center: Arc<dyn RemoteCommandCenter>,
    /// `navigator.mediaSession` metadata and playback state.
    pub now_playing_center: Arc<dyn NowPlayingCenter>,
}

impl WasmBridgeSet {
    /// The playback platform to put in the streamer configuration.
    pub fn platform(&self) -> PlaybackPlatform {
        PlaybackPlatform::Web(Arc::clone(&self.media_runtime))
    }

    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }
}

/// Build the default wasm bridge stack.
///
/// Hosts should call this during startup and pass the returned trait objects
/// into the streamer configuration.
pub fn build_wasm_bridges() -> BridgeResult<WasmBridgeSet> {
    let media_session = Arc::new(WebMediaSession::new());
    let media_runtime = WebAudioRuntime::new();
    debug!(
        adaptive = media_runtime.supports_adaptive(),
        media_session = media_session.is_available(),
        "Browser bridges ready"
    );

    Ok(WasmBridgeSet {
        media_runtime: Arc::new(media_runtime),
        http_client: Arc::new(WasmHttpClient::new()?),
        remote_command_center: media_session.clone(),
        now_playing_center: media_session,
    })
}
