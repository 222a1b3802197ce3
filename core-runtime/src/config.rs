//! # Streamer Configuration
//!
//! Builder-based configuration for a playback session.
//!
//! ## Overview
//!
//! [`StreamerConfig`] holds every host bridge a session talks to plus the
//! tunable [`PlaybackSettings`]. The builder fails fast when a required
//! capability is missing so misconfiguration surfaces at startup instead of
//! on the first `play`.
//!
//! ## Required Dependencies
//!
//! - [`PlaybackPlatform`] - the engine family (native player or web media runtime)
//!
//! ## Optional Dependencies
//!
//! - `RemoteCommandCenter` - lock screen / headset commands
//! - `InterruptionSource` - audio-session interruptions and focus changes
//! - `NowPlayingCenter` - now-playing display
//! - `HttpClient` - artwork fetches (desktop default: reqwest)
//! - `Clock` - defaults to [`SystemClock`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::StreamerConfig;
//! use bridge_traits::{ClientInfo, PlaybackPlatform};
//! use std::sync::Arc;
//!
//! let config = StreamerConfig::builder()
//!     .platform(PlaybackPlatform::Native(Arc::new(MyPlayerFactory)))
//!     .client_info(ClientInfo::new("Radio", "4.2.0").with_device_model("iPhone15,2"))
//!     .remote_command_center(Arc::new(MyCommandCenter))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::StreamerConfig;
//!
//! // No playback platform: fails with CapabilityMissing
//! let config = StreamerConfig::builder()
//!     .build()
//!     .expect("Should fail - missing playback platform");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    ClientInfo, Clock, HttpClient, InterruptionSource, NowPlayingCenter, PlaybackPlatform,
    RemoteCommandCenter, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Settings
// ============================================================================

/// Tunable playback settings.
///
/// Deserializable from host configuration; absent fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Minimum spacing between `timeUpdate` events, also the period of the
    /// web poll and native periodic observer.
    #[serde(default = "default_time_update_interval_ms")]
    pub time_update_interval_ms: u64,

    /// Offset applied by skip and scrub remote commands.
    #[serde(default = "default_skip_interval_ms")]
    pub skip_interval_ms: u64,

    /// Path suffix that marks an adaptive manifest.
    #[serde(default = "default_adaptive_extension")]
    pub adaptive_extension: String,

    /// Broadcast buffer per stream subscriber.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Volume applied while audio focus is ducked.
    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,

    #[serde(default = "default_artwork_fetch_timeout_ms")]
    pub artwork_fetch_timeout_ms: u64,
}

fn default_time_update_interval_ms() -> u64 {
    1_000
}

fn default_skip_interval_ms() -> u64 {
    10_000
}

fn default_adaptive_extension() -> String {
    ".m3u8".to_string()
}

fn default_event_buffer_size() -> usize {
    crate::events::DEFAULT_EVENT_BUFFER_SIZE
}

fn default_duck_volume() -> f32 {
    0.1
}

fn default_artwork_fetch_timeout_ms() -> u64 {
    10_000
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            time_update_interval_ms: default_time_update_interval_ms(),
            skip_interval_ms: default_skip_interval_ms(),
            adaptive_extension: default_adaptive_extension(),
            event_buffer_size: default_event_buffer_size(),
            duck_volume: default_duck_volume(),
            artwork_fetch_timeout_ms: default_artwork_fetch_timeout_ms(),
        }
    }
}

impl PlaybackSettings {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }

    pub fn skip_interval(&self) -> Duration {
        Duration::from_millis(self.skip_interval_ms)
    }

    pub fn artwork_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.artwork_fetch_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_update_interval_ms == 0 {
            return Err(Error::Config(
                "Time update interval must be greater than 0ms".to_string(),
            ));
        }

        if self.skip_interval_ms == 0 {
            return Err(Error::Config(
                "Skip interval must be greater than 0ms".to_string(),
            ));
        }

        if !self.adaptive_extension.starts_with('.') || self.adaptive_extension.len() < 2 {
            return Err(Error::Config(format!(
                "Adaptive extension must look like '.m3u8', got '{}'",
                self.adaptive_extension
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.duck_volume) {
            return Err(Error::Config(format!(
                "Duck volume must be within [0, 1], got {}",
                self.duck_volume
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Config
// ============================================================================

/// Everything a playback session needs. Build with [`StreamerConfig::builder`].
#[derive(Clone)]
pub struct StreamerConfig {
    pub platform: PlaybackPlatform,
    pub remote_command_center: Option<Arc<dyn RemoteCommandCenter>>,
    pub interruption_source: Option<Arc<dyn InterruptionSource>>,
    pub now_playing_center: Option<Arc<dyn NowPlayingCenter>>,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub clock: Arc<dyn Clock>,
    pub client_info: ClientInfo,
    pub settings: PlaybackSettings,
}

impl std::fmt::Debug for StreamerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamerConfig")
            .field("platform", &self.platform)
            .field(
                "remote_command_center",
                &self
                    .remote_command_center
                    .as_ref()
                    .map(|_| "RemoteCommandCenter { ... }"),
            )
            .field(
                "interruption_source",
                &self
                    .interruption_source
                    .as_ref()
                    .map(|_| "InterruptionSource { ... }"),
            )
            .field(
                "now_playing_center",
                &self
                    .now_playing_center
                    .as_ref()
                    .map(|_| "NowPlayingCenter { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("client_info", &self.client_info)
            .field("settings", &self.settings)
            .finish()
    }
}

impl StreamerConfig {
    pub fn builder() -> StreamerConfigBuilder {
        StreamerConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_info.app_name.trim().is_empty() {
            return Err(Error::Config("Client app name cannot be empty".to_string()));
        }

        self.settings.validate()
    }
}

fn platform_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackPlatform".to_string(),
        message: "A playback engine is required. \
                 iOS/Android: inject a NativePlayerFactory wrapping AVPlayer/ExoPlayer. \
                 Web: inject the bridge-wasm WebAudioRuntime."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(client_info: &ClientInfo) -> Option<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let user_agent = format!("{}/{}", client_info.app_name, client_info.app_version);
    match ReqwestHttpClient::with_user_agent(&user_agent) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Default HTTP client unavailable; artwork fetch disabled");
            None
        }
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_client_info: &ClientInfo) -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for [`StreamerConfig`].
#[derive(Default)]
pub struct StreamerConfigBuilder {
    platform: Option<PlaybackPlatform>,
    remote_command_center: Option<Arc<dyn RemoteCommandCenter>>,
    interruption_source: Option<Arc<dyn InterruptionSource>>,
    now_playing_center: Option<Arc<dyn NowPlayingCenter>>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    client_info: Option<ClientInfo>,
    settings: Option<PlaybackSettings>,
}

impl StreamerConfigBuilder {
    pub fn platform(mut self, platform: PlaybackPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn remote_command_center(mut self, center: Arc<dyn RemoteCommandCenter>) -> Self {
        self.remote_command_center = Some(center);
        self
    }

    pub fn interruption_source(mut self, source: Arc<dyn InterruptionSource>) -> Self {
        self.interruption_source = Some(source);
        self
    }

    pub fn now_playing_center(mut self, center: Arc<dyn NowPlayingCenter>) -> Self {
        self.now_playing_center = Some(center);
        self
    }

    /// Sets the HTTP client used for artwork.
    ///
    /// With `desktop-shims` a reqwest client is provided when unset.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn client_info(mut self, info: ClientInfo) -> Self {
        self.client_info = Some(info);
        self
    }

    pub fn settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the `timeUpdate` spacing.
    ///
    /// Default: 1 s
    pub fn time_update_interval(mut self, interval: Duration) -> Self {
        self.settings
            .get_or_insert_with(PlaybackSettings::default)
            .time_update_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the skip/scrub offset for remote commands.
    ///
    /// Default: 10 s
    pub fn skip_interval(mut self, interval: Duration) -> Self {
        self.settings
            .get_or_insert_with(PlaybackSettings::default)
            .skip_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Builds the final `StreamerConfig`.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - No playback platform was provided
    /// - Settings are invalid
    pub fn build(self) -> Result<StreamerConfig> {
        let platform = self.platform.ok_or_else(platform_missing_error)?;
        let client_info = self.client_info.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client(&client_info),
        };

        let config = StreamerConfig {
            platform,
            remote_command_center: self.remote_command_center,
            interruption_source: self.interruption_source,
            now_playing_center: self.now_playing_center,
            http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            client_info,
            settings: self.settings.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
