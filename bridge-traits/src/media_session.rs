//! System Media Session Integration
//!
//! Bridges to the operating system's media surfaces: remote-control commands
//! (lock screen, headset, car), audio-session interruptions and audio focus,
//! and the now-playing display.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::platform::{PlatformCallback, PlatformSendSync};

// ============================================================================
// Remote commands
// ============================================================================

/// A remote-control command that can be enabled or disabled on the system
/// command center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    ChangePlaybackPosition,
    SkipForward,
    SkipBackward,
    /// Continuous scrub forward (fast-forward button).
    SeekForward,
    /// Continuous scrub backward (rewind button).
    SeekBackward,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 8] = [
        RemoteCommand::Play,
        RemoteCommand::Pause,
        RemoteCommand::TogglePlayPause,
        RemoteCommand::ChangePlaybackPosition,
        RemoteCommand::SkipForward,
        RemoteCommand::SkipBackward,
        RemoteCommand::SeekForward,
        RemoteCommand::SeekBackward,
    ];
}

/// A command received from the system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommandEvent {
    Play,
    Pause,
    TogglePlayPause,
    ChangePlaybackPosition(Duration),
    SkipForward,
    SkipBackward,
    SeekForward,
    SeekBackward,
}

impl RemoteCommandEvent {
    /// The command this event was issued for.
    pub fn command(&self) -> RemoteCommand {
        match self {
            RemoteCommandEvent::Play => RemoteCommand::Play,
            RemoteCommandEvent::Pause => RemoteCommand::Pause,
            RemoteCommandEvent::TogglePlayPause => RemoteCommand::TogglePlayPause,
            RemoteCommandEvent::ChangePlaybackPosition(_) => RemoteCommand::ChangePlaybackPosition,
            RemoteCommandEvent::SkipForward => RemoteCommand::SkipForward,
            RemoteCommandEvent::SkipBackward => RemoteCommand::SkipBackward,
            RemoteCommandEvent::SeekForward => RemoteCommand::SeekForward,
            RemoteCommandEvent::SeekBackward => RemoteCommand::SeekBackward,
        }
    }
}

/// The system remote command center (MPRemoteCommandCenter, MediaSession).
pub trait RemoteCommandCenter: PlatformSendSync {
    fn set_enabled(&self, command: RemoteCommand, enabled: bool);

    /// Install or clear the handler that receives command events.
    fn set_handler(&self, handler: Option<PlatformCallback<RemoteCommandEvent>>);

    /// Preferred skip interval shown by the system UI.
    fn set_skip_interval(&self, _interval: Duration) {}
}

// ============================================================================
// Interruptions and audio focus
// ============================================================================

/// Audio-session interruption or audio-focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionSignal {
    /// Another audio session took over (phone call, alarm, transient focus loss).
    Began,
    /// The interruption finished. `should_resume` is the system's hint, absent
    /// when the system gave none.
    Ended { should_resume: Option<bool> },
    /// Focus was lost transiently but playback may continue quietly.
    DuckBegan,
    /// Full focus came back after ducking.
    DuckEnded,
}

/// Source of interruption signals (AVAudioSession, AudioManager focus).
pub trait InterruptionSource: PlatformSendSync {
    fn subscribe(&self, handler: PlatformCallback<InterruptionSignal>);

    fn unsubscribe(&self);
}

// ============================================================================
// Now playing
// ============================================================================

/// Information shown on lock screens and in system media controls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    #[serde(alias = "imageUrl")]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub is_live_stream: bool,
}

impl NowPlayingInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn live(mut self) -> Self {
        self.is_live_stream = true;
        self
    }
}

/// Transport status mirrored to the now-playing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NowPlayingStatus {
    Playing,
    Paused,
    Stopped,
}

/// The system now-playing display.
pub trait NowPlayingCenter: PlatformSendSync {
    fn update_info(&self, info: &NowPlayingInfo);

    fn set_artwork(&self, artwork: Bytes);

    fn set_elapsed(&self, elapsed: Duration);

    fn set_status(&self, status: NowPlayingStatus);
}

// ============================================================================
// Client identification
// ============================================================================

/// Identity of the host application, attached to native media requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub app_name: String,
    pub app_version: String,
    pub device_model: String,
    pub os_name: String,
    pub os_version: String,
}

impl ClientInfo {
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            device_model: "unknown".to_string(),
            os_name: std::env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
        }
    }

    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = model.into();
        self
    }

    pub fn with_os(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.os_name = name.into();
        self.os_version = version.into();
        self
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_maps_to_its_command() {
        let events = [
            RemoteCommandEvent::Play,
            RemoteCommandEvent::Pause,
            RemoteCommandEvent::TogglePlayPause,
            RemoteCommandEvent::ChangePlaybackPosition(Duration::from_secs(3)),
            RemoteCommandEvent::SkipForward,
            RemoteCommandEvent::SkipBackward,
            RemoteCommandEvent::SeekForward,
            RemoteCommandEvent::SeekBackward,
        ];
        let commands: Vec<_> = events.iter().map(|e| e.command()).collect();
        assert_eq!(commands, RemoteCommand::ALL.to_vec());
    }

    #[test]
    fn now_playing_info_accepts_image_url_alias() {
        let info: NowPlayingInfo = serde_json::from_value(serde_json::json!({
            "title": "All Things Considered",
            "imageUrl": "https://cdn.example/art.jpg",
            "isLiveStream": true
        }))
        .unwrap();

        assert_eq!(info.artwork_url.as_deref(), Some("https://cdn.example/art.jpg"));
        assert!(info.is_live_stream);
        assert_eq!(info.artist, None);
    }
}
