//! Remote audio streaming core.
//!
//! Facade over the workspace crates so hosts depend on one package:
//!
//! - [`traits`]: host capability contracts (`bridge-traits`)
//! - [`runtime`]: configuration, events and logging (`core-runtime`)
//! - [`playback`]: the playback session (`core-playback`)
//!
//! Feature flags:
//!
//! - `desktop-shims` (default): reqwest-backed artwork client on native targets
//! - `wasm`: browser bridges and the `RemoteStreamer` JavaScript class
//!
//! ```ignore
//! use remote_streamer::prelude::*;
//!
//! let config = StreamerConfig::builder().platform(platform).build()?;
//! let session = PlaybackSession::new(config)?;
//! session.play("https://example.com/live.m3u8", PlayOptions::default()).await?;
//! ```

pub use bridge_traits as traits;
pub use core_playback as playback;
pub use core_runtime as runtime;

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop as desktop;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm as web;

/// The types most hosts need.
pub mod prelude {
    pub use bridge_traits::media_session::{ClientInfo, NowPlayingInfo};
    pub use bridge_traits::PlaybackPlatform;
    pub use core_playback::{PlayOptions, PlaybackError, PlaybackSession, SessionSnapshot};
    pub use core_runtime::config::{PlaybackSettings, StreamerConfig};
    pub use core_runtime::events::{EventKind, PlaybackEvent};
}
