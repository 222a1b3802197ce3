//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each target.
//!
//! Native engines (AVPlayer, ExoPlayer) report from arbitrary threads, so
//! bridge implementations must be `Send + Sync` there. On `wasm32` everything
//! runs on the browser's main thread and `web_sys` handles are not
//! thread-safe, so the same bounds collapse to no-ops.

use std::sync::Arc;

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}

/// Marker trait equivalent to `Send` on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSend for T where T: Send {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSend {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSend for T {}

/// Observer callback handed to an engine bridge.
///
/// Engines invoke it for every observation they report. The callback never
/// blocks; it only enqueues the observation for the core to process.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformCallback<E> = Arc<dyn Fn(E) + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type PlatformCallback<E> = Arc<dyn Fn(E)>;
