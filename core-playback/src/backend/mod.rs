//! # Backend Adapters
//!
//! One adapter owns one live engine instance for the lifetime of a single
//! `play` request.
//!
//! ## Overview
//!
//! Every adapter exposes the same primitive operations and reports engine
//! activity as [`BackendSignal`]s through the [`SignalSink`] it is handed in
//! [`BackendAdapter::load`]. The sink is stamped with the session generation
//! that created it, so signals from a superseded engine are recognisable and
//! dropped by the session.
//!
//! | Variant | Engine | Time source |
//! |---------|--------|-------------|
//! | [`NativeBackend`] | host `NativePlayerEngine` | engine periodic observer |
//! | [`ProgressiveWebBackend`] | `MediaElement` | fixed poll |
//! | [`AdaptiveWebBackend`] | `MediaElement` + `AdaptiveDemuxer` | fixed poll |

mod adaptive;
mod native;
mod progressive;

pub use adaptive::AdaptiveWebBackend;
pub use native::NativeBackend;
pub use progressive::ProgressiveWebBackend;

use crate::error::Result;
use crate::selection::BackendKind;
use bridge_traits::{PlatformSend, TimeControlStatus, TimedMetadataItem};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Raw engine activity, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSignal {
    /// The engine can start rendering.
    Ready,
    TimeControl(TimeControlStatus),
    BufferEmpty(bool),
    BufferFull(bool),
    LikelyToKeepUp(bool),
    /// Current playback position.
    Tick(Duration),
    /// End of media reached.
    Ended,
    /// Fatal engine failure.
    Failed(String),
    TimedMetadata(Vec<TimedMetadataItem>),
    /// The adaptive manifest was parsed and playback may start.
    ManifestParsed,
}

#[cfg(not(target_arch = "wasm32"))]
type DeliverFn = dyn Fn(u64, BackendSignal) -> bool + Send + Sync;

#[cfg(target_arch = "wasm32")]
type DeliverFn = dyn Fn(u64, BackendSignal) -> bool;

/// Channel from an adapter (and the engine callbacks it installs) back to
/// the session.
///
/// Cloned freely into engine observers. Once closed it silently drops
/// everything.
#[derive(Clone)]
pub struct SignalSink {
    generation: u64,
    deliver: Arc<DeliverFn>,
    closed: Arc<AtomicBool>,
}

impl SignalSink {
    /// `deliver` receives the generation and the signal and reports whether
    /// the receiver is still alive.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new<F>(generation: u64, deliver: F) -> Self
    where
        F: Fn(u64, BackendSignal) -> bool + Send + Sync + 'static,
    {
        Self {
            generation,
            deliver: Arc::new(deliver),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new<F>(generation: u64, deliver: F) -> Self
    where
        F: Fn(u64, BackendSignal) -> bool + 'static,
    {
        Self {
            generation,
            deliver: Arc::new(deliver),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, signal: BackendSignal) {
        if self.is_closed() {
            return;
        }
        if !(self.deliver)(self.generation, signal) {
            self.close();
        }
    }

    /// Stops delivery for this sink and every clone of it.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SignalSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSink")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Primitive operations over one live engine.
///
/// Commands only fail when the engine rejects them outright; anything that
/// goes wrong while media is running is reported as
/// [`BackendSignal::Failed`].
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait BackendAdapter: PlatformSend {
    fn kind(&self) -> BackendKind;

    /// Creates the engine, installs observers that report into `sink`, and
    /// points it at `url`.
    async fn load(&mut self, url: &Url, sink: SignalSink) -> Result<()>;

    async fn play(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn seek(&mut self, position: Duration) -> Result<()>;

    async fn set_volume(&mut self, volume: f32) -> Result<()>;

    async fn set_rate(&mut self, rate: f32) -> Result<()>;

    fn current_time(&self) -> Option<Duration>;

    /// `None` while unknown and for live streams.
    fn duration(&self) -> Option<Duration>;

    fn is_playing(&self) -> bool;

    /// Called by the session for every signal of the current generation
    /// before it is normalized.
    async fn on_signal(&mut self, _signal: &BackendSignal) -> Result<()> {
        Ok(())
    }

    /// Releases observers, timers and the engine. Must not emit afterwards.
    async fn teardown(&mut self);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Sink that records everything it receives.
    pub(crate) fn recording_sink(generation: u64) -> (SignalSink, Arc<Mutex<Vec<BackendSignal>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();
        let sink = SignalSink::new(generation, move |_generation, signal| {
            log.lock().push(signal);
            true
        });
        (sink, received)
    }

    #[test]
    fn closed_sink_drops_signals_for_every_clone() {
        let (sink, received) = recording_sink(3);
        let clone = sink.clone();

        sink.emit(BackendSignal::Ready);
        clone.close();
        sink.emit(BackendSignal::Ended);

        assert_eq!(*received.lock(), vec![BackendSignal::Ready]);
        assert!(sink.is_closed());
    }

    #[test]
    fn sink_closes_itself_when_receiver_is_gone() {
        let sink = SignalSink::new(1, |_, _| false);

        sink.emit(BackendSignal::Ready);

        assert!(sink.is_closed());
    }

    #[test]
    fn sink_stamps_generation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let sink = SignalSink::new(7, move |generation, _| {
            log.lock().push(generation);
            true
        });

        sink.emit(BackendSignal::Ended);

        assert_eq!(*seen.lock(), vec![7]);
        assert_eq!(sink.generation(), 7);
    }
}
