//! Adapter over the host's native streaming player.

use super::{BackendAdapter, BackendSignal, SignalSink};
use crate::error::{PlaybackError, Result};
use crate::selection::BackendKind;
use bridge_traits::{
    ItemStatus, NativeObservation, NativeOpenRequest, NativePlayerEngine, NativePlayerFactory,
    NativeSourceKind, PlatformCallback,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Wraps one `NativePlayerEngine` created from the host factory.
pub struct NativeBackend {
    factory: Arc<dyn NativePlayerFactory>,
    source: NativeSourceKind,
    headers: HashMap<String, String>,
    tick_interval: Duration,
    engine: Option<Box<dyn NativePlayerEngine>>,
}

impl NativeBackend {
    pub fn new(
        factory: Arc<dyn NativePlayerFactory>,
        source: NativeSourceKind,
        headers: HashMap<String, String>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            factory,
            source,
            headers,
            tick_interval,
            engine: None,
        }
    }

    fn engine(&self) -> Result<&dyn NativePlayerEngine> {
        self.engine
            .as_deref()
            .ok_or_else(|| PlaybackError::Internal("native engine not loaded".to_string()))
    }
}

/// Translates one engine observation. `Unknown` item status carries nothing.
pub(crate) fn map_observation(observation: NativeObservation) -> Option<BackendSignal> {
    match observation {
        NativeObservation::Status(ItemStatus::ReadyToPlay) => Some(BackendSignal::Ready),
        NativeObservation::Status(ItemStatus::Failed(message)) => {
            Some(BackendSignal::Failed(message))
        }
        NativeObservation::Status(ItemStatus::Unknown) => None,
        NativeObservation::TimeControl(status) => Some(BackendSignal::TimeControl(status)),
        NativeObservation::BufferEmpty(empty) => Some(BackendSignal::BufferEmpty(empty)),
        NativeObservation::BufferFull(full) => Some(BackendSignal::BufferFull(full)),
        NativeObservation::LikelyToKeepUp(likely) => Some(BackendSignal::LikelyToKeepUp(likely)),
        NativeObservation::PeriodicTime(position) => Some(BackendSignal::Tick(position)),
        NativeObservation::PlayedToEnd => Some(BackendSignal::Ended),
        NativeObservation::TimedMetadata(items) => Some(BackendSignal::TimedMetadata(items)),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl BackendAdapter for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native(self.source)
    }

    async fn load(&mut self, url: &Url, sink: SignalSink) -> Result<()> {
        let engine = self
            .factory
            .create_player()
            .map_err(|e| PlaybackError::EngineUnavailable(e.to_string()))?;

        let request = NativeOpenRequest::new(url.as_str(), self.source)
            .with_headers(self.headers.clone())
            .with_tick_interval(self.tick_interval);

        let observer: PlatformCallback<NativeObservation> =
            Arc::new(move |observation: NativeObservation| {
                if let Some(signal) = map_observation(observation) {
                    sink.emit(signal);
                }
            });

        if let Err(e) = engine.open(request, observer).await {
            // The engine may have registered observers before failing.
            if let Err(release_err) = engine.release().await {
                warn!(error = %release_err, "Failed to release rejected native engine");
            }
            return Err(PlaybackError::BackendFailure(e.to_string()));
        }

        debug!(source = ?self.source, "Native engine opened");
        self.engine = Some(engine);
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.engine()?
            .play()
            .await
            .map_err(|e| PlaybackError::BackendFailure(e.to_string()))
    }

    async fn pause(&mut self) -> Result<()> {
        Ok(self.engine()?.pause().await?)
    }

    async fn seek(&mut self, position: Duration) -> Result<()> {
        Ok(self.engine()?.seek(position).await?)
    }

    async fn set_volume(&mut self, volume: f32) -> Result<()> {
        Ok(self.engine()?.set_volume(volume).await?)
    }

    async fn set_rate(&mut self, rate: f32) -> Result<()> {
        Ok(self.engine()?.set_rate(rate).await?)
    }

    fn current_time(&self) -> Option<Duration> {
        self.engine.as_ref().and_then(|engine| engine.current_time())
    }

    fn duration(&self) -> Option<Duration> {
        self.engine.as_ref().and_then(|engine| engine.duration())
    }

    fn is_playing(&self) -> bool {
        self.engine
            .as_ref()
            .map(|engine| engine.time_control_status().is_playing())
            .unwrap_or(false)
    }

    async fn teardown(&mut self) {
        let Some(engine) = self.engine.take() else {
            return;
        };

        if let Err(e) = engine.pause().await {
            warn!(error = %e, "Native engine pause failed during teardown");
        }
        if let Err(e) = engine.release().await {
            warn!(error = %e, "Native engine release failed during teardown");
        }
    }
}
