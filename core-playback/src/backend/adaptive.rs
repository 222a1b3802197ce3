//! Adapter over a media element fronted by an adaptive demuxer.
//!
//! `play` is deferred until the demuxer reports the manifest as parsed.
//! Segment metadata is only forwarded from that point on.

use super::progressive::ElementDriver;
use super::{BackendAdapter, BackendSignal, SignalSink};
use crate::error::{PlaybackError, Result};
use crate::metadata::MetadataExtractor;
use crate::selection::BackendKind;
use bridge_traits::{AdaptiveDemuxer, DemuxerEvent, MediaElement, PlatformCallback, WebMediaRuntime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub struct AdaptiveWebBackend {
    runtime: Arc<dyn WebMediaRuntime>,
    poll_interval: Duration,
    driver: Option<ElementDriver>,
    demuxer: Option<Box<dyn AdaptiveDemuxer>>,
    manifest_parsed: bool,
    play_requested: bool,
}

impl AdaptiveWebBackend {
    pub fn new(runtime: Arc<dyn WebMediaRuntime>, poll_interval: Duration) -> Self {
        Self {
            runtime,
            poll_interval,
            driver: None,
            demuxer: None,
            manifest_parsed: false,
            play_requested: false,
        }
    }

    fn driver(&mut self) -> Result<&mut ElementDriver> {
        self.driver
            .as_mut()
            .ok_or_else(|| PlaybackError::Internal("adaptive pipeline not loaded".to_string()))
    }

    fn demuxer_observer(sink: SignalSink) -> PlatformCallback<DemuxerEvent> {
        let metadata_enabled = Arc::new(AtomicBool::new(false));
        let extractor = MetadataExtractor::new();

        Arc::new(move |event: DemuxerEvent| match event {
            DemuxerEvent::ManifestParsed => {
                metadata_enabled.store(true, Ordering::Release);
                sink.emit(BackendSignal::ManifestParsed);
            }
            DemuxerEvent::FragmentMetadata(payloads) => {
                if !metadata_enabled.load(Ordering::Acquire) {
                    return;
                }
                let items = extractor.parse_id3_payloads(&payloads);
                if !items.is_empty() {
                    sink.emit(BackendSignal::TimedMetadata(items));
                }
            }
            DemuxerEvent::Error { fatal: true, details } => {
                sink.emit(BackendSignal::Failed(details));
            }
            DemuxerEvent::Error { fatal: false, details } => {
                warn!(details = %details, "Recoverable demuxer error");
            }
        })
    }

    fn release_pipeline(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.detach();
        }
        if let Some(demuxer) = self.demuxer.take() {
            demuxer.set_observer(None);
            demuxer.destroy();
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl BackendAdapter for AdaptiveWebBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::AdaptiveWeb
    }

    async fn load(&mut self, url: &Url, sink: SignalSink) -> Result<()> {
        let pipeline = self
            .runtime
            .create_adaptive()
            .map_err(|e| PlaybackError::EngineUnavailable(e.to_string()))?;

        let element: Arc<dyn MediaElement> = Arc::from(pipeline.element);
        pipeline
            .demuxer
            .set_observer(Some(Self::demuxer_observer(sink.clone())));
        self.driver = Some(ElementDriver::attach(element, sink, self.poll_interval));
        self.demuxer = Some(pipeline.demuxer);
        self.manifest_parsed = false;
        self.play_requested = false;

        let attached = match self.demuxer.as_deref() {
            Some(demuxer) => demuxer
                .load_source(url.as_str())
                .and_then(|_| demuxer.attach_media()),
            None => Ok(()),
        };

        if let Err(e) = attached {
            self.release_pipeline();
            return Err(PlaybackError::BackendFailure(e.to_string()));
        }

        debug!("Adaptive pipeline attached, waiting for manifest");
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        if !self.manifest_parsed {
            self.play_requested = true;
            return Ok(());
        }
        self.driver()?.play().await;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.play_requested = false;
        self.driver()?.pause();
        Ok(())
    }

    async fn seek(&mut self, position: Duration) -> Result<()> {
        self.driver()?.element().set_current_time(position);
        Ok(())
    }

    async fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.driver()?.element().set_volume(volume);
        Ok(())
    }

    async fn set_rate(&mut self, rate: f32) -> Result<()> {
        self.driver()?.element().set_playback_rate(rate);
        Ok(())
    }

    fn current_time(&self) -> Option<Duration> {
        self.driver.as_ref().map(|d| d.element().current_time())
    }

    fn duration(&self) -> Option<Duration> {
        self.driver.as_ref().and_then(|d| d.element().duration())
    }

    fn is_playing(&self) -> bool {
        self.driver
            .as_ref()
            .map(|d| !d.element().is_paused())
            .unwrap_or(false)
    }

    async fn on_signal(&mut self, signal: &BackendSignal) -> Result<()> {
        if *signal != BackendSignal::ManifestParsed || self.manifest_parsed {
            return Ok(());
        }

        self.manifest_parsed = true;
        if std::mem::take(&mut self.play_requested) {
            debug!("Manifest parsed, starting deferred playback");
            self.driver()?.play().await;
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        self.release_pipeline();
    }
}
