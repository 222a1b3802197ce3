//! Adapter over a plain media element pointed at the stream URL.

use super::{BackendAdapter, BackendSignal, SignalSink};
use crate::error::{PlaybackError, Result};
use crate::runtime;
use crate::selection::BackendKind;
use bridge_traits::{ElementEvent, MediaElement, PlatformCallback, TimeControlStatus, WebMediaRuntime};
use futures::future::AbortHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Translates one element lifecycle event.
pub(crate) fn map_element_event(event: ElementEvent) -> Vec<BackendSignal> {
    match event {
        ElementEvent::Playing => vec![BackendSignal::TimeControl(TimeControlStatus::Playing)],
        ElementEvent::Pause => vec![BackendSignal::TimeControl(TimeControlStatus::Paused)],
        ElementEvent::Ended => vec![BackendSignal::Ended],
        ElementEvent::Error(message) => vec![BackendSignal::Failed(message)],
        ElementEvent::Waiting => vec![BackendSignal::BufferEmpty(true)],
        ElementEvent::CanPlayThrough => {
            vec![BackendSignal::Ready, BackendSignal::LikelyToKeepUp(true)]
        }
    }
}

/// Element handling shared by both web adapters: observers, play promise,
/// and the position poll.
pub(crate) struct ElementDriver {
    element: Arc<dyn MediaElement>,
    sink: SignalSink,
    poll_interval: Duration,
    poll: Option<AbortHandle>,
}

impl ElementDriver {
    pub(crate) fn attach(element: Arc<dyn MediaElement>, sink: SignalSink, poll_interval: Duration) -> Self {
        let observer_sink = sink.clone();
        let observer: PlatformCallback<ElementEvent> = Arc::new(move |event: ElementEvent| {
            for signal in map_element_event(event) {
                observer_sink.emit(signal);
            }
        });
        element.set_observer(Some(observer));

        Self {
            element,
            sink,
            poll_interval,
            poll: None,
        }
    }

    pub(crate) fn element(&self) -> &dyn MediaElement {
        self.element.as_ref()
    }

    /// Starts the element. A rejected play promise is reported as a
    /// failure signal, not returned.
    pub(crate) async fn play(&mut self) {
        if let Err(e) = self.element.play().await {
            warn!(error = %e, "Media element refused to play");
            self.sink.emit(BackendSignal::Failed(e.to_string()));
            return;
        }

        self.sink
            .emit(BackendSignal::TimeControl(TimeControlStatus::Playing));
        self.start_poll();
    }

    pub(crate) fn pause(&mut self) {
        self.element.pause();
        self.sink
            .emit(BackendSignal::TimeControl(TimeControlStatus::Paused));
    }

    fn start_poll(&mut self) {
        if self.poll.is_some() {
            return;
        }

        let element = self.element.clone();
        let sink = self.sink.clone();
        self.poll = Some(runtime::spawn_ticker(self.poll_interval, move || {
            if !element.is_paused() {
                sink.emit(BackendSignal::Tick(element.current_time()));
            }
        }));
    }

    pub(crate) fn stop_poll(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
    }

    pub(crate) fn detach(&mut self) {
        self.stop_poll();
        self.sink.close();
        self.element.pause();
        self.element.set_observer(None);
        self.element.reset();
    }
}

/// Media element fed a directly decodable URL.
pub struct ProgressiveWebBackend {
    runtime: Arc<dyn WebMediaRuntime>,
    poll_interval: Duration,
    driver: Option<ElementDriver>,
}

impl ProgressiveWebBackend {
    pub fn new(runtime: Arc<dyn WebMediaRuntime>, poll_interval: Duration) -> Self {
        Self {
            runtime,
            poll_interval,
            driver: None,
        }
    }

    fn driver(&mut self) -> Result<&mut ElementDriver> {
        self.driver
            .as_mut()
            .ok_or_else(|| PlaybackError::Internal("media element not loaded".to_string()))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl BackendAdapter for ProgressiveWebBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ProgressiveWeb
    }

    async fn load(&mut self, url: &Url, sink: SignalSink) -> Result<()> {
        let element: Arc<dyn MediaElement> = Arc::from(
            self.runtime
                .create_element()
                .map_err(|e| PlaybackError::EngineUnavailable(e.to_string()))?,
        );

        let mut driver = ElementDriver::attach(element, sink, self.poll_interval);
        if let Err(e) = driver.element().set_source(url.as_str()) {
            driver.detach();
            return Err(PlaybackError::BackendFailure(e.to_string()));
        }

        debug!("Media element source set");
        self.driver = Some(driver);
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.driver()?.play().await;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
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

    async fn teardown(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_element_events() {
        assert_eq!(
            map_element_event(ElementEvent::Waiting),
            vec![BackendSignal::BufferEmpty(true)]
        );
        assert_eq!(
            map_element_event(ElementEvent::CanPlayThrough),
            vec![BackendSignal::Ready, BackendSignal::LikelyToKeepUp(true)]
        );
        assert_eq!(
            map_element_event(ElementEvent::Error("MEDIA_ERR_NETWORK".into())),
            vec![BackendSignal::Failed("MEDIA_ERR_NETWORK".into())]
        );
        assert_eq!(
            map_element_event(ElementEvent::Pause),
            vec![BackendSignal::TimeControl(TimeControlStatus::Paused)]
        );
    }
}
