//! Hand-written engine and system bridges for session tests.
//!
//! Every mock exposes a probe (an `Arc` shared with the test) that records
//! the calls the core made and lets the test play the engine's part by
//! firing observations.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AdaptiveDemuxer, AdaptivePipeline, ClientInfo, DemuxerEvent, ElementEvent,
    InterruptionSignal, InterruptionSource, ManualClock, MediaElement, NativeObservation,
    NativeOpenRequest, NativePlayerEngine, NativePlayerFactory, NowPlayingCenter, NowPlayingInfo,
    NowPlayingStatus, PlatformCallback, PlaybackPlatform, RemoteCommand, RemoteCommandCenter,
    RemoteCommandEvent, TimeControlStatus, WebMediaRuntime,
};
use bytes::Bytes;
use core_playback::PlaybackSession;
use core_runtime::config::StreamerConfig;
use core_runtime::events::{EventStream, PlaybackEvent};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Native engine
// ============================================================================

#[derive(Default)]
pub struct EngineProbe {
    pub calls: Mutex<Vec<String>>,
    pub request: Mutex<Option<NativeOpenRequest>>,
    observer: Mutex<Option<PlatformCallback<NativeObservation>>>,
    pub position: Mutex<Duration>,
    pub duration: Mutex<Option<Duration>>,
    pub status: Mutex<Option<TimeControlStatus>>,
    pub released: AtomicBool,
    pub open_error: Mutex<Option<String>>,
}

impl EngineProbe {
    /// Fires an observation the way the engine's KVO/listener would. Keeps
    /// firing after release so stale-signal handling can be exercised.
    pub fn emit(&self, observation: NativeObservation) {
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(observation);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

struct MockNativeEngine {
    probe: Arc<EngineProbe>,
}

#[async_trait]
impl NativePlayerEngine for MockNativeEngine {
    async fn open(
        &self,
        request: NativeOpenRequest,
        observer: PlatformCallback<NativeObservation>,
    ) -> BridgeResult<()> {
        self.probe.record("open");
        *self.probe.request.lock() = Some(request);
        *self.probe.observer.lock() = Some(observer);
        match self.probe.open_error.lock().clone() {
            Some(message) => Err(BridgeError::EngineRejected(message)),
            None => Ok(()),
        }
    }

    async fn play(&self) -> BridgeResult<()> {
        self.probe.record("play");
        *self.probe.status.lock() = Some(TimeControlStatus::Playing);
        self.probe
            .emit(NativeObservation::TimeControl(TimeControlStatus::Playing));
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.probe.record("pause");
        *self.probe.status.lock() = Some(TimeControlStatus::Paused);
        if !self.probe.is_released() {
            self.probe
                .emit(NativeObservation::TimeControl(TimeControlStatus::Paused));
        }
        Ok(())
    }

    async fn seek(&self, position: Duration) -> BridgeResult<()> {
        self.probe.record(format!("seek:{}", position.as_secs_f64()));
        *self.probe.position.lock() = position;
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        self.probe.record(format!("volume:{}", volume));
        Ok(())
    }

    async fn set_rate(&self, rate: f32) -> BridgeResult<()> {
        self.probe.record(format!("rate:{}", rate));
        Ok(())
    }

    fn current_time(&self) -> Option<Duration> {
        Some(*self.probe.position.lock())
    }

    fn duration(&self) -> Option<Duration> {
        *self.probe.duration.lock()
    }

    fn time_control_status(&self) -> TimeControlStatus {
        self.probe
            .status
            .lock()
            .unwrap_or(TimeControlStatus::Paused)
    }

    async fn release(&self) -> BridgeResult<()> {
        self.probe.record("release");
        self.probe.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNativeFactory {
    pub engines: Mutex<Vec<Arc<EngineProbe>>>,
    pub unavailable: AtomicBool,
    pub no_adaptive: AtomicBool,
    /// Applied to the next engine created.
    pub next_open_error: Mutex<Option<String>>,
    pub next_duration: Mutex<Option<Duration>>,
}

impl MockNativeFactory {
    pub fn engine(&self, index: usize) -> Arc<EngineProbe> {
        self.engines.lock()[index].clone()
    }

    pub fn last_engine(&self) -> Arc<EngineProbe> {
        self.engines
            .lock()
            .last()
            .cloned()
            .expect("no engine created")
    }

    pub fn created(&self) -> usize {
        self.engines.lock().len()
    }
}

impl NativePlayerFactory for MockNativeFactory {
    fn create_player(&self) -> BridgeResult<Box<dyn NativePlayerEngine>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("no audio session".into()));
        }
        let probe = Arc::new(EngineProbe::default());
        *probe.open_error.lock() = self.next_open_error.lock().take();
        *probe.duration.lock() = *self.next_duration.lock();
        self.engines.lock().push(probe.clone());
        Ok(Box::new(MockNativeEngine { probe }))
    }

    fn supports_adaptive(&self) -> bool {
        !self.no_adaptive.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Web engine
// ============================================================================

#[derive(Default)]
pub struct ElementProbe {
    pub calls: Mutex<Vec<String>>,
    pub source: Mutex<Option<String>>,
    observer: Mutex<Option<PlatformCallback<ElementEvent>>>,
    pub position: Mutex<Duration>,
    pub duration: Mutex<Option<Duration>>,
    pub paused: Mutex<bool>,
    pub volume: Mutex<Option<f32>>,
    pub reject_play: Mutex<Option<String>>,
}

impl ElementProbe {
    pub fn fire(&self, event: ElementEvent) {
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(event);
        }
    }

    pub fn has_observer(&self) -> bool {
        self.observer.lock().is_some()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn play_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| *c == "play").count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

struct MockElement {
    probe: Arc<ElementProbe>,
}

#[async_trait]
impl MediaElement for MockElement {
    fn set_observer(&self, observer: Option<PlatformCallback<ElementEvent>>) {
        *self.probe.observer.lock() = observer;
    }

    fn set_source(&self, url: &str) -> BridgeResult<()> {
        self.probe.record("set_source");
        *self.probe.source.lock() = Some(url.to_string());
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        self.probe.record("play");
        if let Some(message) = self.probe.reject_play.lock().clone() {
            return Err(BridgeError::EngineRejected(message));
        }
        *self.probe.paused.lock() = false;
        Ok(())
    }

    fn pause(&self) {
        self.probe.record("pause");
        *self.probe.paused.lock() = true;
    }

    fn current_time(&self) -> Duration {
        *self.probe.position.lock()
    }

    fn set_current_time(&self, position: Duration) {
        self.probe.record(format!("seek:{}", position.as_secs_f64()));
        *self.probe.position.lock() = position;
    }

    fn duration(&self) -> Option<Duration> {
        *self.probe.duration.lock()
    }

    fn is_paused(&self) -> bool {
        *self.probe.paused.lock()
    }

    fn set_volume(&self, volume: f32) {
        *self.probe.volume.lock() = Some(volume);
    }

    fn set_playback_rate(&self, rate: f32) {
        self.probe.record(format!("rate:{}", rate));
    }

    fn reset(&self) {
        self.probe.record("reset");
        *self.probe.source.lock() = None;
        *self.probe.position.lock() = Duration::ZERO;
    }
}

#[derive(Default)]
pub struct DemuxerProbe {
    pub calls: Mutex<Vec<String>>,
    observer: Mutex<Option<PlatformCallback<DemuxerEvent>>>,
}

impl DemuxerProbe {
    pub fn fire(&self, event: DemuxerEvent) {
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(event);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

struct MockDemuxer {
    probe: Arc<DemuxerProbe>,
}

impl AdaptiveDemuxer for MockDemuxer {
    fn set_observer(&self, observer: Option<PlatformCallback<DemuxerEvent>>) {
        *self.probe.observer.lock() = observer;
    }

    fn load_source(&self, url: &str) -> BridgeResult<()> {
        self.probe.calls.lock().push(format!("load_source:{}", url));
        Ok(())
    }

    fn attach_media(&self) -> BridgeResult<()> {
        self.probe.calls.lock().push("attach_media".to_string());
        Ok(())
    }

    fn destroy(&self) {
        self.probe.calls.lock().push("destroy".to_string());
    }
}

pub struct MockWebRuntime {
    pub adaptive: bool,
    pub elements: Mutex<Vec<Arc<ElementProbe>>>,
    pub demuxers: Mutex<Vec<Arc<DemuxerProbe>>>,
    pub reject_next_play: Mutex<Option<String>>,
}

impl MockWebRuntime {
    pub fn new(adaptive: bool) -> Self {
        Self {
            adaptive,
            elements: Mutex::new(Vec::new()),
            demuxers: Mutex::new(Vec::new()),
            reject_next_play: Mutex::new(None),
        }
    }

    pub fn element(&self, index: usize) -> Arc<ElementProbe> {
        self.elements.lock()[index].clone()
    }

    pub fn demuxer(&self, index: usize) -> Arc<DemuxerProbe> {
        self.demuxers.lock()[index].clone()
    }

    fn new_element(&self) -> Arc<ElementProbe> {
        let probe = Arc::new(ElementProbe::default());
        *probe.paused.lock() = true;
        *probe.reject_play.lock() = self.reject_next_play.lock().take();
        self.elements.lock().push(probe.clone());
        probe
    }
}

impl WebMediaRuntime for MockWebRuntime {
    fn supports_adaptive(&self) -> bool {
        self.adaptive
    }

    fn create_element(&self) -> BridgeResult<Box<dyn MediaElement>> {
        Ok(Box::new(MockElement {
            probe: self.new_element(),
        }))
    }

    fn create_adaptive(&self) -> BridgeResult<AdaptivePipeline> {
        let demuxer = Arc::new(DemuxerProbe::default());
        self.demuxers.lock().push(demuxer.clone());
        Ok(AdaptivePipeline {
            element: Box::new(MockElement {
                probe: self.new_element(),
            }),
            demuxer: Box::new(MockDemuxer { probe: demuxer }),
        })
    }
}

// ============================================================================
// System media session
// ============================================================================

#[derive(Default)]
pub struct MockRemoteCenter {
    pub enabled: Mutex<BTreeMap<RemoteCommand, bool>>,
    handler: Mutex<Option<PlatformCallback<RemoteCommandEvent>>>,
}

impl MockRemoteCenter {
    pub fn send(&self, event: RemoteCommandEvent) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    pub fn is_enabled(&self, command: RemoteCommand) -> bool {
        self.enabled.lock().get(&command).copied().unwrap_or(false)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }
}

impl RemoteCommandCenter for MockRemoteCenter {
    fn set_enabled(&self, command: RemoteCommand, enabled: bool) {
        self.enabled.lock().insert(command, enabled);
    }

    fn set_handler(&self, handler: Option<PlatformCallback<RemoteCommandEvent>>) {
        *self.handler.lock() = handler;
    }
}

#[derive(Default)]
pub struct MockInterruptionSource {
    handler: Mutex<Option<PlatformCallback<InterruptionSignal>>>,
}

impl MockInterruptionSource {
    pub fn signal(&self, signal: InterruptionSignal) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(signal);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.lock().is_some()
    }
}

impl InterruptionSource for MockInterruptionSource {
    fn subscribe(&self, handler: PlatformCallback<InterruptionSignal>) {
        *self.handler.lock() = Some(handler);
    }

    fn unsubscribe(&self) {
        *self.handler.lock() = None;
    }
}

#[derive(Default)]
pub struct MockNowPlaying {
    pub infos: Mutex<Vec<NowPlayingInfo>>,
    pub artwork: Mutex<Vec<Bytes>>,
    pub elapsed: Mutex<Vec<Duration>>,
    pub statuses: Mutex<Vec<NowPlayingStatus>>,
}

impl NowPlayingCenter for MockNowPlaying {
    fn update_info(&self, info: &NowPlayingInfo) {
        self.infos.lock().push(info.clone());
    }

    fn set_artwork(&self, artwork: Bytes) {
        self.artwork.lock().push(artwork);
    }

    fn set_elapsed(&self, elapsed: Duration) {
        self.elapsed.lock().push(elapsed);
    }

    fn set_status(&self, status: NowPlayingStatus) {
        self.statuses.lock().push(status);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct NativeHarness {
    pub session: PlaybackSession,
    pub factory: Arc<MockNativeFactory>,
    pub remote: Arc<MockRemoteCenter>,
    pub interruptions: Arc<MockInterruptionSource>,
    pub now_playing: Arc<MockNowPlaying>,
    pub clock: Arc<ManualClock>,
    pub events: EventStream,
}

impl NativeHarness {
    pub fn new() -> Self {
        let factory = Arc::new(MockNativeFactory::default());
        let remote = Arc::new(MockRemoteCenter::default());
        let interruptions = Arc::new(MockInterruptionSource::default());
        let now_playing = Arc::new(MockNowPlaying::default());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));

        let config = StreamerConfig::builder()
            .platform(PlaybackPlatform::Native(factory.clone()))
            .remote_command_center(remote.clone())
            .interruption_source(interruptions.clone())
            .now_playing_center(now_playing.clone())
            .clock(clock.clone())
            .client_info(
                ClientInfo::new("Radio", "4.2.0")
                    .with_device_model("iPhone15,2")
                    .with_os("iOS", "17.4"),
            )
            .build()
            .expect("valid config");

        let session = PlaybackSession::new(config).expect("session");
        let events = session.subscribe();

        Self {
            session,
            factory,
            remote,
            interruptions,
            now_playing,
            clock,
            events,
        }
    }

    /// Waits until every message queued so far has been handled, including
    /// signals the engine raised while handling them.
    pub async fn settle(&self) {
        settle(&self.session).await;
    }

    pub async fn drain(&mut self) -> Vec<PlaybackEvent> {
        self.settle().await;
        drain(&mut self.events)
    }
}

pub struct WebHarness {
    pub session: PlaybackSession,
    pub runtime: Arc<MockWebRuntime>,
    pub clock: Arc<ManualClock>,
    pub events: EventStream,
}

impl WebHarness {
    pub fn new(adaptive: bool) -> Self {
        let runtime = Arc::new(MockWebRuntime::new(adaptive));
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));

        let config = StreamerConfig::builder()
            .platform(PlaybackPlatform::Web(runtime.clone()))
            .clock(clock.clone())
            .build()
            .expect("valid config");

        let session = PlaybackSession::new(config).expect("session");
        let events = session.subscribe();

        Self {
            session,
            runtime,
            clock,
            events,
        }
    }

    pub async fn settle(&self) {
        settle(&self.session).await;
    }

    pub async fn drain(&mut self) -> Vec<PlaybackEvent> {
        self.settle().await;
        drain(&mut self.events)
    }
}

/// Each round trip flushes one level of engine reactions (a command that
/// makes the engine report, a signal that starts deferred playback).
pub async fn settle(session: &PlaybackSession) {
    for _ in 0..3 {
        session.snapshot().await.expect("session alive");
    }
}

pub fn drain(stream: &mut EventStream) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        events.push(event);
    }
    events
}
