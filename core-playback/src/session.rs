//! # Playback Session
//!
//! The single command-serialization point between the host, the system
//! media surfaces and the live backend.
//!
//! ## Architecture
//!
//! ```text
//!  host commands ─┐
//!  remote cmds  ──┼──> mpsc queue ──> SessionActor ──> BackendAdapter
//!  interruptions ─┤                      │   ▲
//!  backend sigs ──┘                      │   └── SignalSink (generation n)
//!                                        ▼
//!                          EventNormalizer ──> EventEmitter ──> host
//! ```
//!
//! [`PlaybackSession`] is a cheap cloneable handle. Every operation is a
//! message to one actor task, which owns the backend and all lifecycle
//! state, so no two operations ever interleave. Each command resolves
//! through a oneshot reply exactly once.
//!
//! Every backend is loaded under a new generation number. `stop` and a
//! superseding `play` bump the generation before tearing the backend down,
//! so late signals from the old engine are dropped.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackSession, PlayOptions};
//! use core_runtime::events::EventKind;
//!
//! let session = PlaybackSession::new(config)?;
//! let mut events = session.subscribe().only(&[EventKind::Play, EventKind::Stop]);
//!
//! session
//!     .play("https://cdn.example/live.m3u8", PlayOptions::new().with_command_center(true))
//!     .await?;
//! ```
//!
//! On native targets the session must be created inside a Tokio runtime.

use crate::backend::{
    AdaptiveWebBackend, BackendAdapter, BackendSignal, NativeBackend, ProgressiveWebBackend,
    SignalSink,
};
use crate::error::{PlaybackError, Result};
use crate::headers;
use crate::interruption::{InterruptionAction, InterruptionHandler};
use crate::normalizer::EventNormalizer;
use crate::now_playing::NowPlayingController;
use crate::remote::{RemoteAction, RemoteCommandRouter};
use crate::runtime;
use crate::selection::{self, BackendKind};
use crate::state::{SessionState, StateModel};
use bridge_traits::{
    ClientInfo, InterruptionSignal, InterruptionSource, NowPlayingInfo, PlatformCallback,
    PlaybackPlatform, RemoteCommandEvent,
};
use core_runtime::config::{PlaybackSettings, StreamerConfig};
use core_runtime::events::{EventEmitter, EventKind, EventStream, ListenerHandle, PlaybackEvent};
use core_runtime::logging::redact_url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

// ============================================================================
// Public types
// ============================================================================

/// Per-`play` options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayOptions {
    /// Enable lock screen / headset transport commands.
    pub enable_command_center: bool,
    /// Also enable skip and scrub commands. Ignored unless
    /// `enable_command_center` is set.
    pub enable_command_center_seek: bool,
}

impl PlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command_center(mut self, enabled: bool) -> Self {
        self.enable_command_center = enabled;
        self
    }

    pub fn with_command_center_seek(mut self, enabled: bool) -> Self {
        self.enable_command_center_seek = enabled;
        self
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub url: Option<String>,
    pub state: SessionState,
    /// Seconds.
    pub current_time: f64,
    /// Seconds; `None` while unknown or live.
    pub duration: Option<f64>,
    pub volume: f32,
    pub playback_rate: f32,
    pub backend: Option<BackendKind>,
}

// ============================================================================
// Messages
// ============================================================================

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Play {
        url: String,
        options: PlayOptions,
        reply: Reply<Result<()>>,
    },
    Pause(Reply<()>),
    Resume(Reply<()>),
    Stop(Reply<()>),
    SeekTo(f64, Reply<()>),
    SeekBy(f64, Reply<()>),
    SetVolume(f32, Reply<()>),
    SetRate(f32, Reply<()>),
    IsPlaying(Reply<bool>),
    Snapshot(Reply<SessionSnapshot>),
    SetNowPlaying(NowPlayingInfo, Reply<()>),
    Shutdown(Reply<()>),
}

enum SessionMessage {
    Command(Command),
    Signal { generation: u64, signal: BackendSignal },
    Remote(RemoteCommandEvent),
    Interruption(InterruptionSignal),
}

type MessageSender = mpsc::UnboundedSender<SessionMessage>;
type WeakMessageSender = mpsc::WeakUnboundedSender<SessionMessage>;

// ============================================================================
// Handle
// ============================================================================

/// Host-facing handle to a playback session.
#[derive(Clone)]
pub struct PlaybackSession {
    tx: MessageSender,
    emitter: EventEmitter,
}

impl PlaybackSession {
    /// Spawns the session task and hooks up the configured system bridges.
    pub fn new(config: StreamerConfig) -> Result<Self> {
        config.validate()?;

        let emitter = EventEmitter::new(config.settings.event_buffer_size);
        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();

        if let Some(center) = config.remote_command_center.as_ref() {
            let forward = weak.clone();
            let handler: PlatformCallback<RemoteCommandEvent> =
                Arc::new(move |event: RemoteCommandEvent| {
                    if let Some(tx) = forward.upgrade() {
                        let _ = tx.send(SessionMessage::Remote(event));
                    }
                });
            center.set_handler(Some(handler));
        }

        if let Some(source) = config.interruption_source.as_ref() {
            let forward = weak.clone();
            let handler: PlatformCallback<InterruptionSignal> =
                Arc::new(move |signal: InterruptionSignal| {
                    if let Some(tx) = forward.upgrade() {
                        let _ = tx.send(SessionMessage::Interruption(signal));
                    }
                });
            source.subscribe(handler);
        }

        let actor = SessionActor::new(config, emitter.clone(), weak);
        runtime::spawn(actor.run(rx));

        Ok(Self { tx, emitter })
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SessionMessage::Command(build(reply)))
            .map_err(|_| PlaybackError::SessionClosed)?;
        response.await.map_err(|_| PlaybackError::SessionClosed)
    }

    /// Starts streaming `url`, replacing whatever was playing.
    ///
    /// Resolves once the engine accepted the stream. Fails with
    /// [`PlaybackError::InvalidUrl`] without touching current playback when
    /// the URL does not parse.
    pub async fn play(&self, url: impl Into<String>, options: PlayOptions) -> Result<()> {
        let url = url.into();
        self.request(|reply| Command::Play {
            url,
            options,
            reply,
        })
        .await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(Command::Stop).await
    }

    /// Seeks to `position` seconds, clamped to the known duration.
    pub async fn seek_to(&self, position: f64) -> Result<()> {
        self.request(|reply| Command::SeekTo(position, reply)).await
    }

    /// Seeks by `offset` seconds relative to the current position.
    pub async fn seek_by(&self, offset: f64) -> Result<()> {
        self.request(|reply| Command::SeekBy(offset, reply)).await
    }

    /// Sets the volume, clamped to `[0, 1]`. Kept for later loads when
    /// nothing is playing.
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.request(|reply| Command::SetVolume(volume, reply)).await
    }

    pub async fn set_playback_rate(&self, rate: f32) -> Result<()> {
        self.request(|reply| Command::SetRate(rate, reply)).await
    }

    /// Whether the engine reports active playback.
    pub async fn is_playing(&self) -> Result<bool> {
        self.request(Command::IsPlaying).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Updates the now-playing display. Artwork is fetched in the background.
    pub async fn set_now_playing_info(&self, info: NowPlayingInfo) -> Result<()> {
        self.request(|reply| Command::SetNowPlaying(info, reply)).await
    }

    /// Feeds an interruption from a host that does not provide an
    /// [`InterruptionSource`].
    pub fn handle_interruption(&self, signal: InterruptionSignal) -> Result<()> {
        self.tx
            .send(SessionMessage::Interruption(signal))
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Feeds a remote command from a host that routes them itself.
    pub fn handle_remote_command(&self, event: RemoteCommandEvent) -> Result<()> {
        self.tx
            .send(SessionMessage::Remote(event))
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Stops playback, detaches system handlers, and ends the session task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    // ------------------------------------------------------------------------
    // Event surface
    // ------------------------------------------------------------------------

    pub fn subscribe(&self) -> EventStream {
        self.emitter.subscribe()
    }

    pub fn add_listener(
        &self,
        kind: EventKind,
        callback: PlatformCallback<PlaybackEvent>,
    ) -> ListenerHandle {
        self.emitter.add_listener(kind, callback)
    }

    pub fn add_any_listener(&self, callback: PlatformCallback<PlaybackEvent>) -> ListenerHandle {
        self.emitter.add_any_listener(callback)
    }

    pub fn remove_all_listeners(&self) {
        self.emitter.remove_all_listeners();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("closed", &self.is_closed())
            .field("emitter", &self.emitter)
            .finish()
    }
}

// ============================================================================
// Actor
// ============================================================================

struct SessionActor {
    platform: PlaybackPlatform,
    client_info: ClientInfo,
    settings: PlaybackSettings,
    interruption_source: Option<Arc<dyn InterruptionSource>>,

    emitter: EventEmitter,
    normalizer: EventNormalizer,
    state: StateModel,
    router: RemoteCommandRouter,
    interruptions: InterruptionHandler,
    now_playing: NowPlayingController,

    backend: Option<Box<dyn BackendAdapter>>,
    sink: Option<SignalSink>,
    url: Option<String>,
    volume: f32,
    rate: f32,
    generation: u64,
    tx: WeakMessageSender,
}

impl SessionActor {
    fn new(config: StreamerConfig, emitter: EventEmitter, tx: WeakMessageSender) -> Self {
        let settings = config.settings;
        Self {
            normalizer: EventNormalizer::new(config.clock.clone(), settings.time_update_interval()),
            router: RemoteCommandRouter::new(config.remote_command_center, settings.skip_interval()),
            now_playing: NowPlayingController::new(
                config.now_playing_center,
                config.http_client,
                settings.artwork_fetch_timeout(),
            ),
            platform: config.platform,
            client_info: config.client_info,
            interruption_source: config.interruption_source,
            settings,
            emitter,
            state: StateModel::new(),
            interruptions: InterruptionHandler::new(),
            backend: None,
            sink: None,
            url: None,
            volume: 1.0,
            rate: 1.0,
            generation: 0,
            tx,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionMessage>) {
        debug!(platform = self.platform.name(), "Playback session started");

        while let Some(message) = rx.recv().await {
            match message {
                SessionMessage::Command(Command::Shutdown(reply)) => {
                    self.shutdown().await;
                    let _ = reply.send(());
                    return;
                }
                SessionMessage::Command(command) => self.handle_command(command).await,
                SessionMessage::Signal { generation, signal } => {
                    self.handle_signal(generation, signal).await
                }
                SessionMessage::Remote(event) => self.handle_remote(event).await,
                SessionMessage::Interruption(signal) => self.handle_interruption(signal).await,
            }
        }

        // Every handle was dropped.
        self.shutdown().await;
    }

    async fn handle_command(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            Command::Play {
                url,
                options,
                reply,
            } => {
                let result = self.play(url, options).await;
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                self.pause().await;
                let _ = reply.send(());
            }
            Command::Resume(reply) => {
                self.resume().await;
                let _ = reply.send(());
            }
            Command::Stop(reply) => {
                self.stop().await;
                let _ = reply.send(());
            }
            Command::SeekTo(position, reply) => {
                self.seek_to(position).await;
                let _ = reply.send(());
            }
            Command::SeekBy(offset, reply) => {
                self.seek_by(offset).await;
                let _ = reply.send(());
            }
            Command::SetVolume(volume, reply) => {
                self.set_volume(volume).await;
                let _ = reply.send(());
            }
            Command::SetRate(rate, reply) => {
                self.set_rate(rate).await;
                let _ = reply.send(());
            }
            Command::IsPlaying(reply) => {
                let _ = reply.send(self.is_playing());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::SetNowPlaying(info, reply) => {
                self.now_playing.set_info(info);
                let _ = reply.send(());
            }
            Command::Shutdown(reply) => {
                self.shutdown().await;
                let _ = reply.send(());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    async fn play(&mut self, url: String, options: PlayOptions) -> Result<()> {
        let parsed = match selection::validate_url(&url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Rejected play request");
                return Err(e);
            }
        };

        self.teardown_backend().await;

        let kind = selection::select_backend(&parsed, &self.platform, &self.settings.adaptive_extension);
        self.router.configure(&options);

        self.generation += 1;
        self.normalizer.reset();
        self.state.begin_load();
        self.url = Some(parsed.to_string());
        info!(
            url = %redact_url(parsed.as_str()),
            backend = kind.name(),
            generation = self.generation,
            "Loading stream"
        );

        let mut backend = self.create_backend(kind);
        let sink = self.signal_sink(self.generation);
        self.sink = Some(sink.clone());

        if let Err(e) = backend.load(&parsed, sink).await {
            return Err(self.reject_load(backend, e).await);
        }

        let volume = if self.interruptions.is_ducked() {
            self.settings.duck_volume.min(self.volume)
        } else {
            self.volume
        };
        apply_output_settings(backend.as_mut(), volume, self.rate).await;

        if let Err(e) = backend.play().await {
            return Err(self.reject_load(backend, e).await);
        }

        self.backend = Some(backend);
        Ok(())
    }

    /// Tears down a backend that never got accepted and reports the failure
    /// the same way a running engine's failure is reported.
    async fn reject_load(
        &mut self,
        mut backend: Box<dyn BackendAdapter>,
        error: PlaybackError,
    ) -> PlaybackError {
        warn!(error = %error, backend = backend.kind().name(), "Backend rejected stream");

        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        backend.teardown().await;

        let error = match error {
            e @ (PlaybackError::BackendFailure(_) | PlaybackError::EngineUnavailable(_)) => e,
            other => PlaybackError::BackendFailure(other.to_string()),
        };
        let events = self
            .normalizer
            .process(BackendSignal::Failed(error.to_string()));
        self.dispatch(events);
        error
    }

    async fn pause(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            trace!("pause without backend");
            return;
        };
        if let Err(e) = backend.pause().await {
            warn!(error = %e, "Backend pause failed");
        }
    }

    async fn resume(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            trace!("resume without backend");
            return;
        };
        if let Err(e) = backend.play().await {
            warn!(error = %e, "Backend resume failed");
        }
    }

    async fn stop(&mut self) {
        if self.backend.is_none() {
            trace!("stop without backend");
            return;
        }

        self.teardown_backend().await;
        info!("Playback stopped by host");
        self.dispatch(vec![PlaybackEvent::Stop { ended: false }]);
    }

    async fn seek_to(&mut self, position: f64) {
        let Some(backend) = self.backend.as_mut() else {
            trace!("seek without backend");
            return;
        };

        let Some(target) = clamp_position(position, backend.duration()) else {
            warn!(position, "Ignoring seek to unbounded position");
            return;
        };
        let Ok(offset) = Duration::try_from_secs_f64(target) else {
            warn!(target, "Ignoring seek beyond representable position");
            return;
        };

        self.normalizer.note_seek();
        if let Err(e) = backend.seek(offset).await {
            warn!(error = %e, target, "Backend seek failed");
        }
    }

    async fn seek_by(&mut self, offset: f64) {
        let current = self
            .backend
            .as_ref()
            .and_then(|backend| backend.current_time())
            .map(|position| position.as_secs_f64())
            .unwrap_or_else(|| self.state.current_time());
        self.seek_to(current + offset).await;
    }

    async fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);

        // While ducked the stored volume only takes effect on restore.
        if self.interruptions.is_ducked() {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.set_volume(self.volume).await {
                warn!(error = %e, "Backend volume change failed");
            }
        }
    }

    async fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(rate, "Ignoring invalid playback rate");
            return;
        }
        self.rate = rate;

        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.set_rate(rate).await {
                warn!(error = %e, "Backend rate change failed");
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.backend
            .as_ref()
            .map(|backend| backend.is_playing())
            .unwrap_or(false)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let backend = self.backend.as_deref();
        SessionSnapshot {
            url: self.url.clone(),
            state: self.state.state(),
            current_time: backend
                .and_then(|b| b.current_time())
                .map(|position| position.as_secs_f64())
                .unwrap_or_else(|| self.state.current_time()),
            duration: backend
                .and_then(|b| b.duration())
                .map(|duration| duration.as_secs_f64()),
            volume: self.volume,
            playback_rate: self.rate,
            backend: backend.map(|b| b.kind()),
        }
    }

    async fn shutdown(&mut self) {
        self.stop().await;
        self.router.detach();
        if let Some(source) = self.interruption_source.take() {
            source.unsubscribe();
        }
        self.emitter.remove_all_listeners();
        debug!("Playback session shut down");
    }

    // ------------------------------------------------------------------------
    // Side entries
    // ------------------------------------------------------------------------

    async fn handle_signal(&mut self, generation: u64, signal: BackendSignal) {
        if generation != self.generation || self.backend.is_none() {
            trace!(generation, current = self.generation, ?signal, "Dropping stale signal");
            return;
        }

        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.on_signal(&signal).await {
                warn!(error = %e, "Backend failed to handle signal");
            }
        }

        let events = self.normalizer.process(signal);
        self.dispatch(events);

        if self.normalizer.is_failed() {
            info!(generation, "Backend failed; releasing engine");
            self.teardown_backend().await;
        }
    }

    async fn handle_remote(&mut self, event: RemoteCommandEvent) {
        let Some(action) = self.router.action_for(event, self.is_playing()) else {
            return;
        };
        debug!(?event, ?action, "Remote command");

        match action {
            RemoteAction::Resume => self.resume().await,
            RemoteAction::Pause => self.pause().await,
            RemoteAction::SeekTo(position) => self.seek_to(position).await,
            RemoteAction::SeekBy(offset) => self.seek_by(offset).await,
        }
    }

    async fn handle_interruption(&mut self, signal: InterruptionSignal) {
        let Some(action) = self.interruptions.handle(signal) else {
            return;
        };

        match action {
            InterruptionAction::Pause => self.pause().await,
            InterruptionAction::Resume => self.resume().await,
            InterruptionAction::Duck => {
                let ducked = self.settings.duck_volume.min(self.volume);
                self.set_backend_volume(ducked).await;
            }
            InterruptionAction::Restore => {
                let volume = self.volume;
                self.set_backend_volume(volume).await;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn create_backend(&self, kind: BackendKind) -> Box<dyn BackendAdapter> {
        let interval = self.settings.time_update_interval();
        match (&self.platform, kind) {
            (PlaybackPlatform::Native(factory), BackendKind::Native(source)) => {
                Box::new(NativeBackend::new(
                    factory.clone(),
                    source,
                    headers::client_headers(&self.client_info),
                    interval,
                ))
            }
            (PlaybackPlatform::Web(runtime), BackendKind::AdaptiveWeb) => {
                Box::new(AdaptiveWebBackend::new(runtime.clone(), interval))
            }
            (PlaybackPlatform::Web(runtime), _) => {
                Box::new(ProgressiveWebBackend::new(runtime.clone(), interval))
            }
            (PlaybackPlatform::Native(factory), _) => Box::new(NativeBackend::new(
                factory.clone(),
                bridge_traits::NativeSourceKind::Direct,
                headers::client_headers(&self.client_info),
                interval,
            )),
        }
    }

    fn signal_sink(&self, generation: u64) -> SignalSink {
        let tx = self.tx.clone();
        SignalSink::new(generation, move |generation, signal| match tx.upgrade() {
            Some(tx) => tx
                .send(SessionMessage::Signal { generation, signal })
                .is_ok(),
            None => false,
        })
    }

    async fn set_backend_volume(&mut self, volume: f32) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.set_volume(volume).await {
                warn!(error = %e, "Backend volume change failed");
            }
        }
    }

    /// Invalidates the current generation and releases the backend.
    async fn teardown_backend(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if let Some(mut backend) = self.backend.take() {
            self.generation += 1;
            debug!(backend = backend.kind().name(), "Tearing down backend");
            backend.teardown().await;
        }
    }

    fn dispatch(&mut self, events: Vec<PlaybackEvent>) {
        for event in events {
            if self.state.apply(&event) {
                debug!(state = %self.state.state(), "Session state changed");
            }
            self.now_playing.on_event(&event);
            self.emitter.emit(event);
        }
    }
}

/// Pushes the stored volume and rate onto a freshly loaded backend.
async fn apply_output_settings(backend: &mut dyn BackendAdapter, volume: f32, rate: f32) {
    if let Err(e) = backend.set_volume(volume).await {
        warn!(error = %e, "Could not apply stored volume");
    }
    if (rate - 1.0).abs() > f32::EPSILON {
        if let Err(e) = backend.set_rate(rate).await {
            warn!(error = %e, "Could not apply stored rate");
        }
    }
}

/// Clamps a requested position to `[0, duration]`. NaN seeks to the start;
/// `None` means the target is unbounded and the seek must be ignored.
fn clamp_position(position: f64, duration: Option<Duration>) -> Option<f64> {
    let position = if position.is_nan() {
        0.0
    } else {
        position.max(0.0)
    };
    let position = match duration {
        Some(duration) => position.min(duration.as_secs_f64()),
        None => position,
    };
    position.is_finite().then_some(position)
}
