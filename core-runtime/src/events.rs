//! # Playback Event Surface
//!
//! Canonical playback events and the per-session emitter that delivers them
//! to the host.
//!
//! ## Overview
//!
//! Every playback session owns one [`EventEmitter`]. The emitter fans events
//! out two ways:
//! - **Stream subscribers** via `tokio::sync::broadcast`, wrapped in an
//!   [`EventStream`] with optional kind filtering.
//! - **Callback listeners** registered per [`EventKind`], each returning a
//!   [`ListenerHandle`] that removes exactly that listener.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   emit    ┌──────────────┐   subscribe   ┌─────────────┐
//! │ Session task ├──────────>│ EventEmitter ├──────────────>│ EventStream │
//! └──────────────┘           │ (broadcast + │               └─────────────┘
//!                            │  listeners)  ├──────────────>│ listener fn │
//!                            └──────────────┘   callback    └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventEmitter, EventKind, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let emitter = EventEmitter::new(16);
//! let mut stream = emitter.subscribe().only(&[EventKind::Play]);
//!
//! emitter.emit(PlaybackEvent::Pause);
//! emitter.emit(PlaybackEvent::Play);
//!
//! assert_eq!(stream.recv().await.unwrap(), PlaybackEvent::Play);
//! # }
//! ```
//!
//! ## Wire Format
//!
//! Events serialize with a `type` tag using the host-facing names:
//!
//! ```json
//! {"type":"timeUpdate","currentTime":12.0}
//! {"type":"stop","ended":true}
//! {"type":"buffering","isBuffering":false}
//! ```
//!
//! ## Error Handling
//!
//! Stream subscribers that fall behind by more than the buffer size receive
//! `RecvError::Lagged(n)` and may keep reading. `RecvError::Closed` means the
//! session was shut down.

use bridge_traits::{platform::PlatformCallback, MetadataValue};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the broadcast channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// A canonical playback event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    Play,
    Pause,
    /// Playback stopped. `ended` is true only for a natural end of media.
    Stop { ended: bool },
    #[serde(rename_all = "camelCase")]
    TimeUpdate {
        /// Position in seconds.
        current_time: f64,
    },
    #[serde(rename_all = "camelCase")]
    Buffering { is_buffering: bool },
    Error { message: String },
    Metadata { fields: BTreeMap<String, MetadataValue> },
}

impl PlaybackEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlaybackEvent::Play => EventKind::Play,
            PlaybackEvent::Pause => EventKind::Pause,
            PlaybackEvent::Stop { .. } => EventKind::Stop,
            PlaybackEvent::TimeUpdate { .. } => EventKind::TimeUpdate,
            PlaybackEvent::Buffering { .. } => EventKind::Buffering,
            PlaybackEvent::Error { .. } => EventKind::Error,
            PlaybackEvent::Metadata { .. } => EventKind::Metadata,
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            PlaybackEvent::Error { .. } => EventSeverity::Error,
            PlaybackEvent::Buffering { is_buffering: true } => EventSeverity::Warning,
            PlaybackEvent::TimeUpdate { .. } | PlaybackEvent::Metadata { .. } => {
                EventSeverity::Debug
            }
            _ => EventSeverity::Info,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PlaybackEvent::Play => "Playback started",
            PlaybackEvent::Pause => "Playback paused",
            PlaybackEvent::Stop { ended: true } => "Playback reached end of media",
            PlaybackEvent::Stop { ended: false } => "Playback stopped",
            PlaybackEvent::TimeUpdate { .. } => "Playback position updated",
            PlaybackEvent::Buffering { .. } => "Buffering state changed",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::Metadata { .. } => "Timed metadata received",
        }
    }
}

/// Discriminant of [`PlaybackEvent`], used for listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Play,
    Pause,
    Stop,
    TimeUpdate,
    Buffering,
    Error,
    Metadata,
}

impl EventKind {
    /// Host-facing event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Play => "play",
            EventKind::Pause => "pause",
            EventKind::Stop => "stop",
            EventKind::TimeUpdate => "timeUpdate",
            EventKind::Buffering => "buffering",
            EventKind::Error => "error",
            EventKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Emitter
// ============================================================================

struct ListenerEntry {
    id: u64,
    kind: Option<EventKind>,
    callback: PlatformCallback<PlaybackEvent>,
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }
}

/// Per-session event fan-out.
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<PlaybackEvent>,
    listeners: Arc<ListenerRegistry>,
}

impl EventEmitter {
    /// Creates an emitter whose stream subscribers buffer up to `capacity`
    /// events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: Arc::new(ListenerRegistry::default()),
        }
    }

    /// Deliver an event to every listener and stream subscriber.
    ///
    /// Listeners run synchronously on the caller. They may register or remove
    /// listeners; such changes apply from the next event.
    pub fn emit(&self, event: PlaybackEvent) {
        let kind = event.kind();
        let callbacks: Vec<_> = self
            .listeners
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.kind.map_or(true, |k| k == kind))
            .map(|entry| entry.callback.clone())
            .collect();

        for callback in callbacks {
            callback(event.clone());
        }

        // No stream subscribers is not an error.
        let _ = self.sender.send(event);
    }

    /// Register a callback for one event kind.
    pub fn add_listener(
        &self,
        kind: EventKind,
        callback: PlatformCallback<PlaybackEvent>,
    ) -> ListenerHandle {
        self.register(Some(kind), callback)
    }

    /// Register a callback for every event.
    pub fn add_any_listener(&self, callback: PlatformCallback<PlaybackEvent>) -> ListenerHandle {
        self.register(None, callback)
    }

    fn register(
        &self,
        kind: Option<EventKind>,
        callback: PlatformCallback<PlaybackEvent>,
    ) -> ListenerHandle {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.entries.lock().push(ListenerEntry { id, kind, callback });
        ListenerHandle {
            id,
            kind,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    pub fn remove_all_listeners(&self) {
        self.listeners.entries.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.entries.lock().len()
    }

    /// Subscribe to all future events. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriber_count", &self.subscriber_count())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle keeps the listener registered; call
/// [`remove`](Self::remove) to unregister it.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: u64,
    kind: Option<EventKind>,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    pub fn kind(&self) -> Option<EventKind> {
        self.kind
    }

    /// Unregister the listener. Returns `false` if it was already removed.
    pub fn remove(&self) -> bool {
        self.registry
            .upgrade()
            .map_or(false, |registry| registry.remove(self.id))
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
type EventFilter = Box<dyn Fn(&PlaybackEvent) -> bool + Send + Sync>;

#[cfg(target_arch = "wasm32")]
type EventFilter = Box<dyn Fn(&PlaybackEvent) -> bool>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<PlaybackEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PlaybackEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlaybackEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield events matching `predicate`.
    #[cfg(target_arch = "wasm32")]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlaybackEvent) -> bool + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield events of the given kinds.
    pub fn only(self, kinds: &[EventKind]) -> Self {
        let kinds = kinds.to_vec();
        self.filter(move |event| kinds.contains(&event.kind()))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` once the session is gone.
    pub async fn recv(&mut self) -> Result<PlaybackEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlaybackEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &PlaybackEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
