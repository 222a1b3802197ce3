//! # Event Normalization
//!
//! Turns raw [`BackendSignal`]s into canonical [`PlaybackEvent`]s.
//!
//! ## Rules
//!
//! - Transport: `Playing` → `play`, `Paused` → `pause`, each only when it
//!   differs from the last transport event. `WaitingToPlay` asserts
//!   buffering.
//! - Buffering: one boolean derived from the waiting, buffer-empty,
//!   buffer-full and likely-to-keep-up flags, emitted on change only.
//! - Failure: exactly one `error` followed by one `stop{ended:false}`; the
//!   normalizer then drops everything until [`reset`](EventNormalizer::reset).
//! - End of media: one `stop{ended:true}` until playback starts again.
//! - Position: `timeUpdate` no more often than the configured interval and
//!   never backwards, except right after a seek or a new load.
//! - Metadata: only non-empty field maps are emitted.

use crate::backend::BackendSignal;
use crate::metadata::MetadataExtractor;
use bridge_traits::{Clock, TimeControlStatus};
use core_runtime::events::PlaybackEvent;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Engines fire periodic observers slightly early; ticks this close to the
/// interval still count as on time.
const TICK_JITTER_TOLERANCE_MS: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Play,
    Pause,
}

pub struct EventNormalizer {
    clock: Arc<dyn Clock>,
    min_spacing_ms: i64,
    extractor: MetadataExtractor,

    last_transport: Option<Transport>,
    waiting: bool,
    buffer_empty: bool,
    buffer_full: bool,
    likely_to_keep_up: Option<bool>,
    buffering: bool,

    ended: bool,
    failed: bool,

    last_position: Option<f64>,
    last_time_update_ms: Option<i64>,
    position_reset: bool,
}

impl EventNormalizer {
    pub fn new(clock: Arc<dyn Clock>, time_update_interval: Duration) -> Self {
        let interval_ms = i64::try_from(time_update_interval.as_millis()).unwrap_or(i64::MAX);
        Self {
            clock,
            min_spacing_ms: interval_ms.saturating_sub(TICK_JITTER_TOLERANCE_MS).max(0),
            extractor: MetadataExtractor::new(),
            last_transport: None,
            waiting: false,
            buffer_empty: false,
            buffer_full: false,
            likely_to_keep_up: None,
            buffering: false,
            ended: false,
            failed: false,
            last_position: None,
            last_time_update_ms: None,
            position_reset: true,
        }
    }

    /// Forget everything about the previous engine. Called for every new load.
    pub fn reset(&mut self) {
        self.last_transport = None;
        self.waiting = false;
        self.buffer_empty = false;
        self.buffer_full = false;
        self.likely_to_keep_up = None;
        self.buffering = false;
        self.ended = false;
        self.failed = false;
        self.last_position = None;
        self.last_time_update_ms = None;
        self.position_reset = true;
    }

    /// The next position may go backwards.
    pub fn note_seek(&mut self) {
        self.position_reset = true;
    }

    /// A fatal signal was seen; nothing more will be emitted.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    pub fn process(&mut self, signal: BackendSignal) -> Vec<PlaybackEvent> {
        if self.failed {
            trace!(?signal, "Dropping signal after failure");
            return Vec::new();
        }

        let mut events = Vec::new();
        match signal {
            BackendSignal::Ready => {
                self.waiting = false;
                self.buffer_empty = false;
                self.likely_to_keep_up = None;
                self.push_buffering(&mut events);
            }
            BackendSignal::TimeControl(TimeControlStatus::Playing) => {
                self.waiting = false;
                if self.last_transport != Some(Transport::Play) {
                    // Restarting after the end rewinds the engine.
                    if std::mem::take(&mut self.ended) {
                        self.position_reset = true;
                    }
                    self.last_transport = Some(Transport::Play);
                    events.push(PlaybackEvent::Play);
                }
                self.push_buffering(&mut events);
            }
            BackendSignal::TimeControl(TimeControlStatus::Paused) => {
                self.waiting = false;
                // Engines report paused after the end of media; the stop
                // already said so.
                if !self.ended && self.last_transport != Some(Transport::Pause) {
                    self.last_transport = Some(Transport::Pause);
                    events.push(PlaybackEvent::Pause);
                }
                self.push_buffering(&mut events);
            }
            BackendSignal::TimeControl(TimeControlStatus::WaitingToPlay) => {
                self.waiting = true;
                self.push_buffering(&mut events);
            }
            BackendSignal::BufferEmpty(empty) => {
                self.buffer_empty = empty;
                self.push_buffering(&mut events);
            }
            BackendSignal::BufferFull(full) => {
                self.buffer_full = full;
                self.push_buffering(&mut events);
            }
            BackendSignal::LikelyToKeepUp(likely) => {
                self.likely_to_keep_up = Some(likely);
                if likely {
                    self.buffer_empty = false;
                }
                self.push_buffering(&mut events);
            }
            BackendSignal::Tick(position) => {
                if let Some(event) = self.time_update(position) {
                    events.push(event);
                }
            }
            BackendSignal::Ended => {
                if !self.ended {
                    self.ended = true;
                    self.last_transport = None;
                    self.waiting = false;
                    self.buffering = false;
                    events.push(PlaybackEvent::Stop { ended: true });
                }
            }
            BackendSignal::Failed(message) => {
                self.failed = true;
                events.push(PlaybackEvent::Error { message });
                events.push(PlaybackEvent::Stop { ended: false });
            }
            BackendSignal::TimedMetadata(items) => {
                let fields = self.extractor.extract(&items);
                if !fields.is_empty() {
                    events.push(PlaybackEvent::Metadata { fields });
                }
            }
            BackendSignal::ManifestParsed => {}
        }

        events
    }

    fn derived_buffering(&self) -> bool {
        self.waiting
            || (!self.buffer_full
                && (self.buffer_empty || self.likely_to_keep_up == Some(false)))
    }

    fn push_buffering(&mut self, events: &mut Vec<PlaybackEvent>) {
        if self.ended {
            return;
        }
        let is_buffering = self.derived_buffering();
        if is_buffering != self.buffering {
            self.buffering = is_buffering;
            events.push(PlaybackEvent::Buffering { is_buffering });
        }
    }

    fn time_update(&mut self, position: Duration) -> Option<PlaybackEvent> {
        if self.ended {
            return None;
        }

        let now = self.clock.unix_timestamp_millis();
        if let Some(last) = self.last_time_update_ms {
            if now - last < self.min_spacing_ms {
                return None;
            }
        }

        let seconds = position.as_secs_f64();
        if !self.position_reset {
            if let Some(last) = self.last_position {
                if seconds < last {
                    trace!(seconds, last, "Dropping backwards position");
                    return None;
                }
            }
        }

        self.position_reset = false;
        self.last_position = Some(seconds);
        self.last_time_update_ms = Some(now);
        Some(PlaybackEvent::TimeUpdate {
            current_time: seconds,
        })
    }
}
