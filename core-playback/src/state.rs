//! Session lifecycle state, derived from the canonical events the session
//! emits plus the commands that bypass the normalizer.

use core_runtime::events::PlaybackEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Buffering,
    Ended,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Buffering => "buffering",
            SessionState::Ended => "ended",
            SessionState::Failed => "failed",
        }
    }

    /// States in which buffering changes are not reflected.
    fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::Ended | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Playing,
    Paused,
}

#[derive(Debug, Default)]
pub struct StateModel {
    state: SessionState,
    last_transport: Option<Transport>,
    current_time: f64,
}

impl StateModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last reported position in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn begin_load(&mut self) {
        self.state = SessionState::Loading;
        self.last_transport = None;
        self.current_time = 0.0;
    }

    /// Applies one emitted event; returns `true` when the state changed.
    pub fn apply(&mut self, event: &PlaybackEvent) -> bool {
        let previous = self.state;

        match event {
            PlaybackEvent::Play => {
                self.last_transport = Some(Transport::Playing);
                self.state = SessionState::Playing;
            }
            PlaybackEvent::Pause => {
                self.last_transport = Some(Transport::Paused);
                self.state = SessionState::Paused;
            }
            PlaybackEvent::Buffering { is_buffering: true } => {
                if !self.state.is_settled() {
                    self.state = SessionState::Buffering;
                }
            }
            PlaybackEvent::Buffering { is_buffering: false } => {
                if self.state == SessionState::Buffering {
                    self.state = match self.last_transport {
                        Some(Transport::Playing) => SessionState::Playing,
                        Some(Transport::Paused) => SessionState::Paused,
                        None => SessionState::Loading,
                    };
                }
            }
            PlaybackEvent::Stop { ended: true } => {
                self.last_transport = None;
                self.state = SessionState::Ended;
            }
            PlaybackEvent::Stop { ended: false } => {
                self.last_transport = None;
                if self.state != SessionState::Failed {
                    self.state = SessionState::Idle;
                }
            }
            PlaybackEvent::Error { .. } => {
                self.state = SessionState::Failed;
            }
            PlaybackEvent::TimeUpdate { current_time } => {
                self.current_time = *current_time;
            }
            PlaybackEvent::Metadata { .. } => {}
        }

        previous != self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(model: &mut StateModel, events: &[PlaybackEvent]) {
        for event in events {
            model.apply(event);
        }
    }

    #[test]
    fn load_then_play() {
        let mut model = StateModel::new();
        model.begin_load();
        assert_eq!(model.state(), SessionState::Loading);

        assert!(model.apply(&PlaybackEvent::Play));
        assert_eq!(model.state(), SessionState::Playing);
    }

    #[test]
    fn buffering_returns_to_previous_transport() {
        let mut model = StateModel::new();
        model.begin_load();

        model.apply(&PlaybackEvent::Buffering { is_buffering: true });
        assert_eq!(model.state(), SessionState::Buffering);
        model.apply(&PlaybackEvent::Buffering { is_buffering: false });
        assert_eq!(model.state(), SessionState::Loading);

        apply_all(
            &mut model,
            &[
                PlaybackEvent::Pause,
                PlaybackEvent::Buffering { is_buffering: true },
                PlaybackEvent::Buffering { is_buffering: false },
            ],
        );
        assert_eq!(model.state(), SessionState::Paused);
    }

    #[test]
    fn failure_survives_trailing_stop() {
        let mut model = StateModel::new();
        model.begin_load();

        apply_all(
            &mut model,
            &[
                PlaybackEvent::Play,
                PlaybackEvent::Error {
                    message: "decode".into(),
                },
                PlaybackEvent::Stop { ended: false },
                PlaybackEvent::Buffering { is_buffering: true },
            ],
        );

        assert_eq!(model.state(), SessionState::Failed);
    }

    #[test]
    fn end_and_stop() {
        let mut model = StateModel::new();
        model.begin_load();
        apply_all(&mut model, &[PlaybackEvent::Play, PlaybackEvent::Stop { ended: true }]);
        assert_eq!(model.state(), SessionState::Ended);

        model.apply(&PlaybackEvent::Stop { ended: false });
        assert_eq!(model.state(), SessionState::Idle);
    }

    #[test]
    fn time_updates_track_position_without_changing_state() {
        let mut model = StateModel::new();
        model.begin_load();

        let changed = model.apply(&PlaybackEvent::TimeUpdate { current_time: 3.5 });

        assert!(!changed);
        assert_eq!(model.current_time(), 3.5);
    }

    #[test]
    fn display_names() {
        assert_eq!(SessionState::Buffering.to_string(), "buffering");
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
