//! Maps system audio interruptions onto session commands.
//!
//! An interruption always pauses. Playback resumes only when the system
//! explicitly hints that it should; an absent hint keeps the session paused.
//! Interruptions never produce `error` events.

use bridge_traits::InterruptionSignal;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionAction {
    Pause,
    Resume,
    /// Lower the live engine volume without touching the stored volume.
    Duck,
    /// Put the stored volume back on the engine.
    Restore,
}

#[derive(Debug, Default)]
pub struct InterruptionHandler {
    ducked: bool,
}

impl InterruptionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ducked(&self) -> bool {
        self.ducked
    }

    pub fn handle(&mut self, signal: InterruptionSignal) -> Option<InterruptionAction> {
        debug!(?signal, "Audio interruption");

        match signal {
            InterruptionSignal::Began => Some(InterruptionAction::Pause),
            InterruptionSignal::Ended {
                should_resume: Some(true),
            } => Some(InterruptionAction::Resume),
            InterruptionSignal::Ended { .. } => None,
            InterruptionSignal::DuckBegan => {
                if self.ducked {
                    return None;
                }
                self.ducked = true;
                Some(InterruptionAction::Duck)
            }
            InterruptionSignal::DuckEnded => {
                if !self.ducked {
                    return None;
                }
                self.ducked = false;
                Some(InterruptionAction::Restore)
            }
        }
    }
}
