//! # Remote Command Routing
//!
//! Binds system remote-control commands to session operations.
//!
//! The router only tracks which commands are enabled and what each one
//! means. Command events from the system are queued onto the session like
//! any host command, and the session asks the router for the action.
//!
//! | Command | Action | Enabled by |
//! |---------|--------|------------|
//! | play | resume | `enableCommandCenter` |
//! | pause | pause | `enableCommandCenter` |
//! | toggle | pause if playing, else resume | `enableCommandCenter` |
//! | change position | seek to | `enableCommandCenter` |
//! | skip / scrub forward | seek by `+skip_interval` | `enableCommandCenterSeek` |
//! | skip / scrub backward | seek by `-skip_interval` | `enableCommandCenterSeek` |

use crate::session::PlayOptions;
use bridge_traits::{RemoteCommand, RemoteCommandCenter, RemoteCommandEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const TRANSPORT_COMMANDS: [RemoteCommand; 4] = [
    RemoteCommand::Play,
    RemoteCommand::Pause,
    RemoteCommand::TogglePlayPause,
    RemoteCommand::ChangePlaybackPosition,
];

const SEEK_COMMANDS: [RemoteCommand; 4] = [
    RemoteCommand::SkipForward,
    RemoteCommand::SkipBackward,
    RemoteCommand::SeekForward,
    RemoteCommand::SeekBackward,
];

/// Session operation requested by a remote command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteAction {
    Resume,
    Pause,
    /// Absolute position in seconds.
    SeekTo(f64),
    /// Relative offset in seconds.
    SeekBy(f64),
}

pub struct RemoteCommandRouter {
    center: Option<Arc<dyn RemoteCommandCenter>>,
    enabled: BTreeSet<RemoteCommand>,
    skip_interval: Duration,
}

impl RemoteCommandRouter {
    pub fn new(center: Option<Arc<dyn RemoteCommandCenter>>, skip_interval: Duration) -> Self {
        if let Some(center) = center.as_ref() {
            center.set_skip_interval(skip_interval);
        }
        Self {
            center,
            enabled: BTreeSet::new(),
            skip_interval,
        }
    }

    pub fn is_enabled(&self, command: RemoteCommand) -> bool {
        self.enabled.contains(&command)
    }

    pub fn enabled_commands(&self) -> Vec<RemoteCommand> {
        self.enabled.iter().copied().collect()
    }

    /// Applies the per-`play` options. Repeating the same options changes
    /// nothing.
    pub fn configure(&mut self, options: &PlayOptions) {
        let transport = options.enable_command_center;
        let seek = transport && options.enable_command_center_seek;

        for command in TRANSPORT_COMMANDS {
            self.set_enabled(command, transport);
        }
        for command in SEEK_COMMANDS {
            self.set_enabled(command, seek);
        }

        debug!(transport, seek, "Remote commands configured");
    }

    pub fn disable_all(&mut self) {
        for command in RemoteCommand::ALL {
            self.set_enabled(command, false);
        }
    }

    fn set_enabled(&mut self, command: RemoteCommand, enabled: bool) {
        if enabled {
            self.enabled.insert(command);
        } else {
            self.enabled.remove(&command);
        }
        if let Some(center) = self.center.as_ref() {
            center.set_enabled(command, enabled);
        }
    }

    /// Action for an incoming event, or `None` when its command is disabled.
    pub fn action_for(&self, event: RemoteCommandEvent, is_playing: bool) -> Option<RemoteAction> {
        if !self.is_enabled(event.command()) {
            debug!(command = ?event.command(), "Ignoring disabled remote command");
            return None;
        }

        let skip = self.skip_interval.as_secs_f64();
        let action = match event {
            RemoteCommandEvent::Play => RemoteAction::Resume,
            RemoteCommandEvent::Pause => RemoteAction::Pause,
            RemoteCommandEvent::TogglePlayPause if is_playing => RemoteAction::Pause,
            RemoteCommandEvent::TogglePlayPause => RemoteAction::Resume,
            RemoteCommandEvent::ChangePlaybackPosition(position) => {
                RemoteAction::SeekTo(position.as_secs_f64())
            }
            RemoteCommandEvent::SkipForward | RemoteCommandEvent::SeekForward => {
                RemoteAction::SeekBy(skip)
            }
            RemoteCommandEvent::SkipBackward | RemoteCommandEvent::SeekBackward => {
                RemoteAction::SeekBy(-skip)
            }
        };
        Some(action)
    }

    /// Disables every command and drops the system handler.
    pub fn detach(&mut self) {
        self.disable_all();
        if let Some(center) = self.center.as_ref() {
            center.set_handler(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::PlatformCallback;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingCenter {
        enabled: Mutex<BTreeMap<RemoteCommand, bool>>,
        skip: Mutex<Option<Duration>>,
    }

    impl RemoteCommandCenter for RecordingCenter {
        fn set_enabled(&self, command: RemoteCommand, enabled: bool) {
            self.enabled.lock().insert(command, enabled);
        }

        fn set_handler(&self, _handler: Option<PlatformCallback<RemoteCommandEvent>>) {}

        fn set_skip_interval(&self, interval: Duration) {
            *self.skip.lock() = Some(interval);
        }
    }

    fn router() -> (RemoteCommandRouter, Arc<RecordingCenter>) {
        let center = Arc::new(RecordingCenter::default());
        let router = RemoteCommandRouter::new(Some(center.clone()), Duration::from_secs(10));
        (router, center)
    }

    fn options(center: bool, seek: bool) -> PlayOptions {
        PlayOptions::new()
            .with_command_center(center)
            .with_command_center_seek(seek)
    }

    #[test]
    fn transport_only() {
        let (mut router, center) = router();

        router.configure(&options(true, false));

        assert_eq!(router.enabled_commands(), TRANSPORT_COMMANDS.to_vec());
        assert_eq!(center.enabled.lock()[&RemoteCommand::SkipForward], false);
        assert_eq!(*center.skip.lock(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn disabling_after_enabling_turns_everything_off() {
        let (mut router, center) = router();
        router.configure(&options(true, true));
        assert_eq!(router.enabled_commands().len(), 8);

        router.configure(&options(false, true));
        router.configure(&options(false, true));

        assert!(router.enabled_commands().is_empty());
        assert!(center.enabled.lock().values().all(|enabled| !enabled));
    }

    #[test]
    fn maps_events_to_actions() {
        let (mut router, _) = router();
        router.configure(&options(true, true));

        assert_eq!(
            router.action_for(RemoteCommandEvent::TogglePlayPause, true),
            Some(RemoteAction::Pause)
        );
        assert_eq!(
            router.action_for(RemoteCommandEvent::TogglePlayPause, false),
            Some(RemoteAction::Resume)
        );
        assert_eq!(
            router.action_for(
                RemoteCommandEvent::ChangePlaybackPosition(Duration::from_secs(42)),
                true
            ),
            Some(RemoteAction::SeekTo(42.0))
        );
        assert_eq!(
            router.action_for(RemoteCommandEvent::SeekBackward, true),
            Some(RemoteAction::SeekBy(-10.0))
        );
        assert_eq!(
            router.action_for(RemoteCommandEvent::SkipForward, true),
            Some(RemoteAction::SeekBy(10.0))
        );
    }

    #[test]
    fn disabled_commands_are_ignored() {
        let (mut router, _) = router();
        router.configure(&options(true, false));

        assert_eq!(router.action_for(RemoteCommandEvent::SkipForward, true), None);
        assert_eq!(
            router.action_for(RemoteCommandEvent::Play, false),
            Some(RemoteAction::Resume)
        );
    }

    #[test]
    fn works_without_a_center() {
        let mut router = RemoteCommandRouter::new(None, Duration::from_secs(10));
        router.configure(&options(true, false));

        assert!(router.is_enabled(RemoteCommand::Play));
        router.detach();
        assert!(!router.is_enabled(RemoteCommand::Play));
    }
}
