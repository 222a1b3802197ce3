//! Lock screen and headset commands routed through the session.

mod support;

use bridge_traits::{RemoteCommand, RemoteCommandEvent};
use core_playback::PlayOptions;
use core_runtime::events::PlaybackEvent;
use std::time::Duration;
use support::NativeHarness;

const MP3: &str = "https://cdn.example/audio/episode.mp3";

fn seeks(h: &NativeHarness) -> Vec<String> {
    h.factory
        .last_engine()
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("seek:"))
        .collect()
}

#[tokio::test]
async fn test_options_enable_command_groups() {
    let h = NativeHarness::new();

    h.session.play(MP3, PlayOptions::new()).await.unwrap();
    assert!(RemoteCommand::ALL
        .iter()
        .all(|command| !h.remote.is_enabled(*command)));

    h.session
        .play(MP3, PlayOptions::new().with_command_center(true))
        .await
        .unwrap();
    assert!(h.remote.is_enabled(RemoteCommand::Play));
    assert!(h.remote.is_enabled(RemoteCommand::TogglePlayPause));
    assert!(h.remote.is_enabled(RemoteCommand::ChangePlaybackPosition));
    assert!(!h.remote.is_enabled(RemoteCommand::SkipForward));

    h.session
        .play(
            MP3,
            PlayOptions::new()
                .with_command_center(true)
                .with_command_center_seek(true),
        )
        .await
        .unwrap();
    assert!(RemoteCommand::ALL
        .iter()
        .all(|command| h.remote.is_enabled(*command)));

    // Seek alone means nothing without the command center.
    h.session
        .play(MP3, PlayOptions::new().with_command_center_seek(true))
        .await
        .unwrap();
    assert!(!h.remote.is_enabled(RemoteCommand::SkipBackward));
    assert!(!h.remote.is_enabled(RemoteCommand::Pause));
}

#[tokio::test]
async fn test_toggle_follows_engine_state() {
    let mut h = NativeHarness::new();
    h.session
        .play(MP3, PlayOptions::new().with_command_center(true))
        .await
        .unwrap();
    h.drain().await;

    h.remote.send(RemoteCommandEvent::TogglePlayPause);
    assert_eq!(h.drain().await, vec![PlaybackEvent::Pause]);

    h.remote.send(RemoteCommandEvent::TogglePlayPause);
    assert_eq!(h.drain().await, vec![PlaybackEvent::Play]);

    h.remote.send(RemoteCommandEvent::Pause);
    h.remote.send(RemoteCommandEvent::Play);
    assert_eq!(
        h.drain().await,
        vec![PlaybackEvent::Pause, PlaybackEvent::Play]
    );
}

#[tokio::test]
async fn test_skip_moves_by_interval() {
    let h = NativeHarness::new();
    *h.factory.next_duration.lock() = Some(Duration::from_secs(600));
    h.session
        .play(
            MP3,
            PlayOptions::new()
                .with_command_center(true)
                .with_command_center_seek(true),
        )
        .await
        .unwrap();
    *h.factory.last_engine().position.lock() = Duration::from_secs(30);

    h.remote.send(RemoteCommandEvent::SkipForward);
    h.settle().await;
    h.remote.send(RemoteCommandEvent::SeekBackward);
    h.remote.send(RemoteCommandEvent::SkipBackward);
    h.remote.send(RemoteCommandEvent::SkipBackward);
    h.settle().await;

    assert_eq!(seeks(&h), vec!["seek:40", "seek:30", "seek:20", "seek:10"]);
}

#[tokio::test]
async fn test_skip_backward_stops_at_start() {
    let h = NativeHarness::new();
    h.session
        .play(
            MP3,
            PlayOptions::new()
                .with_command_center(true)
                .with_command_center_seek(true),
        )
        .await
        .unwrap();
    *h.factory.last_engine().position.lock() = Duration::from_secs(4);

    h.remote.send(RemoteCommandEvent::SkipBackward);
    h.settle().await;

    assert_eq!(seeks(&h), vec!["seek:0"]);
}

#[tokio::test]
async fn test_change_position_seeks_absolute() {
    let h = NativeHarness::new();
    h.session
        .play(MP3, PlayOptions::new().with_command_center(true))
        .await
        .unwrap();

    h.remote
        .send(RemoteCommandEvent::ChangePlaybackPosition(Duration::from_secs(75)));
    h.settle().await;

    assert_eq!(seeks(&h), vec!["seek:75"]);
}

#[tokio::test]
async fn test_disabled_commands_are_ignored() {
    let mut h = NativeHarness::new();
    h.session
        .play(MP3, PlayOptions::new().with_command_center(true))
        .await
        .unwrap();
    h.drain().await;

    h.remote.send(RemoteCommandEvent::SkipForward);
    h.remote.send(RemoteCommandEvent::SeekForward);
    assert!(h.drain().await.is_empty());
    assert!(seeks(&h).is_empty());

    h.session.play(MP3, PlayOptions::new()).await.unwrap();
    h.drain().await;
    h.remote.send(RemoteCommandEvent::Pause);
    assert!(h.drain().await.is_empty());
    assert!(h.session.is_playing().await.unwrap());
}

#[tokio::test]
async fn test_host_routed_commands_use_same_path() {
    let mut h = NativeHarness::new();
    h.session
        .play(MP3, PlayOptions::new().with_command_center(true))
        .await
        .unwrap();
    h.drain().await;

    h.session
        .handle_remote_command(RemoteCommandEvent::Pause)
        .unwrap();

    assert_eq!(h.drain().await, vec![PlaybackEvent::Pause]);
}

#[tokio::test]
async fn test_shutdown_detaches_command_center() {
    let h = NativeHarness::new();
    h.session
        .play(
            MP3,
            PlayOptions::new()
                .with_command_center(true)
                .with_command_center_seek(true),
        )
        .await
        .unwrap();
    assert!(h.remote.has_handler());

    h.session.shutdown().await.unwrap();

    assert!(!h.remote.has_handler());
    assert!(RemoteCommand::ALL
        .iter()
        .all(|command| !h.remote.is_enabled(*command)));
}
