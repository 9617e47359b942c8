use std::time::Duration;

use tokio::sync::mpsc;

use super::*;
use crate::config::ResolverConfig;
use crate::document::model::{DocumentState, EntityPatch};
use crate::host::memory::MemoryHost;
use crate::playback::scheduler::PlaybackState;
use crate::timeline::event::TimelineEvent;

fn config(duration_frames: u64) -> ResolverConfig {
    ResolverConfig {
        duration_frames,
        ..ResolverConfig::default()
    }
}

fn studio(duration_frames: u64) -> Studio<MemoryHost, MemoryHost> {
    let resolver = TimelineResolver::with_host(MemoryHost::new(), config(duration_frames)).unwrap();
    Studio::new(resolver, MemoryHost::new())
}

fn show(id: &str, frame: u64) -> TimelineEvent {
    TimelineEvent::new(
        id,
        FrameIndex(frame),
        EntityPatch::new(id).with_latex("y=x").into(),
    )
}

#[tokio::test]
async fn seek_applies_resolved_state_to_display() {
    let mut s = studio(30);
    s.resolver_mut().add_event(show("a", 4)).unwrap();

    let outcome = s.seek_to(FrameIndex(6), Instant::now()).await.unwrap();
    assert!(outcome.is_applied());
    assert!(s.display().snapshot().entity("a").is_some());
    assert_eq!(s.display().set_state_calls(), 1);
    assert_eq!(s.current_frame(), FrameIndex(6));

    s.seek_to(FrameIndex(2), Instant::now()).await.unwrap();
    assert!(s.display().snapshot().entity("a").is_none());
}

#[tokio::test]
async fn display_host_only_receives_full_states() {
    let mut s = studio(30);
    for (i, f) in [1u64, 2, 3].iter().enumerate() {
        s.resolver_mut().add_event(show(&format!("e{i}"), *f)).unwrap();
    }
    s.seek_to(FrameIndex(5), Instant::now()).await.unwrap();
    assert_eq!(s.display().mutations(), 1);
    assert_eq!(s.display().set_state_calls(), 1);
}

#[tokio::test]
async fn superseded_seek_is_dropped() {
    let mut s = studio(30);
    s.resolver_mut().add_event(show("a", 10)).unwrap();

    let older = s.request_seek(FrameIndex(12), Instant::now());
    let newer = s.request_seek(FrameIndex(3), Instant::now());
    assert!(newer.generation > older.generation);

    let late = s.resolve(older).await;
    let outcome = s.commit(older, late).await.unwrap();
    assert_eq!(
        outcome,
        SeekOutcome::Superseded {
            frame: FrameIndex(12),
            generation: older.generation
        }
    );
    assert_eq!(s.display().set_state_calls(), 0);

    let fresh = s.resolve(newer).await;
    assert!(s.commit(newer, fresh).await.unwrap().is_applied());
    assert!(s.display().snapshot().entity("a").is_none());
}

#[tokio::test]
async fn seek_is_clamped_into_timeline() {
    let mut s = studio(10);
    let ticket = s.request_seek(FrameIndex(99), Instant::now());
    assert_eq!(ticket.frame, FrameIndex(9));
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_display_unchanged() {
    let slow = MemoryHost::new().with_latency(Duration::from_millis(50));
    let resolver = TimelineResolver::with_host(
        slow,
        ResolverConfig {
            host_timeout_ms: 20,
            ..config(30)
        },
    )
    .unwrap();
    let mut s = Studio::new(resolver, MemoryHost::new());

    let outcome = s.seek_to(FrameIndex(3), Instant::now()).await.unwrap();
    assert_eq!(
        outcome,
        SeekOutcome::Stale {
            frame: FrameIndex(3)
        }
    );
    assert_eq!(s.display().set_state_calls(), 0);
    assert!(s.resolver().list_cached_frames().is_empty());
}

#[tokio::test]
async fn missing_compute_host_is_an_error() {
    let resolver = TimelineResolver::<MemoryHost>::new(config(30)).unwrap();
    let mut s = Studio::new(resolver, MemoryHost::new());
    let err = s.seek_to(FrameIndex(0), Instant::now()).await.unwrap_err();
    assert!(matches!(err, FramestateError::HostNotReady));
}

#[tokio::test]
async fn add_snapshot_captures_display_state() {
    let mut display_state = DocumentState::default();
    display_state.upsert(&EntityPatch::new("drawn").with_latex("x=2"));
    let resolver = TimelineResolver::with_host(MemoryHost::new(), config(30)).unwrap();
    let mut s = Studio::new(resolver, MemoryHost::with_state(display_state.clone()));

    s.add_snapshot(FrameIndex(5), Some("checkpoint".to_owned()))
        .await
        .unwrap();
    let at5 = s.resolver_mut().get_state_at_frame(FrameIndex(5)).await.unwrap();
    assert_eq!(at5.state, display_state);
    let at4 = s.resolver_mut().get_state_at_frame(FrameIndex(4)).await.unwrap();
    assert!(at4.state.entities.is_empty());
}

#[tokio::test]
async fn ticks_apply_frames_while_playing() {
    let mut s = studio(30);
    s.resolver_mut().add_event(show("a", 3)).unwrap();
    let t0 = Instant::now();

    assert!(s.tick(t0).await.unwrap().is_none());

    s.play(t0);
    let first = s.tick(t0 + Duration::from_millis(100)).await.unwrap();
    match first {
        Some(SeekOutcome::Applied(frame)) => assert_eq!(frame.frame, FrameIndex(3)),
        other => panic!("unexpected tick outcome: {other:?}"),
    }
    assert!(s.display().snapshot().entity("a").is_some());

    s.pause();
    assert!(
        s.tick(t0 + Duration::from_millis(500))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(s.current_frame(), FrameIndex(3));
}

#[tokio::test(start_paused = true)]
async fn play_until_stopped_reaches_the_last_frame() {
    let mut s = studio(10);
    s.resolver_mut().add_event(show("end", 9)).unwrap();

    let (_tx, mut rx) = mpsc::channel(1);
    s.play_until_stopped(&mut rx).await.unwrap();

    assert_eq!(s.playback().state(), PlaybackState::Finished);
    assert_eq!(s.current_frame(), FrameIndex(9));
    assert!(s.display().snapshot().entity("end").is_some());
}

#[tokio::test(start_paused = true)]
async fn pause_command_stops_the_loop_and_keeps_the_frame() {
    let mut s = studio(30);
    s.resolver_mut().add_event(show("a", 0)).unwrap();
    let (tx, mut rx) = mpsc::channel(1);

    let controller = async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(PlaybackCommand::Pause).await.unwrap();
    };
    let (played, ()) = tokio::join!(s.play_until_stopped(&mut rx), controller);
    played.unwrap();

    assert_eq!(s.playback().state(), PlaybackState::Paused);
    let kept = s.current_frame();
    assert!((14..=16).contains(&kept.0), "paused at {kept:?}");
    assert!(s.display().set_state_calls() > 0);

    let later = Instant::now() + Duration::from_secs(5);
    assert!(s.tick(later).await.unwrap().is_none());
    assert_eq!(s.current_frame(), kept);
}

#[tokio::test(start_paused = true)]
async fn seek_command_jumps_and_keeps_playing() {
    let mut s = studio(30);
    s.resolver_mut().add_event(show("late", 26)).unwrap();
    let (tx, mut rx) = mpsc::channel(1);
    let started = Instant::now();

    let controller = async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(PlaybackCommand::Seek(FrameIndex(25))).await.unwrap();
    };
    let (played, ()) = tokio::join!(s.play_until_stopped(&mut rx), controller);
    played.unwrap();

    assert_eq!(s.playback().state(), PlaybackState::Finished);
    assert_eq!(s.current_frame(), FrameIndex(29));
    assert!(s.display().snapshot().entity("late").is_some());
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn closed_command_channel_plays_to_the_end() {
    let mut s = studio(5);
    let (tx, mut rx) = mpsc::channel::<PlaybackCommand>(1);
    drop(tx);

    s.play_until_stopped(&mut rx).await.unwrap();
    assert_eq!(s.playback().state(), PlaybackState::Finished);
    assert_eq!(s.current_frame(), FrameIndex(4));
}
