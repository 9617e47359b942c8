use super::*;
use crate::animation::ease::Ease;
use crate::document::model::Bounds;
use crate::host::memory::{ACTION_RUNS_PROP, MemoryHost};
use crate::timeline::event::{AnimationSpec, SnapshotEvent, TimelineEvent};

fn engine() -> ReplayEngine<MemoryHost> {
    ReplayEngine::new(MemoryHost::new())
}

#[tokio::test]
async fn missing_host_fails_fast() {
    let mut engine = ReplayEngine::<MemoryHost>::default();
    let store = EventStore::new();
    let err = engine
        .compute_state_at(&store, FrameIndex(0))
        .await
        .unwrap_err();
    assert!(matches!(err, FramestateError::HostNotReady));
    assert_eq!(engine.replays(), 0);
}

#[tokio::test]
async fn bounds_and_visibility_scenario() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "bounds",
            FrameIndex(3),
            Bounds::new(-5.0, 5.0, 5.0, -5.0).into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "show-a",
            FrameIndex(5),
            EntityPatch::new("a").with_hidden(false).into(),
        ))
        .unwrap();

    let mut engine = engine();
    let f0 = engine.compute_state_at(&store, FrameIndex(0)).await.unwrap();
    assert_eq!(f0.state, DocumentState::default());

    let f4 = engine.compute_state_at(&store, FrameIndex(4)).await.unwrap();
    assert_eq!(f4.state.bounds, Bounds::new(-5.0, 5.0, 5.0, -5.0));
    assert!(f4.state.entity("a").is_none());

    let f5 = engine.compute_state_at(&store, FrameIndex(5)).await.unwrap();
    assert_eq!(f5.state.bounds, Bounds::new(-5.0, 5.0, 5.0, -5.0));
    assert!(!f5.state.entity("a").unwrap().hidden);
    assert_eq!(f5.status, ReplayStatus::Complete);
    assert_eq!(engine.replays(), 3);
}

#[tokio::test]
async fn replay_resets_host_between_frames() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "late",
            FrameIndex(8),
            EntityPatch::new("late").with_latex("y=1").into(),
        ))
        .unwrap();

    let mut engine = engine();
    let at8 = engine.compute_state_at(&store, FrameIndex(8)).await.unwrap();
    assert!(at8.state.entity("late").is_some());
    let at2 = engine.compute_state_at(&store, FrameIndex(2)).await.unwrap();
    assert!(at2.state.entity("late").is_none());
}

#[tokio::test]
async fn variable_name_is_detected_from_prior_event() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "define",
            FrameIndex(0),
            EntityPatch::new("slider").with_latex("k=0").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "sweep",
            FrameIndex(10),
            AnimationSpec::variable("slider", None, 20, 0.0, 100.0, Ease::Linear).into(),
        ))
        .unwrap();

    let mut engine = engine();
    let at20 = engine.compute_state_at(&store, FrameIndex(20)).await.unwrap();
    assert_eq!(
        at20.state.entity("slider").unwrap().latex.as_deref(),
        Some("k=50")
    );
    let at30 = engine.compute_state_at(&store, FrameIndex(30)).await.unwrap();
    let at100 = engine.compute_state_at(&store, FrameIndex(100)).await.unwrap();
    assert_eq!(at30.state, at100.state);
    assert_eq!(
        at100.state.entity("slider").unwrap().latex.as_deref(),
        Some("k=100")
    );
}

#[tokio::test]
async fn undetectable_variable_is_skipped() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "sweep",
            FrameIndex(0),
            AnimationSpec::variable("ghost", None, 10, 0.0, 1.0, Ease::Linear).into(),
        ))
        .unwrap();
    let mut engine = engine();
    let out = engine.compute_state_at(&store, FrameIndex(5)).await.unwrap();
    assert!(out.status.is_partial());
}

#[tokio::test]
async fn property_and_action_animations() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "curve",
            FrameIndex(0),
            EntityPatch::new("curve").with_latex("y=x").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "step",
            FrameIndex(0),
            EntityPatch::new("step").with_latex("a\\to a+1").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "fade",
            FrameIndex(10),
            AnimationSpec::property("curve", "opacity", 20, 0.0, 100.0, Ease::InQuad).into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "tick",
            FrameIndex(0),
            AnimationSpec::action("step", 4, 10, Ease::Linear).into(),
        ))
        .unwrap();

    let mut engine = engine();
    let out = engine.compute_state_at(&store, FrameIndex(15)).await.unwrap();
    assert_eq!(out.status, ReplayStatus::Complete);
    assert_eq!(
        out.state.entity("curve").unwrap().props.get("opacity"),
        Some(&6.25)
    );
    assert_eq!(
        out.state.entity("step").unwrap().props.get(ACTION_RUNS_PROP),
        Some(&4.0)
    );

    let out = engine.compute_state_at(&store, FrameIndex(5)).await.unwrap();
    assert_eq!(
        out.state.entity("step").unwrap().props.get(ACTION_RUNS_PROP),
        Some(&2.0)
    );
    assert!(out.state.entity("curve").unwrap().props.is_empty());
}

#[tokio::test]
async fn failing_event_is_skipped_and_rest_applies() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "bad",
            FrameIndex(1),
            EntityPatch::new("bad").with_latex("x").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "good",
            FrameIndex(2),
            EntityPatch::new("good").with_latex("y=2").into(),
        ))
        .unwrap();

    let mut engine = ReplayEngine::new(MemoryHost::new().reject_entity("bad"));
    let out = engine.compute_state_at(&store, FrameIndex(2)).await.unwrap();

    let ReplayStatus::Partial { skipped } = &out.status else {
        panic!("expected partial replay");
    };
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].event_id, EventId::new("bad"));
    assert_eq!(skipped[0].frame, FrameIndex(1));
    assert!(out.state.entity("good").is_some());
    assert!(out.state.entity("bad").is_none());
}

#[tokio::test]
async fn snapshot_overrides_earlier_edits() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "early",
            FrameIndex(3),
            EntityPatch::new("early").with_latex("e=1").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "after",
            FrameIndex(16),
            EntityPatch::new("base").with_hidden(true).into(),
        ))
        .unwrap();

    let mut snap_state = DocumentState::default();
    snap_state.upsert(&EntityPatch::new("base").with_latex("b=2"));
    store
        .add_snapshot(SnapshotEvent {
            id: EventId::new("snap"),
            frame: FrameIndex(15),
            state: snap_state.clone(),
            description: Some("reset".to_owned()),
        })
        .unwrap();

    let mut engine = engine();
    let at15 = engine.compute_state_at(&store, FrameIndex(15)).await.unwrap();
    assert_eq!(at15.state, snap_state);

    let at16 = engine.compute_state_at(&store, FrameIndex(16)).await.unwrap();
    assert!(at16.state.entity("early").is_none());
    let base = at16.state.entity("base").unwrap();
    assert!(base.hidden);
    assert_eq!(base.latex.as_deref(), Some("b=2"));
}

#[tokio::test]
async fn replays_are_deterministic() {
    let mut store = EventStore::new();
    store
        .add(TimelineEvent::new(
            "a",
            FrameIndex(0),
            EntityPatch::new("a").with_latex("a=1").into(),
        ))
        .unwrap();
    store
        .add(TimelineEvent::new(
            "anim",
            FrameIndex(0),
            AnimationSpec::variable("a", Some("a"), 7, 1.0, 2.0, Ease::InOutQuad).into(),
        ))
        .unwrap();

    let mut e1 = engine();
    let mut e2 = engine();
    for f in 0..10 {
        let a = e1.compute_state_at(&store, FrameIndex(f)).await.unwrap();
        let b = e2.compute_state_at(&store, FrameIndex(f)).await.unwrap();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn capture_uses_compute_host() {
    let mut engine = ReplayEngine::new(MemoryHost::new().with_rendering(true));
    let img = engine
        .capture_image(32, 16, 2.0, Some("#000000"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!((img.width, img.height), (32, 16));
    assert_eq!(
        engine.host().unwrap().snapshot().settings.get("backgroundColor"),
        Some(&serde_json::json!("#000000"))
    );
}
