use super::*;

#[test]
fn timeline_event_json_shape() {
    let ev = TimelineEvent::new(
        "e1",
        FrameIndex(5),
        EntityPatch::new("a").with_hidden(false).into(),
    );
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "id": "e1",
            "frame": 5,
            "type": "expression",
            "entity": { "id": "a", "hidden": false }
        })
    );
    let back: TimelineEvent = serde_json::from_value(v).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn animation_event_parses_from_editor_json() {
    let ev: TimelineEvent = serde_json::from_str(
        r#"{
            "id": "anim",
            "frame": 10,
            "type": "animation",
            "target": { "kind": "variable", "entity": "slider" },
            "durationFrames": 20,
            "from": 0,
            "to": 100,
            "ease": "easeIn"
        }"#,
    )
    .unwrap();
    let EventKind::Animation(spec) = &ev.kind else {
        panic!("expected animation");
    };
    assert_eq!(spec.ease, Ease::InQuad);
    assert_eq!(spec.target.entity(), "slider");
    assert_eq!(spec.end_frame(ev.frame), FrameIndex(30));
}

#[test]
fn bounds_event_is_flat() {
    let ev: TimelineEvent = serde_json::from_str(
        r#"{"id":"b","frame":3,"type":"bounds","left":-5,"right":5,"top":5,"bottom":-5}"#,
    )
    .unwrap();
    assert_eq!(ev.kind, EventKind::Bounds(Bounds::new(-5.0, 5.0, 5.0, -5.0)));
    assert_eq!(ev.kind.label(), "bounds");
}

#[test]
fn validate_rejects_empty_targets() {
    let ev = TimelineEvent::new("x", FrameIndex(0), EntityPatch::new("").into());
    assert!(ev.validate().is_err());

    let ev = TimelineEvent::new(
        "y",
        FrameIndex(0),
        AnimationSpec::property("a", "opacity", 5, 0.0, f64::NAN, Ease::Linear).into(),
    );
    assert!(ev.validate().is_err());

    let ev = TimelineEvent::new("", FrameIndex(0), Bounds::default().into());
    assert!(ev.validate().is_err());
}

#[test]
fn generated_ids_are_unique() {
    let a = EventId::generate();
    let b = EventId::generate();
    assert_ne!(a, b);
    assert!(!a.as_str().is_empty());
}

#[test]
fn action_sample_uses_step_count() {
    let spec = AnimationSpec::action("step", 3, 6, Ease::Linear);
    assert_eq!(
        spec.sample(FrameIndex(0), FrameIndex(4)),
        AnimationSample::InProgress(crate::animation::interp::AnimatedValue::Steps(2))
    );
}
