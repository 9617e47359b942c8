use super::*;

fn scalar(ease: Ease, frame: u64) -> AnimationSample {
    sample_scalar(FrameIndex(10), 20, 0.0, 100.0, ease, FrameIndex(frame))
}

#[test]
fn linear_boundaries() {
    assert_eq!(scalar(Ease::Linear, 9), AnimationSample::Inactive);
    assert_eq!(
        scalar(Ease::Linear, 10),
        AnimationSample::InProgress(AnimatedValue::Scalar(0.0))
    );
    assert_eq!(
        scalar(Ease::Linear, 20),
        AnimationSample::InProgress(AnimatedValue::Scalar(50.0))
    );
    assert_eq!(
        scalar(Ease::Linear, 30),
        AnimationSample::Completed(AnimatedValue::Scalar(100.0))
    );
    assert_eq!(scalar(Ease::Linear, 30), scalar(Ease::Linear, 100));
}

#[test]
fn ease_in_is_quadratic() {
    assert_eq!(
        scalar(Ease::InQuad, 15),
        AnimationSample::InProgress(AnimatedValue::Scalar(6.25))
    );
}

#[test]
fn terminal_value_is_exact_for_awkward_ranges() {
    let s = sample_scalar(FrameIndex(0), 3, 0.1, 0.7, Ease::InOutQuad, FrameIndex(3));
    assert_eq!(s, AnimationSample::Completed(AnimatedValue::Scalar(0.7)));
}

#[test]
fn zero_duration_completes_at_start() {
    let s = sample_scalar(FrameIndex(5), 0, 1.0, 2.0, Ease::Linear, FrameIndex(5));
    assert!(s.is_completed());
    assert_eq!(s.value(), Some(AnimatedValue::Scalar(2.0)));
    let before = sample_scalar(FrameIndex(5), 0, 1.0, 2.0, Ease::Linear, FrameIndex(4));
    assert_eq!(before.value(), None);
}

#[test]
fn steps_floor_eased_progress() {
    let at = |f: u64| sample_steps(FrameIndex(0), 10, 4, Ease::Linear, FrameIndex(f));
    assert_eq!(at(0), AnimationSample::InProgress(AnimatedValue::Steps(0)));
    assert_eq!(at(2), AnimationSample::InProgress(AnimatedValue::Steps(0)));
    assert_eq!(at(3), AnimationSample::InProgress(AnimatedValue::Steps(1)));
    assert_eq!(at(5), AnimationSample::InProgress(AnimatedValue::Steps(2)));
    assert_eq!(at(9), AnimationSample::InProgress(AnimatedValue::Steps(3)));
    assert_eq!(at(10), AnimationSample::Completed(AnimatedValue::Steps(4)));
    assert_eq!(at(10), at(500));
}

#[test]
fn progress_clamps() {
    assert_eq!(progress_at(FrameIndex(4), 8, FrameIndex(3)), None);
    assert_eq!(progress_at(FrameIndex(4), 8, FrameIndex(8)), Some(0.5));
    assert_eq!(progress_at(FrameIndex(4), 8, FrameIndex(40)), Some(1.0));
}
