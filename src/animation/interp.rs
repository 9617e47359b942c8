use crate::animation::ease::Ease;
use crate::foundation::core::FrameIndex;

/// Value produced by an animation at a query frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum AnimatedValue {
    /// Interpolated number (variable and property animations).
    Scalar(f64),
    /// Number of single-step actions to issue from baseline (action animations).
    Steps(u32),
}

/// Result of sampling an animation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum AnimationSample {
    /// The query frame precedes the start frame; the animation contributes nothing.
    Inactive,
    /// Point sample while `0 <= progress < 1`.
    InProgress(AnimatedValue),
    /// Terminal value; identical for every frame at or past the end.
    Completed(AnimatedValue),
}

impl AnimationSample {
    /// Sampled value, if the animation is active.
    pub fn value(self) -> Option<AnimatedValue> {
        match self {
            Self::Inactive => None,
            Self::InProgress(v) | Self::Completed(v) => Some(v),
        }
    }

    /// `true` once the animation reached its end.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Linear progress of `query` through `[start, start + duration]`.
///
/// Returns `None` before `start`. Zero durations are treated as one frame.
pub fn progress_at(start: FrameIndex, duration_frames: u64, query: FrameIndex) -> Option<f64> {
    if query < start {
        return None;
    }
    let elapsed = (query.0 - start.0) as f64;
    let span = duration_frames.max(1) as f64;
    Some((elapsed / span).clamp(0.0, 1.0))
}

/// Sample a numeric `from → to` animation.
pub fn sample_scalar(
    start: FrameIndex,
    duration_frames: u64,
    from: f64,
    to: f64,
    ease: Ease,
    query: FrameIndex,
) -> AnimationSample {
    let Some(p) = progress_at(start, duration_frames, query) else {
        return AnimationSample::Inactive;
    };
    if p >= 1.0 {
        // Terminal value is exactly `to` for every frame at or past the end.
        return AnimationSample::Completed(AnimatedValue::Scalar(to));
    }
    let t = ease.apply(p);
    AnimationSample::InProgress(AnimatedValue::Scalar(from + (to - from) * t))
}

/// Sample a discrete step animation: `floor(total_steps × eased_progress)`.
pub fn sample_steps(
    start: FrameIndex,
    duration_frames: u64,
    total_steps: u32,
    ease: Ease,
    query: FrameIndex,
) -> AnimationSample {
    let Some(p) = progress_at(start, duration_frames, query) else {
        return AnimationSample::Inactive;
    };
    if p >= 1.0 {
        return AnimationSample::Completed(AnimatedValue::Steps(total_steps));
    }
    let steps = (f64::from(total_steps) * ease.apply(p)).floor();
    let steps = (steps.max(0.0) as u32).min(total_steps);
    AnimationSample::InProgress(AnimatedValue::Steps(steps))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interp.rs"]
mod tests;
