use tokio::time::Instant;

use crate::foundation::core::{Fps, FrameIndex};

/// Playback state machine: `Idle → Playing → (Paused | Finished)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Never started.
    Idle,
    /// Advancing against wall-clock time.
    Playing,
    /// Stopped by the author; frame preserved.
    Paused,
    /// Reached the last frame.
    Finished,
}

/// Result of one scheduling tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// Displayed frame after the tick.
    pub frame: FrameIndex,
    /// Frame to apply to the display host, when the throttle allows it.
    pub apply: Option<FrameIndex>,
    /// `true` when this tick reached the end of the timeline.
    pub finished: bool,
}

/// Converts wall-clock time into frames and throttles display applies.
///
/// This is the only place where seconds appear; everything downstream works in frames.
#[derive(Clone, Debug)]
pub struct Playback {
    fps: Fps,
    duration_frames: u64,
    threshold_frames: u64,
    state: PlaybackState,
    current: FrameIndex,
    start_frame: FrameIndex,
    started_at: Option<Instant>,
    last_applied: Option<FrameIndex>,
}

impl Playback {
    /// New scheduler at frame 0.
    ///
    /// A zero threshold is treated as one frame.
    pub fn new(fps: Fps, duration_frames: u64, threshold_frames: u64) -> Self {
        Self {
            fps,
            duration_frames,
            threshold_frames: threshold_frames.max(1),
            state: PlaybackState::Idle,
            current: FrameIndex(0),
            start_frame: FrameIndex(0),
            started_at: None,
            last_applied: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Displayed frame.
    pub fn current_frame(&self) -> FrameIndex {
        self.current
    }

    /// Timeline rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Timeline length.
    pub fn duration_frames(&self) -> u64 {
        self.duration_frames
    }

    fn last_frame(&self) -> FrameIndex {
        FrameIndex(self.duration_frames.saturating_sub(1))
    }

    /// Start (or resume) playing from the current frame.
    ///
    /// Restarts from frame 0 after a finished run. Empty timelines stay put.
    pub fn play(&mut self, now: Instant) {
        if self.duration_frames == 0 || self.state == PlaybackState::Playing {
            return;
        }
        if self.state == PlaybackState::Finished || self.current >= self.last_frame() {
            self.current = FrameIndex(0);
        }
        self.start_frame = self.current;
        self.started_at = Some(now);
        self.last_applied = None;
        self.state = PlaybackState::Playing;
    }

    /// Stop advancing and keep the current frame. Pending ticks become no-ops.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.started_at = None;
        }
    }

    /// Jump to `frame` (clamped into the timeline) and restart the elapsed-time baseline there.
    pub fn seek(&mut self, frame: FrameIndex, now: Instant) -> FrameIndex {
        let clamped = FrameIndex(frame.0.min(self.last_frame().0));
        self.current = clamped;
        self.start_frame = clamped;
        self.last_applied = None;
        match self.state {
            PlaybackState::Playing => self.started_at = Some(now),
            PlaybackState::Finished => self.state = PlaybackState::Paused,
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        clamped
    }

    /// Record that `frame` was applied outside of [`Playback::tick`] (e.g. an explicit seek).
    pub fn mark_applied(&mut self, frame: FrameIndex) {
        self.last_applied = Some(frame);
    }

    /// Advance against `now`: `target = start + round(elapsed × fps)`.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let idle = TickOutcome {
            frame: self.current,
            apply: None,
            finished: self.state == PlaybackState::Finished,
        };
        if self.state != PlaybackState::Playing {
            return idle;
        }
        let Some(started_at) = self.started_at else {
            return idle;
        };

        let elapsed = now.saturating_duration_since(started_at).as_secs_f64();
        let target = self
            .start_frame
            .0
            .saturating_add(self.fps.secs_to_frames_round(elapsed));

        if target >= self.duration_frames {
            let last = self.last_frame();
            self.current = last;
            self.state = PlaybackState::Finished;
            self.started_at = None;
            self.last_applied = Some(last);
            return TickOutcome {
                frame: last,
                apply: Some(last),
                finished: true,
            };
        }

        let target = FrameIndex(target);
        self.current = target;
        let due = self
            .last_applied
            .is_none_or(|last| last.abs_diff(target) >= self.threshold_frames);
        if !due {
            return TickOutcome {
                frame: target,
                apply: None,
                finished: false,
            };
        }
        self.last_applied = Some(target);
        TickOutcome {
            frame: target,
            apply: Some(target),
            finished: false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
