use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::host::DocumentHost;
use crate::playback::scheduler::Playback;
use crate::session::resolver::{ResolvedFrame, TimelineResolver};
use crate::timeline::event::EventId;

/// Receipt for one seek request. Only the most recently issued ticket may touch the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekTicket {
    /// Generation this ticket was issued under.
    pub generation: u64,
    /// Target frame (already clamped into the timeline).
    pub frame: FrameIndex,
}

/// What happened to a seek once its replay finished.
#[derive(Clone, Debug, PartialEq)]
pub enum SeekOutcome {
    /// The resolved state was pushed to the display host.
    Applied(ResolvedFrame),
    /// A newer seek was issued in the meantime; the result was dropped.
    Superseded {
        /// Frame of the dropped result.
        frame: FrameIndex,
        /// Generation of the dropped result.
        generation: u64,
    },
    /// The compute host did not answer in time; the display keeps its previous state.
    Stale {
        /// Frame that could not be resolved.
        frame: FrameIndex,
    },
}

impl SeekOutcome {
    /// `true` when the display host received a new state.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Control message for a running [`Studio::play_until_stopped`] loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Pause and return from the loop, keeping the current frame.
    Pause,
    /// Jump to a frame and keep playing from there.
    Seek(FrameIndex),
}

/// Editing session: resolver, display host and playback scheduler.
///
/// The display host only ever receives complete resolved states through `set_state`; it is
/// never used as replay scratch space.
pub struct Studio<H, D> {
    resolver: TimelineResolver<H>,
    display: D,
    playback: Playback,
    generation: u64,
}

impl<H: DocumentHost, D: DocumentHost> Studio<H, D> {
    /// Wrap a resolver and a display host. Playback parameters come from the resolver config.
    pub fn new(resolver: TimelineResolver<H>, display: D) -> Self {
        let config = resolver.config();
        let playback = Playback::new(
            config.fps,
            config.duration_frames,
            config.apply_threshold_frames,
        );
        Self {
            resolver,
            display,
            playback,
            generation: 0,
        }
    }

    /// Borrow the resolver.
    pub fn resolver(&self) -> &TimelineResolver<H> {
        &self.resolver
    }

    /// Mutable access for timeline edits; cache invalidation stays inside the resolver.
    pub fn resolver_mut(&mut self) -> &mut TimelineResolver<H> {
        &mut self.resolver
    }

    /// Borrow the display host.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Borrow the playback scheduler.
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Frame currently shown by the playback head.
    pub fn current_frame(&self) -> FrameIndex {
        self.playback.current_frame()
    }

    /// Latest issued seek generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record the display host's current state as a snapshot at `frame`.
    pub async fn add_snapshot(
        &mut self,
        frame: FrameIndex,
        description: Option<String>,
    ) -> FramestateResult<EventId> {
        let state = self
            .display
            .state()
            .await
            .map_err(|e| FramestateError::host(format!("read display host: {e}")))?;
        self.resolver.add_snapshot_state(frame, state, description)
    }

    /// Move the playback head to `frame` and issue a new ticket, superseding older ones.
    pub fn request_seek(&mut self, frame: FrameIndex, now: Instant) -> SeekTicket {
        let frame = self.playback.seek(frame, now);
        self.issue(frame)
    }

    fn issue(&mut self, frame: FrameIndex) -> SeekTicket {
        self.generation += 1;
        SeekTicket {
            generation: self.generation,
            frame,
        }
    }

    /// Resolve the state for `ticket` without touching the display host.
    pub async fn resolve(&mut self, ticket: SeekTicket) -> FramestateResult<ResolvedFrame> {
        self.resolver.get_state_at_frame(ticket.frame).await
    }

    /// Apply a resolved result to the display host if `ticket` is still current.
    ///
    /// A `HostTimeout` result turns into [`SeekOutcome::Stale`]; other errors are returned.
    pub async fn commit(
        &mut self,
        ticket: SeekTicket,
        resolved: FramestateResult<ResolvedFrame>,
    ) -> FramestateResult<SeekOutcome> {
        if ticket.generation != self.generation {
            debug!(
                frame = ticket.frame.0,
                generation = ticket.generation,
                latest = self.generation,
                "dropping superseded seek"
            );
            return Ok(SeekOutcome::Superseded {
                frame: ticket.frame,
                generation: ticket.generation,
            });
        }

        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(FramestateError::HostTimeout { frame, waited_ms }) => {
                warn!(frame = frame.0, waited_ms, "seek is stale; display unchanged");
                return Ok(SeekOutcome::Stale { frame });
            }
            Err(err) => return Err(err),
        };

        if resolved.status.is_partial() {
            warn!(frame = resolved.frame.0, "displaying a partially replayed state");
        }
        self.display
            .set_state(&resolved.state)
            .await
            .map_err(|e| FramestateError::host(format!("apply to display host: {e}")))?;
        self.playback.mark_applied(resolved.frame);
        Ok(SeekOutcome::Applied(resolved))
    }

    /// `request_seek`, `resolve` and `commit` in one step.
    pub async fn seek_to(&mut self, frame: FrameIndex, now: Instant) -> FramestateResult<SeekOutcome> {
        let ticket = self.request_seek(frame, now);
        let resolved = self.resolve(ticket).await;
        self.commit(ticket, resolved).await
    }

    /// Start or resume playback.
    pub fn play(&mut self, now: Instant) {
        self.playback.play(now);
    }

    /// Pause playback, keeping the current frame.
    pub fn pause(&mut self) {
        self.playback.pause();
    }

    /// Advance playback against `now` and apply the new frame when the throttle allows it.
    pub async fn tick(&mut self, now: Instant) -> FramestateResult<Option<SeekOutcome>> {
        let outcome = self.playback.tick(now);
        let Some(frame) = outcome.apply else {
            return Ok(None);
        };
        let ticket = self.issue(frame);
        let resolved = self.resolve(ticket).await;
        self.commit(ticket, resolved).await.map(Some)
    }

    /// Drive playback at the frame period until it pauses or finishes.
    ///
    /// `commands` is polled between ticks. Once every sender is dropped, playback runs on to the
    /// last frame. An error pauses playback before it is returned.
    pub async fn play_until_stopped(
        &mut self,
        commands: &mut mpsc::Receiver<PlaybackCommand>,
    ) -> FramestateResult<()> {
        let mut interval = tokio::time::interval(self.playback.fps().frame_duration());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut listening = true;
        self.play(Instant::now());

        while self.playback.is_playing() {
            let step = tokio::select! {
                _ = interval.tick() => self.tick(Instant::now()).await.map(|_| ()),
                cmd = commands.recv(), if listening => match cmd {
                    Some(PlaybackCommand::Pause) => {
                        debug!(frame = self.current_frame().0, "playback paused by command");
                        self.pause();
                        Ok(())
                    }
                    Some(PlaybackCommand::Seek(frame)) => {
                        let res = self.seek_to(frame, Instant::now()).await.map(|_| ());
                        interval.reset();
                        res
                    }
                    None => {
                        listening = false;
                        Ok(())
                    }
                },
            };
            if let Err(err) = step {
                self.pause();
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/studio.rs"]
mod tests;
