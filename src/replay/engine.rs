use tracing::{debug, warn};

use crate::animation::interp::AnimatedValue;
use crate::document::model::{DocumentState, EntityPatch};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::host::{DocumentHost, HostError, HostResult, ImageHandle};
use crate::timeline::event::{AnimationTarget, EventId};
use crate::timeline::store::{EffectiveEvent, EffectivePayload, EventStore};

/// One event that could not be applied during a replay.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkippedEvent {
    /// Source event id.
    pub event_id: EventId,
    /// Source event frame.
    pub frame: FrameIndex,
    /// Host failure message.
    pub reason: String,
}

/// Whether a replayed state is fully verified.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReplayStatus {
    /// Every effective event applied cleanly.
    #[default]
    Complete,
    /// The state was assembled despite one or more skipped events.
    Partial {
        /// Events that failed to apply, in replay order.
        skipped: Vec<SkippedEvent>,
    },
}

impl ReplayStatus {
    fn from_skipped(skipped: Vec<SkippedEvent>) -> Self {
        if skipped.is_empty() {
            Self::Complete
        } else {
            Self::Partial { skipped }
        }
    }

    /// `true` when at least one event was skipped.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }
}

/// Output of a single replay.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    /// Resolved frame.
    pub frame: FrameIndex,
    /// State read back from the compute host.
    pub state: DocumentState,
    /// Verification tag.
    pub status: ReplayStatus,
}

/// Replays the event log against a private compute host.
///
/// The engine owns the host exclusively, so two replays can never interleave on it.
#[derive(Debug)]
pub struct ReplayEngine<H> {
    host: Option<H>,
    replays: u64,
}

impl<H> Default for ReplayEngine<H> {
    fn default() -> Self {
        Self {
            host: None,
            replays: 0,
        }
    }
}

impl<H: DocumentHost> ReplayEngine<H> {
    /// Engine with an attached compute host.
    pub fn new(host: H) -> Self {
        Self {
            host: Some(host),
            replays: 0,
        }
    }

    /// Attach (or replace) the compute host.
    pub fn attach(&mut self, host: H) -> Option<H> {
        self.host.replace(host)
    }

    /// Detach the compute host.
    pub fn detach(&mut self) -> Option<H> {
        self.host.take()
    }

    /// `true` when a compute host is attached.
    pub fn is_ready(&self) -> bool {
        self.host.is_some()
    }

    /// Borrow the compute host.
    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    /// Number of replays started so far.
    pub fn replays(&self) -> u64 {
        self.replays
    }

    /// Reconstruct the state at `frame` from the fixed empty baseline.
    ///
    /// Events are applied strictly in order and each host call is awaited before the next one,
    /// since later events may read state left by earlier ones. A failing event is logged and
    /// skipped; the outcome is then tagged [`ReplayStatus::Partial`].
    #[tracing::instrument(level = "debug", skip_all, fields(frame = frame.0))]
    pub async fn compute_state_at(
        &mut self,
        store: &EventStore,
        frame: FrameIndex,
    ) -> FramestateResult<ReplayOutcome> {
        let host = self.host.as_mut().ok_or(FramestateError::HostNotReady)?;
        self.replays += 1;

        host.set_state(&DocumentState::default())
            .await
            .map_err(|e| FramestateError::host(format!("reset compute host: {e}")))?;

        let events = store.effective_events_up_to(frame);
        debug!(events = events.len(), "replaying");

        let mut skipped = Vec::new();
        for ev in &events {
            if let Err(err) = apply_event(host, ev).await {
                warn!(event = %ev.id, event_frame = ev.frame.0, error = %err, "skipping event");
                skipped.push(SkippedEvent {
                    event_id: ev.id.clone(),
                    frame: ev.frame,
                    reason: err.to_string(),
                });
            }
        }

        let state = host
            .state()
            .await
            .map_err(|e| FramestateError::host(format!("read back compute host: {e}")))?;

        Ok(ReplayOutcome {
            frame,
            state,
            status: ReplayStatus::from_skipped(skipped),
        })
    }

    /// Render whatever the compute host currently holds (normally the last replayed frame).
    pub async fn capture_image(
        &mut self,
        width: u32,
        height: u32,
        pixel_density: f64,
        background: Option<&str>,
    ) -> FramestateResult<Option<ImageHandle>> {
        let host = self.host.as_mut().ok_or(FramestateError::HostNotReady)?;
        if let Some(bg) = background {
            let mut settings = crate::document::model::Settings::new();
            settings.insert("backgroundColor".to_owned(), serde_json::json!(bg));
            host.update_settings(&settings)
                .await
                .map_err(|e| FramestateError::host(format!("apply background: {e}")))?;
        }
        host.capture_image(width, height, pixel_density)
            .await
            .map_err(|e| FramestateError::host(format!("capture image: {e}")))
    }
}

async fn apply_event<H: DocumentHost>(host: &mut H, ev: &EffectiveEvent<'_>) -> HostResult<()> {
    match &ev.payload {
        EffectivePayload::Snapshot(state) => host.set_state(state).await,
        EffectivePayload::Expression(patch) => host.set_entity(patch).await,
        EffectivePayload::Bounds(bounds) => host.set_bounds(*bounds).await,
        EffectivePayload::Animation { target, value, .. } => {
            apply_animation(host, target, *value).await
        }
    }
}

async fn apply_animation<H: DocumentHost>(
    host: &mut H,
    target: &AnimationTarget,
    value: AnimatedValue,
) -> HostResult<()> {
    match (target, value) {
        (AnimationTarget::Variable { entity, name }, AnimatedValue::Scalar(v)) => {
            let name = match name {
                Some(name) => name.clone(),
                None => {
                    let entities = host.entities().await?;
                    entities
                        .iter()
                        .find(|e| e.id == *entity)
                        .and_then(|e| e.defined_variable())
                        .map(str::to_owned)
                        .ok_or_else(|| {
                            HostError::rejected(format!(
                                "cannot detect a variable defined by entity '{entity}'"
                            ))
                        })?
                }
            };
            host.set_entity(&EntityPatch::new(entity.clone()).with_latex(format!("{name}={v}")))
                .await
        }
        (AnimationTarget::Property { entity, property }, AnimatedValue::Scalar(v)) => {
            let entities = host.entities().await?;
            if !entities.iter().any(|e| e.id == *entity) {
                return Err(HostError::UnknownEntity(entity.clone()));
            }
            host.set_entity(&EntityPatch::new(entity.clone()).with_prop(property.clone(), v))
                .await
        }
        (AnimationTarget::Action { entity, .. }, AnimatedValue::Steps(n)) => {
            for _ in 0..n {
                host.run_action(entity).await?;
            }
            Ok(())
        }
        (target, value) => Err(HostError::rejected(format!(
            "animation value {value:?} does not fit target on '{}'",
            target.entity()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/replay/engine.rs"]
mod tests;
