use crate::animation::ease::Ease;
use crate::animation::interp::{AnimationSample, sample_scalar, sample_steps};
use crate::document::model::{Bounds, DocumentState, EntityPatch};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FramestateError, FramestateResult};

/// Identifier of a timeline or snapshot event, unique within its collection.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Wrap an explicit id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Discrete or animated edit placed on the frame axis.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineEvent {
    /// Unique id.
    pub id: EventId,
    /// Frame at which the edit applies (start frame for animations).
    pub frame: FrameIndex,
    /// Payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl TimelineEvent {
    /// Build an event with an explicit id.
    pub fn new(id: impl Into<EventId>, frame: FrameIndex, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            frame,
            kind,
        }
    }

    /// Build an event with a generated id.
    pub fn generated(frame: FrameIndex, kind: EventKind) -> Self {
        Self::new(EventId::generate(), frame, kind)
    }

    /// Payload-level checks (run before insertion).
    pub fn validate(&self) -> FramestateResult<()> {
        if self.id.0.is_empty() {
            return Err(FramestateError::validation("event id must be non-empty"));
        }
        match &self.kind {
            EventKind::Expression(edit) => {
                if edit.entity.id.is_empty() {
                    return Err(FramestateError::validation(format!(
                        "event '{}' targets an empty entity id",
                        self.id
                    )));
                }
            }
            EventKind::Bounds(_) => {}
            EventKind::Animation(spec) => spec.validate(&self.id)?,
        }
        Ok(())
    }
}

/// Closed set of timeline payloads.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// Per-entity upsert.
    Expression(ExpressionEdit),
    /// Viewport replace.
    Bounds(Bounds),
    /// Timed interpolation.
    Animation(AnimationSpec),
}

impl EventKind {
    /// Short lowercase label used in logs and introspection.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Expression(_) => "expression",
            Self::Bounds(_) => "bounds",
            Self::Animation(_) => "animation",
        }
    }
}

/// Property changes for one entity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExpressionEdit {
    /// Patch applied with upsert semantics.
    pub entity: EntityPatch,
}

impl From<EntityPatch> for EventKind {
    fn from(entity: EntityPatch) -> Self {
        Self::Expression(ExpressionEdit { entity })
    }
}

impl From<Bounds> for EventKind {
    fn from(bounds: Bounds) -> Self {
        Self::Bounds(bounds)
    }
}

impl From<AnimationSpec> for EventKind {
    fn from(spec: AnimationSpec) -> Self {
        Self::Animation(spec)
    }
}

/// What an animation drives.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnimationTarget {
    /// Numeric value bound to a named variable defined by `entity` (`name=value`).
    ///
    /// When `name` is absent it is detected from the entity's definition at replay time.
    Variable {
        /// Entity holding the definition.
        entity: String,
        /// Variable name, if known up front.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Numeric property of an existing entity.
    Property {
        /// Target entity.
        entity: String,
        /// Property name.
        property: String,
    },
    /// Action entity stepped `floor(steps × eased_progress)` times.
    Action {
        /// Action entity.
        entity: String,
        /// Total number of steps at completion.
        steps: u32,
    },
}

impl AnimationTarget {
    /// Entity the animation mutates.
    pub fn entity(&self) -> &str {
        match self {
            Self::Variable { entity, .. }
            | Self::Property { entity, .. }
            | Self::Action { entity, .. } => entity,
        }
    }
}

/// Timed interpolation descriptor. The start frame is the owning event's frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    /// Driven target.
    pub target: AnimationTarget,
    /// Duration in frames; `0` behaves like `1`.
    #[serde(default)]
    pub duration_frames: u64,
    /// Start value (ignored by actions).
    #[serde(default)]
    pub from: f64,
    /// End value (ignored by actions).
    #[serde(default)]
    pub to: f64,
    /// Easing curve.
    #[serde(default)]
    pub ease: Ease,
}

impl AnimationSpec {
    /// Numeric animation of a variable.
    pub fn variable(
        entity: impl Into<String>,
        name: Option<&str>,
        duration_frames: u64,
        from: f64,
        to: f64,
        ease: Ease,
    ) -> Self {
        Self {
            target: AnimationTarget::Variable {
                entity: entity.into(),
                name: name.map(str::to_owned),
            },
            duration_frames,
            from,
            to,
            ease,
        }
    }

    /// Numeric animation of an entity property.
    pub fn property(
        entity: impl Into<String>,
        property: impl Into<String>,
        duration_frames: u64,
        from: f64,
        to: f64,
        ease: Ease,
    ) -> Self {
        Self {
            target: AnimationTarget::Property {
                entity: entity.into(),
                property: property.into(),
            },
            duration_frames,
            from,
            to,
            ease,
        }
    }

    /// Step animation of an action entity.
    pub fn action(entity: impl Into<String>, steps: u32, duration_frames: u64, ease: Ease) -> Self {
        Self {
            target: AnimationTarget::Action {
                entity: entity.into(),
                steps,
            },
            duration_frames,
            from: 0.0,
            to: 0.0,
            ease,
        }
    }

    /// First frame at which the animation is completed.
    pub fn end_frame(&self, start: FrameIndex) -> FrameIndex {
        FrameIndex(start.0.saturating_add(self.duration_frames.max(1)))
    }

    /// Sample at `query` for an animation starting at `start`.
    pub fn sample(&self, start: FrameIndex, query: FrameIndex) -> AnimationSample {
        match &self.target {
            AnimationTarget::Variable { .. } | AnimationTarget::Property { .. } => sample_scalar(
                start,
                self.duration_frames,
                self.from,
                self.to,
                self.ease,
                query,
            ),
            AnimationTarget::Action { steps, .. } => {
                sample_steps(start, self.duration_frames, *steps, self.ease, query)
            }
        }
    }

    fn validate(&self, id: &EventId) -> FramestateResult<()> {
        if self.target.entity().is_empty() {
            return Err(FramestateError::validation(format!(
                "animation '{id}' targets an empty entity id"
            )));
        }
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(FramestateError::validation(format!(
                "animation '{id}' values must be finite"
            )));
        }
        Ok(())
    }
}

/// Captured full document state acting as a hard replay reset point.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotEvent {
    /// Unique id.
    pub id: EventId,
    /// Frame at which the state is restored.
    pub frame: FrameIndex,
    /// Captured state.
    pub state: DocumentState,
    /// Author note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SnapshotEvent {
    /// Build a snapshot with a generated id.
    pub fn new(frame: FrameIndex, state: DocumentState, description: Option<String>) -> Self {
        Self {
            id: EventId::generate(),
            frame,
            state,
            description,
        }
    }
}

/// Partial update for [`crate::EventStore::update`]; absent fields are kept.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventPatch {
    /// New frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameIndex>,
    /// Replacement payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
}

impl EventPatch {
    /// Move the event to `frame`.
    pub fn frame(frame: FrameIndex) -> Self {
        Self {
            frame: Some(frame),
            kind: None,
        }
    }

    /// Replace the payload.
    pub fn kind(kind: impl Into<EventKind>) -> Self {
        Self {
            frame: None,
            kind: Some(kind.into()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/event.rs"]
mod tests;
