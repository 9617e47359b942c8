use crate::animation::interp::{AnimatedValue, AnimationSample};
use crate::document::model::{Bounds, DocumentState, EntityPatch};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::timeline::event::{
    AnimationTarget, EventId, EventKind, EventPatch, SnapshotEvent, TimelineEvent,
};

/// Frame-sorted event log: timeline events plus snapshot reset points.
///
/// Both collections stay sorted by frame after every mutation; events sharing a frame keep their
/// insertion order. Every successful mutation bumps [`EventStore::revision`].
#[derive(Clone, Debug, Default)]
pub struct EventStore {
    events: Vec<TimelineEvent>,
    snapshots: Vec<SnapshotEvent>,
    revision: u64,
}

impl EventStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutation counter; any cached result computed against another revision is stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Timeline events in replay order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Snapshots in replay order.
    pub fn snapshots(&self) -> &[SnapshotEvent] {
        &self.snapshots
    }

    /// Look up a timeline event.
    pub fn get(&self, id: &EventId) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Look up a snapshot.
    pub fn snapshot(&self, id: &EventId) -> Option<&SnapshotEvent> {
        self.snapshots.iter().find(|s| &s.id == id)
    }

    /// Number of timeline events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when neither collection holds anything.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.snapshots.is_empty()
    }

    /// Insert a timeline event after any existing events on the same frame.
    pub fn add(&mut self, event: TimelineEvent) -> FramestateResult<()> {
        event.validate()?;
        if self.get(&event.id).is_some() {
            return Err(FramestateError::validation(format!(
                "duplicate event id '{}'",
                event.id
            )));
        }
        insert_sorted(&mut self.events, event, |e| e.frame);
        self.bump();
        Ok(())
    }

    /// Apply a partial update. Returns `Ok(false)` when `id` is unknown.
    ///
    /// A frame change re-inserts the event at the end of its new frame group. An invalid patch
    /// leaves the store untouched.
    pub fn update(&mut self, id: &EventId, patch: EventPatch) -> FramestateResult<bool> {
        let Some(pos) = self.events.iter().position(|e| &e.id == id) else {
            return Ok(false);
        };

        let mut next = self.events[pos].clone();
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        let moved = patch.frame.is_some_and(|f| f != next.frame);
        if let Some(frame) = patch.frame {
            next.frame = frame;
        }
        next.validate()?;

        if moved {
            self.events.remove(pos);
            insert_sorted(&mut self.events, next, |e| e.frame);
        } else {
            self.events[pos] = next;
        }
        self.bump();
        Ok(true)
    }

    /// Remove a timeline event; returns whether it existed.
    pub fn remove(&mut self, id: &EventId) -> bool {
        let before = self.events.len();
        self.events.retain(|e| &e.id != id);
        let found = self.events.len() != before;
        if found {
            self.bump();
        }
        found
    }

    /// Drop every timeline event (snapshots are kept).
    pub fn clear(&mut self) {
        self.events.clear();
        self.bump();
    }

    /// Insert a snapshot after any existing snapshots on the same frame.
    pub fn add_snapshot(&mut self, snapshot: SnapshotEvent) -> FramestateResult<()> {
        if snapshot.id.0.is_empty() {
            return Err(FramestateError::validation("snapshot id must be non-empty"));
        }
        if self.snapshot(&snapshot.id).is_some() {
            return Err(FramestateError::validation(format!(
                "duplicate snapshot id '{}'",
                snapshot.id
            )));
        }
        insert_sorted(&mut self.snapshots, snapshot, |s| s.frame);
        self.bump();
        Ok(())
    }

    /// Remove a snapshot; returns whether it existed.
    pub fn remove_snapshot(&mut self, id: &EventId) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| &s.id != id);
        let found = self.snapshots.len() != before;
        if found {
            self.bump();
        }
        found
    }

    /// Drop every snapshot.
    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
        self.bump();
    }

    /// Events that shape the state at `frame`, in application order.
    ///
    /// Starts at the latest snapshot with `snapshot.frame <= frame` (a full replace makes anything
    /// before it irrelevant), then lists timeline events from that frame on, including same-frame
    /// events, which apply after the snapshot. Animations are replaced by their point sample at
    /// `frame` and omitted before their start.
    pub fn effective_events_up_to(&self, frame: FrameIndex) -> Vec<EffectiveEvent<'_>> {
        let mut out = Vec::new();

        let snap_end = self.snapshots.partition_point(|s| s.frame <= frame);
        let floor = snap_end.checked_sub(1).map(|i| &self.snapshots[i]);
        if let Some(snap) = floor {
            out.push(EffectiveEvent {
                id: &snap.id,
                frame: snap.frame,
                payload: EffectivePayload::Snapshot(&snap.state),
            });
        }
        let floor_frame = floor.map(|s| s.frame).unwrap_or_default();

        let lo = self.events.partition_point(|e| e.frame < floor_frame);
        let hi = self.events.partition_point(|e| e.frame <= frame);
        for ev in &self.events[lo..hi] {
            let payload = match &ev.kind {
                EventKind::Expression(edit) => EffectivePayload::Expression(&edit.entity),
                EventKind::Bounds(bounds) => EffectivePayload::Bounds(*bounds),
                EventKind::Animation(spec) => match spec.sample(ev.frame, frame) {
                    AnimationSample::Inactive => continue,
                    AnimationSample::InProgress(value) => EffectivePayload::Animation {
                        target: &spec.target,
                        value,
                        completed: false,
                    },
                    AnimationSample::Completed(value) => EffectivePayload::Animation {
                        target: &spec.target,
                        value,
                        completed: true,
                    },
                },
            };
            out.push(EffectiveEvent {
                id: &ev.id,
                frame: ev.frame,
                payload,
            });
        }
        out
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn insert_sorted<T>(items: &mut Vec<T>, item: T, frame_of: impl Fn(&T) -> FrameIndex) {
    let f = frame_of(&item);
    let idx = items.partition_point(|e| frame_of(e) <= f);
    items.insert(idx, item);
}

/// One entry of [`EventStore::effective_events_up_to`], borrowed from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveEvent<'a> {
    /// Source event id.
    pub id: &'a EventId,
    /// Source event frame (start frame for animations).
    pub frame: FrameIndex,
    /// What to apply.
    pub payload: EffectivePayload<'a>,
}

/// Payload of an [`EffectiveEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum EffectivePayload<'a> {
    /// Full state replace.
    Snapshot(&'a DocumentState),
    /// Entity upsert.
    Expression(&'a EntityPatch),
    /// Viewport replace.
    Bounds(Bounds),
    /// Animation reduced to a point sample.
    Animation {
        /// Driven target.
        target: &'a AnimationTarget,
        /// Sampled value.
        value: AnimatedValue,
        /// Whether the sample is the terminal value.
        completed: bool,
    },
}

impl std::fmt::Display for EffectiveEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{} [{}] ", self.frame, self.id)?;
        match &self.payload {
            EffectivePayload::Snapshot(state) => {
                write!(f, "snapshot ({} entities)", state.entities.len())
            }
            EffectivePayload::Expression(patch) => write!(f, "expression {}", patch.id),
            EffectivePayload::Bounds(b) => write!(
                f,
                "bounds l={} r={} t={} b={}",
                b.left, b.right, b.top, b.bottom
            ),
            EffectivePayload::Animation {
                target,
                value,
                completed,
            } => {
                let kind = match target {
                    AnimationTarget::Variable { .. } => "variable",
                    AnimationTarget::Property { .. } => "property",
                    AnimationTarget::Action { .. } => "action",
                };
                let state = if *completed { "done" } else { "running" };
                match value {
                    AnimatedValue::Scalar(v) => {
                        write!(f, "{kind} {} = {v} ({state})", target.entity())
                    }
                    AnimatedValue::Steps(n) => {
                        write!(f, "{kind} {} x{n} ({state})", target.entity())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/store.rs"]
mod tests;
