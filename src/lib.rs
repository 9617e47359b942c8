//! Framestate resolves the full document state of an authored timeline at any frame.
//!
//! A timeline is an ordered log of discrete edits, timed animations and full-state snapshots.
//! The state at a frame is rebuilt by replaying that log against a private compute host and is
//! memoized per frame until the log changes:
//!
//! - Author the timeline through a [`TimelineResolver`] (or load a [`Project`])
//! - Query frames with [`TimelineResolver::get_state_at_frame`]
//! - Drive an editing session with seek and playback through a [`Studio`]
//! - Stream a frame range into a [`StateSink`] with [`export_range`]
//!
//! The async operations bound host calls with `tokio::time`, so they must run inside a Tokio
//! runtime with the time driver enabled.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod document;
pub(crate) mod export;
/// Host capability trait and the in-memory reference host.
pub mod host;
pub(crate) mod playback;
pub(crate) mod project;
pub(crate) mod replay;
pub(crate) mod session;
pub(crate) mod timeline;

pub use crate::foundation::core::{Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{FramestateError, FramestateResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::interp::{AnimatedValue, AnimationSample};
pub use crate::cache::state_cache::{CacheEntry, CacheStats, RenderCache, StateCache};
pub use crate::config::{RenderSettings, ResolverConfig};
pub use crate::document::model::{Bounds, DocumentState, Entity, EntityPatch, Settings};
pub use crate::export::driver::{ExportOpts, ExportStats, export_range};
pub use crate::export::sink::{ExportConfig, InMemoryStateSink, JsonLinesSink, StateSink};
pub use crate::host::memory::MemoryHost;
pub use crate::host::{DocumentHost, HostError, HostResult, ImageHandle};
pub use crate::playback::scheduler::{Playback, PlaybackState, TickOutcome};
pub use crate::project::Project;
pub use crate::replay::engine::{ReplayEngine, ReplayOutcome, ReplayStatus, SkippedEvent};
pub use crate::session::resolver::{ResolvedFrame, TimelineResolver};
pub use crate::session::studio::{PlaybackCommand, SeekOutcome, SeekTicket, Studio};
pub use crate::timeline::event::{
    AnimationSpec, AnimationTarget, EventId, EventKind, EventPatch, ExpressionEdit, SnapshotEvent,
    TimelineEvent,
};
pub use crate::timeline::store::{EffectiveEvent, EffectivePayload, EventStore};
