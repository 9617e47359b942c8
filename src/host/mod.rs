//! Host capability consumed by the resolver.
//!
//! A host is the external, stateful document engine that stores (and possibly renders) a
//! [`DocumentState`]. The resolver drives two of them: a private compute host that replays the
//! timeline, and a display host that only ever receives fully resolved states.

use crate::document::model::{Bounds, DocumentState, Entity, EntityPatch, Settings};

/// In-memory reference host.
pub mod memory;

/// Result alias for host calls.
pub type HostResult<T> = Result<T, HostError>;

/// Failure of a single host call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The call referenced an entity the host does not know.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    /// The payload was rejected by the host.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The host cannot serve calls right now.
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Build a [`HostError::Rejected`].
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Opaque handle to an image rendered by the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageHandle {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Device pixel ratio used for the capture.
    pub pixel_density: f64,
    /// Host-defined token identifying the image.
    pub token: String,
}

/// Asynchronous document host.
///
/// Calls may complete later than they are issued because the host owns its own render
/// scheduling. Callers await each call before issuing the next one.
#[allow(async_fn_in_trait)]
pub trait DocumentHost {
    /// Upsert one entity.
    async fn set_entity(&mut self, patch: &EntityPatch) -> HostResult<()>;
    /// Remove one entity; returns whether it existed.
    async fn remove_entity(&mut self, id: &str) -> HostResult<bool>;
    /// Replace the viewport.
    async fn set_bounds(&mut self, bounds: Bounds) -> HostResult<()>;
    /// Current entity list.
    async fn entities(&self) -> HostResult<Vec<Entity>>;
    /// Full current state.
    async fn state(&self) -> HostResult<DocumentState>;
    /// Replace the full state.
    async fn set_state(&mut self, state: &DocumentState) -> HostResult<()>;
    /// Merge document settings.
    async fn update_settings(&mut self, settings: &Settings) -> HostResult<()>;
    /// Run one step of the action entity `id`.
    async fn run_action(&mut self, id: &str) -> HostResult<()>;

    /// Render the current state. Hosts without a renderer return `None`.
    async fn capture_image(
        &mut self,
        width: u32,
        height: u32,
        pixel_density: f64,
    ) -> HostResult<Option<ImageHandle>> {
        let _ = (width, height, pixel_density);
        Ok(None)
    }
}
