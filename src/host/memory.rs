use std::collections::BTreeSet;
use std::time::Duration;

use crate::document::model::{Bounds, DocumentState, Entity, EntityPatch, Settings};
use crate::host::{DocumentHost, HostError, HostResult, ImageHandle};

/// Property incremented by [`DocumentHost::run_action`] on the action entity.
pub const ACTION_RUNS_PROP: &str = "runs";

/// Host that keeps the document in memory.
///
/// Used by the CLI and by tests. It can optionally simulate latency (awaited through
/// `tokio::time::sleep`), fingerprint-based rendering, and per-entity rejection.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    state: DocumentState,
    rendering: bool,
    latency: Option<Duration>,
    rejected_entities: BTreeSet<String>,
    set_state_calls: u64,
    mutations: u64,
}

impl MemoryHost {
    /// Empty host without rendering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host preloaded with `state`.
    pub fn with_state(state: DocumentState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Enable [`DocumentHost::capture_image`].
    pub fn with_rendering(mut self, enabled: bool) -> Self {
        self.rendering = enabled;
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every `set_entity` targeting `id` fail.
    pub fn reject_entity(mut self, id: impl Into<String>) -> Self {
        self.rejected_entities.insert(id.into());
        self
    }

    /// Borrow the current state without going through the async interface.
    pub fn snapshot(&self) -> &DocumentState {
        &self.state
    }

    /// Number of full-state replacements received.
    pub fn set_state_calls(&self) -> u64 {
        self.set_state_calls
    }

    /// Number of mutating calls received (all kinds).
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    async fn settle(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl DocumentHost for MemoryHost {
    async fn set_entity(&mut self, patch: &EntityPatch) -> HostResult<()> {
        self.settle().await;
        if patch.id.is_empty() {
            return Err(HostError::rejected("entity id must be non-empty"));
        }
        if self.rejected_entities.contains(&patch.id) {
            return Err(HostError::rejected(format!(
                "entity '{}' refused the update",
                patch.id
            )));
        }
        if patch.props.values().any(|v| !v.is_finite()) {
            return Err(HostError::rejected(format!(
                "entity '{}' received a non-finite property",
                patch.id
            )));
        }
        self.mutations += 1;
        self.state.upsert(patch);
        Ok(())
    }

    async fn remove_entity(&mut self, id: &str) -> HostResult<bool> {
        self.settle().await;
        self.mutations += 1;
        Ok(self.state.remove(id))
    }

    async fn set_bounds(&mut self, bounds: Bounds) -> HostResult<()> {
        self.settle().await;
        bounds
            .validate()
            .map_err(|e| HostError::rejected(e.to_string()))?;
        self.mutations += 1;
        self.state.bounds = bounds;
        Ok(())
    }

    async fn entities(&self) -> HostResult<Vec<Entity>> {
        self.settle().await;
        Ok(self.state.entities.clone())
    }

    async fn state(&self) -> HostResult<DocumentState> {
        self.settle().await;
        Ok(self.state.clone())
    }

    async fn set_state(&mut self, state: &DocumentState) -> HostResult<()> {
        self.settle().await;
        self.mutations += 1;
        self.set_state_calls += 1;
        self.state = state.clone();
        Ok(())
    }

    async fn update_settings(&mut self, settings: &Settings) -> HostResult<()> {
        self.settle().await;
        self.mutations += 1;
        self.state.merge_settings(settings);
        Ok(())
    }

    async fn run_action(&mut self, id: &str) -> HostResult<()> {
        self.settle().await;
        let Some(entity) = self.state.entities.iter_mut().find(|e| e.id == id) else {
            return Err(HostError::UnknownEntity(id.to_owned()));
        };
        *entity
            .props
            .entry(ACTION_RUNS_PROP.to_owned())
            .or_insert(0.0) += 1.0;
        self.mutations += 1;
        Ok(())
    }

    async fn capture_image(
        &mut self,
        width: u32,
        height: u32,
        pixel_density: f64,
    ) -> HostResult<Option<ImageHandle>> {
        self.settle().await;
        if !self.rendering {
            return Ok(None);
        }
        if width == 0 || height == 0 || pixel_density.is_nan() || pixel_density <= 0.0 {
            return Err(HostError::rejected("capture size must be non-zero"));
        }
        Ok(Some(ImageHandle {
            width,
            height,
            pixel_density,
            token: format!("{:016x}", self.state.fingerprint()),
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
