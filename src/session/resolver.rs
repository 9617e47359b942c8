use tracing::{debug, warn};

use crate::cache::state_cache::{CacheStats, RenderCache, StateCache};
use crate::config::{RenderSettings, ResolverConfig};
use crate::document::model::DocumentState;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::host::{DocumentHost, ImageHandle};
use crate::replay::engine::{ReplayEngine, ReplayStatus};
use crate::timeline::event::{EventId, EventPatch, SnapshotEvent, TimelineEvent};
use crate::timeline::store::EventStore;

/// Fully resolved state of one frame, as handed to callers.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedFrame {
    /// Resolved frame.
    pub frame: FrameIndex,
    /// Deep copy of the resolved state.
    pub state: DocumentState,
    /// Whether the replay behind this state was clean.
    #[serde(flatten)]
    pub status: ReplayStatus,
    /// Rendered image, when captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageHandle>,
}

/// Temporal state resolver: event store, replay engine and the two cache layers.
///
/// Every event-store mutation goes through this type so that cache invalidation always happens
/// in the same step as the mutation.
pub struct TimelineResolver<H> {
    store: EventStore,
    engine: ReplayEngine<H>,
    states: StateCache,
    images: RenderCache,
    config: ResolverConfig,
}

impl<H: DocumentHost> TimelineResolver<H> {
    /// Resolver without a compute host; queries fail with `HostNotReady` until one is attached.
    pub fn new(config: ResolverConfig) -> FramestateResult<Self> {
        config.validate()?;
        Ok(Self {
            store: EventStore::new(),
            engine: ReplayEngine::default(),
            states: StateCache::new(),
            images: RenderCache::new(config.render.clone()),
            config,
        })
    }

    /// Resolver with `host` as its private compute host.
    pub fn with_host(host: H, config: ResolverConfig) -> FramestateResult<Self> {
        let mut resolver = Self::new(config)?;
        resolver.engine.attach(host);
        Ok(resolver)
    }

    /// Attach (or replace) the compute host. Cached results are dropped.
    pub fn attach_host(&mut self, host: H) -> Option<H> {
        self.clear_cache();
        self.engine.attach(host)
    }

    /// Detach the compute host.
    pub fn detach_host(&mut self) -> Option<H> {
        self.engine.detach()
    }

    /// Borrow the compute host.
    pub fn compute_host(&self) -> Option<&H> {
        self.engine.host()
    }

    /// Active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Read-only view of the event log.
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Number of replays run so far.
    pub fn replays(&self) -> u64 {
        self.engine.replays()
    }

    /// Logical-layer hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.states.stats()
    }

    /// Render-layer hit/miss counters; only counted while capture is on.
    pub fn render_cache_stats(&self) -> CacheStats {
        self.images.stats()
    }

    /// Add a timeline event.
    pub fn add_event(&mut self, event: TimelineEvent) -> FramestateResult<()> {
        self.store.add(event)?;
        self.clear_cache();
        Ok(())
    }

    /// Partially update a timeline event; returns whether it was found.
    pub fn update_event(&mut self, id: &EventId, patch: EventPatch) -> FramestateResult<bool> {
        let found = self.store.update(id, patch)?;
        if found {
            self.clear_cache();
        }
        Ok(found)
    }

    /// Remove a timeline event; returns whether it was found.
    pub fn remove_event(&mut self, id: &EventId) -> bool {
        let found = self.store.remove(id);
        if found {
            self.clear_cache();
        }
        found
    }

    /// Add a snapshot holding `state` at `frame`.
    pub fn add_snapshot_state(
        &mut self,
        frame: FrameIndex,
        state: DocumentState,
        description: Option<String>,
    ) -> FramestateResult<EventId> {
        let snapshot = SnapshotEvent::new(frame, state, description);
        let id = snapshot.id.clone();
        self.add_snapshot_event(snapshot)?;
        Ok(id)
    }

    /// Add a fully built snapshot (id included), e.g. one loaded from a project file.
    pub fn add_snapshot_event(&mut self, snapshot: SnapshotEvent) -> FramestateResult<()> {
        self.store.add_snapshot(snapshot)?;
        self.clear_cache();
        Ok(())
    }

    /// Parse a hand-edited snapshot payload and add it.
    ///
    /// Fails with `MalformedSnapshot` before touching the store when the JSON does not describe a
    /// valid [`DocumentState`].
    pub fn import_snapshot_json(
        &mut self,
        frame: FrameIndex,
        json: &str,
        description: Option<String>,
    ) -> FramestateResult<EventId> {
        let state: DocumentState = serde_json::from_str(json)
            .map_err(|e| FramestateError::malformed_snapshot(e.to_string()))?;
        state
            .validate()
            .map_err(|e| FramestateError::malformed_snapshot(e.to_string()))?;
        self.add_snapshot_state(frame, state, description)
    }

    /// Remove a snapshot; returns whether it was found.
    pub fn remove_snapshot(&mut self, id: &EventId) -> bool {
        let found = self.store.remove_snapshot(id);
        if found {
            self.clear_cache();
        }
        found
    }

    /// Drop all timeline events.
    pub fn clear_timeline(&mut self) {
        self.store.clear();
        self.clear_cache();
    }

    /// Drop all snapshots.
    pub fn clear_snapshots(&mut self) {
        self.store.clear_snapshots();
        self.clear_cache();
    }

    /// Drop both cache layers.
    pub fn clear_cache(&mut self) {
        self.states.clear();
        self.images.clear();
    }

    /// Drop one frame from both layers.
    pub fn evict_frame(&mut self, frame: FrameIndex) -> bool {
        let a = self.states.evict(frame);
        let b = self.images.evict(frame);
        a || b
    }

    /// Change render settings. Only the image layer is invalidated.
    pub fn set_render_settings(&mut self, settings: RenderSettings) -> FramestateResult<()> {
        settings.validate()?;
        if self.images.set_settings(settings.clone()) {
            debug!("render settings changed; image cache cleared");
        }
        self.config.render = settings;
        Ok(())
    }

    /// Turn opportunistic image capture on or off.
    pub fn set_capture_images(&mut self, enabled: bool) {
        self.config.capture_images = enabled;
    }

    /// Frames currently held by the logical layer, ascending.
    pub fn list_cached_frames(&self) -> Vec<FrameIndex> {
        self.states.frames()
    }

    /// Frames currently holding a captured image, ascending.
    pub fn list_rendered_frames(&self) -> Vec<FrameIndex> {
        self.images.frames()
    }

    /// Human-readable list of the events a replay of `frame` would apply.
    pub fn describe_events_up_to(&self, frame: FrameIndex) -> Vec<String> {
        self.store
            .effective_events_up_to(frame)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Resolve the state at `frame`, replaying only on a cache miss.
    ///
    /// The returned value is always a copy; the cached entry is never exposed. A replay that does
    /// not finish within `host_timeout_ms` yields `HostTimeout` and caches nothing.
    ///
    /// With `capture_images` on, a frame is served from cache once it has a capture outcome, even
    /// when that capture produced no image. Must be awaited inside a Tokio runtime with the time
    /// driver enabled (`enable_time`), which the bounded wait relies on.
    pub async fn get_state_at_frame(&mut self, frame: FrameIndex) -> FramestateResult<ResolvedFrame> {
        let revision = self.store.revision();

        let cached_image = if self.config.capture_images {
            self.images.get(frame, revision)
        } else {
            Some(None)
        };
        if let Some(image) = cached_image {
            if let Some(entry) = self.states.get(frame, revision) {
                debug!(frame = frame.0, "state cache hit");
                return Ok(ResolvedFrame {
                    frame,
                    state: entry.state,
                    status: entry.status,
                    image,
                });
            }
        }

        debug!(frame = frame.0, "state cache miss");
        let timeout = self.config.host_timeout();
        let outcome =
            match tokio::time::timeout(timeout, self.engine.compute_state_at(&self.store, frame))
                .await
            {
                Ok(outcome) => outcome?,
                Err(_) => {
                    warn!(frame = frame.0, timeout_ms = self.config.host_timeout_ms, "replay timed out");
                    return Err(FramestateError::HostTimeout {
                        frame,
                        waited_ms: self.config.host_timeout_ms,
                    });
                }
            };

        let image = if self.config.capture_images {
            self.capture().await
        } else {
            None
        };

        self.states
            .insert(frame, revision, outcome.state.clone(), outcome.status.clone());
        if self.config.capture_images {
            self.images.insert(frame, revision, image.clone());
        }

        Ok(ResolvedFrame {
            frame,
            state: outcome.state,
            status: outcome.status,
            image,
        })
    }

    async fn capture(&mut self) -> Option<ImageHandle> {
        let render = &self.config.render;
        let captured = tokio::time::timeout(
            self.config.host_timeout(),
            self.engine.capture_image(
                render.width,
                render.height,
                render.pixel_density,
                render.background.as_deref(),
            ),
        )
        .await;
        match captured {
            Ok(Ok(image)) => image,
            Ok(Err(err)) => {
                warn!(error = %err, "image capture failed");
                None
            }
            Err(_) => {
                warn!("image capture timed out");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/resolver.rs"]
mod tests;
