use std::collections::BTreeMap;

use crate::config::RenderSettings;
use crate::document::model::DocumentState;
use crate::foundation::core::FrameIndex;
use crate::host::ImageHandle;
use crate::replay::engine::ReplayStatus;

/// Hit/miss counters for one cache layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that required a replay.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cached logical state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// State read back after the replay.
    pub state: DocumentState,
    /// Whether the replay was clean.
    pub status: ReplayStatus,
    revision: u64,
}

/// Logical-state layer: frame → replayed state, invalidated by event-store mutation only.
///
/// Entries are tagged with the store revision they were computed against; a lookup under a
/// different revision drops the entry and reports a miss. Callers always receive clones.
#[derive(Debug, Default)]
pub struct StateCache {
    entries: BTreeMap<FrameIndex, CacheEntry>,
    stats: CacheStats,
}

impl StateCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the entry for `frame`, if it was computed against `revision`.
    pub fn get(&mut self, frame: FrameIndex, revision: u64) -> Option<CacheEntry> {
        match self.entries.get(&frame) {
            Some(entry) if entry.revision == revision => {
                self.stats.hits += 1;
                Some(entry.clone())
            }
            Some(_) => {
                self.entries.remove(&frame);
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a replay result; replaces any previous entry for `frame` wholesale.
    pub fn insert(
        &mut self,
        frame: FrameIndex,
        revision: u64,
        state: DocumentState,
        status: ReplayStatus,
    ) {
        self.entries.insert(
            frame,
            CacheEntry {
                state,
                status,
                revision,
            },
        );
    }

    /// Drop one frame; returns whether it was cached.
    pub fn evict(&mut self, frame: FrameIndex) -> bool {
        self.entries.remove(&frame).is_some()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached frames, ascending.
    pub fn frames(&self) -> Vec<FrameIndex> {
        self.entries.keys().copied().collect()
    }

    /// Number of cached frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss counters since construction.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Rendered-snapshot layer: frame → capture outcome.
///
/// A frame whose capture produced no image (host cannot render, capture failed) is still
/// recorded, so repeated lookups do not replay it again. Invalidated by event-store mutation
/// (revision tag, explicit clear) and by any change of [`RenderSettings`], which leaves the
/// logical layer alone.
#[derive(Debug, Default)]
pub struct RenderCache {
    images: BTreeMap<FrameIndex, (u64, Option<ImageHandle>)>,
    settings: RenderSettings,
    stats: CacheStats,
}

impl RenderCache {
    /// Empty cache for `settings`.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            images: BTreeMap::new(),
            settings,
            stats: CacheStats::default(),
        }
    }

    /// Settings the cached images were captured with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Switch render settings; clears the layer and returns `true` when they differ.
    pub fn set_settings(&mut self, settings: RenderSettings) -> bool {
        if settings == self.settings {
            return false;
        }
        self.settings = settings;
        self.images.clear();
        true
    }

    /// Capture outcome for `frame`, if one was recorded against `revision`.
    ///
    /// `Some(None)` means the frame was captured without producing an image.
    pub fn get(&mut self, frame: FrameIndex, revision: u64) -> Option<Option<ImageHandle>> {
        match self.images.get(&frame) {
            Some((rev, img)) if *rev == revision => {
                self.stats.hits += 1;
                Some(img.clone())
            }
            Some(_) => {
                self.images.remove(&frame);
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Record a capture outcome; `None` marks a capture that produced no image.
    pub fn insert(&mut self, frame: FrameIndex, revision: u64, image: Option<ImageHandle>) {
        self.images.insert(frame, (revision, image));
    }

    /// Drop one frame.
    pub fn evict(&mut self, frame: FrameIndex) -> bool {
        self.images.remove(&frame).is_some()
    }

    /// Drop everything (settings are kept).
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Frames with a cached image, ascending.
    pub fn frames(&self) -> Vec<FrameIndex> {
        self.images
            .iter()
            .filter(|(_, (_, img))| img.is_some())
            .map(|(frame, _)| *frame)
            .collect()
    }

    /// Hit/miss counters since construction.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/state_cache.rs"]
mod tests;
