use crate::foundation::core::Fps;
use crate::foundation::error::{FramestateError, FramestateResult};

/// Settings that affect captured images but not the logical document state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub pixel_density: f64,
    /// Background color override (`#rrggbb`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pixel_density: 1.0,
            background: None,
        }
    }
}

impl RenderSettings {
    /// Reject zero sizes and non-positive densities.
    pub fn validate(&self) -> FramestateResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FramestateError::validation(
                "render width and height must be > 0",
            ));
        }
        if !self.pixel_density.is_finite() || self.pixel_density <= 0.0 {
            return Err(FramestateError::validation(
                "render pixel_density must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Resolver and playback configuration.
///
/// Missing fields fall back to [`ResolverConfig::default`], so a project file may carry only the
/// keys it cares about.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Timeline rate.
    pub fps: Fps,
    /// Timeline length in frames; playback and export stay inside `[0, duration_frames)`.
    pub duration_frames: u64,
    /// Minimum frame distance between two display applies during playback.
    pub apply_threshold_frames: u64,
    /// Upper bound on a single replay, in milliseconds.
    pub host_timeout_ms: u64,
    /// Capture an image after every replay when the host can render.
    pub capture_images: bool,
    /// Image capture settings.
    pub render: RenderSettings,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            duration_frames: 300,
            apply_threshold_frames: 1,
            host_timeout_ms: 5_000,
            capture_images: false,
            render: RenderSettings::default(),
        }
    }
}

impl ResolverConfig {
    /// Validate every field.
    pub fn validate(&self) -> FramestateResult<()> {
        self.fps.validate()?;
        if self.host_timeout_ms == 0 {
            return Err(FramestateError::validation("host_timeout_ms must be > 0"));
        }
        self.render.validate()
    }

    /// Replay bound as a [`std::time::Duration`].
    pub fn host_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.host_timeout_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
