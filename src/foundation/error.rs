use crate::foundation::core::FrameIndex;

/// Result alias used across the crate.
pub type FramestateResult<T> = Result<T, FramestateError>;

/// Errors surfaced to callers of the resolver.
///
/// Failures of a single event during replay are not represented here: they are contained and
/// reported through [`crate::ReplayStatus::Partial`].
#[derive(thiserror::Error, Debug)]
pub enum FramestateError {
    /// The private compute host has not been attached.
    #[error("compute host is not ready")]
    HostNotReady,

    /// A snapshot payload failed to parse; the event store was left unchanged.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Invalid input (duplicate ids, bad ranges, zero fps, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The host failed in a way that invalidates the whole replay (reset or read-back).
    #[error("host error: {0}")]
    Host(String),

    /// The host did not finish a replay within the configured bound.
    #[error("host timed out after {waited_ms}ms resolving frame {frame}")]
    HostTimeout {
        /// Frame being resolved.
        frame: FrameIndex,
        /// Configured bound in milliseconds.
        waited_ms: u64,
    },

    /// Export driver or sink failure.
    #[error("export error: {0}")]
    Export(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramestateError {
    /// Build a [`FramestateError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FramestateError::MalformedSnapshot`].
    pub fn malformed_snapshot(msg: impl Into<String>) -> Self {
        Self::MalformedSnapshot(msg.into())
    }

    /// Build a [`FramestateError::Host`].
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build a [`FramestateError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`FramestateError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
