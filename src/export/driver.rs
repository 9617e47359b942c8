use tracing::{info, warn};

use crate::export::sink::{ExportConfig, StateSink};
use crate::foundation::core::FrameRange;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::host::DocumentHost;
use crate::session::resolver::TimelineResolver;

/// Export options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportOpts {
    /// How many times a partial frame is evicted and replayed again.
    pub max_retries: u32,
    /// Fail the export instead of accepting a frame that is still partial.
    pub strict: bool,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            max_retries: 2,
            strict: false,
        }
    }
}

/// Summary of a finished export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Frames pushed into the sink.
    pub frames_total: u64,
    /// Frames accepted despite a partial replay.
    pub frames_partial: u64,
    /// Replays spent on retries.
    pub retries: u64,
}

/// Resolve every frame in `range` in increasing order and stream it into `sink`.
#[tracing::instrument(level = "debug", skip_all, fields(start = range.start.0, end = range.end.0))]
pub async fn export_range<H: DocumentHost>(
    resolver: &mut TimelineResolver<H>,
    range: FrameRange,
    opts: ExportOpts,
    sink: &mut dyn StateSink,
) -> FramestateResult<ExportStats> {
    if range.is_empty() {
        return Err(FramestateError::validation("export range must be non-empty"));
    }
    let duration = resolver.config().duration_frames;
    if range.end.0 > duration {
        return Err(FramestateError::validation(format!(
            "export range end {} exceeds timeline duration {duration}",
            range.end
        )));
    }

    info!(frames = range.len_frames(), "export started");
    sink.begin(ExportConfig {
        fps: resolver.config().fps,
        range,
    })?;

    let mut stats = ExportStats::default();
    for frame in range.iter() {
        let mut resolved = resolver.get_state_at_frame(frame).await?;
        let mut attempts = 0;
        while resolved.status.is_partial() && attempts < opts.max_retries {
            attempts += 1;
            stats.retries += 1;
            resolver.evict_frame(frame);
            resolved = resolver.get_state_at_frame(frame).await?;
        }

        if resolved.status.is_partial() {
            if opts.strict {
                return Err(FramestateError::export(format!(
                    "frame {frame} is still partial after {attempts} retries"
                )));
            }
            warn!(frame = frame.0, "exporting partially replayed frame");
            stats.frames_partial += 1;
        }

        sink.push_state(&resolved)?;
        stats.frames_total += 1;
    }

    sink.end()?;
    info!(
        frames = stats.frames_total,
        partial = stats.frames_partial,
        retries = stats.retries,
        "export finished"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/export/driver.rs"]
mod tests;
