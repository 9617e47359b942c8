use std::io::Write;

use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::session::resolver::ResolvedFrame;

/// Configuration handed to a [`StateSink`] at the start of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportConfig {
    /// Timeline rate.
    pub fps: Fps,
    /// Exported frames.
    pub range: FrameRange,
}

/// Consumer of resolved frames.
///
/// Ordering contract: `push_state` is called in strictly increasing `FrameIndex` order within the
/// exported range.
pub trait StateSink {
    /// Called once before the first frame.
    fn begin(&mut self, cfg: ExportConfig) -> FramestateResult<()>;
    /// Called once per exported frame.
    fn push_state(&mut self, frame: &ResolvedFrame) -> FramestateResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> FramestateResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryStateSink {
    cfg: Option<ExportConfig>,
    ended: bool,
    /// Frames in timeline order.
    pub frames: Vec<ResolvedFrame>,
}

impl InMemoryStateSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration received by the last `begin`.
    pub fn config(&self) -> Option<ExportConfig> {
        self.cfg
    }

    /// `true` once `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl StateSink for InMemoryStateSink {
    fn begin(&mut self, cfg: ExportConfig) -> FramestateResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_state(&mut self, frame: &ResolvedFrame) -> FramestateResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> FramestateResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes one JSON object per frame, newline-delimited.
pub struct JsonLinesSink<W: Write> {
    out: W,
    last: Option<FrameIndex>,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink writing into `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            written: 0,
        }
    }

    /// Lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StateSink for JsonLinesSink<W> {
    fn begin(&mut self, _cfg: ExportConfig) -> FramestateResult<()> {
        self.last = None;
        self.written = 0;
        Ok(())
    }

    fn push_state(&mut self, frame: &ResolvedFrame) -> FramestateResult<()> {
        if self.last.is_some_and(|last| frame.frame <= last) {
            return Err(FramestateError::export(format!(
                "frame {} pushed out of order",
                frame.frame
            )));
        }
        serde_json::to_writer(&mut self.out, frame)
            .map_err(|e| FramestateError::serde(e.to_string()))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| FramestateError::export(format!("write json line: {e}")))?;
        self.last = Some(frame.frame);
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> FramestateResult<()> {
        self.out
            .flush()
            .map_err(|e| FramestateError::export(format!("flush json lines: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
