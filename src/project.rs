use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::config::ResolverConfig;
use crate::foundation::error::{FramestateError, FramestateResult};
use crate::host::DocumentHost;
use crate::session::resolver::TimelineResolver;
use crate::timeline::event::{SnapshotEvent, TimelineEvent};

/// JSON-facing project file: configuration plus the authored timeline.
///
/// ```json
/// { "config": { "fps": { "num": 30, "den": 1 } }, "events": [], "snapshots": [] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Project {
    /// Resolver and playback configuration.
    pub config: ResolverConfig,
    /// Timeline events, in any order.
    pub events: Vec<TimelineEvent>,
    /// Snapshots, in any order.
    pub snapshots: Vec<SnapshotEvent>,
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> FramestateResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| FramestateError::validation(format!("parse project JSON: {e}")))
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FramestateResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FramestateError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Write the project as pretty JSON.
    pub fn to_writer<W: Write>(&self, w: W) -> FramestateResult<()> {
        serde_json::to_writer_pretty(w, self).map_err(|e| FramestateError::serde(e.to_string()))
    }

    /// Check configuration, ids and payloads without building a resolver.
    pub fn validate(&self) -> FramestateResult<()> {
        self.config.validate()?;

        let mut seen = BTreeSet::new();
        for ev in &self.events {
            ev.validate()?;
            if !seen.insert(ev.id.as_str()) {
                return Err(FramestateError::validation(format!(
                    "duplicate event id '{}'",
                    ev.id
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for snap in &self.snapshots {
            if !seen.insert(snap.id.as_str()) {
                return Err(FramestateError::validation(format!(
                    "duplicate snapshot id '{}'",
                    snap.id
                )));
            }
            snap.state.validate().map_err(|e| {
                FramestateError::malformed_snapshot(format!("snapshot '{}': {e}", snap.id))
            })?;
        }
        Ok(())
    }

    /// Validate and load the timeline into a fresh resolver backed by `host`.
    pub fn into_resolver<H: DocumentHost>(self, host: H) -> FramestateResult<TimelineResolver<H>> {
        self.validate()?;
        let mut resolver = TimelineResolver::with_host(host, self.config)?;
        for ev in self.events {
            resolver.add_event(ev)?;
        }
        for snap in self.snapshots {
            resolver.add_snapshot_event(snap)?;
        }
        Ok(resolver)
    }
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
