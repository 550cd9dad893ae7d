//! Run manifest emitted after every validation pass.
//!
//! Records which shape set was evaluated (by content hash) and how much of it
//! the dirty-check let through, so two runs over the same commit can be
//! compared without diffing reports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the shape set the validator was built with.
    pub shapes_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Shapes whose plans were built and drained.
    pub shapes_evaluated: usize,

    /// Shapes skipped because the delta could not affect them (or deactivated).
    pub shapes_skipped: usize,

    /// Total violation tuples drained.
    pub violations: usize,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(shapes_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            shapes_hash,
            engine_version: crate::VERSION.to_string(),
            shapes_evaluated: 0,
            shapes_skipped: 0,
            violations: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64) -> Self {
        self.finished_ms = finished_ms.max(self.started_ms);
        self
    }
}
