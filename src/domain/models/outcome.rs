//! Result of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{OutputKey, OutputStore};

/// Snapshot delivered to the caller when a run completes.
///
/// Created at invocation, discarded after delivery; there is no persistence
/// layer behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Unique run identifier
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,

    /// The pipeline's externally visible result
    pub final_summary: String,

    /// Every output key written during the run
    pub outputs: OutputStore,
}

impl RunOutcome {
    /// Convenience accessor for an intermediate output.
    pub fn output(&self, key: OutputKey) -> Option<&str> {
        self.outputs.get(key)
    }
}
