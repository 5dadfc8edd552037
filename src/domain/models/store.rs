//! Shared output store for a single pipeline run.
//!
//! The source of truth for cross-stage data flow. Each stage publishes its
//! result under a fixed [`OutputKey`]; downstream stages declare the keys
//! they read. Keys are a closed enum rather than free-form strings so the
//! dependency graph can be checked when a pipeline is built, not when a
//! lookup fails mid-run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{PipelineError, PipelineResult};

/// The named slots an agent can publish into during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKey {
    CvAnalysis,
    CareerAdvice,
    CertificationSuggestions,
    FinalSummary,
}

impl OutputKey {
    /// Stable string form, matching the serialized representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CvAnalysis => "cv_analysis",
            Self::CareerAdvice => "career_advice",
            Self::CertificationSuggestions => "certification_suggestions",
            Self::FinalSummary => "final_summary",
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value output space scoped to one pipeline run.
///
/// Single writer per key: a second insert of the same key is rejected, which
/// is what makes "a key is present iff its producer completed" hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputStore {
    entries: BTreeMap<OutputKey, String>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a value under `key`.
    ///
    /// # Errors
    /// [`PipelineError::DuplicateOutput`] if the key was already written.
    pub fn insert(&mut self, key: OutputKey, value: String) -> PipelineResult<()> {
        if self.entries.contains_key(&key) {
            return Err(PipelineError::DuplicateOutput(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Read a previously published value.
    pub fn get(&self, key: OutputKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: OutputKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a batch of stage writes into the store.
    ///
    /// Used at the fan-in point of a parallel stage: children run against an
    /// immutable snapshot and their writes are committed together here.
    pub fn commit(&mut self, writes: Vec<(OutputKey, String)>) -> PipelineResult<()> {
        for (key, value) in writes {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (OutputKey, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let mut store = OutputStore::new();
        store
            .insert(OutputKey::CvAnalysis, "analysis".to_string())
            .unwrap();

        assert_eq!(store.get(OutputKey::CvAnalysis), Some("analysis"));
        assert!(!store.contains(OutputKey::CareerAdvice));
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut store = OutputStore::new();
        store
            .insert(OutputKey::CareerAdvice, "first".to_string())
            .unwrap();

        let err = store
            .insert(OutputKey::CareerAdvice, "second".to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicateOutput(OutputKey::CareerAdvice)
        ));
        // First write is preserved.
        assert_eq!(store.get(OutputKey::CareerAdvice), Some("first"));
    }

    #[test]
    fn commit_rejects_conflicting_batch() {
        let mut store = OutputStore::new();
        store
            .insert(OutputKey::CvAnalysis, "analysis".to_string())
            .unwrap();

        let writes = vec![
            (OutputKey::CareerAdvice, "advice".to_string()),
            (OutputKey::CvAnalysis, "clobber".to_string()),
        ];
        assert!(store.commit(writes).is_err());
    }

    #[test]
    fn key_display_matches_serde() {
        let json = serde_json::to_string(&OutputKey::CertificationSuggestions).unwrap();
        assert_eq!(json, format!("\"{}\"", OutputKey::CertificationSuggestions));
    }
}
