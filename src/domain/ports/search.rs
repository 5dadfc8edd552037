//! Web search port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Errors from the search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search endpoint is not configured")]
    NotConfigured,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from search endpoint: {0}")]
    InvalidResponse(String),
}

/// Port trait for external search backends.
///
/// Live search is network I/O with cost and latency; no caching or query
/// deduplication happens at this layer.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query and return ranked hits.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}
