//! HTTP search client.
//!
//! Speaks a minimal JSON search protocol: GET `{endpoint}?q=...&num=...`
//! with optional bearer auth, expecting `{"results": [{title, url,
//! snippet}]}`. When no endpoint is configured the client reports
//! [`SearchError::NotConfigured`] and the web research tool degrades
//! gracefully upstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::models::config::SearchConfig;
use crate::domain::ports::search::{SearchError, SearchHit, SearchProvider};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Search provider backed by a configurable HTTP endpoint.
pub struct HttpSearchClient {
    http_client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    max_results: usize,
}

impl HttpSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for HttpSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let endpoint = self.endpoint.as_ref().ok_or(SearchError::NotConfigured)?;

        debug!(%query, "Dispatching search query");

        let num = self.max_results.to_string();
        let mut request = self
            .http_client
            .get(endpoint)
            .query(&[("q", query), ("num", num.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Search endpoint returned an error");
            return Err(SearchError::RequestFailed(format!("{status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results)
    }
}
