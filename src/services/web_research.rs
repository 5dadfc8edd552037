//! Web research agent.
//!
//! A single-purpose agent that searches the web for a query and summarizes
//! the hits with the model. It implements [`Tool`] directly, so advisor
//! agents can call it mid-generation; one instance is shared by all callers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::ports::language_model::{ChatTurn, GenerateRequest, LanguageModel};
use crate::domain::ports::search::{SearchError, SearchHit, SearchProvider};
use crate::domain::ports::tool::{Tool, ToolError};

const INSTRUCTION: &str = "You are a web research assistant. Answer the query using only the \
     search results provided. Summarize your findings clearly and concisely, and say so when \
     the results do not cover the query.";

const MAX_TOKENS: u32 = 1024;

/// Search-then-summarize agent, callable as a tool.
pub struct WebResearchAgent {
    name: String,
    description: String,
    model: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchProvider>,
}

impl WebResearchAgent {
    pub fn new(model: Arc<dyn LanguageModel>, search: Arc<dyn SearchProvider>) -> Self {
        Self {
            name: "web_research".to_string(),
            description: "Searches the web for current information and returns a concise \
                          summary of the findings."
                .to_string(),
            model,
            search,
        }
    }

    /// Search for `query` and summarize the hits.
    #[instrument(skip(self), fields(agent = %self.name))]
    pub async fn research(&self, query: &str) -> Result<String, ToolError> {
        let hits = self.search.search(query).await.map_err(|err| match err {
            SearchError::NotConfigured => {
                ToolError::NotConfigured("no search endpoint configured".to_string())
            }
            other => ToolError::Failed(other.to_string()),
        })?;

        if hits.is_empty() {
            debug!(%query, "Search returned no hits");
            return Ok(format!("No relevant web results were found for: {query}"));
        }

        let response = self
            .model
            .generate(GenerateRequest {
                system: Some(INSTRUCTION.to_string()),
                messages: vec![ChatTurn::User(render_prompt(query, &hits))],
                tools: Vec::new(),
                max_tokens: MAX_TOKENS,
                temperature: None,
            })
            .await
            .map_err(|err| ToolError::Failed(err.to_string()))?;

        Ok(response.text().to_string())
    }
}

fn render_prompt(query: &str, hits: &[SearchHit]) -> String {
    let rendered: Vec<String> = hits
        .iter()
        .map(|hit| format!("- {} ({})\n  {}", hit.title, hit.url, hit.snippet))
        .collect();
    format!("Query: {query}\n\nSearch results:\n{}", rendered.join("\n"))
}

#[async_trait]
impl Tool for WebResearchAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        self.research(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_all_hits() {
        let hits = vec![
            SearchHit {
                title: "CKA overview".to_string(),
                url: "https://example.com/cka".to_string(),
                snippet: "Kubernetes admin cert".to_string(),
            },
            SearchHit {
                title: "AWS SAA".to_string(),
                url: "https://example.com/saa".to_string(),
                snippet: "Cloud architecture cert".to_string(),
            },
        ];

        let prompt = render_prompt("devops certifications", &hits);
        assert!(prompt.contains("Query: devops certifications"));
        assert!(prompt.contains("CKA overview"));
        assert!(prompt.contains("https://example.com/saa"));
    }
}
