//! Common test fixtures for integration tests.
//!
//! Provides a deterministic scripted model and stub search providers so the
//! end-to-end scenarios run without network access.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sherpa::domain::ports::language_model::{
    ChatTurn, GenerateRequest, GenerateResponse, LanguageModel, ModelError, ToolCall,
};
use sherpa::domain::ports::search::{SearchError, SearchHit, SearchProvider};
use sherpa::domain::ports::tool::{Tool, ToolError};

/// Deterministic model stub.
///
/// Dispatches on the agent instruction in the system prompt and produces
/// output derived only from the request, so identical runs yield identical
/// text. Records the order in which agents invoke it.
pub struct ScriptedModel {
    /// Agent labels in invocation order.
    pub log: Arc<Mutex<Vec<String>>>,

    /// Whether the career advisor should request a web_research call first.
    pub advisor_uses_tool: bool,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
            advisor_uses_tool: false,
        })
    }

    pub fn with_tool_use() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
            advisor_uses_tool: true,
        })
    }

    pub fn invocations(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn user_content(request: &GenerateRequest) -> String {
    request
        .messages
        .iter()
        .find_map(|turn| match turn {
            ChatTurn::User(content) => Some(content.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn tool_results(request: &GenerateRequest) -> Vec<String> {
    request
        .messages
        .iter()
        .filter_map(|turn| match turn {
            ChatTurn::ToolResult { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted-stub"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ModelError> {
        let system = request.system.clone().unwrap_or_default();
        let prompt = user_content(&request);

        let (label, response) = if system.contains("CV analyst") {
            (
                "cv_analyzer",
                text(format!("Skills and experience extracted from: {prompt}")),
            )
        } else if system.contains("career advisor") {
            let results = tool_results(&request);
            if self.advisor_uses_tool && !request.tools.is_empty() && results.is_empty() {
                (
                    "career_advisor_tool_call",
                    GenerateResponse {
                        content: None,
                        tool_calls: vec![ToolCall {
                            id: "call_1".to_string(),
                            name: "web_research".to_string(),
                            arguments: r#"{"query": "current job market"}"#.to_string(),
                        }],
                        usage: None,
                    },
                )
            } else {
                let research = results.first().cloned().unwrap_or_else(|| "none".to_string());
                (
                    "career_advisor",
                    text(format!("Career advice derived from [{prompt}] research [{research}]")),
                )
            }
        } else if system.contains("certification advisor") {
            // Deliberately over-produce so the output cap is exercised. Keep
            // each item on one line so line-based truncation stays visible.
            let context = prompt.replace('\n', " ");
            let items: Vec<String> = (1..=7)
                .map(|i| format!("{i}. Certification {i} - relevant because of [{context}], ~{i} months"))
                .collect();
            ("certification_advisor", text(items.join("\n")))
        } else if system.contains("final summary") {
            ("summary", text(format!("Actionable summary of: {prompt}")))
        } else if system.contains("web research assistant") {
            ("web_research", text(format!("Research findings for: {prompt}")))
        } else {
            ("unknown", text(format!("echo: {prompt}")))
        };

        self.log.lock().unwrap().push(label.to_string());
        Ok(response)
    }
}

fn text(content: String) -> GenerateResponse {
    GenerateResponse {
        content: Some(content),
        tool_calls: Vec::new(),
        usage: None,
    }
}

/// Search provider returning fixed hits.
pub struct StaticSearch;

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        Ok(vec![SearchHit {
            title: format!("Result for {query}"),
            url: "https://example.com".to_string(),
            snippet: "snippet".to_string(),
        }])
    }
}

/// Search provider that fails every call.
pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::RequestFailed("simulated outage".to_string()))
    }
}

/// Tool that fails every invocation, for degradation tests that bypass the
/// web research agent entirely.
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "web_research"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn invoke(&self, _query: &str) -> Result<String, ToolError> {
        Err(ToolError::Failed("simulated outage".to_string()))
    }
}
