//! Language model port.
//!
//! Abstracts the text-generation backend so the pipeline can run against the
//! production HTTP client or a deterministic stub in tests. Implementations
//! must be `Send + Sync` for concurrent use across tokio tasks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One turn in a generation conversation.
#[derive(Debug, Clone)]
pub enum ChatTurn {
    /// Caller-provided content.
    User(String),

    /// Model output from a previous round, carried back for tool loops.
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },

    /// Result of executing a tool call the model requested.
    ToolResult { call_id: String, content: String },
}

/// A tool the model may call during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name (must be unique within a request)
    pub name: String,

    /// What the tool does, shown to the model
    pub description: String,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call identifier
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// JSON-encoded arguments, e.g. `{"query": "..."}`
    pub arguments: String,
}

/// Request to generate text.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// System prompt (the agent's instruction)
    pub system: Option<String>,

    /// Conversation turns, oldest first
    pub messages: Vec<ChatTurn>,

    /// Tools the model may call; empty disables tool use
    pub tools: Vec<ToolSpec>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// Token usage reported by the backend, when available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response from a generation call.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text, if any
    pub content: Option<String>,

    /// Tool calls the model wants executed before it can finish
    pub tool_calls: Vec<ToolCall>,

    /// Token accounting, if the backend reports it
    pub usage: Option<TokenUsage>,
}

impl GenerateResponse {
    /// Text content, defaulting to empty.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Errors from the model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response from model backend: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Whether retrying the request could succeed.
    ///
    /// Rate limits, timeouts, network failures, and 5xx responses are
    /// transient; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Timeout(_) | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::MissingApiKey | Self::Auth(_) | Self::InvalidResponse(_) => false,
        }
    }
}

/// Port trait for text-generation backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier of the configured model (e.g. "gemini-1.5-flash").
    fn model_name(&self) -> &str;

    /// Run one generation call.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ModelError>;
}
