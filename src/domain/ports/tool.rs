//! Tool capability port.
//!
//! Anything exposing `invoke(query) -> text` can be handed to an agent as a
//! callable tool. The web research agent implements this directly, so an
//! agent's output can back another agent's capability without special casing.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool is not configured: {0}")]
    NotConfigured(String),

    #[error("Tool invocation failed: {0}")]
    Failed(String),

    #[error("Tool invocation timed out")]
    Timeout,
}

/// A capability callable by an agent mid-generation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model when deciding whether
    /// to call the tool.
    fn description(&self) -> &str;

    /// Execute the tool for a free-text query.
    async fn invoke(&self, query: &str) -> Result<String, ToolError>;
}
