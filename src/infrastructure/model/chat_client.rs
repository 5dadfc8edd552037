//! HTTP client for OpenAI-compatible chat-completions endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::ports::language_model::{
    GenerateRequest, GenerateResponse, LanguageModel, ModelError, TokenUsage, ToolCall,
};

use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::types::{ChatRequest, ChatResponse, WireMessage, WireTool};

/// Default endpoint: Gemini's OpenAI-compatible surface, matching the
/// default `gemini-1.5-flash` model.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Configuration for the chat client
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// API key. May be empty; checked at the first request.
    pub api_key: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Base URL of the chat-completions endpoint
    pub base_url: String,

    /// Rate limit in requests per second
    pub rate_limit_rps: f64,

    /// Maximum retry attempts
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_backoff_ms: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_rps: 5.0,
            max_retries: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            timeout_secs: 120,
        }
    }
}

/// HTTP client for chat-completions endpoints
///
/// Provides robust HTTP communication with:
/// - Connection pooling and reuse
/// - Rate limiting via token bucket algorithm
/// - Exponential backoff retry for transient errors
/// - Error classification (transient vs permanent)
pub struct ChatClient {
    http_client: ReqwestClient,
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
    rate_limiter: TokenBucketRateLimiter,
    retry_policy: RetryPolicy,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: ChatClientConfig) -> Result<Self, ModelError> {
        let api_key_scrubbed = scrub_key(&config.api_key);

        info!(
            base_url = %config.base_url,
            model = %config.model,
            rate_limit_rps = config.rate_limit_rps,
            timeout_secs = config.timeout_secs,
            api_key = %api_key_scrubbed,
            "Initializing chat client"
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key,
            model: config.model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            rate_limiter: TokenBucketRateLimiter::new(config.rate_limit_rps),
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
        })
    }

    /// Base URL this client posts to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured API key. Exposed for factory-level assertions.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    async fn execute_chat_request(&self, request: &ChatRequest) -> Result<ChatResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, "POST chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout_secs)
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> Result<ChatResponse, ModelError> {
        let status = response.status();
        debug!(%status, "Response status");

        if !status.is_success() {
            return Err(Self::classify_error(status, response).await);
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }

    async fn classify_error(status: StatusCode, response: Response) -> ModelError {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        warn!(%status, body = %body, "API error");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => ModelError::RateLimited,
            status => ModelError::Api {
                status: status.as_u16(),
                body,
            },
        }
    }

    fn to_wire_request(&self, request: &GenerateRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(WireMessage::system(system));
        }
        messages.extend(request.messages.iter().map(WireMessage::from_turn));

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.iter().map(WireTool::from_spec).collect(),
        }
    }

    fn from_wire_response(response: ChatResponse) -> Result<GenerateResponse, ModelError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response had no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(GenerateResponse {
            content: choice.message.content,
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

/// Keep a short prefix of the key for log correlation, counting chars so a
/// multibyte key cannot be split mid-character.
fn scrub_key(key: &str) -> String {
    if key.chars().count() > 8 {
        let prefix: String = key.chars().take(8).collect();
        format!("{prefix}...[REDACTED]")
    } else {
        "[REDACTED]".to_string()
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ModelError> {
        // Credential absence is a first-use error, not a construction error.
        if self.api_key.is_empty() {
            return Err(ModelError::MissingApiKey);
        }

        self.rate_limiter.acquire().await;

        let wire_request = self.to_wire_request(&request);
        let result = self
            .retry_policy
            .execute(|| self.execute_chat_request(&wire_request))
            .await;

        match result {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    info!(
                        input_tokens = usage.prompt_tokens,
                        output_tokens = usage.completion_tokens,
                        "Chat completion succeeded"
                    );
                }
                Self::from_wire_response(response)
            }
            Err(err) => {
                error!(error = %err, "Chat completion failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_with_defaults() {
        let client = ChatClient::new(ChatClientConfig::default()).unwrap();
        assert_eq!(client.model_name(), "gemini-1.5-flash");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert!(client.api_key().is_empty());
    }

    #[test]
    fn client_reflects_custom_config() {
        let client = ChatClient::new(ChatClientConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "http://localhost:4000".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.api_key(), "sk-test");
        assert_eq!(client.model_name(), "gpt-4o-mini");
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = ChatClient::new(ChatClientConfig {
            base_url: "http://localhost:4000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn key_scrubbing_respects_char_boundaries() {
        assert_eq!(scrub_key(""), "[REDACTED]");
        assert_eq!(scrub_key("shortkey"), "[REDACTED]");
        assert_eq!(scrub_key("sk-test-1234567890"), "sk-test-...[REDACTED]");
        assert_eq!(scrub_key("ключ-секретный-токен"), "ключ-сек...[REDACTED]");
    }

    #[tokio::test]
    async fn missing_api_key_fails_at_first_generate() {
        let client = ChatClient::new(ChatClientConfig::default()).unwrap();
        let request = GenerateRequest {
            system: None,
            messages: vec![crate::domain::ports::ChatTurn::User("hi".to_string())],
            tools: Vec::new(),
            max_tokens: 16,
            temperature: None,
        };

        let err = client.generate(request).await.unwrap_err();
        assert!(matches!(err, ModelError::MissingApiKey));
    }
}
