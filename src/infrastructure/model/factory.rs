//! Model factory.
//!
//! Builds a ready-to-use [`LanguageModel`] handle from configuration. The
//! factory does not validate credentials: a missing API key surfaces as
//! [`ModelError::MissingApiKey`] at the first generation call, so a run that
//! cannot authenticate fails before any output key is written.

use std::sync::Arc;

use crate::domain::models::config::{ModelConfig, RateLimitConfig, RetryConfig};
use crate::domain::ports::language_model::{LanguageModel, ModelError};

use super::chat_client::{ChatClient, ChatClientConfig, DEFAULT_BASE_URL};

/// Build a shared model handle for the configured endpoint.
pub fn build_model(
    model: &ModelConfig,
    retry: &RetryConfig,
    rate_limit: &RateLimitConfig,
) -> Result<Arc<dyn LanguageModel>, ModelError> {
    let client = ChatClient::new(ChatClientConfig {
        api_key: model.api_key.clone(),
        model: model.model.clone(),
        base_url: model
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        rate_limit_rps: rate_limit.requests_per_second,
        max_retries: retry.max_retries,
        initial_backoff_ms: retry.initial_backoff_ms,
        max_backoff_ms: retry.max_backoff_ms,
        timeout_secs: model.timeout_secs,
    })?;

    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::Config;

    #[test]
    fn handle_reflects_configured_model() {
        let mut config = Config::default();
        config.model.api_key = "test-key".to_string();
        config.model.model = "gpt-4o-mini".to_string();
        config.model.base_url = Some("http://localhost:4000".to_string());

        let model = build_model(&config.model, &config.retry, &config.rate_limit).unwrap();
        assert_eq!(model.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn default_config_uses_documented_model_name() {
        let config = Config::default();
        let model = build_model(&config.model, &config.retry, &config.rate_limit).unwrap();
        assert_eq!(model.model_name(), "gemini-1.5-flash");
    }

    #[test]
    fn missing_key_does_not_fail_construction() {
        let config = Config::default();
        assert!(config.model.api_key.is_empty());
        assert!(build_model(&config.model, &config.retry, &config.rate_limit).is_ok());
    }
}
