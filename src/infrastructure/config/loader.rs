use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid max_certifications: {0}. Must be at least 1")]
    InvalidMaxCertifications(usize),

    #[error("Invalid max_tool_rounds: {0}. Must be at least 1")]
    InvalidMaxToolRounds(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. sherpa.yaml in the working directory
    /// 3. Environment variables (`SHERPA_*` prefix, `__` nesting)
    /// 4. Bare `API_KEY` / `MODEL_NAME` / `BASE_URL` variables, kept for
    ///    drop-in compatibility with existing deployments
    pub fn load() -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("sherpa.yaml"))
            .merge(Env::prefixed("SHERPA_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::apply_legacy_env(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Overlay the legacy flat environment variables.
    fn apply_legacy_env(config: &mut Config) {
        if let Ok(api_key) = std::env::var("API_KEY") {
            if !api_key.is_empty() {
                config.model.api_key = api_key;
            }
        }
        if let Ok(model) = std::env::var("MODEL_NAME") {
            if !model.is_empty() {
                config.model.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("BASE_URL") {
            if !base_url.is_empty() {
                config.model.base_url = Some(base_url);
            }
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&config.model.temperature) {
            return Err(ConfigError::InvalidTemperature(config.model.temperature));
        }

        if config.model.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(config.model.max_tokens));
        }

        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.pipeline.max_certifications == 0 {
            return Err(ConfigError::InvalidMaxCertifications(
                config.pipeline.max_certifications,
            ));
        }

        if config.pipeline.max_tool_rounds == 0 {
            return Err(ConfigError::InvalidMaxToolRounds(
                config.pipeline.max_tool_rounds,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn rejects_zero_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRetries(0))
        ));
    }

    #[test]
    fn rejects_inverted_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 60_000;
        config.retry.max_backoff_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(60_000, 1_000))
        ));
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn rejects_zero_certifications() {
        let mut config = Config::default();
        config.pipeline.max_certifications = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn load_from_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sherpa.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "model:\n  api_key: file-key\n  model: gemini-1.5-pro").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.model.api_key, "file-key");
        assert_eq!(config.model.model, "gemini-1.5-pro");
        // Untouched sections keep their defaults.
        assert_eq!(config.pipeline.max_tool_rounds, 3);
    }

    #[test]
    fn legacy_env_overrides_model_settings() {
        temp_env::with_vars(
            [
                ("API_KEY", Some("legacy-key")),
                ("MODEL_NAME", Some("gpt-4o-mini")),
                ("BASE_URL", Some("http://localhost:4000")),
            ],
            || {
                let mut config = Config::default();
                ConfigLoader::apply_legacy_env(&mut config);
                assert_eq!(config.model.api_key, "legacy-key");
                assert_eq!(config.model.model, "gpt-4o-mini");
                assert_eq!(config.model.base_url.as_deref(), Some("http://localhost:4000"));
            },
        );
    }
}
