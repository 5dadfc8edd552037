//! Domain models: configuration, the shared output store, and run results.

pub mod config;
pub mod outcome;
pub mod store;

pub use config::{
    Config, LoggingConfig, ModelConfig, PipelineConfig, RateLimitConfig, RetryConfig, SearchConfig,
};
pub use outcome::RunOutcome;
pub use store::{OutputKey, OutputStore};
