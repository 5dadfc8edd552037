//! Language model backend: HTTP client, retry, rate limiting, and factory.

pub mod chat_client;
pub mod factory;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use chat_client::{ChatClient, ChatClientConfig, DEFAULT_BASE_URL};
pub use factory::build_model;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
