//! Sherpa - Career Advisory Agent Pipeline
//!
//! Sherpa runs a fixed pipeline of LLM agents that turn a CV into actionable
//! career advice: a CV analyzer, a parallel stage of career and
//! certification advisors (each able to delegate to a shared web research
//! tool), and a summarizer that merges the results.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Service Layer** (`services`): agents and pipeline composition
//! - **Infrastructure Layer** (`infrastructure`): model client, search
//!   client, configuration
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use sherpa::infrastructure::config::ConfigLoader;
//! use sherpa::services::CareerPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pipeline = CareerPipeline::from_config(&config)?;
//!     let outcome = pipeline.run("5 years Python backend development").await?;
//!     println!("{}", outcome.final_summary);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{PipelineError, PipelineResult};
pub use domain::models::{Config, OutputKey, OutputStore, RunOutcome};
pub use domain::ports::{LanguageModel, SearchProvider, Stage, Tool};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CareerPipeline, ParallelStage, SequentialPipeline, WebResearchAgent};
