//! Service layer: agents and pipeline composition.

pub mod career_pipeline;
pub mod llm_agent;
pub mod pipeline;
pub mod web_research;

pub use career_pipeline::CareerPipeline;
pub use llm_agent::{LlmAgent, LlmAgentBuilder};
pub use pipeline::{ParallelStage, SequentialPipeline};
pub use web_research::WebResearchAgent;
