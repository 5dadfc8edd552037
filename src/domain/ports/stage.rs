//! Pipeline stage port.
//!
//! Both leaf agents and composites (sequential, parallel) satisfy this
//! interface, so composites can nest. A stage never mutates the store
//! directly: it runs against an immutable view and returns the writes it
//! wants committed. The orchestrator commits them after the stage completes,
//! which gives key publication a happens-before edge over every downstream
//! read and makes cross-sibling reads inside a parallel stage impossible by
//! construction.

use async_trait::async_trait;

use crate::domain::errors::PipelineResult;
use crate::domain::models::store::{OutputKey, OutputStore};

/// Writes a stage wants committed at its completion.
pub type StageWrites = Vec<(OutputKey, String)>;

/// A unit of pipeline execution.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, unique within a pipeline.
    fn name(&self) -> &str;

    /// Keys this stage reads. Must all be committed before the stage starts.
    fn input_keys(&self) -> Vec<OutputKey>;

    /// Keys this stage produces.
    fn output_keys(&self) -> Vec<OutputKey>;

    /// Execute against the run input and an immutable view of the store.
    async fn run(&self, run_input: &str, store: &OutputStore) -> PipelineResult<StageWrites>;
}
