//! Sequential and parallel stage composites.
//!
//! Composites satisfy [`Stage`] themselves so they can nest. Dependency
//! wiring is checked when a composite is built: a sequential pipeline
//! rejects a stage reading a key that a later stage produces, and a parallel
//! stage rejects any dependency between siblings. What a composite does not
//! produce internally becomes one of its own declared inputs, resolved by
//! the enclosing pipeline.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::store::{OutputKey, OutputStore};
use crate::domain::ports::stage::{Stage, StageWrites};

/// Ordered pipeline: stage N+1 starts only after stage N's writes commit.
pub struct SequentialPipeline {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    external_inputs: Vec<OutputKey>,
    outputs: Vec<OutputKey>,
}

impl SequentialPipeline {
    /// Build and validate a sequential pipeline.
    ///
    /// # Errors
    /// [`PipelineError::InvalidPipeline`] when a stage reads a key produced
    /// by a later stage, or when two stages claim the same output key.
    pub fn new(name: impl Into<String>, stages: Vec<Arc<dyn Stage>>) -> PipelineResult<Self> {
        let name = name.into();

        let mut all_outputs: BTreeSet<OutputKey> = BTreeSet::new();
        for stage in &stages {
            for key in stage.output_keys() {
                if !all_outputs.insert(key) {
                    return Err(PipelineError::InvalidPipeline {
                        pipeline: name,
                        reason: format!("output key '{key}' is produced by more than one stage"),
                    });
                }
            }
        }

        let mut produced: BTreeSet<OutputKey> = BTreeSet::new();
        let mut external_inputs = Vec::new();
        let mut outputs = Vec::new();
        for stage in &stages {
            for key in stage.input_keys() {
                if produced.contains(&key) {
                    continue;
                }
                if all_outputs.contains(&key) {
                    return Err(PipelineError::InvalidPipeline {
                        pipeline: name,
                        reason: format!(
                            "stage '{}' reads '{key}' before it is produced",
                            stage.name()
                        ),
                    });
                }
                if !external_inputs.contains(&key) {
                    external_inputs.push(key);
                }
            }
            for key in stage.output_keys() {
                produced.insert(key);
                outputs.push(key);
            }
        }

        Ok(Self {
            name,
            stages,
            external_inputs,
            outputs,
        })
    }

    /// Run the pipeline as the root entry point, starting from an empty
    /// store, and return the final store snapshot.
    pub async fn execute(&self, run_input: &str) -> PipelineResult<OutputStore> {
        let mut store = OutputStore::new();
        let writes = self.run(run_input, &store).await?;
        store.commit(writes)?;
        Ok(store)
    }
}

#[async_trait]
impl Stage for SequentialPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_keys(&self) -> Vec<OutputKey> {
        self.external_inputs.clone()
    }

    fn output_keys(&self) -> Vec<OutputKey> {
        self.outputs.clone()
    }

    async fn run(&self, run_input: &str, store: &OutputStore) -> PipelineResult<StageWrites> {
        // Children read both outer state and earlier siblings' writes, so
        // work on a private copy and report only the new writes.
        let mut working = store.clone();
        let mut writes: StageWrites = Vec::new();

        for stage in &self.stages {
            for key in stage.input_keys() {
                if !working.contains(key) {
                    return Err(PipelineError::MissingInput {
                        stage: stage.name().to_string(),
                        key,
                    });
                }
            }

            debug!(pipeline = %self.name, stage = %stage.name(), "Entering stage");
            let stage_writes = stage
                .run(run_input, &working)
                .await
                .map_err(|err| err.in_stage(stage.name()))?;

            for (key, value) in &stage_writes {
                working.insert(*key, value.clone())?;
            }
            writes.extend(stage_writes);
            debug!(pipeline = %self.name, stage = %stage.name(), "Stage committed");
        }

        Ok(writes)
    }
}

/// Concurrent fan-out over sibling stages, synchronized only at completion.
pub struct ParallelStage {
    name: String,
    children: Vec<Arc<dyn Stage>>,
}

impl ParallelStage {
    /// Build and validate a parallel stage.
    ///
    /// # Errors
    /// [`PipelineError::InvalidPipeline`] when a child reads a key a sibling
    /// produces (no ordering exists between siblings) or when two children
    /// claim the same output key.
    pub fn new(name: impl Into<String>, children: Vec<Arc<dyn Stage>>) -> PipelineResult<Self> {
        let name = name.into();

        let mut sibling_outputs: BTreeSet<OutputKey> = BTreeSet::new();
        for child in &children {
            for key in child.output_keys() {
                if !sibling_outputs.insert(key) {
                    return Err(PipelineError::InvalidPipeline {
                        pipeline: name,
                        reason: format!("output key '{key}' is produced by more than one sibling"),
                    });
                }
            }
        }

        for child in &children {
            for key in child.input_keys() {
                if sibling_outputs.contains(&key) && !child.output_keys().contains(&key) {
                    return Err(PipelineError::InvalidPipeline {
                        pipeline: name,
                        reason: format!(
                            "sibling '{}' reads '{key}' which another sibling produces; \
                             parallel siblings have no ordering",
                            child.name()
                        ),
                    });
                }
            }
        }

        Ok(Self { name, children })
    }
}

#[async_trait]
impl Stage for ParallelStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_keys(&self) -> Vec<OutputKey> {
        let mut keys = Vec::new();
        for child in &self.children {
            for key in child.input_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    fn output_keys(&self) -> Vec<OutputKey> {
        self.children
            .iter()
            .flat_map(|child| child.output_keys())
            .collect()
    }

    async fn run(&self, run_input: &str, store: &OutputStore) -> PipelineResult<StageWrites> {
        info!(stage = %self.name, children = self.children.len(), "Fanning out");

        // Every child sees the same immutable snapshot; sibling writes are
        // invisible until the fan-in commit.
        let results = join_all(self.children.iter().map(|child| async move {
            child
                .run(run_input, store)
                .await
                .map_err(|err| err.in_stage(child.name()))
        }))
        .await;

        // All children have completed. Fail with the first error, forwarding
        // nothing partial.
        let mut writes: StageWrites = Vec::new();
        for result in results {
            writes.extend(result?);
        }

        info!(stage = %self.name, "Fan-in complete");
        Ok(writes)
    }
}
