//! Domain errors for the career advisory pipeline.

use thiserror::Error;

use crate::domain::models::store::OutputKey;
use crate::domain::ports::language_model::ModelError;
use crate::domain::ports::tool::ToolError;

/// Pipeline-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' requires input '{key}' which has not been produced")]
    MissingInput { stage: String, key: OutputKey },

    #[error("Output key '{0}' was written more than once in the same run")]
    DuplicateOutput(OutputKey),

    #[error("Invalid pipeline '{pipeline}': {reason}")]
    InvalidPipeline { pipeline: String, reason: String },

    #[error("Stage '{stage}' produced an empty output")]
    EmptyOutput { stage: String },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Wrap an error with the name of the stage it surfaced in.
    ///
    /// Already-wrapped errors are returned untouched so nested composites do
    /// not stack attributions.
    pub fn in_stage(self, stage: &str) -> Self {
        match self {
            err @ Self::StageFailed { .. } => err,
            other => Self::StageFailed {
                stage: stage.to_string(),
                source: Box::new(other),
            },
        }
    }
}
