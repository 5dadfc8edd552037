//! Port traits decoupling the pipeline from external backends.

pub mod language_model;
pub mod search;
pub mod stage;
pub mod tool;

pub use language_model::{
    ChatTurn, GenerateRequest, GenerateResponse, LanguageModel, ModelError, TokenUsage, ToolCall,
    ToolSpec,
};
pub use search::{SearchError, SearchHit, SearchProvider};
pub use stage::{Stage, StageWrites};
pub use tool::{Tool, ToolError};
