//! LLM-backed pipeline agent.
//!
//! An [`LlmAgent`] owns an instruction, a model handle, declared input keys,
//! one output key, and an optional set of callable tools. Running it renders
//! its inputs into a prompt, drives a bounded tool-calling loop, and returns
//! the generated text as a single store write.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::store::{OutputKey, OutputStore};
use crate::domain::ports::language_model::{
    ChatTurn, GenerateRequest, LanguageModel, ToolCall, ToolSpec,
};
use crate::domain::ports::stage::{Stage, StageWrites};
use crate::domain::ports::tool::Tool;

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_MAX_TOOL_ROUNDS: u32 = 3;

/// A single LLM agent, immutable once built.
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    model: Arc<dyn LanguageModel>,
    input_keys: Vec<OutputKey>,
    output_key: OutputKey,
    include_run_input: bool,
    tools: Vec<Arc<dyn Tool>>,
    max_tool_rounds: u32,
    max_tokens: u32,
    temperature: Option<f32>,
    max_items: Option<usize>,
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("instruction", &self.instruction)
            .field("model", &self.model.model_name())
            .field("input_keys", &self.input_keys)
            .field("output_key", &self.output_key)
            .field("include_run_input", &self.include_run_input)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_items", &self.max_items)
            .finish()
    }
}

/// Builder for [`LlmAgent`].
pub struct LlmAgentBuilder {
    name: String,
    description: String,
    instruction: String,
    model: Option<Arc<dyn LanguageModel>>,
    input_keys: Vec<OutputKey>,
    output_key: Option<OutputKey>,
    include_run_input: bool,
    tools: Vec<Arc<dyn Tool>>,
    max_tool_rounds: u32,
    max_tokens: u32,
    temperature: Option<f32>,
    max_items: Option<usize>,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: None,
            input_keys: Vec::new(),
            output_key: None,
            include_run_input: false,
            tools: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            max_items: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Declare a store key this agent reads.
    pub fn reads(mut self, key: OutputKey) -> Self {
        self.input_keys.push(key);
        self
    }

    /// Declare the store key this agent publishes.
    pub fn output_key(mut self, key: OutputKey) -> Self {
        self.output_key = Some(key);
        self
    }

    /// Include the raw run input (the CV text) in the prompt.
    pub fn include_run_input(mut self) -> Self {
        self.include_run_input = true;
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap numbered list items in the output (used for certifications).
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn build(self) -> PipelineResult<LlmAgent> {
        let invalid = |reason: &str| PipelineError::InvalidPipeline {
            pipeline: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("agent name cannot be empty"));
        }
        if self.instruction.trim().is_empty() {
            return Err(invalid("agent instruction cannot be empty"));
        }
        let model = self.model.clone().ok_or_else(|| invalid("agent has no model"))?;
        let output_key = self.output_key.ok_or_else(|| invalid("agent has no output key"))?;

        Ok(LlmAgent {
            name: self.name,
            description: self.description,
            instruction: self.instruction,
            model,
            input_keys: self.input_keys,
            output_key,
            include_run_input: self.include_run_input,
            tools: self.tools,
            max_tool_rounds: self.max_tool_rounds,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_items: self.max_items,
        })
    }
}

impl LlmAgent {
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Render the run input and declared store inputs into the user prompt.
    fn render_prompt(&self, run_input: &str, store: &OutputStore) -> PipelineResult<String> {
        let mut sections = Vec::new();

        if self.include_run_input {
            sections.push(format!("## CV\n\n{run_input}"));
        }

        for key in &self.input_keys {
            let value = store.get(*key).ok_or_else(|| PipelineError::MissingInput {
                stage: self.name.clone(),
                key: *key,
            })?;
            sections.push(format!("## {key}\n\n{value}"));
        }

        Ok(sections.join("\n\n"))
    }

    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect()
    }

    /// Execute one requested tool call, degrading gracefully on failure so a
    /// broken search backend never kills the run.
    async fn run_tool_call(&self, call: &ToolCall) -> String {
        let query = parse_query_argument(&call.arguments);

        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!(agent = %self.name, tool = %call.name, "Model requested an unknown tool");
            return format!("Tool '{}' is not available.", call.name);
        };

        debug!(agent = %self.name, tool = %call.name, query = %query, "Invoking tool");
        match tool.invoke(&query).await {
            Ok(result) => result,
            Err(err) => {
                warn!(agent = %self.name, tool = %call.name, error = %err, "Tool call failed");
                format!(
                    "Tool '{}' is currently unavailable ({err}). Continue without it.",
                    call.name
                )
            }
        }
    }

    /// Drive the generation loop until the model stops requesting tools or
    /// the round budget is spent (the final round withholds tools to force
    /// an answer).
    async fn generate(&self, user_prompt: String) -> PipelineResult<String> {
        let mut messages = vec![ChatTurn::User(user_prompt)];

        for round in 0..=self.max_tool_rounds {
            let tools = if round < self.max_tool_rounds {
                self.tool_specs()
            } else {
                Vec::new()
            };

            let response = self
                .model
                .generate(GenerateRequest {
                    system: Some(self.instruction.clone()),
                    messages: messages.clone(),
                    tools,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                })
                .await?;

            // Accept whatever text came back once the round budget is spent,
            // even if a misbehaving backend still asks for tools.
            if response.tool_calls.is_empty() || round == self.max_tool_rounds {
                return Ok(response.text().to_string());
            }

            messages.push(ChatTurn::Assistant {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
            });
            for call in &response.tool_calls {
                let result = self.run_tool_call(call).await;
                messages.push(ChatTurn::ToolResult {
                    call_id: call.id.clone(),
                    content: result,
                });
            }
        }

        unreachable!("loop returns on or before the final round")
    }
}

#[async_trait]
impl Stage for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_keys(&self) -> Vec<OutputKey> {
        self.input_keys.clone()
    }

    fn output_keys(&self) -> Vec<OutputKey> {
        vec![self.output_key]
    }

    async fn run(&self, run_input: &str, store: &OutputStore) -> PipelineResult<StageWrites> {
        info!(agent = %self.name, output_key = %self.output_key, "Running agent");

        let prompt = self.render_prompt(run_input, store)?;
        let mut text = self.generate(prompt).await?;

        if text.trim().is_empty() {
            return Err(PipelineError::EmptyOutput {
                stage: self.name.clone(),
            });
        }

        if let Some(max_items) = self.max_items {
            text = cap_numbered_list(&text, max_items);
        }

        Ok(vec![(self.output_key, text)])
    }
}

/// Pull the `query` field out of a tool call's JSON arguments, falling back
/// to the raw argument string when the model sent something unexpected.
fn parse_query_argument(arguments: &str) -> String {
    serde_json::from_str::<serde_json::Value>(arguments)
        .ok()
        .and_then(|value| value.get("query").and_then(|q| q.as_str()).map(String::from))
        .unwrap_or_else(|| arguments.to_string())
}

/// Truncate a numbered list to at most `max_items` items.
///
/// Lines starting with `N.` or `N)` open an item; everything after the line
/// that opens item `max_items + 1` is dropped. Text without numbered items
/// passes through untouched.
fn cap_numbered_list(text: &str, max_items: usize) -> String {
    let mut items_seen = 0usize;
    let mut kept = Vec::new();

    for line in text.lines() {
        if starts_numbered_item(line) {
            items_seen += 1;
            if items_seen > max_items {
                break;
            }
        }
        kept.push(line);
    }

    if items_seen > max_items {
        kept.join("\n")
    } else {
        text.to_string()
    }
}

fn starts_numbered_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return false;
    }
    matches!(
        trimmed[digits.len()..].chars().next(),
        Some('.' | ')')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_from_json_arguments() {
        assert_eq!(
            parse_query_argument(r#"{"query": "rust certifications"}"#),
            "rust certifications"
        );
    }

    #[test]
    fn parse_query_falls_back_to_raw() {
        assert_eq!(parse_query_argument("not json"), "not json");
    }

    #[test]
    fn cap_list_truncates_extra_items() {
        let text = "Intro line\n1. First\nmore detail\n2. Second\n3. Third\n4. Fourth";
        let capped = cap_numbered_list(text, 2);
        assert!(capped.contains("2. Second"));
        assert!(!capped.contains("3. Third"));
        assert!(capped.contains("Intro line"));
    }

    #[test]
    fn cap_list_leaves_short_lists_alone() {
        let text = "1. Only\n2. Two items";
        assert_eq!(cap_numbered_list(text, 5), text);
    }

    #[test]
    fn cap_list_ignores_plain_prose() {
        let text = "No numbered items here.\nJust prose.";
        assert_eq!(cap_numbered_list(text, 1), text);
    }

    #[test]
    fn numbered_item_detection() {
        assert!(starts_numbered_item("1. AWS Solutions Architect"));
        assert!(starts_numbered_item("  12) Kubernetes CKA"));
        assert!(!starts_numbered_item("version 1.5 is out"));
        assert!(!starts_numbered_item("- bullet"));
    }

    #[test]
    fn builder_requires_model_and_output_key() {
        let err = LlmAgent::builder("test_agent")
            .instruction("do the thing")
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPipeline { .. }));
    }
}
