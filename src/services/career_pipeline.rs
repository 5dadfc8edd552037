//! The fixed career advisory pipeline.
//!
//! CV analyzer → (career advisor ∥ certification advisor) → summary. Both
//! advisors share one web research tool. The certification advisor reads
//! only `cv_analysis`; reading its sibling's `career_advice` would be a race
//! under parallel execution and is rejected by stage validation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::config::Config;
use crate::domain::models::outcome::RunOutcome;
use crate::domain::models::store::OutputKey;
use crate::domain::ports::language_model::LanguageModel;
use crate::domain::ports::tool::Tool;
use crate::infrastructure::model::build_model;
use crate::infrastructure::search::HttpSearchClient;
use crate::services::llm_agent::LlmAgent;
use crate::services::pipeline::{ParallelStage, SequentialPipeline};
use crate::services::web_research::WebResearchAgent;

const CV_ANALYZER_INSTRUCTION: &str = "You are a CV analyst. Review the CV text provided and \
     extract everything relevant about the candidate: skills, professional experience, \
     education, and qualifications. Present the analysis as concise prose organized by topic.";

const CAREER_ADVISOR_INSTRUCTION: &str = "You are a career advisor. Based on the CV analysis \
     provided, give concise and practical advice on career paths, job opportunities, and skills \
     worth developing. Use the web_research tool when current job-market information would \
     improve the advice.";

const SUMMARY_INSTRUCTION: &str = "You produce the final summary. Combine the key points of \
     the career advice and the certification suggestions into one clear, actionable digest the \
     candidate can follow.";

fn certification_advisor_instruction(max_certifications: usize) -> String {
    format!(
        "You are a certification advisor. Based on the CV analysis provided, recommend \
         certifications that would strengthen the candidate's career prospects. List no more \
         than {max_certifications} certifications as a numbered list, each with a brief \
         explanation of why it is relevant and an estimate of the time it takes to complete. \
         Use the web_research tool when you need current information about certification \
         programs."
    )
}

/// Root controller: the single externally invoked entry point.
pub struct CareerPipeline {
    pipeline: SequentialPipeline,
}

impl CareerPipeline {
    /// Wire the fixed pipeline over a model handle and a research tool.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        research: Arc<dyn Tool>,
        config: &Config,
    ) -> PipelineResult<Self> {
        let cv_analyzer = LlmAgent::builder("cv_analyzer_agent")
            .description("Analyzes a CV and extracts skills, experience, and qualifications")
            .instruction(CV_ANALYZER_INSTRUCTION)
            .model(Arc::clone(&model))
            .include_run_input()
            .output_key(OutputKey::CvAnalysis)
            .max_tokens(config.model.max_tokens)
            .temperature(config.model.temperature)
            .build()?;

        let career_advisor = LlmAgent::builder("career_advisor_agent")
            .description("Provides career advice from the CV analysis and web research")
            .instruction(CAREER_ADVISOR_INSTRUCTION)
            .model(Arc::clone(&model))
            .reads(OutputKey::CvAnalysis)
            .output_key(OutputKey::CareerAdvice)
            .tool(Arc::clone(&research))
            .max_tool_rounds(config.pipeline.max_tool_rounds)
            .max_tokens(config.model.max_tokens)
            .temperature(config.model.temperature)
            .build()?;

        let certification_advisor = LlmAgent::builder("certification_advisor_agent")
            .description("Suggests certifications from the CV analysis and web research")
            .instruction(certification_advisor_instruction(
                config.pipeline.max_certifications,
            ))
            .model(Arc::clone(&model))
            .reads(OutputKey::CvAnalysis)
            .output_key(OutputKey::CertificationSuggestions)
            .tool(Arc::clone(&research))
            .max_tool_rounds(config.pipeline.max_tool_rounds)
            .max_items(config.pipeline.max_certifications)
            .max_tokens(config.model.max_tokens)
            .temperature(config.model.temperature)
            .build()?;

        let parallel_advisors = ParallelStage::new(
            "parallel_advisor_stage",
            vec![Arc::new(career_advisor), Arc::new(certification_advisor)],
        )?;

        let summary = LlmAgent::builder("summary_agent")
            .description("Summarizes the career advice and certification suggestions")
            .instruction(SUMMARY_INSTRUCTION)
            .model(model)
            .reads(OutputKey::CareerAdvice)
            .reads(OutputKey::CertificationSuggestions)
            .output_key(OutputKey::FinalSummary)
            .max_tokens(config.model.max_tokens)
            .temperature(config.model.temperature)
            .build()?;

        let pipeline = SequentialPipeline::new(
            "career_pipeline",
            vec![
                Arc::new(cv_analyzer),
                Arc::new(parallel_advisors),
                Arc::new(summary),
            ],
        )?;

        Ok(Self { pipeline })
    }

    /// Build the pipeline from configuration: production model client plus
    /// HTTP-backed web research.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = build_model(&config.model, &config.retry, &config.rate_limit)?;
        let search = Arc::new(HttpSearchClient::new(&config.search)?);
        let research: Arc<dyn Tool> =
            Arc::new(WebResearchAgent::new(Arc::clone(&model), search));

        Ok(Self::new(model, research, config)?)
    }

    /// Run the pipeline over a CV and return the run outcome.
    #[instrument(skip(self, cv_text), fields(cv_len = cv_text.len()))]
    pub async fn run(&self, cv_text: &str) -> PipelineResult<RunOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(%run_id, "Starting career pipeline run");

        let outputs = self.pipeline.execute(cv_text).await?;

        let final_summary = outputs
            .get(OutputKey::FinalSummary)
            .ok_or(PipelineError::MissingInput {
                stage: "career_pipeline".to_string(),
                key: OutputKey::FinalSummary,
            })?
            .to_string();

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(%run_id, elapsed_ms, outputs = outputs.len(), "Run complete");

        Ok(RunOutcome {
            run_id,
            started_at,
            elapsed_ms,
            final_summary,
            outputs,
        })
    }
}
