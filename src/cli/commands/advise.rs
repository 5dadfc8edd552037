//! Implementation of the `sherpa advise` command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::{output, CommandOutput};
use crate::domain::models::outcome::RunOutcome;
use crate::infrastructure::config::ConfigLoader;
use crate::services::CareerPipeline;

#[derive(Args, Debug)]
pub struct AdviseArgs {
    /// Path to the CV text file, or `-` to read from stdin
    #[arg(long, short)]
    pub cv: PathBuf,

    /// Print intermediate outputs alongside the final summary
    #[arg(long)]
    pub full: bool,
}

#[derive(Debug, serde::Serialize)]
struct AdviseOutput {
    outcome: RunOutcome,
    full: bool,
}

impl CommandOutput for AdviseOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.full {
            for (key, value) in self.outcome.outputs.iter() {
                lines.push(format!("=== {key} ===\n{value}\n"));
            }
        } else {
            lines.push(self.outcome.final_summary.clone());
        }
        lines.push(format!(
            "\n(run {} completed in {} ms)",
            self.outcome.run_id, self.outcome.elapsed_ms
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.outcome).unwrap_or_default()
    }
}

pub async fn execute(args: AdviseArgs, json_mode: bool) -> Result<()> {
    let cv_text = read_cv(&args.cv)?;
    anyhow::ensure!(!cv_text.trim().is_empty(), "CV input is empty");

    let config = ConfigLoader::load()?;
    let pipeline = CareerPipeline::from_config(&config)?;
    let outcome = pipeline.run(&cv_text).await?;

    output(
        &AdviseOutput {
            outcome,
            full: args.full,
        },
        json_mode,
    );
    Ok(())
}

fn read_cv(path: &PathBuf) -> Result<String> {
    if path.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read CV from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CV from {}", path.display()))
    }
}
