//! Implementation of the `sherpa config` command.

use anyhow::Result;
use clap::Args;

use crate::cli::{output, CommandOutput};
use crate::domain::models::config::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Load from a specific file instead of the default hierarchy
    #[arg(long)]
    pub file: Option<std::path::PathBuf>,
}

#[derive(Debug, serde::Serialize)]
struct ConfigOutput {
    config: Config,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|_| "Failed to render configuration".to_string())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

pub async fn execute(args: ConfigArgs, json_mode: bool) -> Result<()> {
    let mut config = match &args.file {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    // Never print credentials.
    config.model.api_key = redact(&config.model.api_key);
    config.search.api_key = config.search.api_key.take().map(|key| redact(&key));

    output(&ConfigOutput { config }, json_mode);
    Ok(())
}

fn redact(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else if key.chars().count() > 8 {
        // Char-based prefix: byte slicing would panic on a multibyte key.
        let prefix: String = key.chars().take(4).collect();
        format!("{prefix}...[REDACTED]")
    } else {
        "[REDACTED]".to_string()
    }
}
