//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// Career advisory agent pipeline
#[derive(Parser, Debug)]
#[command(name = "sherpa", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the career advisory pipeline over a CV
    Advise(commands::advise::AdviseArgs),

    /// Print the resolved configuration
    Config(commands::config::ConfigArgs),
}

/// Rendering contract for command results.
pub trait CommandOutput {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

/// Print a command result in the selected format.
pub fn output(result: &impl CommandOutput, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Report a fatal error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) {
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
