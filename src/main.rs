//! Sherpa CLI entry point.

use clap::Parser;

use sherpa::cli::{Cli, Commands};
use sherpa::infrastructure::config::ConfigLoader;
use sherpa::infrastructure::logging::init_tracing;

#[tokio::main]
async fn main() {
    // Best-effort config load for the logging setup; a broken config falls
    // back to default logging and the command reports the real error.
    let logging = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Advise(args) => sherpa::cli::commands::advise::execute(args, cli.json).await,
        Commands::Config(args) => sherpa::cli::commands::config::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        sherpa::cli::handle_error(err, cli.json);
    }
}
