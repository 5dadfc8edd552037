//! Tracing subscriber setup driven by [`LoggingConfig`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::models::config::LoggingConfig;

/// Resolve the log filter: an explicit `RUST_LOG` wins, otherwise the
/// configured level applies.
fn resolve_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean.
pub fn init_tracing(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(resolve_filter(&config.level));

    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_applies_without_rust_log() {
        temp_env::with_var("RUST_LOG", None::<&str>, || {
            assert_eq!(resolve_filter("debug").to_string(), "debug");
        });
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            assert_eq!(resolve_filter("debug").to_string(), "warn");
        });
    }
}
