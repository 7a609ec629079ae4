use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over everything; otherwise `-v`, `-vv` and `-vvv` select
/// info, debug and trace, and without them the configured level applies.
///
/// # Errors
/// Fails on an invalid filter directive or when a subscriber is already set.
pub fn init(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive(&config.level, verbose))
            .with_context(|| format!("invalid log level '{}'", config.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    }
    .context("installing the tracing subscriber")
}

fn directive(level: &str, verbose: u8) -> &str {
    match verbose {
        0 => level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
