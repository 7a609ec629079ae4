mod config;
mod logging;
mod server;
mod signals;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Preference Service: per-user grid, form and free-form UI preferences
#[derive(Parser)]
#[command(name = "preference-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for the HTTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database for the preference store
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate the configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.mock);

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            tracing::info!(bind_addr = %config.server.bind_addr, "Preference server starting");
            server::run(config).await
        }
        Commands::Check => {
            println!("Configuration is valid");
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}
