use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codelink_core::configs::{load_config, CodelinkConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod design_url;

/// Codelink - link source components to design files
#[derive(Parser)]
#[command(name = "codelink")]
#[command(about = "Link source-code components to their design files")]
#[command(version)]
struct Cli {
    /// Path to the workspace root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Log runtime details to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the workspace is ready to link components
    Doctor {
        /// Access token to check instead of CODELINK_ACCESS_TOKEN
        #[arg(long)]
        token: Option<String>,
    },
    /// Inspect the configuration file format
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the JSON schema of codelink.yml
    Schema,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CODELINK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // An unreadable config must not stop `doctor` from reporting on it
    let config = match load_config(&cli.workspace) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring configuration");
            CodelinkConfig::default()
        }
    };
    let display = config.display.unwrap_or_default();
    if !display.color_enabled() {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Doctor { token } => commands::doctor::execute(&cli.workspace, token, &display).await,
        Commands::Config { config_command } => commands::config::execute(config_command),
    }
}
