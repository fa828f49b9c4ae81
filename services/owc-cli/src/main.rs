//! `owc`: inspect and edit OWS Context documents from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use owc_cli::{execute, CliConfig, Command};

#[derive(Parser, Debug)]
#[command(name = "owc")]
#[command(about = "Inspect and edit OWS Context layer trees")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => CliConfig::default(),
    }
    .with_env()?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.log_json {
        config.log_json = true;
    }
    config.validate()?;

    init_tracing(&config)?;
    debug!(?config, "configuration loaded");

    let output = execute(args.command, &config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn init_tracing(config: &CliConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // stdout carries command output, logs go to stderr
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
