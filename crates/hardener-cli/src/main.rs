//! Hardener CLI
//!
//! # Commands
//!
//! - `autofix`: harden one artifact file and write the result
//! - `serve`: run the HTTP surface

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "hardener")]
#[command(version)]
#[command(about = "Harden OpenAPI artifacts against an external security scorer")]
#[command(propagate_version = true)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess, correct and re-assess an artifact until it reaches the target
    Autofix(commands::autofix::AutofixArgs),
    /// Serve POST /v1/harden and GET /health
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Autofix(args) => commands::autofix::run(args).await,
        Commands::Serve(args) => {
            commands::serve::run(args).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
