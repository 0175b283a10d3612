//! Verso CLI - versioned documentation site publisher.
//!
//! Provides commands for:
//! - `deploy`: Publish the current build as the latest site
//! - `archive`: File the current build under a version tag
//! - `versions`: List published versions

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ArchiveArgs, DeployArgs, RunStatus, VersionsArgs};
use output::Output;

/// Verso - versioned documentation site publisher.
#[derive(Parser)]
#[command(name = "verso", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the current build as the latest (unversioned) site.
    Deploy(DeployArgs),
    /// File the current build under a version tag.
    Archive(ArchiveArgs),
    /// List published versions, newest first.
    Versions(VersionsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Deploy(args) => args.execute(&output),
        Commands::Archive(args) => args.execute(&output),
        Commands::Versions(args) => args.execute(&output),
    };

    let code = match result {
        Ok(RunStatus::Complete) => 0,
        Ok(RunStatus::Partial) => {
            output.warning("Completed with per-page failures");
            2
        }
        Err(err) => {
            output.error(&format!("Error: {err}"));
            1
        }
    };
    std::process::exit(code);
}
