//! `verso versions` - list published versions.

use std::path::PathBuf;

use clap::Args;

use verso_config::Config;

use super::{RunStatus, build_pipeline};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the `versions` command.
#[derive(Debug, Args)]
pub(crate) struct VersionsArgs {
    /// Path to the config file (defaults to discovering verso.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl VersionsArgs {
    /// Execute the versions command.
    pub(crate) fn execute(&self, output: &Output) -> Result<RunStatus, CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let pipeline = build_pipeline(&config)?;

        let versions = pipeline.list_versions()?;
        if versions.is_empty() {
            output.info("No published versions");
        } else {
            output.info("Published versions (newest first):");
            for label in versions {
                output.info(&format!("  {label}"));
            }
        }
        Ok(RunStatus::Complete)
    }
}
