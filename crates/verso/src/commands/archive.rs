//! `verso archive` - file the current build under a version tag.

use clap::Args;

use verso_pipeline::RunMode;

use super::{PublishArgs, RunStatus};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the `archive` command.
#[derive(Debug, Args)]
pub(crate) struct ArchiveArgs {
    /// Version tag in YYYY.MM.DD form (e.g. 2025.01.15).
    tag: String,

    #[command(flatten)]
    publish: PublishArgs,
}

impl ArchiveArgs {
    /// Execute the archive command.
    ///
    /// The tag is validated before anything is fetched or staged; a bad
    /// tag aborts with the archive untouched.
    pub(crate) fn execute(&self, output: &Output) -> Result<RunStatus, CliError> {
        let mode = RunMode::archive(&self.tag)?;
        self.publish.run(&mode, output)
    }
}
