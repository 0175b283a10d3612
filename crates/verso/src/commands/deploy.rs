//! `verso deploy` - publish the current build as the latest site.

use clap::Args;

use verso_pipeline::RunMode;

use super::{PublishArgs, RunStatus};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the `deploy` command.
#[derive(Debug, Args)]
pub(crate) struct DeployArgs {
    #[command(flatten)]
    publish: PublishArgs,
}

impl DeployArgs {
    /// Execute the deploy command.
    pub(crate) fn execute(&self, output: &Output) -> Result<RunStatus, CliError> {
        self.publish.run(&RunMode::Deploy, output)
    }
}
