//! CLI error types.

use verso_config::ConfigError;
use verso_pipeline::{HookError, RunError};
use verso_version::VersionError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Version(#[from] VersionError),

    #[error("{0}")]
    Hook(#[from] HookError),

    #[error("{0}")]
    Run(#[from] RunError),
}
