//! CLI command implementations.

mod archive;
mod deploy;
mod versions;

pub(crate) use archive::ArchiveArgs;
pub(crate) use deploy::DeployArgs;
pub(crate) use versions::VersionsArgs;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use verso_config::{CliSettings, Config};
use verso_pipeline::{Pipeline, PublishConfig, RunMode, RunReport, run_hook};

use crate::error::CliError;
use crate::output::Output;

/// How the command finished; drives the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    /// Everything succeeded.
    Complete,
    /// The run published, but some pages failed to rewrite.
    Partial,
}

/// Options shared by `deploy` and `archive`.
#[derive(Debug, Args)]
pub(crate) struct PublishArgs {
    /// Path to the config file (defaults to discovering verso.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Rendered site directory (overrides site.source_dir).
    #[arg(long, value_name = "DIR")]
    pub site_dir: Option<PathBuf>,

    /// Root-relative site prefix (overrides site.prefix).
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Auth token for the publish remote.
    #[arg(long, env = "VERSO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the pre/post render hooks.
    #[arg(long)]
    pub skip_hooks: bool,
}

impl PublishArgs {
    /// Load config with these CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let settings = CliSettings {
            source_dir: self.site_dir.clone(),
            prefix: self.prefix.clone(),
            token: self.token.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }

    /// Run one publish cycle with hooks around the (external) render step.
    pub(crate) fn run(&self, mode: &RunMode, output: &Output) -> Result<RunStatus, CliError> {
        let config = self.load_config()?;
        let pipeline = build_pipeline(&config)?;

        let hook_dir = config
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        if !self.skip_hooks
            && let Some(command) = &config.hooks.pre_render
        {
            run_hook("pre_render", command, &hook_dir)?;
        }
        // Rendering itself is external; by this point the source tree is
        // expected to exist.
        if !self.skip_hooks
            && let Some(command) = &config.hooks.post_render
        {
            run_hook("post_render", command, &hook_dir)?;
        }

        let report = pipeline.run(mode, &config.site_resolved.source_dir)?;
        Ok(summarize(&report, mode, output))
    }
}

/// Build the pipeline from validated config.
pub(crate) fn build_pipeline(config: &Config) -> Result<Pipeline, CliError> {
    let publish = config.require_publish()?;
    Ok(Pipeline::new(
        PublishConfig {
            remote_url: publish.remote.clone(),
            branch: publish.branch.clone(),
            checkout_dir: config.site_resolved.checkout_dir(),
            token: publish.token.clone(),
            timeout: publish.timeout_secs.map(Duration::from_secs),
        },
        config.site_resolved.prefix.clone(),
    ))
}

/// Print the run report and derive the exit status.
fn summarize(report: &RunReport, mode: &RunMode, output: &Output) -> RunStatus {
    for failure in &report.rewrite.failures {
        output.page_failure(&failure.page, &failure.error);
    }

    let what = match mode {
        RunMode::Deploy => "Deployed latest build".to_owned(),
        RunMode::Archive(version) => format!("Archived version {version}"),
    };
    match &report.outcome {
        verso_pipeline::PublishOutcome::Published { commit } => {
            output.success(&format!("{what} ({commit})"));
        }
        verso_pipeline::PublishOutcome::Unchanged => {
            output.info("Published tree already current, nothing to push");
        }
    }
    output.info(&format!(
        "{} page(s) updated, {} version(s) known",
        report.rewrite.updated,
        report.versions.len()
    ));

    if report.is_complete() {
        RunStatus::Complete
    } else {
        RunStatus::Partial
    }
}
