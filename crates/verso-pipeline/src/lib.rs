//! Publish run orchestration.
//!
//! A run assembles the publication tree in a scratch staging directory and
//! hands the finished tree to the publisher as its last step. The durable
//! target is never touched before that, so interrupting a run leaves the
//! published site exactly as it was.
//!
//! Runs are single-writer: nothing here locks, the remote's
//! compare-and-push is the only guard against concurrent publishes. Two
//! overlapping runs resolve to one winner and one
//! [`PublishError::Conflict`](verso_publish::PublishError::Conflict).

mod hooks;

use std::path::{Path, PathBuf};

use verso_archive::{MergeError, MergeMode};
use verso_nav::{NavigationModel, RewriteOutcome, rewrite_tree, write_versions_page};
use verso_publish::{PublishError, Publisher};
use verso_version::{ARCHIVE_DIR, RegistryError, Version, VersionError, VersionRegistry};

pub use hooks::{HookError, run_hook};
pub use verso_publish::{PublishConfig, PublishOutcome};

/// What this run publishes.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Publish the current build as the unversioned latest site.
    Deploy,
    /// File the current build under its version tag.
    Archive(Version),
}

impl RunMode {
    /// Archive mode from a raw tag string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidFormat`] for a bad tag. Nothing has
    /// been staged or published at that point; the archive is untouched.
    pub fn archive(tag: &str) -> Result<Self, VersionError> {
        Ok(Self::Archive(Version::parse(tag)?))
    }

    /// Deterministic commit message for this run.
    #[must_use]
    pub fn commit_message(&self) -> String {
        match self {
            Self::Deploy => "Deploy latest build".to_owned(),
            Self::Archive(version) => format!("Archive version {}", version.label()),
        }
    }
}

/// Error aborting a run.
///
/// Per-page navigation failures are not here: they are collected in the
/// [`RunReport`] and the rest of the run proceeds.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Bad version tag.
    #[error("{0}")]
    Version(#[from] VersionError),

    /// Archive root could not be scanned.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// Publication tree could not be assembled.
    #[error("{0}")]
    Merge(#[from] MergeError),

    /// Publication failed.
    #[error("{0}")]
    Publish(#[from] PublishError),

    /// Scratch staging area failure.
    #[error("staging error: {0}")]
    Staging(#[from] std::io::Error),
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Ordered version labels known at publish time, newest first.
    pub versions: Vec<String>,
    /// What the publisher did.
    pub outcome: PublishOutcome,
    /// Navigation rewrite summary, including per-page failures.
    pub rewrite: RewriteOutcome,
}

impl RunReport {
    /// Whether every page was rewritten successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rewrite.is_complete()
    }
}

/// Orchestrates one publish run end to end.
pub struct Pipeline {
    publisher: Publisher,
    prefix: String,
}

impl Pipeline {
    /// Create a pipeline publishing to the given target.
    #[must_use]
    pub fn new(publish: PublishConfig, prefix: impl Into<String>) -> Self {
        Self {
            publisher: Publisher::new(publish),
            prefix: prefix.into(),
        }
    }

    /// Run one publish cycle.
    ///
    /// `source_dir` is the renderer's output tree. The flow: fresh base
    /// from the remote, registry scan, tree assembly in scratch staging,
    /// navigation synthesis, publish.
    ///
    /// # Errors
    ///
    /// Any [`RunError`] aborts before the publish step, leaving the
    /// hosting target untouched. Per-page navigation failures do not
    /// abort; inspect [`RunReport::is_complete`].
    pub fn run(&self, mode: &RunMode, source_dir: &Path) -> Result<RunReport, RunError> {
        self.publisher.prepare()?;
        let checkout = self.publisher.checkout_dir();

        let mut registry = VersionRegistry::scan(&checkout.join(ARCHIVE_DIR))?;
        let merge_mode = match mode {
            RunMode::Deploy => MergeMode::Deploy,
            RunMode::Archive(version) => {
                // Pending version is listed before its directory exists;
                // it will by the time the tree is published.
                registry = registry.with_pending(version.clone());
                MergeMode::Archive(version.clone())
            }
        };

        let staging = tempfile::tempdir()?;
        verso_archive::merge(&merge_mode, source_dir, checkout, staging.path())?;

        let model = NavigationModel::from_registry(&registry, &self.prefix);
        write_versions_page(staging.path(), &registry, &model)?;
        let rewrite = rewrite_tree(staging.path(), &model)?;

        let outcome = self
            .publisher
            .publish(staging.path(), &mode.commit_message())?;

        Ok(RunReport {
            versions: registry
                .versions()
                .iter()
                .map(|v| v.label().to_owned())
                .collect(),
            outcome,
            rewrite,
        })
    }

    /// Fetch the remote and list the currently published versions.
    ///
    /// # Errors
    ///
    /// Fails if the remote cannot be fetched or the archive scanned.
    pub fn list_versions(&self) -> Result<Vec<String>, RunError> {
        self.publisher.prepare()?;
        let archive_root = self.publisher.checkout_dir().join(ARCHIVE_DIR);
        let registry = VersionRegistry::scan(&archive_root)?;
        Ok(registry
            .versions()
            .iter()
            .map(|v| v.label().to_owned())
            .collect())
    }

    /// The local checkout of the publication branch.
    #[must_use]
    pub fn checkout_dir(&self) -> PathBuf {
        self.publisher.checkout_dir().to_path_buf()
    }
}
