//! Git publication target.
//!
//! The publisher owns the only step that touches the durable hosting
//! target. A run works against a local checkout of the hosting branch:
//! [`Publisher::prepare`] brings it to the remote tip so the run starts
//! from a fresh base, and [`Publisher::publish`] syncs the assembled tree
//! in, commits and pushes.
//!
//! Publishing is idempotent with respect to content: the staged tree is
//! compared against `HEAD`'s tree id, and a byte-identical tree is a no-op
//! instead of an empty commit. A remote that moved since the base was
//! fetched surfaces as [`PublishError::Conflict`]; the recovery is a whole
//! fresh run, never an automatic merge, which could silently resurrect or
//! duplicate archived versions.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use git2::build::CheckoutBuilder;
use git2::{Cred, ErrorCode, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository, Signature};

/// Where and how to publish.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Remote URL of the hosting repository.
    pub remote_url: String,
    /// Hosting branch (e.g. `gh-pages`).
    pub branch: String,
    /// Local checkout directory for the hosting branch.
    pub checkout_dir: PathBuf,
    /// Auth token for the remote, if it requires one.
    pub token: Option<String>,
    /// Bound on remote transfer time. Exceeding it fails the run with a
    /// retryable error instead of hanging.
    pub timeout: Option<Duration>,
}

/// Result of a publish attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A commit was created and pushed.
    Published {
        /// The new commit id.
        commit: String,
    },
    /// The computed tree is byte-identical to what is already published.
    Unchanged,
}

/// Error returned by the publisher.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The remote moved since the base was fetched (stale-base write).
    ///
    /// Recoverable: re-run from a fresh fetch. Never auto-merged.
    #[error("publish conflict: remote moved since fetch: {0}")]
    Conflict(String),

    /// A remote transfer exceeded the configured timeout.
    ///
    /// Conflict-class: the caller should retry the whole run.
    #[error("remote operation timed out after {0:?}")]
    Timeout(Duration),

    /// Underlying git failure.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Filesystem failure while syncing the checkout.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Publishes assembled publication trees to a git hosting branch.
pub struct Publisher {
    config: PublishConfig,
}

impl Publisher {
    /// Create a publisher with the given configuration.
    #[must_use]
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    /// The checkout directory holding the current published tree.
    #[must_use]
    pub fn checkout_dir(&self) -> &Path {
        &self.config.checkout_dir
    }

    /// Bring the local checkout to the remote branch tip.
    ///
    /// Initializes the checkout on first use. An empty remote (nothing
    /// published yet) leaves the checkout empty on an unborn branch.
    ///
    /// # Errors
    ///
    /// [`PublishError::Timeout`] if the fetch exceeds the configured bound,
    /// [`PublishError::Git`] for other fetch failures.
    pub fn prepare(&self) -> Result<(), PublishError> {
        let repo = self.open_or_init()?;

        let expired = Arc::new(AtomicBool::new(false));
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.callbacks(&expired));

        let mut remote = repo.find_remote("origin")?;
        // Fetch all heads so an empty remote is not an error
        let fetched = remote.fetch(
            &["+refs/heads/*:refs/remotes/origin/*"],
            Some(&mut options),
            None,
        );
        if let Err(err) = fetched {
            if expired.load(Ordering::Relaxed) {
                return Err(self.timeout_error());
            }
            return Err(err.into());
        }
        drop(remote);

        let branch_ref = format!("refs/heads/{}", self.config.branch);
        let remote_ref = format!("refs/remotes/origin/{}", self.config.branch);

        if let Ok(target) = repo.refname_to_id(&remote_ref) {
            // Force-set the ref directly: works even when HEAD already
            // points at the branch.
            repo.reference(&branch_ref, target, true, "reset to remote tip")?;
            repo.set_head(&branch_ref)?;
            let mut checkout = CheckoutBuilder::new();
            checkout.force().remove_untracked(true);
            repo.checkout_head(Some(&mut checkout))?;
            tracing::debug!(branch = %self.config.branch, commit = %target, "checkout at remote tip");
        } else {
            // Nothing published yet: unborn branch, empty checkout
            repo.set_head(&branch_ref)?;
            tracing::debug!(branch = %self.config.branch, "remote branch absent, starting empty");
        }

        Ok(())
    }

    /// Sync `tree` into the checkout, commit and push.
    ///
    /// # Errors
    ///
    /// [`PublishError::Conflict`] on a stale base,
    /// [`PublishError::Timeout`] when the push exceeds the configured bound.
    pub fn publish(&self, tree: &Path, message: &str) -> Result<PublishOutcome, PublishError> {
        let repo = Repository::open(&self.config.checkout_dir)?;

        self.sync_checkout(tree)?;

        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        // add_all only sees worktree files; update_all records deletions
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;

        let head_commit = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };

        if let Some(parent) = &head_commit
            && parent.tree_id() == tree_oid
        {
            tracing::info!("published tree already current, skipping commit");
            return Ok(PublishOutcome::Unchanged);
        }

        let git_tree = repo.find_tree(tree_oid)?;
        let signature = repo
            .signature()
            .or_else(|_| Signature::now("verso", "verso@localhost"))?;
        let parents: Vec<&git2::Commit> = head_commit.iter().collect();
        let commit = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &git_tree,
            &parents,
        )?;

        self.push(&repo)?;
        tracing::info!(commit = %commit, message, "published");
        Ok(PublishOutcome::Published {
            commit: commit.to_string(),
        })
    }

    /// Push the branch, mapping a stale base to [`PublishError::Conflict`].
    fn push(&self, repo: &Repository) -> Result<(), PublishError> {
        let expired = Arc::new(AtomicBool::new(false));
        let rejection = Arc::new(std::sync::Mutex::new(None::<String>));

        let mut callbacks = self.callbacks(&expired);
        let seen = Arc::clone(&rejection);
        callbacks.push_update_reference(move |refname, status| {
            if let Some(status) = status
                && let Ok(mut slot) = seen.lock()
            {
                *slot = Some(format!("{refname}: {status}"));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!(
            "refs/heads/{branch}:refs/heads/{branch}",
            branch = self.config.branch
        );
        let mut remote = repo.find_remote("origin")?;
        let pushed = remote.push(&[refspec], Some(&mut options));

        if let Some(status) = rejection.lock().ok().and_then(|slot| slot.clone()) {
            return Err(PublishError::Conflict(status));
        }
        if let Err(err) = pushed {
            if expired.load(Ordering::Relaxed) {
                return Err(self.timeout_error());
            }
            if err.code() == ErrorCode::NotFastForward {
                return Err(PublishError::Conflict(err.message().to_owned()));
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Open the checkout repository, initializing it with the configured
    /// remote on first use.
    fn open_or_init(&self) -> Result<Repository, PublishError> {
        let dir = &self.config.checkout_dir;
        let repo = match Repository::open(dir) {
            Ok(repo) => repo,
            Err(_) => {
                std::fs::create_dir_all(dir)?;
                Repository::init(dir)?
            }
        };

        let url_matches = repo
            .find_remote("origin")
            .is_ok_and(|r| r.url() == Some(self.config.remote_url.as_str()));
        if !url_matches {
            if repo.find_remote("origin").is_ok() {
                repo.remote_set_url("origin", &self.config.remote_url)?;
            } else {
                repo.remote("origin", &self.config.remote_url)?;
            }
        }
        Ok(repo)
    }

    /// Replace the checkout's content (everything except `.git`) with `tree`.
    fn sync_checkout(&self, tree: &Path) -> Result<(), io::Error> {
        let checkout = &self.config.checkout_dir;
        for entry in std::fs::read_dir(checkout)? {
            let entry = entry?;
            if entry.file_name() == ".git" {
                continue;
            }
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(entry.path())?;
            } else {
                std::fs::remove_file(entry.path())?;
            }
        }
        verso_archive::copy_tree(tree, checkout)
    }

    /// Callbacks carrying credentials and the transfer deadline.
    fn callbacks(&self, expired: &Arc<AtomicBool>) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();

        if let Some(token) = self.config.token.clone() {
            callbacks.credentials(move |_url, username_from_url, _allowed| {
                Cred::userpass_plaintext(username_from_url.unwrap_or("git"), &token)
            });
        }

        if let Some(timeout) = self.config.timeout {
            let started = Instant::now();
            let flag = Arc::clone(expired);
            callbacks.transfer_progress(move |_progress| deadline_ok(started, timeout, &flag));
            let started = Instant::now();
            let flag = Arc::clone(expired);
            callbacks.push_transfer_progress(move |_current, _total, _bytes| {
                deadline_ok(started, timeout, &flag);
            });
        }

        callbacks
    }

    fn timeout_error(&self) -> PublishError {
        PublishError::Timeout(self.config.timeout.unwrap_or_default())
    }
}

/// Whether a transfer may continue. Marks `expired` and tells libgit2 to
/// abort once `timeout` has elapsed since `started`; the caller turns the
/// flag into [`PublishError::Timeout`] when the aborted operation errors.
fn deadline_ok(started: Instant, timeout: Duration, expired: &AtomicBool) -> bool {
    if started.elapsed() > timeout {
        expired.store(true, Ordering::Relaxed);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Bare remote plus a publisher pointed at it.
    fn fixture(temp: &Path) -> (PathBuf, Publisher) {
        let remote = temp.join("remote.git");
        Repository::init_bare(&remote).unwrap();
        let publisher = Publisher::new(PublishConfig {
            remote_url: remote.to_string_lossy().into_owned(),
            branch: "gh-pages".to_owned(),
            checkout_dir: temp.join("checkout"),
            token: None,
            timeout: None,
        });
        (remote, publisher)
    }

    fn tree_with(temp: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let tree = temp.join(name);
        for (path, content) in files {
            let full = tree.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        tree
    }

    #[test]
    fn test_first_publish_to_empty_remote() {
        let temp = tempfile::tempdir().unwrap();
        let (remote, publisher) = fixture(temp.path());
        let tree = tree_with(temp.path(), "tree", &[("index.html", "hello")]);

        publisher.prepare().unwrap();
        let outcome = publisher.publish(&tree, "Deploy latest build").unwrap();
        assert!(matches!(outcome, PublishOutcome::Published { .. }));

        let bare = Repository::open_bare(&remote).unwrap();
        let head = bare.refname_to_id("refs/heads/gh-pages").unwrap();
        let commit = bare.find_commit(head).unwrap();
        assert_eq!(commit.message(), Some("Deploy latest build"));
    }

    #[test]
    fn test_identical_tree_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let (remote, publisher) = fixture(temp.path());
        let tree = tree_with(temp.path(), "tree", &[("index.html", "hello")]);

        publisher.prepare().unwrap();
        publisher.publish(&tree, "Deploy latest build").unwrap();

        // Re-run with the same content: no new commit, no push
        publisher.prepare().unwrap();
        let outcome = publisher.publish(&tree, "Deploy latest build").unwrap();
        assert_eq!(outcome, PublishOutcome::Unchanged);

        let bare = Repository::open_bare(&remote).unwrap();
        let head = bare.refname_to_id("refs/heads/gh-pages").unwrap();
        let commit = bare.find_commit(head).unwrap();
        assert_eq!(commit.parent_count(), 0, "no second commit");
    }

    #[test]
    fn test_changed_tree_appends_commit() {
        let temp = tempfile::tempdir().unwrap();
        let (remote, publisher) = fixture(temp.path());

        publisher.prepare().unwrap();
        let first = tree_with(temp.path(), "one", &[("index.html", "v1")]);
        publisher.publish(&first, "Deploy latest build").unwrap();

        publisher.prepare().unwrap();
        let second = tree_with(temp.path(), "two", &[("index.html", "v2")]);
        publisher
            .publish(&second, "Archive version 2024.06.01")
            .unwrap();

        let bare = Repository::open_bare(&remote).unwrap();
        let head = bare.refname_to_id("refs/heads/gh-pages").unwrap();
        let commit = bare.find_commit(head).unwrap();
        assert_eq!(commit.message(), Some("Archive version 2024.06.01"));
        assert_eq!(commit.parent_count(), 1);
    }

    #[test]
    fn test_prepare_picks_up_remote_changes() {
        let temp = tempfile::tempdir().unwrap();
        let (_remote, publisher) = fixture(temp.path());

        publisher.prepare().unwrap();
        let tree = tree_with(
            temp.path(),
            "tree",
            &[("index.html", "v1"), ("archive/2024.06.01/index.html", "a")],
        );
        publisher.publish(&tree, "Deploy latest build").unwrap();

        // A second checkout of the same remote sees the published content
        let other = Publisher::new(PublishConfig {
            remote_url: publisher.config.remote_url.clone(),
            branch: "gh-pages".to_owned(),
            checkout_dir: temp.path().join("other"),
            token: None,
            timeout: None,
        });
        other.prepare().unwrap();
        let published = fs::read_to_string(other.checkout_dir().join("index.html")).unwrap();
        assert_eq!(published, "v1");
        assert!(
            other
                .checkout_dir()
                .join("archive/2024.06.01/index.html")
                .exists()
        );
    }

    #[test]
    fn test_stale_base_is_conflict() {
        let temp = tempfile::tempdir().unwrap();
        let (_remote, publisher) = fixture(temp.path());

        // Two writers from the same base
        let other = Publisher::new(PublishConfig {
            remote_url: publisher.config.remote_url.clone(),
            branch: "gh-pages".to_owned(),
            checkout_dir: temp.path().join("other"),
            token: None,
            timeout: None,
        });

        publisher.prepare().unwrap();
        let base = tree_with(temp.path(), "base", &[("index.html", "base")]);
        publisher.publish(&base, "Deploy latest build").unwrap();

        other.prepare().unwrap();
        publisher.prepare().unwrap();

        // First writer moves the remote
        let theirs = tree_with(temp.path(), "theirs", &[("index.html", "theirs")]);
        publisher.publish(&theirs, "Deploy latest build").unwrap();

        // Second writer pushes from the stale base
        let ours = tree_with(temp.path(), "ours", &[("index.html", "ours")]);
        let err = other.publish(&ours, "Deploy latest build").unwrap_err();
        assert!(matches!(err, PublishError::Conflict(_)), "got {err:?}");

        // Recovery: fresh fetch, then retry the run
        other.prepare().unwrap();
        let retried = other.publish(&ours, "Deploy latest build").unwrap();
        assert!(matches!(retried, PublishOutcome::Published { .. }));
    }

    #[test]
    fn test_deadline_within_timeout_continues() {
        let expired = AtomicBool::new(false);
        assert!(deadline_ok(
            Instant::now(),
            Duration::from_secs(60),
            &expired
        ));
        assert!(!expired.load(Ordering::Relaxed));
    }

    #[test]
    fn test_deadline_elapsed_sets_flag_and_aborts() {
        let expired = AtomicBool::new(false);
        let started = Instant::now() - Duration::from_secs(1);
        assert!(!deadline_ok(started, Duration::ZERO, &expired));
        assert!(expired.load(Ordering::Relaxed));
    }

    #[test]
    fn test_timeout_error_carries_configured_bound() {
        let temp = tempfile::tempdir().unwrap();
        let (_remote, publisher) = fixture(temp.path());
        let bounded = Publisher::new(PublishConfig {
            timeout: Some(Duration::from_secs(30)),
            ..publisher.config
        });

        match bounded.timeout_error() {
            PublishError::Timeout(bound) => assert_eq!(bound, Duration::from_secs(30)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_sync_removes_files_dropped_from_tree() {
        let temp = tempfile::tempdir().unwrap();
        let (_remote, publisher) = fixture(temp.path());

        publisher.prepare().unwrap();
        let first = tree_with(
            temp.path(),
            "one",
            &[("index.html", "v1"), ("old.html", "old")],
        );
        publisher.publish(&first, "Deploy latest build").unwrap();

        publisher.prepare().unwrap();
        let second = tree_with(temp.path(), "two", &[("index.html", "v2")]);
        publisher.publish(&second, "Deploy latest build").unwrap();

        assert!(!publisher.checkout_dir().join("old.html").exists());
    }
}
