//! Parallel per-page navigation rewriting.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;

use crate::markup::nav_region;
use crate::model::{NavigationModel, page_version};

/// Matches the anchor-delimited navigation region, anchors included.
static NAV_REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*VERSION_NAV_START\s*-->.*?<!--\s*VERSION_NAV_END\s*-->")
        .expect("static regex")
});

/// Error for a single page.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// The page has no navigation anchors to replace.
    #[error("navigation anchor not found")]
    AnchorNotFound,

    /// The page could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A page that failed to rewrite, with its path relative to the tree root.
#[derive(Debug)]
pub struct PageFailure {
    /// Page path relative to the tree root.
    pub page: PathBuf,
    /// What went wrong.
    pub error: NavError,
}

/// Result of rewriting a tree: per-page failures are collected, not fatal.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    /// Pages whose navigation region was replaced with new content.
    pub updated: usize,
    /// Pages already carrying the exact region (idempotent re-run).
    pub unchanged: usize,
    /// Pages that could not be rewritten.
    pub failures: Vec<PageFailure>,
}

impl RewriteOutcome {
    /// Whether every page was rewritten successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Rewrite the navigation region of every HTML page under `tree`.
///
/// Applies uniformly to all pages, including those copied verbatim from the
/// archive: navigation is shared chrome, so archived pages' selectors must
/// stay current even though their bodies never change.
///
/// Pages are processed in parallel; each page owns a disjoint output path,
/// so no locking is needed. A page missing the anchors is reported in the
/// outcome and left unmodified without affecting its siblings.
///
/// # Errors
///
/// Returns an error only if the tree itself cannot be walked; per-page
/// problems land in [`RewriteOutcome::failures`].
pub fn rewrite_tree(tree: &Path, model: &NavigationModel) -> io::Result<RewriteOutcome> {
    let mut pages = Vec::new();
    collect_html(tree, tree, &mut pages)?;

    let results: Vec<Result<bool, PageFailure>> = pages
        .par_iter()
        .map(|relative| {
            rewrite_page(tree, relative, model).map_err(|error| PageFailure {
                page: relative.clone(),
                error,
            })
        })
        .collect();

    let mut outcome = RewriteOutcome::default();
    for result in results {
        match result {
            Ok(true) => outcome.updated += 1,
            Ok(false) => outcome.unchanged += 1,
            Err(failure) => {
                tracing::warn!(page = %failure.page.display(), error = %failure.error, "page not rewritten");
                outcome.failures.push(failure);
            }
        }
    }

    tracing::debug!(
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        failed = outcome.failures.len(),
        "navigation rewrite finished"
    );
    Ok(outcome)
}

/// Rewrite one page. Returns whether the file content changed.
fn rewrite_page(tree: &Path, relative: &Path, model: &NavigationModel) -> Result<bool, NavError> {
    let path = tree.join(relative);
    let content = std::fs::read_to_string(&path)?;

    if !NAV_REGION_RE.is_match(&content) {
        return Err(NavError::AnchorNotFound);
    }

    let region = nav_region(model, &page_version(relative));
    let rewritten = NAV_REGION_RE.replace(&content, regex::NoExpand(&region));

    if rewritten == content {
        return Ok(false);
    }
    std::fs::write(&path, rewritten.as_bytes())?;
    Ok(true)
}

/// Collect `.html` files recursively, as paths relative to `base`.
fn collect_html(base: &Path, current: &Path, pages: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_html(base, &path, pages)?;
        } else if path.extension().is_some_and(|e| e == "html") {
            // Paths under base by construction
            if let Ok(relative) = path.strip_prefix(base) {
                pages.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}
