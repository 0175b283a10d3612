//! Publication tree assembly.
//!
//! Combines a freshly rendered site tree with the existing archive into the
//! tree to publish. Two modes:
//!
//! - **Deploy**: the fresh build becomes the tree root (the "latest"
//!   build); the existing `archive/` subtree is carried over verbatim.
//! - **Archive**: the fresh build is filed under `archive/<label>/`,
//!   replacing any previous content for that label.
//!
//! Assembly happens in a caller-owned staging directory. Nothing here
//! touches the durable publication target, so an interrupted run leaves it
//! exactly as it was.
//!
//! Archived pages are immutable artifacts: deploy copies them byte-for-byte
//! and never reduces the set of labels under `archive/`. The only permitted
//! deletion is an explicit re-archive of the same label.

use std::io;
use std::path::{Path, PathBuf};

use verso_version::{ARCHIVE_DIR, Version};

/// How the fresh build is merged into the publication tree.
#[derive(Debug, Clone)]
pub enum MergeMode {
    /// Fresh build becomes the latest (unversioned) site root.
    Deploy,
    /// Fresh build is filed under `archive/<label>/`.
    Archive(Version),
}

/// Error returned by tree assembly.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The renderer produced no output tree.
    #[error("missing source tree: {}", .0.display())]
    MissingSourceTree(PathBuf),

    /// The existing archive could not be read.
    ///
    /// Propagated, never treated as an empty archive: publishing a tree
    /// that silently dropped all history is worse than failing the run.
    #[error("archive root unreadable: {path}: {source}")]
    ArchiveRootUnreadable {
        /// Archive directory that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Any other I/O failure while assembling the staging tree.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Assemble the publication tree in `staging`.
///
/// `fresh_tree` is the renderer's output; `published_tree` is the current
/// state of the publication target (may not exist on a first publish).
/// `staging` is created if needed and is expected to be empty.
///
/// # Errors
///
/// [`MergeError::MissingSourceTree`] if the renderer produced nothing,
/// [`MergeError::ArchiveRootUnreadable`] if the existing archive cannot be
/// read, [`MergeError::Io`] for other staging failures.
pub fn merge(
    mode: &MergeMode,
    fresh_tree: &Path,
    published_tree: &Path,
    staging: &Path,
) -> Result<(), MergeError> {
    if !fresh_tree.is_dir() {
        return Err(MergeError::MissingSourceTree(fresh_tree.to_path_buf()));
    }
    std::fs::create_dir_all(staging)?;

    match mode {
        MergeMode::Deploy => deploy(fresh_tree, published_tree, staging),
        MergeMode::Archive(version) => archive(fresh_tree, published_tree, staging, version),
    }
}

/// Deploy mode: fresh root plus the existing archive, verbatim.
fn deploy(fresh_tree: &Path, published_tree: &Path, staging: &Path) -> Result<(), MergeError> {
    copy_tree(fresh_tree, staging)?;

    let archive_root = published_tree.join(ARCHIVE_DIR);
    if archive_root.exists() {
        copy_tree(&archive_root, &staging.join(ARCHIVE_DIR)).map_err(|source| {
            MergeError::ArchiveRootUnreadable {
                path: archive_root.clone(),
                source,
            }
        })?;
    }

    tracing::debug!(staging = %staging.display(), "assembled deploy tree");
    Ok(())
}

/// Archive mode: existing tree carried over, fresh build filed under its
/// label. Re-archiving an existing label fully replaces that directory.
fn archive(
    fresh_tree: &Path,
    published_tree: &Path,
    staging: &Path,
    version: &Version,
) -> Result<(), MergeError> {
    if published_tree.is_dir() {
        for entry in std::fs::read_dir(published_tree)? {
            let entry = entry?;
            let name = entry.file_name();
            // The published tree may be a VCS checkout; its metadata is
            // not site content.
            if name == ".git" {
                continue;
            }
            let src = entry.path();
            let dst = staging.join(&name);
            if name == ARCHIVE_DIR {
                copy_tree(&src, &dst).map_err(|source| MergeError::ArchiveRootUnreadable {
                    path: src.clone(),
                    source,
                })?;
            } else if entry.file_type()?.is_dir() {
                copy_tree(&src, &dst)?;
            } else {
                std::fs::copy(&src, &dst)?;
            }
        }
    }

    let slot = staging.join(ARCHIVE_DIR).join(version.label());
    if slot.exists() {
        std::fs::remove_dir_all(&slot)?;
    }
    copy_tree(fresh_tree, &slot)?;

    tracing::debug!(label = %version.label(), "assembled archive tree");
    Ok(())
}

/// Recursively copy a directory tree, merging into an existing destination.
///
/// Existing files at the destination are overwritten; files only present at
/// the destination are left alone.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
