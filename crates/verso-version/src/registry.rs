//! Version registry derived from the archive directory.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Version, VersionError};

/// Error returned when scanning the archive root.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The archive root exists but could not be read.
    ///
    /// Propagated rather than treated as an empty archive: a transient read
    /// failure must not produce a publish that silently drops all history.
    #[error("archive root unreadable: {path}: {source}")]
    ArchiveRootUnreadable {
        /// The archive root that failed to enumerate.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// The set of versions currently present in the publication tree.
///
/// Always rebuilt from the archive directory's child names at run start;
/// there is no cross-run cached state. A version being published this run
/// can be added with [`with_pending`](Self::with_pending) so navigation can
/// link to it before it physically exists.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    // Keyed by label; directory names are unique so labels are too.
    versions: BTreeMap<String, Version>,
}

impl VersionRegistry {
    /// Scan the archive root's immediate child directories for versions.
    ///
    /// Child directories whose names do not parse as versions are skipped;
    /// the archive root may contain non-version housekeeping entries. A
    /// missing archive root yields an empty registry (first publish).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ArchiveRootUnreadable`] if the root exists
    /// but enumeration fails.
    pub fn scan(archive_root: &Path) -> Result<Self, RegistryError> {
        let mut versions = BTreeMap::new();

        if !archive_root.exists() {
            tracing::debug!(path = %archive_root.display(), "no archive root, empty registry");
            return Ok(Self { versions });
        }

        let unreadable = |source| RegistryError::ArchiveRootUnreadable {
            path: archive_root.to_path_buf(),
            source,
        };

        for entry in std::fs::read_dir(archive_root).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let is_dir = entry.file_type().map_err(unreadable)?.is_dir();
            if !is_dir {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match Version::parse(&name) {
                Ok(version) => {
                    versions.insert(name, version);
                }
                Err(VersionError::InvalidFormat(_)) => {
                    tracing::debug!(name = %name, "skipping non-version archive entry");
                }
            }
        }

        Ok(Self { versions })
    }

    /// Include a version being published this run.
    ///
    /// The pending version is part of the ordered list even though its
    /// directory may not exist yet; by publish time it will. Re-archiving
    /// an existing label replaces the entry rather than duplicating it.
    #[must_use]
    pub fn with_pending(mut self, version: Version) -> Self {
        self.versions.insert(version.label().to_owned(), version);
        self
    }

    /// All known versions, most recent first.
    ///
    /// Sorted descending by `(year, month, day)`; equal dates order
    /// lexicographically by label for determinism.
    #[must_use]
    pub fn versions(&self) -> Vec<&Version> {
        let mut list: Vec<&Version> = self.versions.values().collect();
        list.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| a.label().cmp(b.label())));
        list
    }

    /// Whether a label is present in the registry.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.versions.contains_key(label)
    }

    /// Number of known versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn labels(registry: &VersionRegistry) -> Vec<&str> {
        registry.versions().iter().map(|v| v.label()).collect()
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let registry = VersionRegistry::scan(Path::new("/nonexistent/archive")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scan_unreadable_root_errors() {
        let temp = tempfile::tempdir().unwrap();
        // A file where the archive directory should be: enumeration fails
        let root = temp.path().join("archive");
        fs::write(&root, "not a directory").unwrap();

        let err = VersionRegistry::scan(&root).unwrap_err();
        let RegistryError::ArchiveRootUnreadable { path, .. } = err;
        assert_eq!(path, root);
    }

    #[test]
    fn test_scan_collects_version_directories() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("2024.06.01")).unwrap();
        fs::create_dir(temp.path().join("2025.01.15")).unwrap();

        let registry = VersionRegistry::scan(temp.path()).unwrap();
        assert_eq!(labels(&registry), vec!["2025.01.15", "2024.06.01"]);
    }

    #[test]
    fn test_scan_skips_housekeeping_entries() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("2024.06.01")).unwrap();
        fs::create_dir(temp.path().join("assets")).unwrap();
        fs::create_dir(temp.path().join(".cache")).unwrap();
        // Files are never versions, even with a version-shaped name
        fs::write(temp.path().join("2024.07.01"), "not a dir").unwrap();

        let registry = VersionRegistry::scan(temp.path()).unwrap();
        assert_eq!(labels(&registry), vec!["2024.06.01"]);
    }

    #[test]
    fn test_ordering_most_recent_first() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["2024.06.01", "2025.02.01", "2025.01.01", "2024.12.31"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        let registry = VersionRegistry::scan(temp.path()).unwrap();
        assert_eq!(
            labels(&registry),
            vec!["2025.02.01", "2025.01.01", "2024.12.31", "2024.06.01"]
        );
    }

    #[test]
    fn test_with_pending_adds_unpublished_version() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("2024.06.01")).unwrap();

        let registry = VersionRegistry::scan(temp.path())
            .unwrap()
            .with_pending(Version::parse("2024.09.01").unwrap());

        assert_eq!(labels(&registry), vec!["2024.09.01", "2024.06.01"]);
    }

    #[test]
    fn test_with_pending_replaces_same_label() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("2024.06.01")).unwrap();

        let registry = VersionRegistry::scan(temp.path())
            .unwrap()
            .with_pending(Version::parse("2024.06.01").unwrap());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("2024.06.01"));
    }

    #[test]
    fn test_scan_is_pure_recomputation() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("2024.06.01")).unwrap();

        let first = VersionRegistry::scan(temp.path()).unwrap();
        assert_eq!(first.len(), 1);

        // A new directory appears between runs; the next scan sees it
        // without any cached state getting in the way.
        fs::create_dir(temp.path().join("2024.07.01")).unwrap();
        let second = VersionRegistry::scan(temp.path()).unwrap();
        assert_eq!(labels(&second), vec!["2024.07.01", "2024.06.01"]);
    }
}
