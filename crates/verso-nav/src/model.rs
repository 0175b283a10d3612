//! Derived navigation model.

use std::path::Path;

use verso_version::{ARCHIVE_DIR, Version, VersionRegistry};

/// A single dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    /// Human-visible label ("Latest" or the version tag).
    pub label: String,
    /// Root-relative link target.
    pub href: String,
}

/// Which build a page belongs to, derived from its path in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVersion {
    /// Page is part of the unversioned latest build.
    Latest,
    /// Page lives under `archive/<label>/`.
    Archived(String),
}

impl PageVersion {
    /// Label shown in the selector badge.
    #[must_use]
    pub fn badge(&self) -> &str {
        match self {
            Self::Latest => "Latest",
            Self::Archived(label) => label,
        }
    }
}

/// Ordered dropdown model, fully regenerated from the registry each run.
///
/// Never patched incrementally: stale entries cannot accumulate because the
/// whole model is recomputed from the registry every time.
#[derive(Debug, Clone)]
pub struct NavigationModel {
    entries: Vec<NavEntry>,
    prefix: String,
}

impl NavigationModel {
    /// Build the model: "Latest" pinned first, then archived versions most
    /// recent first.
    ///
    /// `prefix` is the root-relative site prefix (`""` or `/courses/intro`).
    #[must_use]
    pub fn from_registry(registry: &VersionRegistry, prefix: &str) -> Self {
        let prefix = normalize_prefix(prefix);
        let mut entries = vec![NavEntry {
            label: "Latest".to_owned(),
            href: format!("{prefix}/index.html"),
        }];
        for version in registry.versions() {
            entries.push(NavEntry {
                label: version.label().to_owned(),
                href: format!("{prefix}/{ARCHIVE_DIR}/{}/index.html", version.label()),
            });
        }
        Self { entries, prefix }
    }

    /// Dropdown entries, latest first.
    #[must_use]
    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    /// Normalized site prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Link to the versions listing page.
    #[must_use]
    pub fn versions_href(&self) -> String {
        format!("{}/{}", self.prefix, crate::VERSIONS_PAGE)
    }

    /// Link to the latest build's index.
    #[must_use]
    pub fn latest_href(&self) -> String {
        format!("{}/index.html", self.prefix)
    }
}

/// Normalize a site prefix to `""` or `/segment[/...]` with no trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Classify a page by its path relative to the tree root.
///
/// Pages under `archive/<label>/` where `<label>` parses as a version
/// belong to that archived build; everything else is the latest build.
#[must_use]
pub fn page_version(relative: &Path) -> PageVersion {
    let mut components = relative.components().map(|c| c.as_os_str());
    if components.next().is_some_and(|c| c == ARCHIVE_DIR)
        && let Some(candidate) = components.next()
    {
        let name = candidate.to_string_lossy();
        if Version::parse(&name).is_ok() {
            return PageVersion::Archived(name.into_owned());
        }
    }
    PageVersion::Latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn registry(labels: &[&str]) -> VersionRegistry {
        labels.iter().fold(VersionRegistry::default(), |r, l| {
            r.with_pending(Version::parse(l).unwrap())
        })
    }

    #[test]
    fn test_latest_pinned_first() {
        let model = NavigationModel::from_registry(&registry(&["2024.06.01", "2025.01.01"]), "");
        let labels: Vec<&str> = model.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Latest", "2025.01.01", "2024.06.01"]);
    }

    #[test]
    fn test_hrefs_without_prefix() {
        let model = NavigationModel::from_registry(&registry(&["2024.06.01"]), "");
        assert_eq!(model.entries()[0].href, "/index.html");
        assert_eq!(model.entries()[1].href, "/archive/2024.06.01/index.html");
        assert_eq!(model.versions_href(), "/versions.html");
    }

    #[test]
    fn test_hrefs_with_prefix() {
        let model = NavigationModel::from_registry(&registry(&["2024.06.01"]), "/courses/intro");
        assert_eq!(model.entries()[0].href, "/courses/intro/index.html");
        assert_eq!(
            model.entries()[1].href,
            "/courses/intro/archive/2024.06.01/index.html"
        );
    }

    #[test]
    fn test_prefix_normalization() {
        for raw in ["courses", "/courses", "courses/", "/courses/"] {
            let model = NavigationModel::from_registry(&VersionRegistry::default(), raw);
            assert_eq!(model.prefix(), "/courses", "raw prefix {raw:?}");
        }
        let empty = NavigationModel::from_registry(&VersionRegistry::default(), "/");
        assert_eq!(empty.prefix(), "");
    }

    #[test]
    fn test_page_version_latest() {
        assert_eq!(page_version(Path::new("index.html")), PageVersion::Latest);
        assert_eq!(
            page_version(Path::new("guide/setup.html")),
            PageVersion::Latest
        );
    }

    #[test]
    fn test_page_version_archived() {
        assert_eq!(
            page_version(Path::new("archive/2024.06.01/index.html")),
            PageVersion::Archived("2024.06.01".to_owned())
        );
        assert_eq!(
            page_version(Path::new("archive/2024.06.01/deep/page.html")),
            PageVersion::Archived("2024.06.01".to_owned())
        );
    }

    #[test]
    fn test_page_version_non_version_archive_entry() {
        // Housekeeping directories under archive/ are not versions
        assert_eq!(
            page_version(Path::new("archive/assets/logo.html")),
            PageVersion::Latest
        );
    }

    #[test]
    fn test_page_version_relative_path_shape() {
        let p = PathBuf::from("archive").join("2025.01.15").join("a.html");
        assert_eq!(
            page_version(&p),
            PageVersion::Archived("2025.01.15".to_owned())
        );
    }
}
