//! HTML generation for the version selector.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::model::{NavigationModel, PageVersion};
use crate::{NAV_END, NAV_START};

/// Render the full navigation region for one page, anchors included.
///
/// The region always contains the dropdown; pages belonging to an archived
/// build additionally get an "archived version" notice. The notice lives
/// inside the replaceable region, never in the page body, so archived page
/// content stays byte-for-byte immutable.
#[must_use]
pub(crate) fn nav_region(model: &NavigationModel, page: &PageVersion) -> String {
    let mut out = String::new();
    out.push_str(NAV_START);
    out.push('\n');

    if let PageVersion::Archived(label) = page {
        let _ = write!(
            out,
            "<div class=\"version-notice\" role=\"note\">\n\
             This is an archived version ({label}) - see the \
             <a href=\"{}\">latest version</a>.\n\
             </div>\n",
            model.latest_href()
        );
    }

    let _ = write!(
        out,
        "<li id=\"version-dropdown\" class=\"nav-item dropdown\">\n\
         <a class=\"nav-link dropdown-toggle\" href=\"#\" id=\"nav-menu-versions\" \
         role=\"link\" data-bs-toggle=\"dropdown\" aria-expanded=\"false\">\n\
         <span class=\"menu-text\">Version:</span> \
         <span class=\"version-badge\" aria-hidden=\"true\">{}</span>\n\
         </a>\n\
         <ul class=\"dropdown-menu\" aria-labelledby=\"nav-menu-versions\">\n",
        page.badge()
    );

    for entry in model.entries() {
        let _ = write!(
            out,
            "<li><a class=\"dropdown-item\" href=\"{}\">\
             <span class=\"dropdown-text\">{}</span></a></li>\n",
            entry.href, entry.label
        );
    }

    let _ = write!(
        out,
        "<li><hr class=\"dropdown-divider\"></li>\n\
         <li><a class=\"dropdown-item\" href=\"{}\">\
         <span class=\"dropdown-text\">All versions</span></a></li>\n\
         </ul>\n\
         </li>\n",
        model.versions_href()
    );

    out.push_str(NAV_END);
    out
}

/// Human-readable date for a tag, falling back to the raw label.
///
/// Tags pass only syntactic range checks, so a label like `2024.02.30` may
/// not be a real date; those render as the label itself.
#[must_use]
pub(crate) fn human_date(year: u16, month: u8, day: u8, label: &str) -> String {
    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
        .map_or_else(|| label.to_owned(), |d| d.format("%B %d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_version::{Version, VersionRegistry};

    fn model(labels: &[&str]) -> NavigationModel {
        let registry = labels.iter().fold(VersionRegistry::default(), |r, l| {
            r.with_pending(Version::parse(l).unwrap())
        });
        NavigationModel::from_registry(&registry, "")
    }

    #[test]
    fn test_region_is_anchor_delimited() {
        let html = nav_region(&model(&["2024.06.01"]), &PageVersion::Latest);
        assert!(html.starts_with(NAV_START));
        assert!(html.ends_with(NAV_END));
    }

    #[test]
    fn test_region_lists_all_versions() {
        let html = nav_region(&model(&["2024.06.01", "2025.01.01"]), &PageVersion::Latest);
        assert!(html.contains("href=\"/index.html\""));
        assert!(html.contains("/archive/2025.01.01/index.html"));
        assert!(html.contains("/archive/2024.06.01/index.html"));
        assert!(html.contains("/versions.html"));
    }

    #[test]
    fn test_latest_page_has_no_notice() {
        let html = nav_region(&model(&["2024.06.01"]), &PageVersion::Latest);
        assert!(!html.contains("version-notice"));
        assert!(html.contains("version-badge\" aria-hidden=\"true\">Latest<"));
    }

    #[test]
    fn test_archived_page_gets_notice_and_badge() {
        let html = nav_region(
            &model(&["2024.06.01"]),
            &PageVersion::Archived("2024.06.01".to_owned()),
        );
        assert!(html.contains("version-notice"));
        assert!(html.contains("archived version (2024.06.01)"));
        assert!(html.contains("version-badge\" aria-hidden=\"true\">2024.06.01<"));
    }

    #[test]
    fn test_human_date_real_date() {
        assert_eq!(human_date(2024, 6, 1, "2024.06.01"), "June 01, 2024");
    }

    #[test]
    fn test_human_date_impossible_date_falls_back() {
        assert_eq!(human_date(2024, 2, 30, "2024.02.30"), "2024.02.30");
    }
}
