//! Generated versions listing page.

use std::fmt::Write;
use std::io;
use std::path::Path;

use verso_version::VersionRegistry;

use crate::markup::human_date;
use crate::model::NavigationModel;
use crate::{NAV_END, NAV_START};

/// Fixed path of the versions listing page, relative to the tree root.
pub const VERSIONS_PAGE: &str = "versions.html";

/// Write the versions listing page at the tree root.
///
/// The page is regenerated in full on every run from the registry, so the
/// listing can never go stale or accumulate removed entries. It carries the
/// standard navigation anchors and picks up its dropdown in the same
/// rewrite pass as every other page.
///
/// # Errors
///
/// Returns an error if the page cannot be written.
pub fn write_versions_page(
    tree: &Path,
    registry: &VersionRegistry,
    model: &NavigationModel,
) -> io::Result<()> {
    let content = render(registry, model);
    std::fs::write(tree.join(VERSIONS_PAGE), content)
}

fn render(registry: &VersionRegistry, model: &NavigationModel) -> String {
    let mut items = String::new();

    let _ = write!(
        items,
        "<div class=\"list-group-item list-group-item-action\">\n\
         <div class=\"d-flex w-100 justify-content-between\">\n\
         <h5 class=\"mb-1 anchored\">Latest Version</h5>\n\
         <p><small class=\"text-muted\">Current</small></p>\n\
         </div>\n\
         <p><a href=\"{}\">View Latest Version</a></p>\n\
         </div>\n",
        model.latest_href()
    );

    for version in registry.versions() {
        let label = version.label();
        let date = human_date(version.year(), version.month(), version.day(), label);
        let _ = write!(
            items,
            "\n<div class=\"list-group-item list-group-item-action\">\n\
             <div class=\"d-flex w-100 justify-content-between\">\n\
             <h5 class=\"mb-1 anchored\">Version {label}</h5>\n\
             <p><small class=\"text-muted\">{date}</small></p>\n\
             </div>\n\
             <p><a href=\"{}/archive/{label}/index.html\">View Version {label}</a></p>\n\
             </div>\n",
            model.prefix()
        );
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Versions</title>\n\
         </head>\n\
         <body>\n\
         <nav class=\"navbar\"><ul class=\"navbar-nav\">\n\
         {NAV_START}\n\
         {NAV_END}\n\
         </ul></nav>\n\
         <main class=\"content\">\n\
         <h1>Versions</h1>\n\
         <div class=\"list-group\">\n\
         {items}\
         </div>\n\
         </main>\n\
         </body>\n\
         </html>\n"
    )
}
