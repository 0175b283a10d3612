//! Version navigation synthesis.
//!
//! Every rendered page carries a navigation region delimited by the
//! [`NAV_START`]/[`NAV_END`] anchors. This crate regenerates that region on
//! every publish so the version selector always reflects the registry, and
//! regenerates the versions listing page enumerating all known versions.
//!
//! Pages are treated as two disjoint parts: an immutable body and a
//! replaceable navigation region. Rewriting is a pure function over the
//! region, so applying it twice with the same registry produces
//! byte-identical output, and archived pages can keep current navigation
//! without their content ever changing.

mod markup;
mod model;
mod rewrite;
mod versions_page;

pub use model::{NavEntry, NavigationModel, PageVersion};
pub use rewrite::{NavError, PageFailure, RewriteOutcome, rewrite_tree};
pub use versions_page::{VERSIONS_PAGE, write_versions_page};

/// Anchor opening the replaceable navigation region.
pub const NAV_START: &str = "<!-- VERSION_NAV_START -->";

/// Anchor closing the replaceable navigation region.
pub const NAV_END: &str = "<!-- VERSION_NAV_END -->";
