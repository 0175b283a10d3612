//! Version tag parsing and archive registry.
//!
//! A published site consists of a "latest" build plus an archive of
//! previously tagged builds, one directory per version under the archive
//! root. This crate owns the two pure pieces of that model:
//!
//! - [`Version`]: a validated `YYYY.MM.DD` tag with total ordering
//! - [`VersionRegistry`]: the set of versions derived from the archive
//!   directory's actual contents
//!
//! The registry is recomputed from disk on every run and never persisted,
//! so the listing can never drift from what actually exists.

mod registry;
mod version;

/// Name of the directory holding archived versions, relative to the
/// publication tree root.
pub const ARCHIVE_DIR: &str = "archive";

pub use registry::{RegistryError, VersionRegistry};
pub use version::{Version, VersionError};
