//! Core data structures.
//!
//! - The `.nuspec` manifest model
//! - Feed metadata and its download cache directive
//! - Domain errors

pub mod download_cache;
pub mod errors;
pub mod metadata;
pub mod nuspec;

pub use download_cache::{parse_download_cache, CacheEntry};
pub use errors::PackageError;
pub use metadata::PackageMetadata;
pub use nuspec::{FileRule, NuSpec};
