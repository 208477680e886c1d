//! choco-internalize - repackage community Chocolatey packages for an
//! internal feed.
//!
//! A package is fetched from an upstream OData feed, the download URLs in its
//! install script are rewritten to point at an internal mirror, and the
//! result is repacked as a `.nupkg` that can be pushed to a private feed.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Fakes and fixtures for unit tests.
///
/// Only compiled for tests. Provides in-memory stand-ins for the feed, the
/// mirror and the push target.
#[cfg(test)]
pub mod test_support;

pub use core::{CacheEntry, NuSpec, PackageError, PackageMetadata};
pub use ops::{pack, process_package, Collaborators, ProcessOptions, ProcessOutcome};
pub use util::config::Config;
