//! Domain error types.
//!
//! I/O failures are carried as `anyhow::Error` with context attached at each
//! stage boundary. The variants here are the failures callers may want to
//! match on.

use thiserror::Error;

/// Error raised by one of the packaging stages.
#[derive(Debug, Error)]
pub enum PackageError {
    /// A download cache record did not split into `url^path^checksum`.
    #[error("unknown download cache: `{record}`")]
    MalformedDirective { record: String },

    /// A mirror probe did not come back with `200 OK`.
    #[error("download cache {url} is unreachable: {reason}")]
    UnreachableMirror { url: String, reason: String },

    /// The feed refused a pushed package.
    #[error("push to {url} rejected with HTTP {status}")]
    PublishRejected { url: String, status: u16 },

    /// The feed entry lacked a field the pipeline depends on.
    #[error("package metadata is missing `{field}`")]
    MissingMetadata { field: &'static str },

    /// Strict mode found entries that could not be internalized.
    #[error(
        "internalization incomplete: {not_found} url(s) not found, {unreachable} mirror(s) unreachable"
    )]
    IncompleteInternalization { not_found: usize, unreachable: usize },
}
