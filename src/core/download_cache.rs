//! Download cache directive parsing.
//!
//! The community feed publishes a `DownloadCache` property on packages whose
//! install scripts fetch payloads from the internet:
//!
//! ```text
//! https://host/a.zip^tools/a.zip^<checksum>|https://host/b.msi^tools/b.msi^<checksum>
//! ```

use serde::Serialize;

use crate::core::errors::PackageError;

/// Separator between records.
pub const RECORD_SEPARATOR: char = '|';

/// Separator between the fields of one record.
pub const FIELD_SEPARATOR: char = '^';

/// One externally hosted payload referenced by an install script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Original download URL
    pub url: String,

    /// Path of the cached file relative to the package
    pub path: String,

    /// Checksum as published; never verified
    pub checksum: String,
}

/// Parse a download cache directive.
///
/// Returns an empty list for an empty directive. Empty records are skipped;
/// any other record must have exactly three fields and a non-empty URL or
/// the whole parse fails.
pub fn parse_download_cache(directive: &str) -> Result<Vec<CacheEntry>, PackageError> {
    if directive.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for record in directive.split(RECORD_SEPARATOR) {
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
        let (url, path, checksum) = match fields.as_slice() {
            [url, path, checksum] if !url.trim().is_empty() => (url, path, checksum),
            _ => {
                return Err(PackageError::MalformedDirective {
                    record: record.to_string(),
                })
            }
        };

        entries.push(CacheEntry {
            url: url.to_string(),
            path: path.to_string(),
            checksum: checksum.to_string(),
        });
    }

    Ok(entries)
}
