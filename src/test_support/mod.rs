//! Test utilities and fakes for unit tests.
//!
//! The pipeline talks to three remote services (the upstream feed, the
//! mirror, the push target). Each has an in-memory stand-in here so tests
//! never reach the network.

pub mod fixtures;

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

pub use fixtures::*;

use crate::core::errors::PackageError;
use crate::core::metadata::PackageMetadata;
use crate::ops::push::Publisher;
use crate::sources::feed::PackageFeed;
use crate::sources::mirror::MirrorCheck;
use crate::util::ids::IdGenerator;

/// Mirror check that records every URL it is asked about.
#[derive(Debug, Default)]
pub struct StubMirror {
    unreachable: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl StubMirror {
    /// Every URL validates.
    pub fn reachable() -> Self {
        Self::default()
    }

    /// Only the listed URLs fail validation.
    pub fn unreachable(urls: &[&str]) -> Self {
        StubMirror {
            unreachable: urls.iter().map(|u| u.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl MirrorCheck for StubMirror {
    fn validate(&self, url: &str) -> Result<(), PackageError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.unreachable.iter().any(|u| u == url) {
            return Err(PackageError::UnreachableMirror {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }
        Ok(())
    }
}

/// Deterministic ids: `pattern` repeated to the requested length.
#[derive(Debug, Clone)]
pub struct FixedIds {
    pattern: String,
}

impl FixedIds {
    pub fn new(pattern: &str) -> Self {
        FixedIds {
            pattern: pattern.to_string(),
        }
    }
}

impl IdGenerator for FixedIds {
    fn hex(&self, len: usize) -> String {
        self.pattern.chars().cycle().take(len).collect()
    }
}

/// A feed holding exactly one package.
#[derive(Debug)]
pub struct MemoryFeed {
    metadata: PackageMetadata,
    archive: Vec<u8>,
    downloads: AtomicUsize,
}

impl MemoryFeed {
    pub fn new(metadata: PackageMetadata, archive: Vec<u8>) -> Self {
        MemoryFeed {
            metadata,
            archive,
            downloads: AtomicUsize::new(0),
        }
    }

    /// Number of archive downloads served.
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl PackageFeed for MemoryFeed {
    fn metadata(&self, id: &str, version: &str) -> Result<PackageMetadata> {
        if !self.metadata.title.eq_ignore_ascii_case(id) || self.metadata.version != version {
            bail!("package {} {} not found", id, version);
        }
        Ok(self.metadata.clone())
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64> {
        if url != self.metadata.content_src {
            bail!("no package at {}", url);
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);
        out.write_all(&self.archive)?;
        Ok(self.archive.len() as u64)
    }
}

/// One recorded publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub source: String,
    pub api_key: Option<String>,
    pub package: Vec<u8>,
}

/// Publisher that keeps what it was given.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pushes: Mutex<Vec<PushRecord>>,
}

impl RecordingPublisher {
    pub fn pushes(&self) -> Vec<PushRecord> {
        self.pushes.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, source: &str, api_key: Option<&str>, package: Vec<u8>) -> Result<()> {
        self.pushes.lock().unwrap().push(PushRecord {
            source: source.to_string(),
            api_key: api_key.map(str::to_string),
            package,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_ids() {
        let ids = FixedIds::new("ab");
        assert_eq!(ids.hex(5), "ababa");
        assert_eq!(ids.hex(0), "");
    }

    #[test]
    fn test_demo_package_layout() {
        let data = demo_package(Some("script"));
        let entries = nupkg_entries(&data);
        assert_eq!(entries[0], "demo.nuspec");
        assert_eq!(read_entry(&data, "tools/chocolateyInstall.ps1"), "script");
    }
}
