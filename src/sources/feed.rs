//! Upstream package feed access.

use std::io::Write;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::metadata::PackageMetadata;
use crate::util::config::DEFAULT_FEED_URL;

/// A feed that serves package metadata and package archives.
pub trait PackageFeed {
    /// Look up one published package version.
    fn metadata(&self, id: &str, version: &str) -> Result<PackageMetadata>;

    /// Stream the archive at `url` into `out`, returning the byte count.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64>;
}

/// An OData v2 feed such as the Chocolatey community repository.
pub struct ODataFeed {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ODataFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        ODataFeed {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// URL of the entry describing `id` at `version`.
    pub fn entry_url(&self, id: &str, version: &str) -> String {
        format!(
            "{}/Packages(Id='{}',Version='{}')",
            self.base_url.trim_end_matches('/'),
            id,
            version
        )
    }
}

impl Default for ODataFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

impl PackageFeed for ODataFeed {
    fn metadata(&self, id: &str, version: &str) -> Result<PackageMetadata> {
        let url = self.entry_url(id, version);
        tracing::debug!("Fetching package metadata from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("failed to request package metadata from {}", url))?;

        if !response.status().is_success() {
            bail!("failed to fetch {}: HTTP {}", url, response.status());
        }

        let body = response
            .text()
            .with_context(|| format!("failed to read metadata response from {}", url))?;

        PackageMetadata::from_entry_xml(&body)
            .with_context(|| format!("failed to decode package metadata from {}", url))
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to download package from {}", url))?;

        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }

        let bar = match response.content_length() {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) =
            ProgressStyle::with_template("  {bar:30} {bytes}/{total_bytes} {bytes_per_sec}")
        {
            bar.set_style(style);
        }

        let written = response
            .copy_to(&mut bar.wrap_write(out))
            .with_context(|| format!("failed to read package body from {}", url))?;
        bar.finish_and_clear();

        tracing::debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
