//! Publishing a package archive to a NuGet-compatible feed.

use std::path::Path;

use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};

use crate::core::errors::PackageError;

/// Header carrying the feed API key.
pub const API_KEY_HEADER: &str = "X-NuGet-ApiKey";

/// Uploads a packed archive.
pub trait Publisher {
    fn publish(&self, source: &str, api_key: Option<&str>, package: Vec<u8>) -> Result<()>;
}

/// Publishes with a multipart `PUT`, as NuGet v2 servers expect.
pub struct FeedPublisher {
    client: reqwest::blocking::Client,
}

impl FeedPublisher {
    pub fn new() -> Self {
        FeedPublisher {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for FeedPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for FeedPublisher {
    fn publish(&self, source: &str, api_key: Option<&str>, package: Vec<u8>) -> Result<()> {
        if source.is_empty() {
            bail!("no push source specified");
        }

        let part = Part::bytes(package)
            .file_name("package.nupkg")
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("package", part);

        let mut request = self.client.put(source).multipart(form);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .with_context(|| format!("failed to send package to {}", source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackageError::PublishRejected {
                url: source.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(())
    }
}

/// Read `path` and hand it to `publisher`.
pub fn push_file(
    publisher: &dyn Publisher,
    path: &Path,
    source: &str,
    api_key: Option<&str>,
) -> Result<()> {
    let package = std::fs::read(path)
        .with_context(|| format!("failed to read package: {}", path.display()))?;

    tracing::info!("Pushing {} to {}", path.display(), source);
    publisher.publish(source, api_key, package)?;
    tracing::info!("Pushed {} to {}", path.display(), source);
    Ok(())
}
