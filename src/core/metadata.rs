//! Remote package metadata.
//!
//! The community repository is an OData v2 feed. Asking it for
//! `Packages(Id='<id>',Version='<version>')` returns a single Atom entry:
//!
//! ```text
//! <entry xmlns:d=".../dataservices" xmlns:m=".../dataservices/metadata">
//!   <title type="text">ActivePerl</title>
//!   <content type="application/zip" src="https://.../package/ActivePerl/5.24.2.2403"/>
//!   <m:properties>
//!     <d:Version>5.24.2.2403</d:Version>
//!     <d:DownloadCache>url^path^checksum|...</d:DownloadCache>
//!   </m:properties>
//! </entry>
//! ```
//!
//! Elements are matched on local names, so the prefixes the feed happens to
//! use do not matter.

use std::fmt;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::download_cache::{parse_download_cache, CacheEntry};
use crate::core::errors::PackageError;

/// The subset of a feed entry the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package title; also the base name of the nuspec inside the package
    pub title: String,

    /// Package version as published
    pub version: String,

    /// Download URL of the `.nupkg`
    pub content_src: String,

    /// Raw download cache directive (empty when the feed has none)
    pub download_cache: String,
}

impl PackageMetadata {
    /// Decode a feed entry document.
    pub fn from_entry_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut title: Option<String> = None;
        let mut version: Option<String> = None;
        let mut content_src: Option<String> = None;
        let mut download_cache: Option<String> = None;

        loop {
            let event = reader
                .read_event()
                .with_context(|| {
                    format!("malformed feed entry at byte {}", reader.buffer_position())
                })?;

            match event {
                Event::Start(e) => {
                    path.push(local_name(&e));
                    if ends_with(&path, &["entry", "content"]) && content_src.is_none() {
                        content_src = content_source(&e)?;
                    }
                }
                Event::Empty(e) => {
                    path.push(local_name(&e));
                    if ends_with(&path, &["entry", "content"]) && content_src.is_none() {
                        content_src = content_source(&e)?;
                    }
                    path.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape().context("invalid text in feed entry")?;
                    let slot = if ends_with(&path, &["entry", "title"]) {
                        &mut title
                    } else if ends_with(&path, &["properties", "Version"]) {
                        &mut version
                    } else if ends_with(&path, &["properties", "DownloadCache"]) {
                        &mut download_cache
                    } else {
                        continue;
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
                Event::End(_) => {
                    // One entry is all we read; a feed with several keeps the first.
                    if path.last().map(String::as_str) == Some("entry") && title.is_some() {
                        break;
                    }
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let title = title.ok_or(PackageError::MissingMetadata { field: "title" })?;
        let content_src = content_src.ok_or(PackageError::MissingMetadata {
            field: "content@src",
        })?;

        Ok(PackageMetadata {
            title,
            version: version.unwrap_or_default(),
            content_src,
            download_cache: download_cache.unwrap_or_default(),
        })
    }

    /// Parse the download cache directive attached to this package.
    pub fn download_cache(&self) -> Result<Vec<CacheEntry>, PackageError> {
        parse_download_cache(&self.download_cache)
    }

    /// File name of the manifest inside the unpacked package.
    pub fn nuspec_file_name(&self) -> String {
        format!("{}.nuspec", self.title)
    }

    /// File name used for the repacked archive.
    pub fn nupkg_file_name(&self) -> String {
        format!("{}.{}.nupkg", self.title, self.version)
    }
}

impl fmt::Display for PackageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.title, self.version)
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn ends_with(path: &[String], tail: &[&str]) -> bool {
    path.len() >= tail.len()
        && path[path.len() - tail.len()..]
            .iter()
            .zip(tail)
            .all(|(a, b)| a == b)
}

fn content_source(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.context("invalid attribute on <content>")?;
        if attr.key.local_name().as_ref() == b"src" {
            let value = attr
                .unescape_value()
                .context("invalid content source attribute")?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
