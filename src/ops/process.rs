//! The end-to-end repackaging pipeline.
//!
//! One run handles one package version, strictly in sequence: fetch
//! metadata, download and unpack, internalize the install script, repack,
//! and optionally push. Scratch directories are scoped to the run and go
//! away on every exit path unless the caller asked to keep them.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::errors::PackageError;
use crate::core::metadata::PackageMetadata;
use crate::core::nuspec::NuSpec;
use crate::ops::internalize::{internalize, InternalizeResult, Replacement};
use crate::ops::pack::pack;
use crate::ops::push::Publisher;
use crate::sources::archive::unpack_package;
use crate::sources::feed::PackageFeed;
use crate::sources::mirror::{MirrorCheck, MirrorPrefix};
use crate::util::config::Config;
use crate::util::fs::{ensure_dir, write_string, ScratchDir};
use crate::util::hash::sha256_file;
use crate::util::ids::IdGenerator;

const WORK_DIR_PREFIX: &str = "choco-internalize-";
const OUTPUT_DIR_PREFIX: &str = "choco-internalize-out-";
const SOURCE_ARCHIVE: &str = "source.nupkg";
const UNPACK_DIR: &str = "package";

/// Where and how to publish the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub source: String,
    pub api_key: Option<String>,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub mirror_prefix: MirrorPrefix,
    pub keep_temp: bool,
    pub strict: bool,
    pub output_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub push: Option<PushTarget>,
}

impl ProcessOptions {
    pub fn new(mirror_prefix: impl Into<String>) -> Self {
        ProcessOptions {
            mirror_prefix: MirrorPrefix::new(mirror_prefix),
            keep_temp: false,
            strict: false,
            output_dir: None,
            report_path: None,
            push: None,
        }
    }

    /// Build options from a merged, validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        // validate() guarantees a prefix.
        let prefix = config.mirror_prefix().unwrap_or_default();
        let push = config.push.enabled.then(|| PushTarget {
            source: config.push.source.clone().unwrap_or_default(),
            api_key: config.push.api_key.clone().filter(|k| !k.is_empty()),
        });

        Ok(ProcessOptions {
            mirror_prefix: MirrorPrefix::new(prefix),
            keep_temp: config.run.keep_temp,
            strict: config.run.strict,
            output_dir: config.run.output_dir.clone(),
            report_path: None,
            push,
        })
    }

    pub fn with_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }
}

/// The external services a run talks to.
pub struct Collaborators<'a> {
    pub feed: &'a dyn PackageFeed,
    pub mirror: &'a dyn MirrorCheck,
    pub ids: &'a dyn IdGenerator,
    pub publisher: &'a dyn Publisher,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub metadata: PackageMetadata,
    pub internalize: InternalizeResult,
    /// Path of the repacked archive; only present on disk when `retained`.
    pub package: PathBuf,
    pub retained: bool,
    pub size: u64,
    pub sha256: String,
    pub pushed: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    package: &'a str,
    version: &'a str,
    result: &'a InternalizeResult,
}

/// Repackage `id` at `version` with internalized downloads.
pub fn process_package(
    opts: &ProcessOptions,
    with: &Collaborators<'_>,
    id: &str,
    version: &str,
) -> Result<ProcessOutcome> {
    let metadata = with
        .feed
        .metadata(id, version)
        .with_context(|| format!("failed to fetch metadata for {} {}", id, version))?;

    let work = ScratchDir::new(WORK_DIR_PREFIX, opts.keep_temp)?;
    let package_dir = work.join(UNPACK_DIR);

    tracing::info!("Downloading {}", metadata);
    fetch_and_unpack(with.feed, &metadata, &work, &package_dir)?;
    tracing::info!("Downloaded {} to {}", metadata, package_dir.display());

    let result = internalize(&package_dir, &metadata, &opts.mirror_prefix, with.mirror)
        .with_context(|| format!("failed to internalize {}", metadata))?;

    if let Some(path) = &opts.report_path {
        write_report(path, &metadata, &result)?;
    }

    if opts.strict {
        if let Some(report) = result.report().filter(|r| !r.is_complete()) {
            return Err(PackageError::IncompleteInternalization {
                not_found: report.count(Replacement::NotFound),
                unreachable: report.unreachable(),
            }
            .into());
        }
    }

    let spec_path = package_dir.join(metadata.nuspec_file_name());
    let spec = NuSpec::load(&spec_path)?;

    let output_scratch;
    let output_dir: &Path = match &opts.output_dir {
        Some(dir) => {
            ensure_dir(dir)?;
            dir
        }
        None => {
            output_scratch = ScratchDir::new(OUTPUT_DIR_PREFIX, opts.keep_temp)?;
            output_scratch.path()
        }
    };
    let retained = opts.output_dir.is_some() || opts.keep_temp;

    let package = output_dir.join(metadata.nupkg_file_name());
    tracing::info!("Repacking {} to {}", metadata, package.display());
    write_package(&spec, &package_dir, &package, with.ids)?;

    let size = fs::metadata(&package)
        .with_context(|| format!("failed to stat package: {}", package.display()))?
        .len();
    let sha256 = sha256_file(&package)?;
    tracing::info!("Packed {} ({} bytes, sha256 {})", metadata, size, sha256);

    let mut pushed = false;
    if let Some(target) = &opts.push {
        tracing::info!("Pushing {} to {}", metadata, target.source);
        let bytes = fs::read(&package)
            .with_context(|| format!("failed to read package: {}", package.display()))?;
        with.publisher
            .publish(&target.source, target.api_key.as_deref(), bytes)
            .with_context(|| format!("failed to push {}", metadata))?;
        tracing::info!("Pushed {} to {}", metadata, target.source);
        pushed = true;
    }

    Ok(ProcessOutcome {
        metadata,
        internalize: result,
        package,
        retained,
        size,
        sha256,
        pushed,
    })
}

fn fetch_and_unpack(
    feed: &dyn PackageFeed,
    metadata: &PackageMetadata,
    work: &ScratchDir,
    dest: &Path,
) -> Result<()> {
    let archive = work.join(SOURCE_ARCHIVE);
    {
        let file = File::create(&archive)
            .with_context(|| format!("failed to create file: {}", archive.display()))?;
        let mut out = BufWriter::new(file);
        feed.download(&metadata.content_src, &mut out)
            .with_context(|| format!("failed to download {}", metadata.content_src))?;
        out.flush()
            .with_context(|| format!("failed to write file: {}", archive.display()))?;
    }

    let file = File::open(&archive)
        .with_context(|| format!("failed to open file: {}", archive.display()))?;
    let count = unpack_package(BufReader::new(file), dest)
        .with_context(|| format!("failed to unpack {}", metadata))?;
    tracing::debug!("Unpacked {} files from {}", count, archive.display());
    Ok(())
}

fn write_package(
    spec: &NuSpec,
    package_dir: &Path,
    path: &Path,
    ids: &dyn IdGenerator,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    pack(spec, package_dir, &mut out, ids)
        .with_context(|| format!("failed to pack {}", path.display()))?;
    out.flush()
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

fn write_report(path: &Path, metadata: &PackageMetadata, result: &InternalizeResult) -> Result<()> {
    let report = RunReport {
        package: &metadata.title,
        version: &metadata.version,
        result,
    };
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    write_string(path, &json)?;
    tracing::info!("Wrote report to {}", path.display());
    Ok(())
}
