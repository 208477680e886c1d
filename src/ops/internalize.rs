//! Install script internalization.
//!
//! Rewrites every download cache URL found in `tools/chocolateyInstall.ps1`
//! to its internal mirror address. Each entry is handled independently: a
//! URL that is missing or a mirror that does not answer is reported, and the
//! remaining entries are still processed.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::download_cache::CacheEntry;
use crate::core::metadata::PackageMetadata;
use crate::sources::mirror::{MirrorCheck, MirrorPrefix};
use crate::util::fs::find_file_ignore_case;

/// Directory holding the install script, relative to the package root.
pub const TOOLS_DIR: &str = "tools";

/// Install script name (matched without regard to ASCII case).
pub const INSTALL_SCRIPT: &str = "chocolateyInstall.ps1";

/// What the substitution did for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Replacement {
    /// The upstream URL was found and rewritten
    Updated,
    /// The upstream URL was absent but the mirror URL was already present
    AlreadyUpdated,
    /// Neither URL appears in the script
    NotFound,
}

/// Result of validating the mirror URL for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorStatus {
    Reachable,
    Unreachable(String),
}

/// Outcome for a single download cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub url: String,
    pub target: String,
    pub replacement: Replacement,
    pub mirror: MirrorStatus,
}

/// Outcomes for every entry, in directive order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalizeReport {
    pub script: PathBuf,
    pub entries: Vec<EntryReport>,
}

impl InternalizeReport {
    pub fn count(&self, replacement: Replacement) -> usize {
        self.entries
            .iter()
            .filter(|e| e.replacement == replacement)
            .count()
    }

    pub fn unreachable(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.mirror, MirrorStatus::Unreachable(_)))
            .count()
    }

    /// Every URL was rewritten (now or before) and every mirror answered.
    pub fn is_complete(&self) -> bool {
        self.count(Replacement::NotFound) == 0 && self.unreachable() == 0
    }
}

/// Overall result of internalizing one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum InternalizeResult {
    /// The package has no install script to rewrite
    AlreadyInternal,
    /// The package declares no download cache
    NothingToInternalize,
    /// The script was processed and written back
    Rewritten(InternalizeReport),
}

impl InternalizeResult {
    pub fn report(&self) -> Option<&InternalizeReport> {
        match self {
            InternalizeResult::Rewritten(report) => Some(report),
            _ => None,
        }
    }
}

/// Locate the install script inside an unpacked package.
pub fn find_install_script(package_dir: &Path) -> Result<Option<PathBuf>> {
    find_file_ignore_case(&package_dir.join(TOOLS_DIR), INSTALL_SCRIPT)
}

/// Internalize the install script of `metadata`'s package, unpacked at
/// `package_dir`.
///
/// The download cache directive is only parsed once an install script has
/// been found, so a package without one is never rejected for its metadata.
pub fn internalize(
    package_dir: &Path,
    metadata: &PackageMetadata,
    prefix: &MirrorPrefix,
    mirror: &dyn MirrorCheck,
) -> Result<InternalizeResult> {
    let Some(script) = find_install_script(package_dir)? else {
        tracing::info!("{} is already internal", metadata);
        return Ok(InternalizeResult::AlreadyInternal);
    };

    let entries = metadata
        .download_cache()
        .with_context(|| format!("failed to parse download cache of {}", metadata))?;
    if entries.is_empty() {
        tracing::info!("{} had no download content to internalize", metadata);
        return Ok(InternalizeResult::NothingToInternalize);
    }

    let report = internalize_script(&script, &entries, prefix, mirror, metadata)?;
    Ok(InternalizeResult::Rewritten(report))
}

/// Rewrite one script file in place.
pub fn internalize_script(
    script: &Path,
    entries: &[CacheEntry],
    prefix: &MirrorPrefix,
    mirror: &dyn MirrorCheck,
    label: &dyn fmt::Display,
) -> Result<InternalizeReport> {
    let mut content = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read install script: {}", script.display()))?;

    let mut report = InternalizeReport {
        script: script.to_path_buf(),
        entries: Vec::with_capacity(entries.len()),
    };

    for entry in entries {
        let target = prefix.target_for(&entry.url);

        let mirror_status = match mirror.validate(&target) {
            Ok(()) => {
                tracing::info!("{} download cache {} validated", label, target);
                MirrorStatus::Reachable
            }
            Err(e) => {
                tracing::error!("{} download cache {} validate err: {}", label, target, e);
                MirrorStatus::Unreachable(e.to_string())
            }
        };

        let (rewritten, replacement) = replace_url(&content, &entry.url, &target);
        match replacement {
            Replacement::Updated => {
                tracing::info!(
                    "{} download cache updated {} => {}",
                    label,
                    entry.url,
                    target
                );
                content = rewritten;
            }
            Replacement::AlreadyUpdated => {
                tracing::warn!("{} download cache {} already updated", label, target);
            }
            Replacement::NotFound => {
                tracing::error!("{} download cache {} not found", label, entry.url);
            }
        }

        report.entries.push(EntryReport {
            url: entry.url.clone(),
            target,
            replacement,
            mirror: mirror_status,
        });
    }

    std::fs::write(script, &content)
        .with_context(|| format!("failed to write install script: {}", script.display()))?;

    Ok(report)
}

/// Replace every occurrence of `url` with `target` and classify the result.
pub fn replace_url(content: &str, url: &str, target: &str) -> (String, Replacement) {
    let rewritten = content.replace(url, target);
    let replacement = if rewritten != content {
        Replacement::Updated
    } else if content.contains(target) {
        Replacement::AlreadyUpdated
    } else {
        Replacement::NotFound
    };
    (rewritten, replacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PackageError;
    use crate::test_support::{demo_metadata, StubMirror};
    use std::fs;
    use tempfile::TempDir;

    const PREFIX: &str = "https://mirror.local/";
    const X_ONLY: &str = "http://a.test/x.zip^tools/x.zip^abc123";
    const X_AND_Y: &str = "http://a.test/x.zip^tools/x.zip^1|https://b.test/y.msi^tools/y.msi^2";
    const MISSING_CHECKSUM: &str = "http://a.test/x.zip^tools/x.zip";

    fn package_with_script(script: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let tools = tmp.path().join("tools");
        fs::create_dir_all(&tools).unwrap();
        let path = tools.join("chocolateyInstall.ps1");
        fs::write(&path, script).unwrap();
        (tmp, path)
    }

    fn try_run(dir: &Path, cache: &str, mirror: &StubMirror) -> Result<InternalizeResult> {
        internalize(dir, &demo_metadata(cache), &MirrorPrefix::new(PREFIX), mirror)
    }

    fn run(dir: &Path, cache: &str, mirror: &StubMirror) -> InternalizeResult {
        try_run(dir, cache, mirror).unwrap()
    }

    #[test]
    fn test_rewrites_url() {
        let (tmp, script) = package_with_script(
            "$url = 'http://a.test/x.zip'\nInstall-ChocolateyZipPackage -Url $url\n",
        );

        let result = run(tmp.path(), X_ONLY, &StubMirror::reachable());
        let report = result.report().unwrap();

        let content = fs::read_to_string(&script).unwrap();
        assert!(content.contains("https://mirror.local/http/a.test/x.zip"));
        assert!(!content.contains("http://a.test/x.zip"));
        assert_eq!(report.entries[0].replacement, Replacement::Updated);
        assert!(report.is_complete());
    }

    #[test]
    fn test_missing_script_is_already_internal() {
        let tmp = TempDir::new().unwrap();

        let mirror = StubMirror::reachable();
        let result = run(tmp.path(), X_ONLY, &mirror);

        assert_eq!(result, InternalizeResult::AlreadyInternal);
        assert!(mirror.calls().is_empty());
    }

    #[test]
    fn test_missing_script_ignores_malformed_directive() {
        let tmp = TempDir::new().unwrap();

        let result = run(tmp.path(), MISSING_CHECKSUM, &StubMirror::reachable());
        assert_eq!(result, InternalizeResult::AlreadyInternal);
    }

    #[test]
    fn test_malformed_directive_leaves_script_untouched() {
        let (tmp, script) = package_with_script("'http://a.test/x.zip'");

        let err = try_run(tmp.path(), MISSING_CHECKSUM, &StubMirror::reachable()).unwrap_err();

        assert!(format!("{:#}", err).contains("failed to parse download cache of demo.1.0.0"));
        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::MalformedDirective { .. })
        ));
        assert_eq!(fs::read_to_string(script).unwrap(), "'http://a.test/x.zip'");
    }

    #[test]
    fn test_empty_cache_is_noop() {
        let (tmp, script) = package_with_script("Write-Host 'hi'");

        let result = run(tmp.path(), "", &StubMirror::reachable());

        assert_eq!(result, InternalizeResult::NothingToInternalize);
        assert_eq!(fs::read_to_string(script).unwrap(), "Write-Host 'hi'");
    }

    #[test]
    fn test_script_name_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("tools")).unwrap();
        let script = tmp.path().join("tools").join("ChocolateyInstall.ps1");
        fs::write(&script, "http://a.test/x.zip").unwrap();

        let result = run(tmp.path(), X_ONLY, &StubMirror::reachable());

        assert!(matches!(result, InternalizeResult::Rewritten(_)));
        assert_eq!(
            fs::read_to_string(script).unwrap(),
            "https://mirror.local/http/a.test/x.zip"
        );
    }

    #[test]
    fn test_not_found_leaves_content_identical() {
        let original = "Write-Host 'nothing to see'\r\n";
        let (tmp, script) = package_with_script(original);

        let result = run(tmp.path(), X_AND_Y, &StubMirror::reachable());
        let report = result.report().unwrap();

        assert_eq!(fs::read(&script).unwrap(), original.as_bytes());
        assert_eq!(report.count(Replacement::NotFound), 2);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_already_updated() {
        let original =
            "a https://mirror.local/http/a.test/x.zip b https://mirror.local/https/b.test/y.msi";
        let (tmp, script) = package_with_script(original);

        let result = run(tmp.path(), X_AND_Y, &StubMirror::reachable());
        let report = result.report().unwrap();

        assert_eq!(fs::read_to_string(&script).unwrap(), original);
        assert_eq!(report.count(Replacement::AlreadyUpdated), 2);
        assert!(report.is_complete());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let (tmp, script) = package_with_script(
            "$a = 'http://a.test/x.zip'; $b = 'https://b.test/y.msi'; $c = 'http://a.test/x.zip'",
        );
        let mirror = StubMirror::reachable();

        let first = run(tmp.path(), X_AND_Y, &mirror);
        assert_eq!(first.report().unwrap().count(Replacement::Updated), 2);
        let after_first = fs::read_to_string(&script).unwrap();

        let second = run(tmp.path(), X_AND_Y, &mirror);
        let report = second.report().unwrap();
        assert_eq!(report.count(Replacement::AlreadyUpdated), 2);

        let after_second = fs::read_to_string(&script).unwrap();
        assert_eq!(after_first, after_second);
        assert!(!after_second.contains("'http://a.test/x.zip'"));
        assert!(!after_second.contains("'https://b.test/y.msi'"));
    }

    #[test]
    fn test_unreachable_mirror_does_not_abort() {
        let (tmp, script) = package_with_script("'http://a.test/x.zip' 'http://a.test/z.zip'");
        let cache = "http://a.test/x.zip^tools/x.zip^1|http://a.test/z.zip^tools/z.zip^2";
        let mirror = StubMirror::unreachable(&["https://mirror.local/http/a.test/x.zip"]);

        let result = run(tmp.path(), cache, &mirror);
        let report = result.report().unwrap();

        assert!(matches!(report.entries[0].mirror, MirrorStatus::Unreachable(_)));
        assert_eq!(report.entries[1].mirror, MirrorStatus::Reachable);
        assert_eq!(report.count(Replacement::Updated), 2);
        assert_eq!(report.unreachable(), 1);
        assert_eq!(
            mirror.calls(),
            vec![
                "https://mirror.local/http/a.test/x.zip".to_string(),
                "https://mirror.local/http/a.test/z.zip".to_string(),
            ]
        );

        let content = fs::read_to_string(script).unwrap();
        assert!(content.contains("https://mirror.local/http/a.test/x.zip"));
        assert!(content.contains("https://mirror.local/http/a.test/z.zip"));
    }

    #[test]
    fn test_replace_url() {
        let (rewritten, replacement) = replace_url("x u x u", "u", "T");
        assert_eq!(rewritten, "x T x T");
        assert_eq!(replacement, Replacement::Updated);
        assert_eq!(replace_url("T", "u", "T").1, Replacement::AlreadyUpdated);
        assert_eq!(replace_url("z", "u", "T").1, Replacement::NotFound);
    }

    #[test]
    fn test_report_serializes() {
        let report = InternalizeReport {
            script: PathBuf::from("tools/chocolateyInstall.ps1"),
            entries: vec![EntryReport {
                url: "http://a.test/x.zip".to_string(),
                target: "https://mirror.local/http/a.test/x.zip".to_string(),
                replacement: Replacement::AlreadyUpdated,
                mirror: MirrorStatus::Unreachable("HTTP 404".to_string()),
            }],
        };
        let json = serde_json::to_string(&InternalizeResult::Rewritten(report)).unwrap();
        assert!(json.contains(r#""status":"rewritten""#));
        assert!(json.contains(r#""replacement":"already-updated""#));
        assert!(json.contains(r#""unreachable":"HTTP 404""#));
    }
}
