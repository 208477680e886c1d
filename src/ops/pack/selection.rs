//! Choosing which files go into a package.

use std::collections::HashMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use anyhow::{Context, Result};
use glob::Pattern;
use walkdir::WalkDir;

use crate::core::nuspec::{FileRule, NuSpec};
use crate::sources::archive::is_packaging_part;
use crate::util::fs::{archive_name, relative_path};

/// A payload file and where it lands in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub source: PathBuf,
    pub archive_path: String,
}

/// How the payload is chosen.
#[derive(Debug, Clone, Copy)]
pub enum FileSelection<'a> {
    /// No rules declared: everything under the source directory.
    All,
    /// Explicit `<file>` rules, expanded in order.
    Rules(&'a [FileRule]),
}

impl<'a> FileSelection<'a> {
    pub fn for_spec(spec: &'a NuSpec) -> Self {
        match spec.file_rules() {
            [] => FileSelection::All,
            rules => FileSelection::Rules(rules),
        }
    }

    /// Resolve the selection against `dir`, never including `manifest_name`
    /// or a packaging part the writer generates itself.
    pub fn select(&self, dir: &Path, manifest_name: &str) -> Result<Vec<SelectedFile>> {
        let mut set = SelectionSet::default();
        match self {
            FileSelection::All => walk_all(dir, manifest_name, &mut set)?,
            FileSelection::Rules(rules) => {
                for rule in rules.iter() {
                    expand_rule(dir, rule, manifest_name, &mut set)?;
                }
            }
        }
        Ok(set.files)
    }
}

/// Ordered files keyed by archive path; a repeated path keeps its first
/// position but takes the newer source.
#[derive(Default)]
struct SelectionSet {
    files: Vec<SelectedFile>,
    index: HashMap<String, usize>,
}

impl SelectionSet {
    fn insert(&mut self, file: SelectedFile) {
        if is_packaging_part(&file.archive_path) {
            tracing::debug!("Skipping packaging part {}", file.source.display());
            return;
        }
        match self.index.get(&file.archive_path) {
            Some(&i) => {
                tracing::debug!(
                    "{} matched again, using {}",
                    file.archive_path,
                    file.source.display()
                );
                self.files[i] = file;
            }
            None => {
                self.index.insert(file.archive_path.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }
}

fn is_manifest(path: &Path, manifest_name: &str) -> bool {
    path.file_name().is_some_and(|name| name == manifest_name)
}

fn walk_all(dir: &Path, manifest_name: &str, set: &mut SelectionSet) -> Result<()> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || is_manifest(path, manifest_name) {
            continue;
        }
        set.insert(SelectedFile {
            source: path.to_path_buf(),
            archive_path: archive_name(&relative_path(dir, path)),
        });
    }
    Ok(())
}

fn expand_rule(
    dir: &Path,
    rule: &FileRule,
    manifest_name: &str,
    set: &mut SelectionSet,
) -> Result<()> {
    let excludes = exclude_patterns(rule)?;
    let pattern = format!(
        "{}{}{}",
        Pattern::escape(&dir.to_string_lossy()),
        MAIN_SEPARATOR_STR,
        rule.src.trim_start_matches(['/', '\\'])
    );

    let paths =
        glob::glob(&pattern).with_context(|| format!("invalid file pattern `{}`", rule.src))?;

    let mut matched = 0;
    for path in paths {
        let path = path.with_context(|| format!("failed to expand `{}`", rule.src))?;
        if !path.is_file() || is_manifest(&path, manifest_name) {
            continue;
        }

        let relative = relative_path(dir, &path);
        if excludes.iter().any(|p| p.matches_path(&relative)) {
            tracing::debug!("Excluding {}", relative.display());
            continue;
        }

        let archive_path = match (rule.target.as_deref(), path.file_name()) {
            (Some(target), Some(name)) if !target.is_empty() => {
                archive_name(&Path::new(target).join(name))
            }
            _ => archive_name(&relative),
        };

        matched += 1;
        set.insert(SelectedFile {
            source: path,
            archive_path,
        });
    }

    if matched == 0 {
        tracing::warn!("File rule `{}` matched nothing", rule.src);
    }
    Ok(())
}

fn exclude_patterns(rule: &FileRule) -> Result<Vec<Pattern>> {
    let Some(exclude) = rule.exclude.as_deref() else {
        return Ok(Vec::new());
    };
    exclude
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let p = p.replace('\\', MAIN_SEPARATOR_STR);
            Pattern::new(&p).with_context(|| format!("invalid exclude pattern `{}`", p))
        })
        .collect()
}
