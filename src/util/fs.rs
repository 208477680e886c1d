//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// A temporary directory scoped to one packaging run.
///
/// Removed on drop unless it was created with `keep`, in which case it
/// outlives the process and its path is logged.
#[derive(Debug)]
pub enum ScratchDir {
    Owned(TempDir),
    Kept(PathBuf),
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn new(prefix: &str, keep: bool) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .context("failed to create temporary directory")?;

        if keep {
            let path = dir.keep();
            tracing::info!("Keeping temporary directory {}", path.display());
            Ok(ScratchDir::Kept(path))
        } else {
            Ok(ScratchDir::Owned(dir))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ScratchDir::Owned(dir) => dir.path(),
            ScratchDir::Kept(path) => path,
        }
    }

    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path().join(path)
    }

    /// Whether the directory survives drop.
    pub fn is_kept(&self) -> bool {
        matches!(self, ScratchDir::Kept(_))
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path as a zip entry name (`/`-separated, no leading `/`).
pub fn archive_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Find a file in `dir` whose name matches `name` ignoring ASCII case.
///
/// An exact match wins over a case-insensitive one.
pub fn find_file_ignore_case(dir: &Path, name: &str) -> Result<Option<PathBuf>> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Ok(Some(exact));
    }
    if !dir.is_dir() {
        return Ok(None);
    }

    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
            && entry.file_type()?.is_file()
        {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
