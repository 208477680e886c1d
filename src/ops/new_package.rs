//! Implementation of `choco-internalize new`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::nuspec::NuSpec;
use crate::util::fs::ensure_dir;

/// Options for writing a sample manifest.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Package id (defaults to `Package`)
    pub id: Option<String>,

    /// Author and owner recorded in the manifest
    pub user: String,

    /// Overwrite an existing manifest
    pub force: bool,
}

/// Write a sample `<id>.nuspec` into `dir`, returning its path.
pub fn new_package(dir: &Path, opts: &NewOptions) -> Result<PathBuf> {
    let spec = NuSpec::sample(opts.id.as_deref(), &opts.user);

    ensure_dir(dir)?;
    let path = dir.join(spec.file_name());
    if path.exists() && !opts.force {
        bail!(
            "`{}` already exists\n\
             \n\
             Use `--force` to overwrite it.",
            path.display()
        );
    }

    let bytes = spec.to_bytes()?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write file: {}", path.display()))?;

    tracing::info!("Created {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(id: Option<&str>) -> NewOptions {
        NewOptions {
            id: id.map(str::to_string),
            user: "tester".to_string(),
            force: false,
        }
    }

    #[test]
    fn test_new_package_writes_loadable_manifest() {
        let tmp = TempDir::new().unwrap();

        let path = new_package(tmp.path(), &opts(Some("mytool"))).unwrap();
        assert_eq!(path, tmp.path().join("mytool.nuspec"));

        let spec = NuSpec::load(&path).unwrap();
        assert_eq!(spec.id(), "mytool");
        assert_eq!(spec.metadata.authors.as_deref(), Some("tester"));
        assert_eq!(spec.dependencies().len(), 1);
    }

    #[test]
    fn test_new_package_default_id() {
        let tmp = TempDir::new().unwrap();
        let path = new_package(tmp.path(), &opts(None)).unwrap();
        assert!(path.ends_with("Package.nuspec"));
    }

    #[test]
    fn test_new_package_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        new_package(tmp.path(), &opts(Some("x"))).unwrap();

        let err = new_package(tmp.path(), &opts(Some("x"))).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let mut force = opts(Some("x"));
        force.force = true;
        assert!(new_package(tmp.path(), &force).is_ok());
    }
}
