//! `choco-internalize pack` command

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cli::PackArgs;
use choco_internalize::core::nuspec::{NuSpec, NUSPEC_EXTENSION};
use choco_internalize::ops::pack::pack;
use choco_internalize::util::hash::sha256_file;
use choco_internalize::util::ids::RandomIds;

/// Find the single manifest at the top of `dir`.
pub fn find_nuspec(dir: &Path) -> Result<PathBuf> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_nuspec = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(NUSPEC_EXTENSION));
        if is_nuspec && path.is_file() {
            found.push(path);
        }
    }

    match found.len() {
        0 => bail!("no .nuspec found in {}", dir.display()),
        1 => Ok(found.remove(0)),
        _ => bail!(
            "multiple .nuspec files found in {}\n\
             \n\
             Use `--nuspec` to choose one.",
            dir.display()
        ),
    }
}

pub fn execute(args: PackArgs) -> Result<()> {
    let nuspec_path = match args.nuspec {
        Some(path) => path,
        None => find_nuspec(&args.dir)?,
    };
    let spec = NuSpec::load(&nuspec_path)?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}.nupkg", spec.id(), spec.version())));

    // Packed in memory so an output path inside DIR is not picked up as payload.
    let mut buffer = Cursor::new(Vec::new());
    let summary = pack(&spec, &args.dir, &mut buffer, &RandomIds)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(&output, buffer.into_inner())
        .with_context(|| format!("failed to write file: {}", output.display()))?;

    tracing::info!("sha256 {}", sha256_file(&output)?);
    eprintln!(
        "      Packed {} ({} files)",
        output.display(),
        summary.payload_files
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_single_nuspec() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("demo.nuspec"), "").unwrap();
        fs::write(tmp.path().join("readme.md"), "").unwrap();

        assert_eq!(find_nuspec(tmp.path()).unwrap(), tmp.path().join("demo.nuspec"));
    }

    #[test]
    fn test_find_nuspec_none_or_many() {
        let tmp = TempDir::new().unwrap();
        assert!(find_nuspec(tmp.path()).is_err());

        fs::write(tmp.path().join("a.nuspec"), "").unwrap();
        fs::write(tmp.path().join("b.NUSPEC"), "").unwrap();
        let err = find_nuspec(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("multiple"));
    }
}
