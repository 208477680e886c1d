//! `.nupkg` extraction.
//!
//! Packaging parts (`[Content_Types].xml`, `_rels/`, core properties) are
//! not extracted: repacking generates fresh ones.

use std::fs;
use std::io::{self, Read, Seek};
use std::path::Path;

use anyhow::{bail, Context, Result};
use zip::ZipArchive;

/// Zip entries that belong to the packaging format, not the package.
pub fn is_packaging_part(name: &str) -> bool {
    name == "[Content_Types].xml"
        || name.starts_with("_rels/")
        || name.starts_with("package/services/metadata/")
}

/// Extract a package archive into `dest`, returning the number of files written.
pub fn unpack_package<R: Read + Seek>(reader: R, dest: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(reader).context("failed to open package archive")?;

    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read archive entry #{}", index))?;

        let name = entry.name().replace('\\', "/");
        if is_packaging_part(&name) {
            tracing::debug!("Skipping packaging part {}", name);
            continue;
        }

        // Security check: ensure path is within destination
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            bail!("archive entry escapes destination directory: {}", name);
        };
        let output_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).with_context(|| {
                format!("failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut file = fs::File::create(&output_path)
            .with_context(|| format!("failed to create file: {}", output_path.display()))?;
        io::copy(&mut entry, &mut file)
            .with_context(|| format!("failed to extract file: {}", output_path.display()))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_nupkg;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_unpack_package() {
        let data = build_nupkg(&[
            ("demo.nuspec", "<package/>"),
            ("tools/chocolateyInstall.ps1", "Install-ChocolateyPackage"),
            ("[Content_Types].xml", "<Types/>"),
            ("_rels/.rels", "<Relationships/>"),
            ("package/services/metadata/core-properties/abc.psmdcp", "<coreProperties/>"),
        ]);

        let tmp = TempDir::new().unwrap();
        let written = unpack_package(Cursor::new(data), tmp.path()).unwrap();

        assert_eq!(written, 2);
        assert!(tmp.path().join("demo.nuspec").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("tools/chocolateyInstall.ps1")).unwrap(),
            "Install-ChocolateyPackage"
        );
        assert!(!tmp.path().join("[Content_Types].xml").exists());
        assert!(!tmp.path().join("_rels").exists());
        assert!(!tmp.path().join("package").exists());
    }

    #[test]
    fn test_unpack_rejects_escaping_entry() {
        let data = build_nupkg(&[("../evil.txt", "x")]);
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out");

        let err = unpack_package(Cursor::new(data), &dest).unwrap_err();
        assert!(err.to_string().contains("escapes"));
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        assert!(unpack_package(Cursor::new(b"not a zip".to_vec()), tmp.path()).is_err());
    }

    #[test]
    fn test_is_packaging_part() {
        assert!(is_packaging_part("[Content_Types].xml"));
        assert!(is_packaging_part("_rels/.rels"));
        assert!(!is_packaging_part("tools/_rels.txt"));
        assert!(!is_packaging_part("package.ps1"));
    }
}
