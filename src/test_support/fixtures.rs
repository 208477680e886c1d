//! Test fixtures: feed documents, manifests and package archives.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::core::metadata::PackageMetadata;

/// A community-style manifest with dependencies and file rules.
pub const SAMPLE_NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2015/06/nuspec.xsd">
  <metadata>
    <id>activeperl</id>
    <version>5.24.2.2403</version>
    <packageSourceUrl>https://github.com/example/activeperl</packageSourceUrl>
    <owners>example</owners>
    <title>ActivePerl</title>
    <authors>ActiveState</authors>
    <projectUrl>https://www.activestate.com/activeperl</projectUrl>
    <requireLicenseAcceptance>false</requireLicenseAcceptance>
    <description>Perl distribution for Windows.</description>
    <tags>perl admin</tags>
    <dependencies>
      <dependency id="chocolatey-core.extension" version="1.1.0" />
      <dependency id="chocolatey-core.extension" />
    </dependencies>
  </metadata>
  <files>
    <file src="tools\**" target="tools" />
    <file src="legal\*.txt" />
  </files>
</package>
"#;

/// Manifest of the `demo` package served by [`demo_package`].
pub const DEMO_NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2015/06/nuspec.xsd">
  <metadata>
    <id>demo</id>
    <version>1.0.0</version>
    <authors>Demo Author</authors>
    <description>Demo package.</description>
    <tags>demo</tags>
  </metadata>
</package>
"#;

/// An Atom feed entry as served by an OData v2 feed.
///
/// Values are inserted verbatim, so callers escape `&` themselves.
pub fn feed_entry_xml(
    title: &str,
    version: &str,
    content_src: &str,
    download_cache: Option<&str>,
) -> String {
    let cache = download_cache
        .map(|c| format!("\n    <d:DownloadCache>{}</d:DownloadCache>", c))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xml:base="https://community.chocolatey.org/api/v2/" xmlns="http://www.w3.org/2005/Atom" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <id>https://community.chocolatey.org/api/v2/Packages(Id='{title}',Version='{version}')</id>
  <title type="text">{title}</title>
  <summary type="text"></summary>
  <updated>2023-01-01T00:00:00Z</updated>
  <author><name>someone</name></author>
  <content type="application/zip" src="{content_src}" />
  <m:properties>
    <d:Id>{title}</d:Id>
    <d:Version>{version}</d:Version>
    <d:Title>{title}</d:Title>{cache}
  </m:properties>
</entry>
"#
    )
}

/// Build a zip archive holding `files` in order.
pub fn build_nupkg(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Entry names of an archive in stored order.
pub fn nupkg_entries(data: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one archive entry as text.
pub fn read_entry(data: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    out
}

/// Feed metadata for `demo` 1.0.0 with the given directive.
pub fn demo_metadata(download_cache: &str) -> PackageMetadata {
    PackageMetadata {
        title: "demo".to_string(),
        version: "1.0.0".to_string(),
        content_src: "https://feed.test/api/v2/package/demo/1.0.0".to_string(),
        download_cache: download_cache.to_string(),
    }
}

/// A published `demo` package, optionally with an install script.
///
/// Carries the packaging parts a real feed would serve.
pub fn demo_package(install_script: Option<&str>) -> Vec<u8> {
    let mut files = vec![
        ("demo.nuspec", DEMO_NUSPEC),
        ("tools/LICENSE.txt", "MIT"),
        ("[Content_Types].xml", "<Types/>"),
        ("_rels/.rels", "<Relationships/>"),
        (
            "package/services/metadata/core-properties/0123.psmdcp",
            "<coreProperties/>",
        ),
    ];
    if let Some(script) = install_script {
        files.push(("tools/chocolateyInstall.ps1", script));
    }
    build_nupkg(&files)
}
