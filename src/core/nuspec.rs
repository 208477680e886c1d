//! `.nuspec` manifest parsing and schema.
//!
//! The nuspec is the XML manifest at the root of every package. Only the
//! elements the community repository uses are modelled; anything else is
//! dropped on load.

use std::fmt::Write as _;
use std::path::{Path, MAIN_SEPARATOR_STR};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

/// Namespace written on serialized manifests.
pub const NUSPEC_NAMESPACE: &str = "http://schemas.microsoft.com/packaging/2015/06/nuspec.xsd";

/// Extension of manifest files.
pub const NUSPEC_EXTENSION: &str = "nuspec";

/// The parsed `.nuspec` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "package")]
pub struct NuSpec {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,

    /// Package metadata
    pub metadata: Metadata,

    /// File inclusion rules (None or empty = everything)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Files>,
}

/// The `<metadata>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_license_acceptance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    // Chocolatey extensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_tracker_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailing_list_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
}

/// The `<dependencies>` list. Order is kept and duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(rename = "dependency", default)]
    pub items: Vec<Dependency>,
}

/// A single `<dependency id=".." version=".."/>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "@id")]
    pub id: String,

    /// Version range, uninterpreted
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The `<files>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Files {
    #[serde(rename = "file", default)]
    pub rules: Vec<FileRule>,
}

/// A `<file src=".." target=".." exclude=".."/>` inclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRule {
    /// Glob relative to the package directory
    #[serde(rename = "@src")]
    pub src: String,

    /// Directory inside the archive for matched files
    #[serde(rename = "@target", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// `;`-separated globs removed from the matches
    #[serde(rename = "@exclude", default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

impl FileRule {
    pub fn new(src: impl Into<String>) -> Self {
        FileRule {
            src: src.into(),
            target: None,
            exclude: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl NuSpec {
    /// Create a manifest with just an identity.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        NuSpec {
            xmlns: Some(NUSPEC_NAMESPACE.to_string()),
            metadata: Metadata {
                id: id.into(),
                version: version.into(),
                ..Default::default()
            },
            files: None,
        }
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        Self::from_str(&contents)
            .with_context(|| format!("failed to parse nuspec: {}", path.display()))
    }

    /// Parse manifest text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self> {
        // A UTF-8 BOM is common in files produced on Windows.
        let contents = contents.trim_start_matches('\u{feff}');
        let spec: NuSpec = quick_xml::de::from_str(contents).context("invalid nuspec xml")?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.metadata.id.trim().is_empty() {
            bail!("nuspec is missing a package id");
        }
        Ok(())
    }

    /// Serialize to the bytes stored in the archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;

        let mut ser = quick_xml::se::Serializer::new(&mut out);
        ser.indent(' ', 2);
        self.serialize(ser).context("failed to serialize nuspec")?;

        Ok(out.into_bytes())
    }

    /// Name of this manifest inside a package: `<id>.nuspec`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.metadata.id, NUSPEC_EXTENSION)
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// File inclusion rules in declaration order.
    pub fn file_rules(&self) -> &[FileRule] {
        self.files.as_ref().map(|f| f.rules.as_slice()).unwrap_or(&[])
    }

    /// Dependencies in declaration order.
    pub fn dependencies(&self) -> &[Dependency] {
        self.metadata
            .dependencies
            .as_ref()
            .map(|d| d.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_dependency(&mut self, id: impl Into<String>, version: impl Into<String>) {
        self.metadata
            .dependencies
            .get_or_insert_with(Dependencies::default)
            .items
            .push(Dependency {
                id: id.into(),
                version: Some(version.into()),
            });
    }

    pub fn add_file_rule(&mut self, rule: FileRule) {
        self.files.get_or_insert_with(Files::default).rules.push(rule);
    }

    /// Rewrite Windows separators in file rules to the host separator.
    pub fn normalize_file_rules(&mut self) {
        let Some(files) = self.files.as_mut() else {
            return;
        };
        for rule in &mut files.rules {
            rule.src = rule.src.replace('\\', MAIN_SEPARATOR_STR);
            if let Some(target) = rule.target.as_mut() {
                *target = target.replace('\\', MAIN_SEPARATOR_STR);
            }
        }
    }

    /// A populated template for authoring a new package.
    pub fn sample(id: Option<&str>, user: &str) -> Self {
        let mut spec = NuSpec::new(id.unwrap_or("Package"), "1.0.0");
        let placeholder = "http://LICENSE_URL_HERE_OR_DELETE_THIS_LINE".to_string();

        let meta = &mut spec.metadata;
        meta.authors = Some(user.to_string());
        meta.owners = Some(user.to_string());
        meta.license_url = Some(placeholder.clone());
        meta.project_url = Some(placeholder.clone());
        meta.icon_url = Some(placeholder);
        meta.require_license_acceptance = Some(false);
        meta.description = Some("Package Description".to_string());
        meta.release_notes =
            Some("Summary of changes made in this release of the package.".to_string());
        meta.copyright = Some(format!("Copyright {}", chrono::Local::now().year()));
        meta.tags = Some("Tag1 Tag2".to_string());

        spec.add_dependency("SampleDependency", "1.0");
        spec
    }
}
