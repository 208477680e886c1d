//! Assembling a `.nupkg` from a package directory.
//!
//! The archive is written as one forward stream in a fixed order: manifest,
//! payload, core properties, relationships, and the content type index last
//! so that it can list every extension written before it.

mod parts;
mod selection;

pub use parts::{
    content_type_for, part_extension, ContentTypes, CoreProperties, Relationship, Relationships,
    CORE_PROPERTIES_RELATIONSHIP, MANIFEST_RELATIONSHIP,
};
pub use selection::{FileSelection, SelectedFile};

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::nuspec::NuSpec;
use crate::util::ids::IdGenerator;

/// Directory holding the core properties part.
pub const CORE_PROPERTIES_DIR: &str = "package/services/metadata/core-properties";

/// Root relationships part.
pub const RELATIONSHIPS_PATH: &str = "_rels/.rels";

/// Content type index part.
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Tool name recorded as `lastModifiedBy`.
pub const LAST_MODIFIED_BY: &str = "choco-internalize";

/// What a pack run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    /// Entry names in write order.
    pub entries: Vec<String>,
    /// Number of payload files (excludes the manifest and packaging parts).
    pub payload_files: usize,
    /// Name of the generated core properties part.
    pub core_properties: String,
}

/// Write the package for `spec` with payload from `dir` into `out`.
pub fn pack<W: Write + Seek>(
    spec: &NuSpec,
    dir: &Path,
    out: W,
    ids: &dyn IdGenerator,
) -> Result<PackSummary> {
    let mut spec = spec.clone();
    spec.normalize_file_rules();

    let manifest_name = spec.file_name();
    let mut writer = PackageWriter::new(out);

    writer.add_part(&manifest_name, &spec.to_bytes()?)?;

    let files = FileSelection::for_spec(&spec).select(dir, &manifest_name)?;
    for file in &files {
        let data = fs::read(&file.source)
            .with_context(|| format!("failed to read file: {}", file.source.display()))?;
        writer.add_part(&file.archive_path, &data)?;
    }

    let core_properties = format!("{}/{}.psmdcp", CORE_PROPERTIES_DIR, ids.hex(32));
    writer.add_part(&core_properties, &core_properties_for(&spec).to_bytes()?)?;

    let mut rels = Relationships::new();
    rels.add(MANIFEST_RELATIONSHIP, &manifest_name, relationship_id(ids));
    rels.add(CORE_PROPERTIES_RELATIONSHIP, &core_properties, relationship_id(ids));
    writer.add_part(RELATIONSHIPS_PATH, &rels.to_bytes()?)?;

    let entries = writer.finish()?;
    tracing::debug!("Packed {} entries for {}", entries.len(), spec.id());

    Ok(PackSummary {
        entries,
        payload_files: files.len(),
        core_properties,
    })
}

fn relationship_id(ids: &dyn IdGenerator) -> String {
    format!("R{}", ids.hex(16))
}

fn core_properties_for(spec: &NuSpec) -> CoreProperties {
    let meta = &spec.metadata;
    CoreProperties {
        creator: meta.authors.clone(),
        description: meta.description.clone(),
        identifier: meta.id.clone(),
        version: meta.version.clone(),
        keywords: meta.tags.clone(),
        last_modified_by: LAST_MODIFIED_BY.to_string(),
    }
}

/// Zip writer that tracks content types and entry names.
struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    content_types: ContentTypes,
    entries: Vec<String>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PackageWriter<W> {
    fn new(out: W) -> Self {
        PackageWriter {
            zip: ZipWriter::new(out),
            content_types: ContentTypes::new(),
            entries: Vec::new(),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    fn add_part(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.write_entry(name, data)?;
        self.content_types.register(name);
        Ok(())
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip
            .start_file(name, self.options)
            .with_context(|| format!("failed to start archive entry {}", name))?;
        self.zip
            .write_all(data)
            .with_context(|| format!("failed to write archive entry {}", name))?;
        self.entries.push(name.to_string());
        Ok(())
    }

    /// Write the content type index and close the archive.
    fn finish(mut self) -> Result<Vec<String>> {
        let index = self.content_types.to_bytes()?;
        self.write_entry(CONTENT_TYPES_PATH, &index)?;
        self.zip.finish().context("failed to finish package archive")?;
        Ok(self.entries)
    }
}
