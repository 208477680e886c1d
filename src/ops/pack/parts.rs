//! Open Packaging Conventions parts.
//!
//! Every package carries three generated parts besides the manifest and the
//! payload: the content type index, the root relationships, and a core
//! properties fragment.

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const CONTENT_TYPES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";
const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const CORE_PROPERTIES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

/// Relationship type pointing at the package manifest.
pub const MANIFEST_RELATIONSHIP: &str = "http://schemas.microsoft.com/packaging/2010/07/manifest";

/// Relationship type pointing at the core properties part.
pub const CORE_PROPERTIES_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

const DEFAULT_CONTENT_TYPE: &str = "application/octet";
const RELATIONSHIPS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CORE_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.core-properties+xml";

/// Content type declared for an extension.
pub fn content_type_for(extension: &str) -> &'static str {
    if extension.eq_ignore_ascii_case("rels") {
        RELATIONSHIPS_CONTENT_TYPE
    } else if extension.eq_ignore_ascii_case("psmdcp") {
        CORE_PROPERTIES_CONTENT_TYPE
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

/// Extension of a part name, taken from its last segment.
///
/// `_rels/.rels` has extension `rels`; `LICENSE` and `file.` have none.
pub fn part_extension(part_name: &str) -> Option<&str> {
    let file_name = part_name.rsplit('/').next().unwrap_or(part_name);
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Accumulates the `[Content_Types].xml` index as parts are added.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<String>,
    overrides: Vec<String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the content type of a part as it is written.
    pub fn register(&mut self, part_name: &str) {
        match part_extension(part_name) {
            Some(ext) => self.add_extension(ext),
            None => {
                let part = format!("/{}", part_name.trim_start_matches('/'));
                if !self.overrides.contains(&part) {
                    self.overrides.push(part);
                }
            }
        }
    }

    /// Declare an extension; extensions compare case-insensitively.
    pub fn add_extension(&mut self, ext: &str) {
        let ext = ext.trim_start_matches('.');
        if !self.defaults.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            self.defaults.push(ext.to_string());
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.defaults
    }

    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = xml_writer()?;
        w.write_event(Event::Start(
            BytesStart::new("Types").with_attributes([("xmlns", CONTENT_TYPES_NAMESPACE)]),
        ))?;
        for ext in &self.defaults {
            w.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
                ("Extension", ext.as_str()),
                ("ContentType", content_type_for(ext)),
            ])))?;
        }
        for part in &self.overrides {
            w.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
                ("PartName", part.as_str()),
                ("ContentType", DEFAULT_CONTENT_TYPE),
            ])))?;
        }
        w.write_event(Event::End(BytesEnd::new("Types")))?;
        Ok(w.into_inner())
    }
}

/// One `<Relationship>` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
}

/// The package-root relationship set stored at `_rels/.rels`.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link the package root to `target` (made absolute if needed).
    pub fn add(&mut self, kind: &str, target: &str, id: String) {
        self.items.push(Relationship {
            id,
            kind: kind.to_string(),
            target: format!("/{}", target.trim_start_matches('/')),
        });
    }

    pub fn items(&self) -> &[Relationship] {
        &self.items
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = xml_writer()?;
        w.write_event(Event::Start(
            BytesStart::new("Relationships")
                .with_attributes([("xmlns", RELATIONSHIPS_NAMESPACE)]),
        ))?;
        for rel in &self.items {
            w.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
                ("Type", rel.kind.as_str()),
                ("Target", rel.target.as_str()),
                ("Id", rel.id.as_str()),
            ])))?;
        }
        w.write_event(Event::End(BytesEnd::new("Relationships")))?;
        Ok(w.into_inner())
    }
}

/// The `.psmdcp` core properties fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub creator: Option<String>,
    pub description: Option<String>,
    pub identifier: String,
    pub version: String,
    pub keywords: Option<String>,
    pub last_modified_by: String,
}

impl CoreProperties {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = xml_writer()?;
        w.write_event(Event::Start(BytesStart::new("coreProperties").with_attributes([
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ("xmlns", CORE_PROPERTIES_NAMESPACE),
        ])))?;

        if let Some(creator) = &self.creator {
            text_element(&mut w, "dc:creator", creator)?;
        }
        if let Some(description) = &self.description {
            text_element(&mut w, "dc:description", description)?;
        }
        text_element(&mut w, "dc:identifier", &self.identifier)?;
        text_element(&mut w, "version", &self.version)?;
        if let Some(keywords) = &self.keywords {
            text_element(&mut w, "keywords", keywords)?;
        }
        text_element(&mut w, "lastModifiedBy", &self.last_modified_by)?;

        w.write_event(Event::End(BytesEnd::new("coreProperties")))?;
        Ok(w.into_inner())
    }
}

fn xml_writer() -> Result<Writer<Vec<u8>>> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(w)
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
