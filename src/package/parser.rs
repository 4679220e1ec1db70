//! Container and package-document parsing (container.xml, OPF-style
//! manifest + spine).

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// Parsed package document: the manifest (id -> href) and the ordered
/// spine of idrefs.
pub struct PackageDoc {
    pub manifest: HashMap<String, String>,
    pub spine_ids: Vec<String>,
}

/// Parse META-INF/container.xml to find the package document path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidPackage(
        "no rootfile found in container.xml".into(),
    ))
}

/// Parse a package document into its manifest and spine.
///
/// Manifest items without an id are dropped; spine itemrefs are kept in
/// document order. Metadata elements are ignored.
pub fn parse_package_doc(content: &str) -> Result<PackageDoc> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"item" => {
                        let mut id = String::new();
                        let mut href = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"id" => id = String::from_utf8(attr.value.to_vec())?,
                                b"href" => href = String::from_utf8(attr.value.to_vec())?,
                                _ => {}
                            }
                        }

                        if !id.is_empty() && !href.is_empty() {
                            manifest.insert(id, href);
                        }
                    }
                    b"itemref" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"idref" {
                                spine_ids.push(String::from_utf8(attr.value.to_vec())?);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(PackageDoc {
        manifest,
        spine_ids,
    })
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract local name from a namespaced XML name ("opf:item" -> "item").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
