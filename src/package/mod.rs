//! Scripture package reading: the zip container, the memoized
//! `PackageIndex`, and chapter loading.

mod parser;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::ops::Bound;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use regex_lite::Regex;
use std::sync::LazyLock;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::html;

pub use parser::{PackageDoc, parse_container_xml, parse_package_doc};

/// Conventional package document paths, probed when the container
/// descriptor is absent or malformed.
const FALLBACK_DOC_PATHS: &[&str] = &["OEBPS/content.opf", "OPS/content.opf", "content.opf"];

/// Chapter-navigation marker hrefs embed the book number: the chapter
/// content for that book starts at the following spine entry.
static BOOK_NAV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chapternav(\d{1,3})\.x?html?$").unwrap());

/// One entry of the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineEntry {
    /// Position in the spine, assigned at parse time.
    pub index: u32,
    pub href: String,
}

/// The cleaned body fragment of one chapter. Built per request and
/// owned by the caller; chapter bodies are never cached.
#[derive(Debug, Clone)]
pub struct ChapterContent {
    pub html: String,
}

/// Immutable index over a parsed package: the spine, the base path for
/// resolving hrefs, and the book -> first-chapter-spine-index map.
#[derive(Debug, Clone)]
pub struct PackageIndex {
    spine: Vec<SpineEntry>,
    content_prefix: String,
    book_starts: BTreeMap<u8, u32>,
}

impl PackageIndex {
    /// Spine index of the first chapter of a book, if the book is mapped.
    pub fn book_start(&self, book: u8) -> Option<u32> {
        self.book_starts.get(&book).copied()
    }

    /// Resolve (book, chapter) to a spine index.
    ///
    /// `spine_index(b, c) = book_starts[b] + c - 1`. The result is
    /// bounded by the next mapped book's start (and by the spine length
    /// for the last mapped book), so a chapter number that runs past a
    /// book's last chapter does not address the next book's content.
    pub fn spine_index(&self, book: u8, chapter: u16) -> Option<u32> {
        if chapter == 0 {
            return None;
        }
        let start = self.book_start(book)?;
        let index = start + chapter as u32 - 1;

        let limit = self
            .book_starts
            .range((Bound::Excluded(book), Bound::Unbounded))
            .next()
            // next book's start counts its nav marker entry
            .map(|(_, &next_start)| next_start.saturating_sub(1))
            .unwrap_or(self.spine.len() as u32);

        if index >= limit {
            return None;
        }
        Some(index)
    }

    /// Href of the spine entry at `index`.
    pub fn href_at(&self, index: u32) -> Option<&str> {
        self.spine.get(index as usize).map(|e| e.href.as_str())
    }

    pub fn spine(&self) -> &[SpineEntry] {
        &self.spine
    }

    /// Book numbers with mapped chapter starts, in ascending order.
    pub fn mapped_books(&self) -> impl Iterator<Item = u8> + '_ {
        self.book_starts.keys().copied()
    }

    /// Join a spine href onto the content path prefix.
    fn resolve_href(&self, href: &str) -> String {
        if self.content_prefix.is_empty() {
            href.to_string()
        } else {
            format!("{}/{}", self.content_prefix, href)
        }
    }
}

/// A packaged scripture edition: a zip container plus a
/// once-constructed `PackageIndex`.
///
/// The index is built lazily on the first `initialize` (or
/// `load_chapter`) call. Initialization is memoized through a
/// `OnceLock`, so concurrent first callers block on exactly one parse
/// and all observe the same result; a memoized failure is re-surfaced
/// on later calls and is not retried (open a new package to retry).
pub struct ScripturePackage<R: Read + Seek> {
    archive: Mutex<ZipArchive<R>>,
    index: OnceLock<std::result::Result<PackageIndex, String>>,
}

impl ScripturePackage<std::fs::File> {
    /// Open a package file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ScripturePackage<R> {
    /// Open a package from any `Read + Seek` source.
    ///
    /// Reads only the zip central directory; the index is built on
    /// first use.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self {
            archive: Mutex::new(archive),
            index: OnceLock::new(),
        })
    }

    /// Build (or return the memoized) package index.
    pub fn initialize(&self) -> Result<&PackageIndex> {
        let slot = self
            .index
            .get_or_init(|| self.build_index().map_err(|e| e.to_string()));
        match slot {
            Ok(index) => Ok(index),
            Err(msg) => Err(Error::InvalidPackage(msg.clone())),
        }
    }

    /// Resolve (book, chapter) to cleaned chapter markup.
    ///
    /// `Ok(None)` covers every expected absence: unmapped book,
    /// out-of-range chapter, or missing content resource. Each call
    /// re-reads and re-cleans the resource.
    pub fn load_chapter(&self, book: u8, chapter: u16) -> Result<Option<ChapterContent>> {
        let index = self.initialize()?;

        let Some(spine_index) = index.spine_index(book, chapter) else {
            return Ok(None);
        };
        let Some(href) = index.href_at(spine_index) else {
            return Ok(None);
        };
        let path = index.resolve_href(href);

        let bytes = {
            let mut archive = self.archive.lock().unwrap_or_else(|e| e.into_inner());
            match read_entry(&mut archive, &path)? {
                Some(bytes) => bytes,
                None => return Ok(None),
            }
        };

        let raw = decode_text(&bytes);
        let body = html::extract_body(&raw);
        Ok(Some(ChapterContent {
            html: html::sanitize_fragment(body),
        }))
    }

    fn build_index(&self) -> Result<PackageIndex> {
        let mut archive = self.archive.lock().unwrap_or_else(|e| e.into_inner());

        let doc_path = find_package_doc_path(&mut archive)?;
        let content_prefix = Path::new(&doc_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let doc_bytes = read_entry(&mut archive, &doc_path)?
            .ok_or_else(|| Error::InvalidPackage(format!("package document missing: {doc_path}")))?;
        let doc = parse_package_doc(&decode_text(&doc_bytes))?;

        let mut spine = Vec::with_capacity(doc.spine_ids.len());
        let mut book_starts = BTreeMap::new();

        for idref in &doc.spine_ids {
            let Some(href) = doc.manifest.get(idref) else {
                continue;
            };
            let index = spine.len() as u32;

            if let Some(caps) = BOOK_NAV_RE.captures(href)
                && let Ok(book) = caps[1].parse::<u8>()
                && (1..=crate::canon::BOOK_COUNT).contains(&book)
            {
                book_starts.insert(book, index + 1);
            }

            spine.push(SpineEntry {
                index,
                href: href.clone(),
            });
        }

        tracing::debug!(
            spine = spine.len(),
            books = book_starts.len(),
            "package index built"
        );

        Ok(PackageIndex {
            spine,
            content_prefix,
            book_starts,
        })
    }
}

/// Locate the package document: container.xml first, conventional paths
/// as a fallback when the descriptor is absent or malformed.
fn find_package_doc_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    if let Some(container) = read_entry(archive, "META-INF/container.xml")?
        && let Ok(path) = parse_container_xml(&container)
    {
        return Ok(path);
    }

    for path in FALLBACK_DOC_PATHS {
        if archive.by_name(path).is_ok() {
            return Ok((*path).to_string());
        }
    }

    Err(Error::InvalidPackage(
        "no container descriptor or package document found".into(),
    ))
}

/// Read one archive entry, with a percent-decoded fallback lookup for
/// malformed packages. `Ok(None)` if the entry does not exist.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(Some(contents));
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let Ok(decoded) = percent_encoding::percent_decode_str(path).decode_utf8() else {
        return Ok(None);
    };
    if decoded == path {
        return Ok(None);
    }

    match archive.by_name(&decoded) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            Ok(Some(contents))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Decode resource bytes tolerantly: UTF-8 first, then the encoding
/// named by the XML declaration, then Windows-1252.
fn decode_text(bytes: &[u8]) -> String {
    let (result, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result.into_owned();
    }

    if let Some(name) = extract_xml_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result.into_owned();
    }

    let (result, _, _): (Cow<str>, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result.into_owned()
}

/// Extract the encoding name from an XML declaration, if any. Only the
/// first ~100 bytes are checked.
fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(100)];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}
