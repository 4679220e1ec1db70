//! # biblion
//!
//! A scripture content engine: turns a packaged Bible edition (a
//! zip-based container with a manifest and spine of HTML fragments)
//! into addressable (book, chapter) content, and extracts structured
//! annotations from loosely-structured markup.
//!
//! ## Components
//!
//! - [`ScripturePackage`] — parses the container once into an immutable
//!   index and resolves (book, chapter) to cleaned chapter markup.
//! - [`extract_footnotes`] — splits chapter markup into footnote-free
//!   display markup plus ordered footnote definitions.
//! - [`parse_references`] / [`make_clickable`] — finds scripture
//!   citations in arbitrary text and resolves them against the fixed
//!   66-book canon.
//! - [`search`] — case-insensitive substring search across the whole
//!   corpus with progress reporting and cooperative cancellation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use biblion::{ScripturePackage, parse_references};
//!
//! let package = ScripturePackage::open("biblia.epub")?;
//! if let Some(chapter) = package.load_chapter(43, 3)? {
//!     println!("{}", chapter.html);
//! }
//!
//! let refs = parse_references("Lea Juan 3:16 hoy");
//! assert_eq!(refs[0].book_id, 43);
//! # Ok::<(), biblion::Error>(())
//! ```

pub mod canon;
mod error;
pub mod footnote;
pub mod html;
pub mod package;
pub mod reference;
pub mod search;

pub use error::{Error, Result};
pub use footnote::{FootnoteDefinition, extract_footnotes};
pub use package::{ChapterContent, PackageIndex, ScripturePackage, SpineEntry};
pub use reference::{ScriptureReference, make_clickable, parse_references};
pub use search::{CancelFlag, SearchResult, search, search_with_progress};
