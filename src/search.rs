//! Corpus search: case-insensitive substring search across all 66
//! books, with coarse progress reporting and cooperative cancellation.

use std::io::{Read, Seek};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::canon;
use crate::error::Result;
use crate::html;
use crate::package::ScripturePackage;

const MIN_QUERY_CHARS: usize = 2;
const MAX_PER_CHAPTER: usize = 5;
const MAX_TOTAL: usize = 100;
const PROGRESS_STRIDE: u32 = 20;
const SNIPPET_CONTEXT: usize = 60;

/// One occurrence of the query inside one chapter's plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub book_id: u8,
    pub book_name: &'static str,
    pub chapter: u16,
    pub snippet: String,
    /// Character offset of the match within the chapter's flattened text.
    pub match_index: usize,
}

/// Cooperative cancellation flag for a running search. The engine
/// checks it between chapters only; a chapter already being processed
/// always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search the whole corpus for a literal, case-insensitive substring.
pub fn search<R: Read + Seek>(
    package: &ScripturePackage<R>,
    query: &str,
) -> Result<Vec<SearchResult>> {
    search_with_progress(package, query, |_| {}, &CancelFlag::new())
}

/// Search with a progress callback and a cancellation flag.
///
/// Progress is reported as a percentage in 0..=100, after every 20
/// chapters and once more at completion. Per-chapter load failures are
/// logged and skipped; caps are 5 matches per chapter and 100 total.
/// A trimmed query shorter than 2 characters returns empty without
/// touching the corpus.
pub fn search_with_progress<R: Read + Seek, F: FnMut(u8)>(
    package: &ScripturePackage<R>,
    query: &str,
    mut on_progress: F,
    cancel: &CancelFlag,
) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(Vec::new());
    }

    package.initialize()?;
    let needle: Vec<char> = query.to_lowercase().chars().collect();

    let mut results = Vec::new();
    let mut processed: u32 = 0;

    'books: for book in canon::books() {
        for chapter in 1..=book.chapters {
            if cancel.is_cancelled() {
                break 'books;
            }
            processed += 1;

            match package.load_chapter(book.id, chapter) {
                Ok(Some(content)) => {
                    let text = html::flatten_text(&content.html);
                    collect_matches(&text, &needle, book, chapter, &mut results);
                    if results.len() >= MAX_TOTAL {
                        break 'books;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(book = book.id, chapter, error = %e, "skipping chapter");
                }
            }

            if processed % PROGRESS_STRIDE == 0 {
                on_progress((processed * 100 / canon::TOTAL_CHAPTERS) as u8);
            }
        }
    }

    on_progress(100);
    Ok(results)
}

/// Collect non-overlapping occurrences of `needle` in `text`, up to the
/// per-chapter and global caps.
fn collect_matches(
    text: &str,
    needle: &[char],
    book: canon::Book,
    chapter: u16,
    results: &mut Vec<SearchResult>,
) {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();

    let mut found = 0;
    let mut i = 0;
    while i + needle.len() <= folded.len() {
        if folded[i..i + needle.len()] == *needle {
            results.push(SearchResult {
                book_id: book.id,
                book_name: book.name,
                chapter,
                snippet: build_snippet(&chars, i, needle.len()),
                match_index: i,
            });
            found += 1;
            if found >= MAX_PER_CHAPTER || results.len() >= MAX_TOTAL {
                return;
            }
            i += needle.len();
        } else {
            i += 1;
        }
    }
}

/// Build a snippet with ~60 characters of context on each side,
/// ellipsis-marked where it does not reach the text boundaries.
fn build_snippet(chars: &[char], start: usize, len: usize) -> String {
    let from = start.saturating_sub(SNIPPET_CONTEXT);
    let to = (start + len + SNIPPET_CONTEXT).min(chars.len());

    let mut out = String::new();
    if from > 0 {
        out.push('…');
    }
    out.extend(&chars[from..to]);
    if to < chars.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: u8) -> canon::Book {
        canon::book(id).unwrap()
    }

    #[test]
    fn test_collect_matches_case_insensitive() {
        let mut results = Vec::new();
        let needle: Vec<char> = "jehová".chars().collect();
        collect_matches(
            "Al principio Jehová creó. JEHOVÁ habló.",
            &needle,
            book(1),
            1,
            &mut results,
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].match_index, 13);
        assert!(results[0].snippet.contains("Jehová"));
        assert!(results[1].snippet.contains("JEHOVÁ"));
    }

    #[test]
    fn test_collect_matches_non_overlapping() {
        let mut results = Vec::new();
        let needle: Vec<char> = "aa".chars().collect();
        collect_matches("aaaa", &needle, book(1), 1, &mut results);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].match_index, 0);
        assert_eq!(results[1].match_index, 2);
    }

    #[test]
    fn test_per_chapter_cap() {
        let mut results = Vec::new();
        let needle: Vec<char> = "ab".chars().collect();
        collect_matches(
            "ab ab ab ab ab ab ab ab",
            &needle,
            book(1),
            1,
            &mut results,
        );
        assert_eq!(results.len(), MAX_PER_CHAPTER);
    }

    #[test]
    fn test_snippet_ellipsis() {
        let text: String = "x".repeat(200);
        let chars: Vec<char> = text.chars().collect();

        let middle = build_snippet(&chars, 100, 2);
        assert!(middle.starts_with('…'));
        assert!(middle.ends_with('…'));

        let at_start = build_snippet(&chars, 0, 2);
        assert!(!at_start.starts_with('…'));
        assert!(at_start.ends_with('…'));

        let short: Vec<char> = "hello".chars().collect();
        assert_eq!(build_snippet(&short, 0, 5), "hello");
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }
}
