//! Verse reference resolution: locating scripture citations in free
//! text and rewriting them as navigable spans.
//!
//! Citation grammar (heuristic):
//!
//! ```text
//! [1-3]? BookName[.]? Chapter[:Verse[-VerseEnd][,Verse]*][; Chapter:Verse[-VerseEnd]]*
//! ```
//!
//! Book names resolve through [`crate::canon::resolve_name`], including
//! its documented prefix fallback. Semicolon-chained continuations
//! ("Roma 5:12; 6:23") become additional references on the same book.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::canon;
use crate::html;

/// A structured, navigable scripture citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptureReference {
    pub book_id: u8,
    pub chapter: u16,
    pub verse: Option<u16>,
    pub verse_end: Option<u16>,
    pub verse_list: Option<Vec<u16>>,
    /// The exact substring matched, for non-destructive replacement.
    pub original_span: String,
}

/// Primary citation pattern. Groups: 1 ordinal, 2 book name, 3 chapter,
/// 4 verse, 5 verse end, 6 comma list, 7 semicolon chain. The name group
/// carries no word boundary (`\b` is ASCII-only and would reject names
/// starting with an accented letter); word-start checking happens in
/// [`scan`].
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b([1-3])\s*)?([A-Za-zÀ-ÿ]{2,})\.?\s+(\d{1,3})(?::(\d{1,3})(?:\s*-\s*(\d{1,3}))?((?:\s*,\s*\d{1,3})+)?)?((?:\s*;\s*\d{1,3}\s*:\s*\d{1,3}(?:\s*-\s*\d{1,3})?)+)?",
    )
    .unwrap()
});

/// One chapter:verse segment of a semicolon chain.
static CHAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*:\s*(\d{1,3})(?:\s*-\s*(\d{1,3}))?").unwrap());

/// Numbers inside a comma-separated verse list.
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,3}").unwrap());

/// Find every scripture citation in `text` and resolve it.
///
/// Unresolvable book names and out-of-range chapters are silently
/// skipped; duplicates (same book, chapter, verse) are dropped.
pub fn parse_references(text: &str) -> Vec<ScriptureReference> {
    let mut seen: HashSet<(u8, u16, Option<u16>)> = HashSet::new();
    scan(text)
        .into_iter()
        .map(|(_, r)| r)
        .filter(|r| seen.insert((r.book_id, r.chapter, r.verse)))
        .collect()
}

/// Rewrite `text` as an HTML fragment with every citation wrapped in a
/// navigable span. Non-citation text is escaped exactly once; spans
/// never overlap. Single-pass only: feeding the output back in is out
/// of contract.
pub fn make_clickable(text: &str) -> String {
    let matches = scan(text);
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for (range, reference) in matches {
        out.push_str(&html::escape(&text[pos..range.start]));
        push_span(&mut out, &reference);
        pos = range.end;
    }
    out.push_str(&html::escape(&text[pos..]));
    out
}

fn push_span(out: &mut String, r: &ScriptureReference) {
    out.push_str(&format!(
        "<span class=\"scripture-ref\" data-book=\"{}\" data-chapter=\"{}\"",
        r.book_id, r.chapter
    ));
    if let Some(v) = r.verse {
        out.push_str(&format!(" data-verse=\"{v}\""));
    }
    if let Some(v) = r.verse_end {
        out.push_str(&format!(" data-verse-end=\"{v}\""));
    }
    if let Some(list) = &r.verse_list {
        let joined: Vec<String> = list.iter().map(u16::to_string).collect();
        out.push_str(&format!(" data-verses=\"{}\"", joined.join(",")));
    }
    out.push('>');
    out.push_str(&html::escape(&r.original_span));
    out.push_str("</span>");
}

/// Scan for citations, returning each reference with its byte range in
/// ascending position order. Chained continuations get their own
/// disjoint sub-ranges, so the ranges never overlap.
///
/// When a candidate match fails to resolve (unknown word, out-of-range
/// chapter), the scan resumes one character past the failed match start
/// rather than past the whole match, so an ordinary word cannot swallow
/// a citation right behind it ("Vea 1 Cor 15:3").
fn scan(text: &str) -> Vec<(Range<usize>, ScriptureReference)> {
    let mut out: Vec<(Range<usize>, ScriptureReference)> = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = CITATION_RE.captures(&text[pos..]) else {
            break;
        };
        let whole = caps.get(0).unwrap();

        // a citation cannot start mid-word ("xJuan 3:16")
        let mid_word = text[..pos + whole.start()]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);

        let name = caps.get(2).unwrap().as_str();
        let candidate = match caps.get(1) {
            Some(ord) => format!("{} {}", ord.as_str(), name),
            None => name.to_string(),
        };
        let resolved = canon::resolve_name(&candidate)
            .and_then(|id| canon::book(id))
            .zip(caps[3].parse::<u16>().ok())
            .filter(|(book, c)| *c >= 1 && *c <= book.chapters && !mid_word);
        let Some((book, chapter)) = resolved else {
            let skip = text[pos + whole.start()..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            pos += whole.start() + skip;
            continue;
        };
        let verse = caps.get(4).and_then(|m| m.as_str().parse::<u16>().ok());
        let verse_end = caps.get(5).and_then(|m| m.as_str().parse::<u16>().ok());
        let verse_list = caps.get(6).map(|m| {
            let mut list: Vec<u16> = verse.into_iter().collect();
            list.extend(
                LIST_RE
                    .find_iter(m.as_str())
                    .filter_map(|n| n.as_str().parse::<u16>().ok()),
            );
            list
        });

        // the primary span stops before any semicolon chain
        let primary_end = pos
            + caps
                .get(6)
                .or_else(|| caps.get(5))
                .or_else(|| caps.get(4))
                .map(|m| m.end())
                .unwrap_or_else(|| caps.get(3).unwrap().end());
        let primary_start = pos + whole.start();

        out.push((
            primary_start..primary_end,
            ScriptureReference {
                book_id: book.id,
                chapter,
                verse,
                verse_end,
                verse_list,
                original_span: text[primary_start..primary_end].to_string(),
            },
        ));

        if let Some(chain) = caps.get(7) {
            for seg in CHAIN_RE.captures_iter(chain.as_str()) {
                let seg_whole = seg.get(0).unwrap();
                let Ok(seg_chapter) = seg[1].parse::<u16>() else {
                    continue;
                };
                if seg_chapter < 1 || seg_chapter > book.chapters {
                    continue;
                }
                let seg_verse = seg[2].parse::<u16>().ok();
                let seg_end = seg.get(3).and_then(|m| m.as_str().parse::<u16>().ok());

                let start = pos + chain.start() + seg_whole.start();
                let end = pos + chain.start() + seg_whole.end();
                out.push((
                    start..end,
                    ScriptureReference {
                        book_id: book.id,
                        chapter: seg_chapter,
                        verse: seg_verse,
                        verse_end: seg_end,
                        verse_list: None,
                        original_span: text[start..end].to_string(),
                    },
                ));
            }
        }

        pos += whole.end();
    }

    out
}
