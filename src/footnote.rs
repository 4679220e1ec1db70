//! Footnote extraction from chapter markup.
//!
//! Chapters carry footnotes in two loosely-coupled halves: out-of-line
//! definition blocks (a `^` marker followed by a citation like
//! "Gen. 1:1" and the note text), and inline anchors wrapping a single
//! glyph. The two are correlated purely by position: the Nth anchor in
//! document order is paired with the Nth extracted definition. Matched
//! cardinality is assumed, not guaranteed; surplus anchors become inert
//! spans.

use regex_lite::Regex;
use std::sync::LazyLock;

use crate::html;

/// An out-of-line footnote definition. Ids are assigned by extraction
/// order: `fn_0`, `fn_1`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteDefinition {
    pub id: String,
    pub reference: String,
    pub content: String,
}

/// Start of a definition block in flattened text: marker + citation.
static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\^\s*((?:[1-3]\s*)?[A-Za-zÀ-ÿ]+\.?\s*\d{1,3}:\d{1,3}[a-z]?)").unwrap()
});

/// A definition run inside raw markup, for the residual sweep.
static DEF_RAW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\^\s*(?:[1-3]\s*)?[A-Za-zÀ-ÿ]+\.?\s*\d{1,3}:\d{1,3}[a-z]?[^<^]*").unwrap()
});

/// Paragraph elements, for paragraph-level definition removal.
static PARA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>.*?</p>").unwrap());

/// Inline footnote anchor: a short numeric-id anchor wrapping a single
/// glyph (or one entity reference).
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bid\s*=\s*["'](\d+)["'][^>]*>\s*((?:&#?[A-Za-z0-9]+;)|[^<\s])\s*</a>"#)
        .unwrap()
});

/// Split chapter markup into footnote-free display markup plus the
/// ordered footnote definitions.
///
/// Never fails: when the markup holds no recognizable definitions, the
/// input is returned unchanged with an empty list.
pub fn extract_footnotes(html: &str) -> (String, Vec<FootnoteDefinition>) {
    let plain = html::flatten_text(html);
    let footnotes = scan_definitions(&plain);
    if footnotes.is_empty() {
        return (html.to_string(), Vec::new());
    }

    let clean = remove_definition_paragraphs(html);
    let clean = DEF_RAW_RE.replace_all(&clean, "").into_owned();
    let clean = rewrite_markers(&clean, footnotes.len());

    (clean, footnotes)
}

/// Scan flattened text for definition blocks. Each block starts at a
/// marker + citation and runs to the next marker or end of text.
fn scan_definitions(plain: &str) -> Vec<FootnoteDefinition> {
    let mut blocks: Vec<(usize, usize, String)> = Vec::new();
    for caps in DEF_RE.captures_iter(plain) {
        let whole = caps.get(0).unwrap();
        let reference = caps.get(1).unwrap().as_str().trim().to_string();
        blocks.push((whole.start(), whole.end(), reference));
    }

    blocks
        .iter()
        .enumerate()
        .map(|(i, &(_, end, ref reference))| {
            let content_end = blocks
                .get(i + 1)
                .map(|&(next_start, _, _)| next_start)
                .unwrap_or(plain.len());
            FootnoteDefinition {
                id: format!("fn_{i}"),
                reference: reference.clone(),
                content: plain[end..content_end].trim().to_string(),
            }
        })
        .collect()
}

/// Drop paragraphs that consist solely of definition text.
fn remove_definition_paragraphs(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    for m in PARA_RE.find_iter(html) {
        out.push_str(&html[pos..m.start()]);
        let text = html::flatten_text(m.as_str());
        let is_definition = text.trim_start().starts_with('^') && DEF_RE.is_match(&text);
        if !is_definition {
            out.push_str(m.as_str());
        }
        pos = m.end();
    }
    out.push_str(&html[pos..]);
    out
}

/// Replace every inline anchor with a tappable span, pairing the Nth
/// anchor with the Nth definition. Anchors past `count` get no `data-fn`
/// attribute and are non-navigable.
fn rewrite_markers(html: &str, count: usize) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    for (n, caps) in ANCHOR_RE.captures_iter(html).enumerate() {
        let whole = caps.get(0).unwrap();
        let glyph = caps.get(2).unwrap().as_str();
        out.push_str(&html[pos..whole.start()]);
        if n < count {
            out.push_str(&format!(
                "<span class=\"fn-marker\" data-fn=\"fn_{n}\">{glyph}</span>"
            ));
        } else {
            out.push_str(&format!("<span class=\"fn-marker\">{glyph}</span>"));
        }
        pos = whole.end();
    }
    out.push_str(&html[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_definitions() {
        let (_, notes) =
            extract_footnotes("^ Gen. 1:1 first note text ^ Gen 1:2 second note");

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "fn_0");
        assert_eq!(notes[0].reference, "Gen. 1:1");
        assert_eq!(notes[0].content, "first note text");
        assert_eq!(notes[1].id, "fn_1");
        assert_eq!(notes[1].reference, "Gen 1:2");
        assert_eq!(notes[1].content, "second note");
    }

    #[test]
    fn test_no_definitions_passthrough() {
        let html = "<p>En el principio</p>";
        let (clean, notes) = extract_footnotes(html);
        assert_eq!(clean, html);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_definition_paragraph_removed() {
        let html = "<p>Body text<a id=\"21\">*</a> here.</p><p>^ Juan 3:16 nota al pie</p>";
        let (clean, notes) = extract_footnotes(html);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].reference, "Juan 3:16");
        assert_eq!(notes[0].content, "nota al pie");
        assert!(!clean.contains("nota al pie"));
        assert!(clean.contains("Body text"));
    }

    #[test]
    fn test_marker_rewrite_positional() {
        let html = concat!(
            "<p>One<a id=\"5\">*</a> two<a id=\"9\">*</a>.</p>",
            "<p>^ Gen. 1:1 alpha ^ Gen. 1:2 beta</p>",
        );
        let (clean, notes) = extract_footnotes(html);

        assert_eq!(notes.len(), 2);
        assert!(clean.contains("data-fn=\"fn_0\""));
        assert!(clean.contains("data-fn=\"fn_1\""));
        let first = clean.find("fn_0").unwrap();
        let second = clean.find("fn_1").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_surplus_marker_is_inert() {
        let html = concat!(
            "<p>One<a id=\"5\">*</a> two<a id=\"9\">*</a>.</p>",
            "<p>^ Gen. 1:1 only note</p>",
        );
        let (clean, notes) = extract_footnotes(html);

        assert_eq!(notes.len(), 1);
        assert!(clean.contains("data-fn=\"fn_0\""));
        assert!(!clean.contains("data-fn=\"fn_1\""));
        // the second anchor is still rewritten, just without a target
        assert_eq!(clean.matches("fn-marker").count(), 2);
    }

    #[test]
    fn test_residual_definition_swept() {
        // definition not isolated in its own paragraph
        let html = "<div>intro ^ Sal. 23:1 nota residual</div>";
        let (clean, notes) = extract_footnotes(html);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].reference, "Sal. 23:1");
        assert!(!clean.contains("nota residual"));
        assert!(clean.contains("intro"));
    }

    #[test]
    fn test_verse_letter_suffix() {
        let (_, notes) = extract_footnotes("^ Mal. 2:15a media parte");
        assert_eq!(notes[0].reference, "Mal. 2:15a");
        assert_eq!(notes[0].content, "media parte");
    }
}
