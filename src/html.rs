//! Markup helpers shared by the chapter loader, footnote extractor,
//! reference resolver, and search engine.
//!
//! Content resources are HTML-like fragments whose exact shape is not
//! guaranteed, so everything here is heuristic pattern matching rather
//! than a real DOM. Patterns are compiled once via LazyLock.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Matches the <body> element and captures its inner fragment.
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

/// Matches <script>...</script> blocks.
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());

/// Matches <style>...</style> blocks.
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());

/// Matches HTML comments.
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Matches void non-content elements: external links, metadata, images.
static VOID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:link|meta|img)\b[^>]*>").unwrap());

/// Matches any tag, for flattening markup to plain text.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Matches entity references for decoding during flattening.
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x?[0-9A-Fa-f]+|[A-Za-z]+);").unwrap());

/// Extract the inner fragment of the <body> element.
///
/// Falls back to the whole input when no body element is found, since
/// some packages ship bare fragments.
pub fn extract_body(html: &str) -> &str {
    match BODY_RE.captures(html) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(html),
        None => html,
    }
}

/// Strip non-content elements from a fragment: scripts, styles,
/// comments, external links, metadata, and images.
pub fn sanitize_fragment(html: &str) -> String {
    let html = SCRIPT_RE.replace_all(html, "");
    let html = STYLE_RE.replace_all(&html, "");
    let html = COMMENT_RE.replace_all(&html, "");
    VOID_RE.replace_all(&html, "").into_owned()
}

/// Flatten markup to plain text: tags replaced by spaces, entities
/// decoded, whitespace collapsed to single spaces.
pub fn flatten_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let text = ENTITY_RE.replace_all(&text, |caps: &regex_lite::Captures| {
        resolve_entity(&caps[1]).unwrap_or_default()
    });
    let words: Vec<&str> = text.split_whitespace().collect();
    words.join(" ")
}

/// Visible text of a fragment: tags removed outright, entities decoded,
/// whitespace untouched. Unlike [`flatten_text`] no spaces are inserted
/// at tag positions, so inline spans do not split adjacent characters.
pub fn visible_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    ENTITY_RE
        .replace_all(&text, |caps: &regex_lite::Captures| {
            resolve_entity(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Escape text for inclusion in an HTML fragment.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Resolve an entity reference body (without the & and ;).
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some(" ".to_string()),
        // Accented vowels are common in the Spanish editions
        "aacute" => return Some("á".to_string()),
        "eacute" => return Some("é".to_string()),
        "iacute" => return Some("í".to_string()),
        "oacute" => return Some("ó".to_string()),
        "uacute" => return Some("ú".to_string()),
        "ntilde" => return Some("ñ".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_body() {
        let html = "<html><head><title>t</title></head><body class=\"x\"><p>Hi</p></body></html>";
        assert_eq!(extract_body(html), "<p>Hi</p>");

        // No body element: whole input passes through
        assert_eq!(extract_body("<p>bare</p>"), "<p>bare</p>");
    }

    #[test]
    fn test_sanitize_fragment() {
        let html = concat!(
            "<p>keep</p><script>var x = 1;</script>",
            "<style>p { color: red }</style>",
            "<link rel=\"stylesheet\" href=\"a.css\"/>",
            "<meta charset=\"utf-8\"/>",
            "<img src=\"pic.png\" alt=\"\"/>",
            "<!-- note --><p>also keep</p>",
        );
        assert_eq!(sanitize_fragment(html), "<p>keep</p><p>also keep</p>");
    }

    #[test]
    fn test_flatten_text() {
        assert_eq!(
            flatten_text("<p>En el  principio</p>\n<p>cre&oacute;</p>"),
            "En el principio creó"
        );
        assert_eq!(flatten_text("<p>A&nbsp;B &amp; C</p>"), "A B & C");
        assert_eq!(flatten_text("<p>Dios &#233;l</p>"), "Dios él");
        assert_eq!(flatten_text("<p>&#x41;</p>"), "A");
        assert_eq!(flatten_text(""), "");
    }

    #[test]
    fn test_visible_text() {
        assert_eq!(visible_text("a<span>b</span>c"), "abc");
        assert_eq!(visible_text("x &amp;lt; y"), "x &lt; y");
        assert_eq!(visible_text("  sin   colapso "), "  sin   colapso ");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & c“"), "a &lt; b &amp; c“");
        assert_eq!(escape("\"quoted\""), "&quot;quoted&quot;");
    }
}
