//! The fixed 66-book canon: names, short codes, chapter counts, and
//! case-folded name lookup for citation resolution.
//!
//! Canonical names follow the Spanish editions the packages ship with;
//! the abbreviation table adds short codes and common abbreviations in
//! both Spanish and English conventions (including numeric-prefixed
//! forms like "1 Cor").

use std::collections::HashMap;
use std::sync::LazyLock;

/// One book of the canon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    /// Canonical book number, 1 (Génesis) through 66 (Apocalipsis).
    pub id: u8,
    pub name: &'static str,
    pub short: &'static str,
    pub chapters: u16,
}

pub const BOOK_COUNT: u8 = 66;

/// Sum of chapter counts over the whole canon.
pub const TOTAL_CHAPTERS: u32 = 1189;

/// (name, short code, chapter count), indexed by book id - 1.
const BOOKS: [(&str, &str, u16); 66] = [
    ("Génesis", "gen", 50),
    ("Éxodo", "exo", 40),
    ("Levítico", "lev", 27),
    ("Números", "num", 36),
    ("Deuteronomio", "deu", 34),
    ("Josué", "jos", 24),
    ("Jueces", "jue", 21),
    ("Rut", "rut", 4),
    ("1 Samuel", "1 sa", 31),
    ("2 Samuel", "2 sa", 24),
    ("1 Reyes", "1 re", 22),
    ("2 Reyes", "2 re", 25),
    ("1 Crónicas", "1 cr", 29),
    ("2 Crónicas", "2 cr", 36),
    ("Esdras", "esd", 10),
    ("Nehemías", "neh", 13),
    ("Ester", "est", 10),
    ("Job", "job", 42),
    ("Salmos", "sal", 150),
    ("Proverbios", "pro", 31),
    ("Eclesiastés", "ecl", 12),
    ("Cantares", "can", 8),
    ("Isaías", "isa", 66),
    ("Jeremías", "jer", 52),
    ("Lamentaciones", "lam", 5),
    ("Ezequiel", "eze", 48),
    ("Daniel", "dan", 12),
    ("Oseas", "ose", 14),
    ("Joel", "joe", 3),
    ("Amós", "amo", 9),
    ("Abdías", "abd", 1),
    ("Jonás", "jon", 4),
    ("Miqueas", "miq", 7),
    ("Nahúm", "nah", 3),
    ("Habacuc", "hab", 3),
    ("Sofonías", "sof", 3),
    ("Hageo", "hag", 2),
    ("Zacarías", "zac", 14),
    ("Malaquías", "mal", 4),
    ("Mateo", "mat", 28),
    ("Marcos", "mar", 16),
    ("Lucas", "luc", 24),
    ("Juan", "jua", 21),
    ("Hechos", "hec", 28),
    ("Romanos", "rom", 16),
    ("1 Corintios", "1 co", 16),
    ("2 Corintios", "2 co", 13),
    ("Gálatas", "gal", 6),
    ("Efesios", "efe", 6),
    ("Filipenses", "fil", 4),
    ("Colosenses", "col", 4),
    ("1 Tesalonicenses", "1 te", 5),
    ("2 Tesalonicenses", "2 te", 3),
    ("1 Timoteo", "1 ti", 6),
    ("2 Timoteo", "2 ti", 4),
    ("Tito", "tit", 3),
    ("Filemón", "flm", 1),
    ("Hebreos", "heb", 13),
    ("Santiago", "san", 5),
    ("1 Pedro", "1 pe", 5),
    ("2 Pedro", "2 pe", 3),
    ("1 Juan", "1 jn", 5),
    ("2 Juan", "2 jn", 1),
    ("3 Juan", "3 jn", 1),
    ("Judas", "jud", 1),
    ("Apocalipsis", "apo", 22),
];

/// Curated abbreviations beyond the canonical names and short codes.
/// Mostly English names and abbreviations that the short-code prefixes
/// do not already cover.
const ABBREVIATIONS: [(&str, u8); 52] = [
    ("gn", 1),
    ("ex", 2),
    ("lv", 3),
    ("nm", 4),
    ("dt", 5),
    ("joshua", 6),
    ("judges", 7),
    ("judg", 7),
    ("ruth", 8),
    ("1 kings", 11),
    ("2 kings", 12),
    ("1 chronicles", 13),
    ("2 chronicles", 14),
    ("ezra", 15),
    ("psalms", 19),
    ("psalm", 19),
    ("ps", 19),
    ("ecclesiastes", 21),
    ("eccl", 21),
    ("song", 22),
    ("cant", 22),
    ("hosea", 28),
    ("hos", 28),
    ("obadiah", 31),
    ("obad", 31),
    ("micah", 33),
    ("mic", 33),
    ("zephaniah", 36),
    ("zeph", 36),
    ("zechariah", 38),
    ("zech", 38),
    ("mt", 40),
    ("mk", 41),
    ("mr", 41),
    ("luke", 42),
    ("lk", 42),
    ("john", 43),
    ("jn", 43),
    ("acts", 44),
    ("1 cor", 46),
    ("2 cor", 47),
    ("ephesians", 49),
    ("eph", 49),
    ("philippians", 50),
    ("phil", 50),
    ("philemon", 57),
    ("phlm", 57),
    ("james", 59),
    ("jas", 59),
    ("stg", 59),
    ("jude", 65),
    ("rev", 66),
];

static LOOKUP: LazyLock<HashMap<String, u8>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (i, (name, short, _)) in BOOKS.iter().enumerate() {
        let id = (i + 1) as u8;
        map.insert(fold(name), id);
        map.insert(fold(short), id);
    }
    for (abbrev, id) in ABBREVIATIONS {
        map.insert(fold(abbrev), id);
    }
    map
});

/// Lookup keys eligible for the prefix fallback (length >= 3), sorted
/// longest-first so the most specific prefix wins deterministically.
static PREFIX_KEYS: LazyLock<Vec<(String, u8)>> = LazyLock::new(|| {
    let mut keys: Vec<(String, u8)> = LOOKUP
        .iter()
        .filter(|(k, _)| k.chars().count() >= 3)
        .map(|(k, &id)| (k.clone(), id))
        .collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
    keys
});

/// Get a book by its canonical number (1..=66).
pub fn book(id: u8) -> Option<Book> {
    if id == 0 {
        return None;
    }
    BOOKS
        .get(id as usize - 1)
        .map(|&(name, short, chapters)| Book {
            id,
            name,
            short,
            chapters,
        })
}

/// Iterate all 66 books in canonical order.
pub fn books() -> impl Iterator<Item = Book> {
    (1..=BOOK_COUNT).filter_map(book)
}

/// Resolve a book name, short code, or abbreviation to a book number.
///
/// Tries an exact case-folded match first, then falls back to prefix
/// matching: any table key of length >= 3 that is a prefix of the
/// candidate is accepted ("roma" resolves via "rom"). The fallback can
/// pick an unintended book when names share a prefix; that ambiguity is
/// inherited behavior and is pinned by tests rather than fixed.
pub fn resolve_name(name: &str) -> Option<u8> {
    let key = fold(name);
    if key.len() < 2 {
        return None;
    }
    if let Some(&id) = LOOKUP.get(&key) {
        return Some(id);
    }
    PREFIX_KEYS
        .iter()
        .find(|(k, _)| key.starts_with(k.as_str()))
        .map(|&(_, id)| id)
}

/// Case-fold a name for lookup: lowercase, accents stripped, trailing
/// period dropped, whitespace collapsed.
fn fold(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_space = true;
    for c in name.trim().trim_end_matches('.').chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
            continue;
        }
        last_space = false;
        for lc in c.to_lowercase() {
            out.push(match lc {
                'á' | 'à' | 'ä' | 'â' => 'a',
                'é' | 'è' | 'ë' | 'ê' => 'e',
                'í' | 'ì' | 'ï' | 'î' => 'i',
                'ó' | 'ò' | 'ö' | 'ô' => 'o',
                'ú' | 'ù' | 'ü' | 'û' => 'u',
                'ñ' => 'n',
                other => other,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        assert_eq!(BOOKS.len(), 66);
        let sum: u32 = BOOKS.iter().map(|&(_, _, c)| c as u32).sum();
        assert_eq!(sum, TOTAL_CHAPTERS);
    }

    #[test]
    fn test_book_lookup() {
        assert_eq!(book(1).unwrap().name, "Génesis");
        assert_eq!(book(19).unwrap().chapters, 150);
        assert_eq!(book(43).unwrap().name, "Juan");
        assert_eq!(book(66).unwrap().name, "Apocalipsis");
        assert!(book(0).is_none());
        assert!(book(67).is_none());
    }

    #[test]
    fn test_resolve_exact() {
        assert_eq!(resolve_name("Juan"), Some(43));
        assert_eq!(resolve_name("juan"), Some(43));
        assert_eq!(resolve_name("Génesis"), Some(1));
        assert_eq!(resolve_name("Genesis"), Some(1));
        assert_eq!(resolve_name("Gen."), Some(1));
        assert_eq!(resolve_name("1 Corintios"), Some(46));
        assert_eq!(resolve_name("1 Cor"), Some(46));
        assert_eq!(resolve_name("jn"), Some(43));
        assert_eq!(resolve_name("Ps"), Some(19));
    }

    #[test]
    fn test_resolve_prefix_fallback() {
        // "roma" is not a table key but "rom" prefixes it
        assert_eq!(resolve_name("Roma"), Some(45));
        assert_eq!(resolve_name("Apocal"), Some(66));
        assert_eq!(resolve_name("Salmo"), Some(19));
        assert_eq!(resolve_name("Santi"), Some(59));
        // longest matching prefix wins: "judg" (Jueces) over "jud" (Judas)
        assert_eq!(resolve_name("Judgm"), Some(7));
    }

    #[test]
    fn test_resolve_miss() {
        assert_eq!(resolve_name(""), None);
        assert_eq!(resolve_name("x"), None);
        assert_eq!(resolve_name("zzz"), None);
        assert_eq!(resolve_name("capitulo"), None);
    }

    #[test]
    fn test_books_iterator_order() {
        let all: Vec<Book> = books().collect();
        assert_eq!(all.len(), 66);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[65].id, 66);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }
}
