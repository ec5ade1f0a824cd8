use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::book_order::BookId;

lazy_static! {
    // Genesis 1:1
    // 1 Corinthians 1:2-4
    // GEN 1:1 In the beginning
    // Gen.1.1-2.3
    static ref RE_VERSE_REF: Regex = Regex::new(
        r"^\s*(?P<book>(?:[1-3]\s*)?[^\W\d_][\w ]*?)\.?\s*(?P<chapter>\d+)\s*[:.]\s*(?P<verse>\d+)(?:\s*[-–]\s*(?:(?P<end_chapter>\d+)\s*[:.]\s*)?(?P<end_verse>\d+))?"
    ).unwrap();

    // JON 1
    // Song of Songs 2
    static ref RE_CHAPTER_REF: Regex = Regex::new(
        r"^\s*(?P<book>(?:[1-3]\s*)?[^\W\d_][\w ]*?)\.?\s*(?P<chapter>\d+)\s*$"
    ).unwrap();
}

/// A reference to a verse, or a verse range, in a canonical book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRef {
    pub book: BookId,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_verse: Option<u32>,
    /// Text following the reference, trimmed.
    #[serde(skip)]
    pub content: Option<String>,
}

/// Parse a verse reference like "1 Corinthians 1:2", "1CO 1:2" or "Gen.1.1-2.3".
///
/// The book may be given by id, English name or OSIS abbreviation in any case.
/// Returns None if the text does not start with a reference to a known book.
pub fn parse_verse_reference(text: &str) -> Option<VerseRef> {
    let caps = RE_VERSE_REF.captures(text)?;

    let book = BookId::from_name(caps.name("book")?.as_str())?;
    let chapter: u32 = caps.name("chapter")?.as_str().parse().ok()?;
    let verse: u32 = caps.name("verse")?.as_str().parse().ok()?;

    let end_verse: Option<u32> = match caps.name("end_verse") {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    let end_chapter: Option<u32> = match caps.name("end_chapter") {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };

    let matched_len = caps.get(0)?.end();
    let rest = text[matched_len..].trim();
    let content = if rest.is_empty() { None } else { Some(rest.to_string()) };

    Some(VerseRef {
        book,
        chapter,
        verse,
        end_chapter,
        end_verse,
        content,
    })
}

/// Parse a chapter reference like "JON 1".
pub fn parse_chapter_reference(text: &str) -> Option<(BookId, u32)> {
    let caps = RE_CHAPTER_REF.captures(text)?;
    let book = BookId::from_name(caps.name("book")?.as_str())?;
    let chapter: u32 = caps.name("chapter")?.as_str().parse().ok()?;
    Some((book, chapter))
}

pub fn is_empty_or_whitespace(text: Option<&str>) -> bool {
    text.is_none_or(|t| t.trim().is_empty())
}
