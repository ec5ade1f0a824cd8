//! Tokenizer for the inline-tag markup dialect.
//!
//! Structural boundaries are found with one regex pass over the whole file.
//! Verse bodies get a second, separate pass into inline segments.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // <BN>GENESIS</BN>
    // <CN>CHAPTER 1</CN>, <SN>PSALM 16</SN>
    // <SH>The Creation</SH>, <SS>A Mikhtam of David.</SS>
    // <V>{{01::1}}2<T>, <PM>{{42::13}}6<T>, <P>{{19::16}}2^
    // A {...} group right after the verse marker is left in the body, so
    // <T>{And} he said comes out as italic "And" followed by plain text.
    static ref RE_STRUCTURE: Regex = Regex::new(
        r"<BN>(?P<book>.*?)</BN>|<(?:CN|SN)>(?P<chapter>.*?)</(?:CN|SN)>|<SH>(?P<heading>.*?)</SH>|<SS>(?P<subtitle>.*?)</SS>|<(?P<tag>V|C|CC|CP|PM|A|PO|P|PN)>\{\{(?P<reference>.*?)\}\}(?P<verse>\d+)(?:<T>|\^)"
    ).unwrap();

    // <$F<FN>01<FNC>1<FNV>2</FN><N1>Or {a waste}$E>
    // <$R<RFN>01<RNC>1<RNV>1</RFN><RA>Ps 102:25$RE>
    static ref RE_SEGMENT: Regex = Regex::new(
        r"(?P<footnote><\$F.*?\$E>)|(?P<crossref><\$R.*?\$RE>)|(?P<rs_start><RS>)|(?P<rs_end></RS>)|(?P<tag><[^>]*>)|\{(?P<italics>.*?)\}"
    ).unwrap();

    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// The tag that opens a verse. Poetry and paragraph variants change how the verse is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseTag {
    V,
    C,
    CC,
    CP,
    PM,
    A,
    PO,
    P,
    PN,
}

impl VerseTag {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "V" => Some(VerseTag::V),
            "C" => Some(VerseTag::C),
            "CC" => Some(VerseTag::CC),
            "CP" => Some(VerseTag::CP),
            "PM" => Some(VerseTag::PM),
            "A" => Some(VerseTag::A),
            "PO" => Some(VerseTag::PO),
            "P" => Some(VerseTag::P),
            "PN" => Some(VerseTag::PN),
            _ => None,
        }
    }

    pub fn is_poem(&self) -> bool {
        matches!(self, VerseTag::P | VerseTag::PO | VerseTag::PN | VerseTag::CC | VerseTag::CP)
    }

    pub fn starts_paragraph(&self) -> bool {
        matches!(self, VerseTag::PM)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    BookName(&'a str),
    ChapterNumber(&'a str),
    SectionHeading(&'a str),
    HebrewSubtitle(&'a str),
    VerseStart {
        tag: VerseTag,
        /// The `BB::C` part between the double braces.
        reference: &'a str,
        number: &'a str,
    },
    /// Text between two boundaries.
    Body(&'a str),
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in RE_STRUCTURE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Body(&text[last..whole.start()]));
        }
        last = whole.end();

        let token = if let Some(m) = caps.name("book") {
            Token::BookName(m.as_str())
        } else if let Some(m) = caps.name("chapter") {
            Token::ChapterNumber(m.as_str())
        } else if let Some(m) = caps.name("heading") {
            Token::SectionHeading(m.as_str())
        } else if let Some(m) = caps.name("subtitle") {
            Token::HebrewSubtitle(m.as_str())
        } else {
            let tag = caps.name("tag").and_then(|m| VerseTag::from_tag(m.as_str()));
            match (tag, caps.name("reference"), caps.name("verse")) {
                (Some(tag), Some(reference), Some(number)) => Token::VerseStart {
                    tag,
                    reference: reference.as_str(),
                    number: number.as_str(),
                },
                _ => continue,
            }
        };
        tokens.push(token);
    }

    if last < text.len() {
        tokens.push(Token::Body(&text[last..]));
    }

    tokens
}

/// Inline pieces of a verse body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Italics(&'a str),
    /// The whole `<$F ... $E>` block.
    Footnote(&'a str),
    CrossReference,
    RedLetterStart,
    RedLetterEnd,
    /// Any other tag, kept only as a marker.
    Tag,
}

pub fn segments(body: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in RE_SEGMENT.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            out.push(Segment::Text(&body[last..whole.start()]));
        }
        last = whole.end();

        let segment = if let Some(m) = caps.name("footnote") {
            Segment::Footnote(m.as_str())
        } else if caps.name("crossref").is_some() {
            Segment::CrossReference
        } else if caps.name("rs_start").is_some() {
            Segment::RedLetterStart
        } else if caps.name("rs_end").is_some() {
            Segment::RedLetterEnd
        } else if caps.name("tag").is_some() {
            Segment::Tag
        } else {
            Segment::Italics(caps.name("italics").map(|m| m.as_str()).unwrap_or_default())
        };
        out.push(segment);
    }

    if last < body.len() {
        out.push(Segment::Text(&body[last..]));
    }

    out
}

/// Collapse every run of whitespace, line endings included, to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_string()
}
