//! The common parse tree shared by every scripture parser, and the commentary tree.
//!
//! Serialized field names and `"type"` tags are the ones the generated API exposes,
//! so chapter contents are embedded into output pages as-is.

use serde::{Deserialize, Serialize};

use crate::book_order::BookId;
use crate::logger::Log;
use crate::reference::VerseRef;

/// The root of one parsed book.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: Vec<RootContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_messages: Vec<ParseMessage>,
}

impl ParseTree {
    pub fn new() -> Self {
        ParseTree::default()
    }

    pub fn chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.content.iter().filter_map(|c| match c {
            RootContent::Chapter(chapter) => Some(chapter),
            RootContent::Heading(_) => None,
        })
    }

    /// Record a non-fatal problem on the tree and forward it to the log.
    pub fn warn(&mut self, msg: String, log: &dyn Log) {
        log.warn(&msg);
        self.parse_messages.push(ParseMessage::warning(msg));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RootContent {
    Heading(Heading),
    Chapter(Chapter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
}

impl ParseMessage {
    pub fn warning(message: impl Into<String>) -> Self {
        ParseMessage { kind: MessageKind::Warning, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub content: Vec<ChapterContent>,
    pub footnotes: Vec<Footnote>,
}

impl Chapter {
    pub fn new(number: u32) -> Self {
        Chapter { number, content: Vec::new(), footnotes: Vec::new() }
    }

    pub fn verses(&self) -> impl Iterator<Item = &Verse> {
        self.content.iter().filter_map(|c| match c {
            ChapterContent::Verse(verse) => Some(verse),
            _ => None,
        })
    }

    pub fn verse_count(&self) -> usize {
        self.verses().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChapterContent {
    Heading(Heading),
    Verse(Verse),
    HebrewSubtitle(HebrewSubtitle),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub content: Vec<VerseContent>,
}

impl Verse {
    pub fn new(number: u32) -> Self {
        Verse { number, content: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HebrewSubtitle {
    pub content: Vec<VerseContent>,
}

/// One item of verse content. Plain text serializes as a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerseContent {
    Text(String),
    Formatted(FormattedText),
    FootnoteReference(FootnoteReference),
    InlineHeading(InlineHeading),
    InlineLineBreak(InlineLineBreak),
}

impl VerseContent {
    pub fn line_break() -> Self {
        VerseContent::InlineLineBreak(InlineLineBreak { line_break: true })
    }

    pub fn footnote(note_id: u32) -> Self {
        VerseContent::FootnoteReference(FootnoteReference { note_id })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedText {
    pub text: String,
    /// Poetic indent level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poem: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub words_of_jesus: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub descriptive: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italics: bool,
}

impl FormattedText {
    /// Whether `other` carries the same attributes, so the two runs can be joined.
    pub fn same_style(&self, other: &FormattedText) -> bool {
        self.poem == other.poem
            && self.words_of_jesus == other.words_of_jesus
            && self.descriptive == other.descriptive
            && self.italics == other.italics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootnoteReference {
    pub note_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineHeading {
    pub heading: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineLineBreak {
    pub line_break: bool,
}

/// The marker shown in the text for a footnote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Caller {
    /// Rendered with an automatically generated symbol, written as "+".
    Generated,
    Explicit(String),
    None,
}

impl From<Option<String>> for Caller {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            None => Caller::None,
            Some("+") => Caller::Generated,
            Some(s) => Caller::Explicit(s.to_string()),
        }
    }
}

impl From<Caller> for Option<String> {
    fn from(value: Caller) -> Self {
        match value {
            Caller::Generated => Some("+".to_string()),
            Caller::Explicit(s) => Some(s),
            Caller::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footnote {
    pub note_id: u32,
    pub text: String,
    pub caller: Caller,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<FootnoteVerseRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteVerseRef {
    pub chapter: u32,
    pub verse: u32,
}

// --- Commentary ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommentaryParseTree {
    pub books: Vec<CommentaryBookNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<CommentaryProfileNode>,
}

impl CommentaryParseTree {
    pub fn new() -> Self {
        CommentaryParseTree::default()
    }

    /// Find or append the node for `book`.
    pub fn book_mut(&mut self, book: BookId) -> &mut CommentaryBookNode {
        let idx = match self.books.iter().position(|b| b.book == book) {
            Some(idx) => idx,
            None => {
                self.books.push(CommentaryBookNode::new(book));
                self.books.len() - 1
            }
        };
        &mut self.books[idx]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryBookNode {
    pub book: BookId,
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_summary: Option<String>,
    pub chapters: Vec<CommentaryChapterNode>,
}

impl CommentaryBookNode {
    pub fn new(book: BookId) -> Self {
        CommentaryBookNode { book, introduction: None, introduction_summary: None, chapters: Vec::new() }
    }

    /// Find or append the chapter `number`.
    pub fn chapter_mut(&mut self, number: u32) -> &mut CommentaryChapterNode {
        let idx = match self.chapters.iter().position(|c| c.number == number) {
            Some(idx) => idx,
            None => {
                self.chapters.push(CommentaryChapterNode::new(number));
                self.chapters.len() - 1
            }
        };
        &mut self.chapters[idx]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryChapterNode {
    pub number: u32,
    pub introduction: Option<String>,
    pub verses: Vec<CommentaryVerseNode>,
}

impl CommentaryChapterNode {
    pub fn new(number: u32) -> Self {
        CommentaryChapterNode { number, introduction: None, verses: Vec::new() }
    }

    /// Find or append the verse `number`.
    pub fn verse_mut(&mut self, number: u32) -> &mut CommentaryVerseNode {
        let idx = match self.verses.iter().position(|v| v.number == number) {
            Some(idx) => idx,
            None => {
                self.verses.push(CommentaryVerseNode { number, content: Vec::new() });
                self.verses.len() - 1
            }
        };
        &mut self.verses[idx]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryVerseNode {
    pub number: u32,
    pub content: Vec<String>,
}

/// A topical article (a person, a place) attached to a commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryProfileNode {
    pub id: String,
    pub subject: String,
    pub reference: Option<VerseRef>,
    pub content: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verse_content_json_shape() {
        let verse = ChapterContent::Verse(Verse {
            number: 1,
            content: vec![
                VerseContent::Text("In the ".to_string()),
                VerseContent::Formatted(FormattedText {
                    text: "beginning".to_string(),
                    italics: true,
                    ..Default::default()
                }),
                VerseContent::footnote(1),
                VerseContent::line_break(),
            ],
        });

        assert_eq!(
            serde_json::to_value(&verse).unwrap(),
            json!({
                "type": "verse",
                "number": 1,
                "content": [
                    "In the ",
                    { "text": "beginning", "italics": true },
                    { "noteId": 1 },
                    { "lineBreak": true },
                ],
            })
        );
    }

    #[test]
    fn test_caller_serialization() {
        let footnote = Footnote {
            note_id: 2,
            text: "Or a waste".to_string(),
            caller: Caller::Generated,
            reference: Some(FootnoteVerseRef { chapter: 1, verse: 2 }),
        };
        let value = serde_json::to_value(&footnote).unwrap();
        assert_eq!(value["caller"], json!("+"));
        assert_eq!(value["noteId"], json!(2));

        let none = Footnote { caller: Caller::None, reference: None, ..footnote };
        assert_eq!(serde_json::to_value(&none).unwrap()["caller"], json!(null));
    }

    #[test]
    fn test_line_break_tag() {
        assert_eq!(
            serde_json::to_value(ChapterContent::LineBreak).unwrap(),
            json!({ "type": "line_break" })
        );
    }
}
