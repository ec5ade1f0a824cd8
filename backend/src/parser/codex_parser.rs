//! Parser for notebook-cell JSON (`{"cells": [...]}`), one HTML cell per verse
//! or chapter heading.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::book_order::BookId;
use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::reference::{parse_chapter_reference, parse_verse_reference, VerseRef};
use crate::types::{
    Caller, Chapter, ChapterContent, Footnote, FootnoteVerseRef, Heading, ParseTree, RootContent, Verse,
    VerseContent,
};

lazy_static! {
    // <sup class="footnote-marker" data-footnote="&lt;p&gt;Or ...&lt;/p&gt;">1</sup>
    static ref RE_SUP: Regex = Regex::new(r"(?s)<sup\b(?P<attrs>[^>]*)>.*?</sup>").unwrap();
    static ref RE_DATA_FOOTNOTE: Regex = Regex::new(r#"data-footnote\s*=\s*"(?P<note>[^"]*)""#).unwrap();
    static ref RE_FOOTNOTE_CLASS: Regex = Regex::new(r#"class\s*=\s*"[^"]*\bfootnote-marker\b[^"]*""#).unwrap();
    static ref RE_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

#[derive(Debug, Deserialize)]
struct CodexNotebook {
    cells: Vec<CodexCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodexCell {
    language_id: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum CellMetadata {
    Text {
        id: String,
        #[serde(default, rename = "bookCode")]
        book_code: Option<String>,
        #[serde(default)]
        chapter: Option<u32>,
        #[serde(default)]
        verse: Option<u32>,
        #[serde(default)]
        data: Option<TextCellData>,
    },
    Paratext {
        id: String,
    },
    ChapterHeading {},
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextCellData {
    #[serde(default)]
    global_references: Vec<String>,
}

/// A piece of cell content before it is split into lines.
enum Piece {
    Text(String),
    Note(u32),
}

pub struct CodexParser;

impl CodexParser {
    /// Parse a notebook. A change of book starts a new tree.
    pub fn parse(content: &str, log: &dyn Log) -> Result<Vec<ParseTree>> {
        let notebook: CodexNotebook = serde_json::from_str(content)?;
        let mut builder = CodexBuilder::default();

        for cell in &notebook.cells {
            if cell.language_id != "html" || cell.value.is_empty() {
                continue;
            }
            let Some(metadata) = cell.metadata.clone() else { continue };
            let Ok(metadata) = serde_json::from_value::<CellMetadata>(metadata) else {
                log.debug("Ignoring cell with unrecognized metadata");
                continue;
            };

            match metadata {
                CellMetadata::Text { id, book_code, chapter, verse, data } => {
                    let reference = builder.resolve_reference(&id, book_code.as_deref(), chapter, verse, data)?;
                    builder.add_verse_cell(reference, &cell.value);
                }
                CellMetadata::Paratext { id } => match parse_chapter_reference(&id) {
                    Some((book, chapter)) => builder.add_heading_cell(book, chapter, &cell.value),
                    None => log.debug(&format!("Ignoring paratext cell {}", id)),
                },
                CellMetadata::ChapterHeading {} => {}
            }
        }

        Ok(builder.finish())
    }
}

#[derive(Default)]
struct CodexBuilder {
    trees: Vec<ParseTree>,
    previous: Option<VerseRef>,
    /// Lines of the verse being accumulated.
    lines: Vec<Vec<VerseContent>>,
}

impl CodexBuilder {
    fn resolve_reference(
        &self,
        id: &str,
        book_code: Option<&str>,
        chapter: Option<u32>,
        verse: Option<u32>,
        data: Option<TextCellData>,
    ) -> Result<VerseRef> {
        if let Some(reference) = parse_verse_reference(id) {
            return Ok(reference);
        }

        if let (Some(code), Some(chapter)) = (book_code, chapter) {
            let book = BookId::from_name(code).ok_or_else(|| ParseError::InvalidBook(code.to_string()))?;
            let verse = match (verse, &self.previous) {
                (Some(verse), _) => verse,
                // Not every cell carries a verse number; continue the previous one.
                (None, Some(prev)) if prev.book == book && prev.chapter == chapter => prev.verse,
                (None, Some(_)) => {
                    return Err(ParseError::InvalidReference(format!(
                        "cannot infer verse number for non-consecutive cell {}",
                        id
                    )))
                }
                (None, None) => return Err(ParseError::InvalidReference(id.to_string())),
            };
            return Ok(VerseRef { book, chapter, verse, end_chapter: None, end_verse: None, content: None });
        }

        let global = data.and_then(|d| d.global_references.into_iter().next());
        match global {
            Some(global) => parse_verse_reference(&global).ok_or(ParseError::InvalidReference(global)),
            None => Err(ParseError::InvalidReference(id.to_string())),
        }
    }

    fn chapter_mut(&mut self, book: BookId, number: u32) -> &mut Chapter {
        if self.trees.last().is_none_or(|t| t.id != Some(book)) {
            let mut tree = ParseTree::new();
            tree.id = Some(book);
            self.trees.push(tree);
        }
        let last = self.trees.len() - 1;
        let tree = &mut self.trees[last];

        let found = tree
            .content
            .iter()
            .position(|c| matches!(c, RootContent::Chapter(ch) if ch.number == number));
        let idx = match found {
            Some(idx) => idx,
            None => {
                tree.content.push(RootContent::Chapter(Chapter::new(number)));
                tree.content.len() - 1
            }
        };
        match &mut tree.content[idx] {
            RootContent::Chapter(chapter) => chapter,
            RootContent::Heading(_) => unreachable!("index points at a chapter"),
        }
    }

    fn add_verse_cell(&mut self, reference: VerseRef, html: &str) {
        let same_verse = self.previous.as_ref().is_some_and(|prev| {
            prev.book == reference.book && prev.chapter == reference.chapter && prev.verse == reference.verse
        });
        if !same_verse {
            self.flush();
        }

        let pieces = {
            let chapter = self.chapter_mut(reference.book, reference.chapter);
            cell_pieces(html, chapter, reference.verse)
        };
        self.previous = Some(reference);

        self.lines.push(Vec::new());
        for piece in pieces {
            match piece {
                Piece::Text(text) => {
                    let mut parts = text.split('\n');
                    if let Some(first) = parts.next() {
                        self.push_to_line(first);
                    }
                    for part in parts {
                        self.lines.push(Vec::new());
                        self.push_to_line(part);
                    }
                }
                Piece::Note(note_id) => {
                    if let Some(line) = self.lines.last_mut() {
                        line.push(VerseContent::footnote(note_id));
                    }
                }
            }
        }
    }

    fn push_to_line(&mut self, text: &str) {
        let Some(line) = self.lines.last_mut() else { return };
        if text.is_empty() {
            return;
        }
        match line.last_mut() {
            Some(VerseContent::Text(last)) => last.push_str(text),
            _ => line.push(VerseContent::Text(text.to_string())),
        }
    }

    fn add_heading_cell(&mut self, book: BookId, chapter: u32, html: &str) {
        self.flush();
        let text = html_to_text(html);
        if text.is_empty() {
            return;
        }

        let chapter = self.chapter_mut(book, chapter);
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                chapter.content.push(ChapterContent::LineBreak);
            }
            chapter.content.push(ChapterContent::Heading(Heading { content: vec![line.to_string()] }));
        }
    }

    /// Write the accumulated lines of the previous verse into its chapter.
    fn flush(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        let Some(prev) = self.previous.take() else { return };

        let mut content: Vec<VerseContent> = Vec::new();
        for line in lines.into_iter().filter(|l| !is_blank_line(l)) {
            if !content.is_empty() {
                content.push(VerseContent::line_break());
            }
            content.extend(line);
        }

        let chapter = self.chapter_mut(prev.book, prev.chapter);
        chapter.content.push(ChapterContent::Verse(Verse { number: prev.verse, content }));
    }

    fn finish(mut self) -> Vec<ParseTree> {
        self.flush();
        self.trees
    }
}

fn is_blank_line(line: &[VerseContent]) -> bool {
    line.iter().all(|item| matches!(item, VerseContent::Text(t) if t.trim().is_empty()))
}

/// Split a cell into text and footnote markers. Footnotes are added to `chapter`
/// with chapter-scoped ids.
fn cell_pieces(html: &str, chapter: &mut Chapter, verse: u32) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in RE_SUP.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
        if !RE_FOOTNOTE_CLASS.is_match(attrs) {
            continue;
        }

        pieces.push(Piece::Text(html_to_text(&html[last..whole.start()])));
        last = whole.end();

        let Some(note) = RE_DATA_FOOTNOTE.captures(attrs).and_then(|c| c.name("note")) else { continue };
        let text = html_to_text(&html_escape::decode_html_entities(note.as_str()));
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let note_id = chapter.footnotes.len() as u32 + 1;
        chapter.footnotes.push(Footnote {
            note_id,
            text: text.to_string(),
            caller: Caller::None,
            reference: Some(FootnoteVerseRef { chapter: chapter.number, verse }),
        });
        pieces.push(Piece::Note(note_id));
    }

    pieces.push(Piece::Text(html_to_text(&html[last..])));
    pieces
}

fn html_to_text(html: &str) -> String {
    html_escape::decode_html_entities(&RE_TAG.replace_all(html, "")).into_owned()
}
