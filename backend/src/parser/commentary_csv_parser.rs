//! Parser for line-oriented commentary CSV.
//!
//! Each row fills one of the discriminant columns: a book row opens a book, a
//! chapter row opens a chapter, and a verse row appends commentary to a verse.

use serde::{Deserialize, Serialize};

use crate::book_order::BookId;
use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::reference::{is_empty_or_whitespace, parse_verse_reference};
use crate::types::{CommentaryBookNode, CommentaryChapterNode, CommentaryParseTree};

/// One CSV row with normalized column names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentaryCsvLine {
    pub book: String,
    pub chapter: String,
    /// A verse reference, or a directive such as "Book Introduction".
    pub verse: String,
    pub commentaries: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Book,
    Chapter,
    Verse,
    Commentaries,
}

fn normalize_header(header: &str) -> Option<Column> {
    let header = header.trim().to_lowercase();
    match header.as_str() {
        "book" => Some(Column::Book),
        "chapter" => Some(Column::Chapter),
        "commentaries" | "commentary" => Some(Column::Commentaries),
        h if h.contains("verse") => Some(Column::Verse),
        _ => None,
    }
}

fn has_value(value: &str) -> bool {
    !is_empty_or_whitespace(Some(value))
}

pub struct CommentaryCsvParser;

impl CommentaryCsvParser {
    pub fn parse(csv: &str, log: &dyn Log) -> Result<CommentaryParseTree> {
        let lines = read_lines(csv)?;
        log.debug(&format!("Read {} commentary rows", lines.len()));
        Self::parse_lines(&lines, log)
    }

    pub fn parse_lines(lines: &[CommentaryCsvLine], log: &dyn Log) -> Result<CommentaryParseTree> {
        let mut tree = CommentaryParseTree::new();
        // Indices into tree.books and the open book's chapters.
        let mut book: Option<usize> = None;
        let mut chapter: Option<usize> = None;

        for line in lines {
            if has_value(&line.book) {
                let id = BookId::from_name(line.book.trim())
                    .ok_or_else(|| ParseError::InvalidBook(line.book.clone()))?;
                let mut node = CommentaryBookNode::new(id);
                node.introduction = has_value(&line.commentaries).then(|| line.commentaries.clone());
                tree.books.push(node);
                book = Some(tree.books.len() - 1);
                chapter = None;
            } else if has_value(&line.chapter) {
                let number = line
                    .chapter
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ParseError::InvalidChapter(line.chapter.clone()))?;
                let Some(book_idx) = book else {
                    return Err(ParseError::ChapterWithoutBook(line.chapter.clone()));
                };
                let mut node = CommentaryChapterNode::new(number);
                node.introduction = has_value(&line.commentaries).then(|| line.commentaries.clone());
                let chapters = &mut tree.books[book_idx].chapters;
                chapters.push(node);
                chapter = Some(chapters.len() - 1);
            } else if has_value(&line.verse) {
                let reference = parse_verse_reference(&line.verse)
                    .ok_or_else(|| ParseError::InvalidReference(line.verse.clone()))?;

                let book_node = match book {
                    Some(idx) if tree.books[idx].book == reference.book => &mut tree.books[idx],
                    _ => {
                        log.warn(&format!(
                            "Ignoring commentary for {} outside of the current book",
                            line.verse.trim()
                        ));
                        continue;
                    }
                };

                let open = chapter.filter(|idx| book_node.chapters[*idx].number == reference.chapter);
                let chapter_idx = match open {
                    Some(idx) => idx,
                    None => {
                        book_node.chapters.push(CommentaryChapterNode::new(reference.chapter));
                        book_node.chapters.len() - 1
                    }
                };
                chapter = Some(chapter_idx);

                book_node.chapters[chapter_idx]
                    .verse_mut(reference.verse)
                    .content
                    .push(line.commentaries.clone());
            }
        }

        Ok(tree)
    }
}

/// Read rows by header name. Quoted multi-line fields and ragged rows are accepted.
fn read_lines(csv: &str) -> Result<Vec<CommentaryCsvLine>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv.as_bytes());

    let mut columns: Vec<(usize, Column)> = Vec::new();
    for (idx, header) in reader.headers()?.iter().enumerate() {
        if let Some(column) = normalize_header(header) {
            if !columns.iter().any(|(_, c)| *c == column) {
                columns.push((idx, column));
            }
        }
    }

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut line = CommentaryCsvLine::default();
        for (idx, column) in &columns {
            let value = record.get(*idx).unwrap_or_default().to_string();
            match column {
                Column::Book => line.book = value,
                Column::Chapter => line.chapter = value,
                Column::Verse => line.verse = value,
                Column::Commentaries => line.commentaries = value,
            }
        }
        lines.push(line);
    }

    Ok(lines)
}
