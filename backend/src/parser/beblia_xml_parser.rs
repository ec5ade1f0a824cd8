//! Parser for the testament/book/chapter/verse XML dialect.
//!
//! ```xml
//! <bible translation="..." version="..." link="...">
//!   <testament name="Old">
//!     <book number="1">
//!       <chapter number="1">
//!         <verse number="1">In the beginning...</verse>
//! ```

use serde::{Deserialize, Serialize};

use crate::book_order::BookId;
use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::parser::iterators::{children_of, NodeCursor};
use crate::parser::xml_dom::{NodeId, XmlDocument};
use crate::types::{Chapter, ChapterContent, ParseMessage, ParseTree, RootContent, Verse, VerseContent};

/// Bumped whenever the output for the same input changes, so cached parses get redone.
pub const BEBLIA_PARSER_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BebliaMetadata {
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Quick check without parsing.
pub fn is_beblia_xml(content: &str) -> bool {
    content.contains("<bible") && content.contains("<testament") && content.contains("<book")
}

pub struct BebliaXmlParser;

impl BebliaXmlParser {
    /// Parse the XML once. Books are extracted from the returned document.
    pub fn load<'l>(xml: &str, log: &'l dyn Log) -> Result<BebliaDocument<'l>> {
        let doc = XmlDocument::parse(xml)?;
        let bible = doc
            .document_element()
            .filter(|e| doc.is_named(*e, "bible"))
            .ok_or_else(|| ParseError::MissingElement("bible".to_string()))?;
        Ok(BebliaDocument { doc, bible, log })
    }
}

pub struct BebliaDocument<'l> {
    doc: XmlDocument,
    bible: NodeId,
    log: &'l dyn Log,
}

impl BebliaDocument<'_> {
    pub fn metadata(&self) -> BebliaMetadata {
        let attr = |key: &str| {
            self.doc
                .attr(self.bible, key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        BebliaMetadata {
            translation: attr("translation").unwrap_or_default(),
            version: attr("version"),
            link: attr("link"),
            status: attr("status"),
        }
    }

    fn book_elements(&self) -> Vec<NodeId> {
        NodeCursor::descendants(&self.doc, self.bible)
            .filter(|n| self.doc.is_named(*n, "book"))
            .collect()
    }

    fn number_attr(&self, node: NodeId) -> Option<u32> {
        self.doc
            .attr(node, "number")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
    }

    /// Positive book numbers present in the document, sorted.
    pub fn available_books(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .book_elements()
            .into_iter()
            .filter_map(|b| self.number_attr(b))
            .collect();
        numbers.sort_unstable();
        numbers
    }

    /// Parse the book with the given number, or the first book.
    pub fn parse_book(&self, number: Option<u32>) -> Result<ParseTree> {
        let books = self.book_elements();
        let book = match number {
            Some(n) => books.into_iter().find(|b| self.number_attr(*b) == Some(n)),
            None => books.into_iter().next(),
        };
        let Some(book) = book else {
            return Err(ParseError::BookNotFound(match number {
                Some(n) => format!("Book number {} not found", n),
                None => "No books found".to_string(),
            }));
        };

        let mut tree = ParseTree::new();
        tree.id = self.number_attr(book).and_then(BookId::from_number);
        if tree.id.is_none() {
            let raw = self.doc.attr(book, "number").unwrap_or_default().to_string();
            tree.warn(format!("Unknown book number: {}", raw), self.log);
        }
        self.parse_chapters(book, &mut tree);
        Ok(tree)
    }

    /// One tree per book with a known number. Warnings about skipped books are
    /// reported on the next emitted tree.
    pub fn parse_all_books(&self) -> Vec<ParseTree> {
        let mut trees = Vec::new();
        let mut pending: Vec<ParseMessage> = Vec::new();

        for book in self.book_elements() {
            let Some(id) = self.number_attr(book).and_then(BookId::from_number) else {
                let raw = self.doc.attr(book, "number").unwrap_or_default();
                let msg = format!("Unknown book number: {}, skipping", raw);
                self.log.warn(&msg);
                pending.push(ParseMessage::warning(msg));
                continue;
            };

            let mut tree = ParseTree::new();
            tree.id = Some(id);
            tree.parse_messages = std::mem::take(&mut pending);
            self.parse_chapters(book, &mut tree);
            trees.push(tree);
        }

        trees
    }

    fn parse_chapters(&self, book: NodeId, tree: &mut ParseTree) {
        let doc = &self.doc;
        let mut cursor = NodeCursor::descendants(doc, book);

        while let Some(node) = cursor.next() {
            if !doc.is_named(node, "chapter") {
                continue;
            }

            let Some(number) = self.number_attr(node) else {
                let raw = doc.attr(node, "number").unwrap_or_default();
                tree.warn(format!("Invalid chapter number: {}", raw), self.log);
                // Dropping the reader skips the chapter's subtree.
                drop(children_of(&mut cursor, doc, node));
                continue;
            };

            let mut chapter = Chapter::new(number);
            let verses: Vec<NodeId> = children_of(&mut cursor, doc, node)
                .filter(|n| doc.is_named(*n, "verse"))
                .collect();
            for verse in verses {
                match self.number_attr(verse) {
                    Some(n) => {
                        let text = doc.text_content(verse).trim().to_string();
                        let content = if text.is_empty() { vec![] } else { vec![VerseContent::Text(text)] };
                        chapter.content.push(ChapterContent::Verse(Verse { number: n, content }));
                    }
                    None => {
                        let raw = doc.attr(verse, "number").unwrap_or_default();
                        tree.warn(format!("Invalid verse number: {}", raw), self.log);
                    }
                }
            }
            tree.content.push(RootContent::Chapter(chapter));
        }
    }
}
