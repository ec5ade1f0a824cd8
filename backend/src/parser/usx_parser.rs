//! Parser for USX, the XML form of USFM.
//!
//! ```xml
//! <usx version="3.0">
//!   <book code="GEN" style="id"/>
//!   <para style="h">Genesis</para>
//!   <chapter number="1" style="c" sid="GEN 1"/>
//!   <para style="s1">The Creation</para>
//!   <para style="m"><verse number="1" style="v" sid="GEN 1:1"/>In the beginning...<verse eid="GEN 1:1"/></para>
//!   <chapter eid="GEN 1"/>
//! </usx>
//! ```
//!
//! Chapters and verses are milestones, so a verse runs from its start marker
//! across paragraph boundaries until the next verse marker. Content is read
//! with a single `NodeCursor` over the whole document.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::book_order::BookId;
use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::parser::iterators::{children_of, NodeCursor};
use crate::parser::markup_tokens::collapse_whitespace;
use crate::parser::xml_dom::{NodeId, XmlDocument};
use crate::types::{
    Caller, Chapter, ChapterContent, Footnote, FootnoteVerseRef, FormattedText, Heading, HebrewSubtitle,
    InlineHeading, ParseTree, RootContent, Verse, VerseContent,
};

/// Bumped whenever the output for the same input changes, so cached parses get redone.
pub const USX_PARSER_VERSION: &str = "1";

lazy_static! {
    // "2:2 Cited in Hebrews 4:4"
    static ref RE_NOTE_ORIGIN: Regex = Regex::new(r"^\d{1,3}:\d{1,3}").unwrap();
}

/// Verses most modern translations leave out on purpose.
const KNOWN_SKIPPED_VERSES: [&str; 16] = [
    "MAT 17:21",
    "MAT 18:11",
    "MAT 23:14",
    "MRK 7:16",
    "MRK 9:44",
    "MRK 9:46",
    "MRK 11:26",
    "MRK 15:28",
    "LUK 17:36",
    "LUK 23:17",
    "JHN 5:4",
    "ACT 8:37",
    "ACT 15:34",
    "ACT 24:7",
    "ACT 28:29",
    "ROM 16:24",
];

/// Paragraph styles that carry no scripture text: identification, running
/// headers, introductions, book titles and parallel passage references.
const IGNORED_PARA_STYLES: [&str; 61] = [
    "ide", "rem", "h", "h1", "h2", "h3", "h4", "toc1", "toc2", "toc3", "toca1", "toca2", "toca3", "imt", "imt1",
    "imt2", "imt3", "imt4", "is", "is1", "is2", "is3", "is4", "ip", "ipi", "im", "imi", "ipq", "imq", "ipr", "iq",
    "iq1", "iq2", "iq3", "iq4", "ib", "ili", "ili1", "ili2", "ili3", "ili4", "iot", "io", "io1", "io2", "io3", "io4",
    "iex", "imte", "ie", "mt", "mt1", "mt2", "mt3", "mt4", "mte", "mte1", "mte2", "cl", "cd", "r",
];

const TITLE_STYLES: [&str; 3] = ["mt1", "mt2", "mt3"];

fn is_section_heading(style: &str) -> bool {
    matches!(style, "s1" | "s2" | "s3" | "s4")
}

fn poem_level(style: &str) -> Option<u32> {
    match style {
        "q1" => Some(1),
        "q2" => Some(2),
        "q3" => Some(3),
        "q4" => Some(4),
        _ => None,
    }
}

pub struct UsxParser;

impl UsxParser {
    /// Parse one USX book. A document without a `<book code="...">` element fails.
    pub fn parse(usx: &str, log: &dyn Log) -> Result<ParseTree> {
        let doc = XmlDocument::parse(usx)?;
        let usx_element = doc
            .document_element()
            .ok_or_else(|| ParseError::MissingElement("usx".to_string()))?;

        let book = NodeCursor::descendants(&doc, usx_element)
            .find(|n| doc.is_named(*n, "book") && doc.attr(*n, "code").is_some())
            .ok_or_else(|| ParseError::MissingElement("book".to_string()))?;
        let code = doc.attr(book, "code").unwrap_or_default().trim().to_uppercase();
        if code.is_empty() {
            return Err(ParseError::InvalidBook("book element without a code".to_string()));
        }

        let mut builder = UsxBook {
            doc: &doc,
            log,
            code,
            tree: ParseTree::new(),
            last_verse: None,
        };
        builder.read_identification(usx_element);
        builder.read_root(usx_element);
        Ok(builder.tree)
    }
}

struct UsxBook<'a> {
    doc: &'a XmlDocument,
    log: &'a dyn Log,
    code: String,
    tree: ParseTree,
    /// (chapter, verse) of the last verse started.
    last_verse: Option<(u32, u32)>,
}

impl<'a> UsxBook<'a> {
    fn style(&self, node: NodeId) -> Option<&'a str> {
        self.doc.attr(node, "style")
    }

    fn para_style(&self, node: NodeId) -> Option<&'a str> {
        if self.doc.is_named(node, "para") { self.style(node) } else { None }
    }

    fn number_attr(&self, node: NodeId) -> Option<u32> {
        self.doc
            .attr(node, "number")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
    }

    fn read_identification(&mut self, usx: NodeId) {
        let doc = self.doc;

        match BookId::from_str(&self.code) {
            Ok(id) => self.tree.id = Some(id),
            Err(_) => {
                let msg = format!("Unknown book code: {}", self.code);
                self.tree.warn(msg, self.log);
            }
        }

        self.tree.header = doc
            .descendant_range(usx)
            .map(NodeId)
            .find(|n| self.para_style(*n) == Some("h"))
            .map(|h| collapse_whitespace(&doc.text_content(h)));

        let titles: Vec<String> = doc
            .descendant_range(usx)
            .map(NodeId)
            .filter(|n| self.para_style(*n).is_some_and(|s| TITLE_STYLES.contains(&s)))
            .map(|t| collapse_whitespace(&doc.text_content(t)))
            .filter(|t| !t.is_empty())
            .collect();
        if !titles.is_empty() {
            self.tree.title = Some(titles.join(" "));
        }
    }

    fn read_root(&mut self, usx: NodeId) {
        let doc = self.doc;
        let mut nodes = NodeCursor::descendants(doc, usx);

        while let Some(node) = nodes.next() {
            if doc.is_named(node, "chapter") {
                if doc.attr(node, "eid").is_some() {
                    continue;
                }
                let number = self.number_attr(node);
                let mut chapter = Chapter::new(number.unwrap_or(0));
                self.read_chapter(&mut chapter, &mut nodes);
                match number {
                    Some(_) => self.tree.content.push(RootContent::Chapter(chapter)),
                    None => {
                        let raw = doc.attr(node, "number").unwrap_or_default();
                        let msg = format!("Invalid chapter number: {}", raw);
                        self.tree.warn(msg, self.log);
                    }
                }
            } else if self.para_style(node).is_some_and(is_section_heading) {
                self.tree.content.push(RootContent::Heading(heading(doc, node)));
            }
        }
    }

    fn read_chapter(&mut self, chapter: &mut Chapter, nodes: &mut NodeCursor) {
        let doc = self.doc;

        while let Some(node) = nodes.next() {
            match doc.name(node) {
                Some("chapter") => {
                    // The root loop opens the next chapter.
                    if doc.attr(node, "eid").is_none() {
                        let _ = nodes.rewind(1);
                    }
                    break;
                }
                Some("para") => match self.style(node) {
                    Some(s) if is_section_heading(s) => chapter.content.push(ChapterContent::Heading(heading(doc, node))),
                    Some("b") => chapter.content.push(ChapterContent::LineBreak),
                    Some("d") => self.read_hebrew_subtitle(node, chapter, nodes),
                    _ => {}
                },
                Some("verse") if doc.attr(node, "eid").is_none() => {
                    if let Some(verse) = self.read_verse(node, chapter, nodes) {
                        chapter.content.push(ChapterContent::Verse(verse));
                    }
                }
                _ => {}
            }
        }
    }

    /// A `d` paragraph. A verse starting inside it is added to the chapter
    /// before the subtitle; its footnotes carry verse 0.
    fn read_hebrew_subtitle(&mut self, para: NodeId, chapter: &mut Chapter, nodes: &mut NodeCursor) {
        let doc = self.doc;
        let mut subtitle = HebrewSubtitle::default();

        while let Some(node) = nodes.next() {
            if !doc.is_descendant(node, para) {
                let _ = nodes.rewind(1);
                break;
            }
            if doc.is_named(node, "verse") {
                if doc.attr(node, "eid").is_none()
                    && let Some(verse) = self.read_verse(node, chapter, nodes)
                {
                    chapter.content.push(ChapterContent::Verse(verse));
                }
            } else if let Some(item) = self.node_content(node, chapter, 0, nodes) {
                add_or_join(&mut subtitle.content, item);
            }
        }

        trim_content(&mut subtitle.content);
        if !subtitle.content.is_empty() {
            chapter.content.push(ChapterContent::HebrewSubtitle(subtitle));
        }
    }

    /// Everything up to the next verse or chapter marker. Returns `None` for a
    /// verse without a valid number, after consuming its content.
    fn read_verse(&mut self, marker: NodeId, chapter: &mut Chapter, nodes: &mut NodeCursor) -> Option<Verse> {
        let doc = self.doc;
        let number = self.number_attr(marker);
        if let Some(number) = number {
            self.check_missing_verses(chapter.number, number);
        }

        let mut content = Vec::new();
        let mut last_poem_para: Option<NodeId> = None;

        while let Some(node) = nodes.next() {
            if doc.is_named(node, "verse") || doc.is_named(node, "chapter") {
                if doc.attr(node, "eid").is_none() || doc.is_named(node, "chapter") {
                    let _ = nodes.rewind(1);
                }
                break;
            }

            let mut poem = None;
            let mut descriptive = false;
            if let Some(parent) = doc.parent(node) {
                let style = self.para_style(parent);
                if let Some(level) = style.and_then(poem_level) {
                    poem = Some(level);
                    // Two lines of the same indent are separate paragraphs.
                    let continues_poem = doc
                        .previous_element_sibling(parent)
                        .is_some_and(|prev| self.para_style(prev) == style);
                    if continues_poem && last_poem_para != Some(parent) {
                        last_poem_para = Some(parent);
                        if !content.is_empty() {
                            content.push(VerseContent::line_break());
                        }
                    }
                } else if style == Some("d") {
                    descriptive = true;
                }
            }

            if let Some(item) = self.node_content(node, chapter, number.unwrap_or(0), nodes) {
                add_or_join(&mut content, with_style(item, poem, descriptive));
            }
        }

        trim_content(&mut content);
        match number {
            Some(number) => Some(Verse { number, content }),
            None => {
                let raw = doc.attr(marker, "number").unwrap_or_default();
                let msg = format!("Invalid verse number: {}", raw);
                self.tree.warn(msg, self.log);
                None
            }
        }
    }

    fn check_missing_verses(&mut self, chapter: u32, verse: u32) {
        if let Some((last_chapter, last_verse)) = self.last_verse
            && last_chapter == chapter
        {
            for missing in (last_verse + 1)..verse {
                let reference = format!("{} {}:{}", self.code, chapter, missing);
                if !KNOWN_SKIPPED_VERSES.contains(&reference.as_str()) {
                    let msg = format!("Verse {} is missing.", reference);
                    self.tree.warn(msg, self.log);
                }
            }
        }
        self.last_verse = Some((chapter, verse));
    }

    /// The verse content contributed by one node. Elements whose text is read
    /// here consume their subtree from `nodes`.
    fn node_content(
        &mut self,
        node: NodeId,
        chapter: &mut Chapter,
        verse: u32,
        nodes: &mut NodeCursor,
    ) -> Option<VerseContent> {
        let doc = self.doc;
        match doc.name(node) {
            None => doc.text(node).map(|t| VerseContent::Text(t.to_string())),
            Some("note") => {
                let text = subtree_text(nodes, doc, node);
                if self.style(node) != Some("f") {
                    // Cross references.
                    return None;
                }
                let text = RE_NOTE_ORIGIN.replace(text.trim(), "");
                let note_id = chapter.footnotes.len() as u32 + 1;
                chapter.footnotes.push(Footnote {
                    note_id,
                    text: collapse_whitespace(&text),
                    caller: Caller::from(doc.attr(node, "caller").filter(|c| !c.is_empty()).map(str::to_string)),
                    reference: Some(FootnoteVerseRef { chapter: chapter.number, verse }),
                });
                Some(VerseContent::footnote(note_id))
            }
            Some("char") => {
                let text = subtree_text(nodes, doc, node);
                if self.style(node) == Some("wj") {
                    Some(VerseContent::Formatted(FormattedText {
                        text,
                        words_of_jesus: true,
                        ..FormattedText::default()
                    }))
                } else {
                    Some(VerseContent::Text(text))
                }
            }
            Some("para") => match self.style(node) {
                Some("b") => {
                    drop(children_of(nodes, doc, node));
                    Some(VerseContent::line_break())
                }
                Some(s) if is_section_heading(s) => {
                    let heading = collapse_whitespace(&subtree_text(nodes, doc, node));
                    (!heading.is_empty()).then_some(VerseContent::InlineHeading(InlineHeading { heading }))
                }
                Some(s) if IGNORED_PARA_STYLES.contains(&s) => {
                    drop(children_of(nodes, doc, node));
                    None
                }
                // The paragraph's own text follows as separate nodes.
                _ => None,
            },
            _ => None,
        }
    }
}

fn heading(doc: &XmlDocument, para: NodeId) -> Heading {
    let text = collapse_whitespace(&doc.text_content(para));
    Heading { content: if text.is_empty() { vec![] } else { vec![text] } }
}

/// Concatenated text below `node`, consuming the subtree from `nodes`.
fn subtree_text(nodes: &mut NodeCursor, doc: &XmlDocument, node: NodeId) -> String {
    children_of(nodes, doc, node).filter_map(|n| doc.text(n)).collect()
}

fn with_style(item: VerseContent, poem: Option<u32>, descriptive: bool) -> VerseContent {
    if poem.is_none() && !descriptive {
        return item;
    }
    match item {
        VerseContent::Text(text) => VerseContent::Formatted(FormattedText {
            text,
            poem,
            descriptive,
            ..FormattedText::default()
        }),
        VerseContent::Formatted(mut formatted) => {
            if poem.is_some() {
                formatted.poem = poem;
            }
            formatted.descriptive |= descriptive;
            VerseContent::Formatted(formatted)
        }
        other => other,
    }
}

/// Append `item`, extending the last run when both are plain or share a style.
fn add_or_join(content: &mut Vec<VerseContent>, item: VerseContent) {
    if let Some(last) = content.last_mut() {
        match (last, &item) {
            (VerseContent::Text(last), VerseContent::Text(text)) => {
                last.push_str(text);
                return;
            }
            (VerseContent::Formatted(last), VerseContent::Formatted(next)) if last.same_style(next) => {
                last.text.push_str(&next.text);
                return;
            }
            _ => {}
        }
    }
    content.push(item);
}

/// Collapse whitespace in text runs and drop the ones left empty.
fn trim_content(content: &mut Vec<VerseContent>) {
    content.retain_mut(|item| match item {
        VerseContent::Text(text) => {
            *text = collapse_whitespace(text);
            !text.is_empty()
        }
        VerseContent::Formatted(formatted) => {
            formatted.text = collapse_whitespace(&formatted.text);
            !formatted.text.is_empty()
        }
        _ => true,
    });
}
