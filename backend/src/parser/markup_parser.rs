//! Parser for the inline-tag markup dialect (`<BN>`, `<CN>`, `<V>{{BB::C}}N<T>` ...).
//!
//! The token stream from `markup_tokens` drives an explicit state machine.
//! The builder keeps the index of the open chapter and verse instead of
//! references, so text after a section heading still lands in the verse that
//! was open before it.

use lazy_static::lazy_static;
use regex::Regex;

use crate::book_order::BookId;
use crate::logger::Log;
use crate::parser::markup_tokens::{collapse_whitespace, segments, tokenize, Segment, Token, VerseTag};
use crate::types::{
    Caller, Chapter, ChapterContent, Footnote, FootnoteVerseRef, FormattedText, Heading, HebrewSubtitle,
    ParseTree, RootContent, Verse, VerseContent,
};

lazy_static! {
    // CHAPTER 12, PSALM 16
    static ref RE_FIRST_NUMBER: Regex = Regex::new(r"\d+").unwrap();

    // The L<\>{ORD}</> the Psalmist
    static ref RE_HEADING_MARKS: Regex = Regex::new(r"<\\>|</?>|[{}]").unwrap();

    // <$F<FN>01<FNC>1<FNV>2</FN>
    static ref RE_FOOTNOTE_META: Regex = Regex::new(r"<FN>.*?</FN>").unwrap();

    static ref RE_ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

const OPENING_QUOTES: [char; 4] = ['“', '‘', '"', '\''];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NoBook,
    InBook,
    /// Index of the open chapter in the root content.
    InChapter { chapter: usize },
    InVerse { chapter: usize, verse: usize },
}

impl State {
    fn chapter(&self) -> Option<usize> {
        match *self {
            State::InChapter { chapter } | State::InVerse { chapter, .. } => Some(chapter),
            State::NoBook | State::InBook => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser;

impl MarkupParser {
    pub fn new() -> Self {
        MarkupParser
    }

    /// Parse a whole markup file. Every `<BN>` starts a new tree.
    pub fn parse(&self, text: &str, log: &dyn Log) -> Vec<ParseTree> {
        let mut builder = TreeBuilder::new(log);
        for token in tokenize(text) {
            builder.accept(token);
        }
        builder.finish()
    }
}

struct TreeBuilder<'l> {
    log: &'l dyn Log,
    roots: Vec<ParseTree>,
    state: State,
    poem: bool,
    words_of_jesus: bool,
}

impl<'l> TreeBuilder<'l> {
    fn new(log: &'l dyn Log) -> Self {
        TreeBuilder {
            log,
            roots: Vec::new(),
            state: State::NoBook,
            poem: false,
            words_of_jesus: false,
        }
    }

    fn finish(self) -> Vec<ParseTree> {
        self.roots
    }

    fn accept(&mut self, token: Token<'_>) {
        match token {
            Token::BookName(raw) => self.start_book(raw),
            Token::ChapterNumber(raw) => self.start_chapter(raw),
            Token::SectionHeading(raw) => self.add_heading(raw),
            Token::HebrewSubtitle(raw) => self.add_subtitle(raw),
            Token::VerseStart { tag, reference, number } => self.start_verse(tag, reference, number),
            Token::Body(text) => self.add_body(text),
        }
    }

    /// The current tree, created without a title when content shows up before any `<BN>`.
    fn root(&mut self) -> &mut ParseTree {
        if self.roots.is_empty() {
            self.roots.push(ParseTree::new());
            self.state = State::InBook;
        }
        let last = self.roots.len() - 1;
        &mut self.roots[last]
    }

    fn chapter_at(&mut self, idx: usize) -> Option<&mut Chapter> {
        match self.root().content.get_mut(idx) {
            Some(RootContent::Chapter(chapter)) => Some(chapter),
            _ => None,
        }
    }

    fn start_book(&mut self, raw: &str) {
        let title = raw.trim().to_string();
        let mut tree = ParseTree::new();
        tree.id = BookId::from_name(&title);
        tree.title = Some(title);
        self.roots.push(tree);
        self.state = State::InBook;
        self.words_of_jesus = false;
        self.poem = false;
    }

    fn start_chapter(&mut self, raw: &str) {
        let log = self.log;
        let number = RE_FIRST_NUMBER
            .find(raw)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0);

        let root = self.root();
        let Some(number) = number else {
            root.warn(format!("Chapter heading without a number: {}", raw.trim()), log);
            self.state = State::InBook;
            return;
        };

        root.content.push(RootContent::Chapter(Chapter::new(number)));
        let chapter = root.content.len() - 1;
        self.state = State::InChapter { chapter };
        self.words_of_jesus = false;
        self.poem = false;
    }

    fn add_heading(&mut self, raw: &str) {
        let text = collapse_whitespace(&RE_HEADING_MARKS.replace_all(raw, ""));
        let heading = Heading { content: vec![text] };

        match self.state.chapter() {
            Some(idx) => {
                if let Some(chapter) = self.chapter_at(idx) {
                    chapter.content.push(ChapterContent::Heading(heading));
                }
            }
            None => self.root().content.push(RootContent::Heading(heading)),
        }
    }

    fn add_subtitle(&mut self, raw: &str) {
        let log = self.log;
        let Some(idx) = self.state.chapter() else {
            self.root().warn(format!("Hebrew subtitle outside of a chapter: {}", raw.trim()), log);
            return;
        };
        let Some(chapter) = self.chapter_at(idx) else { return };

        let clean = collapse_whitespace(&raw.replace(['{', '}'], ""));
        let mut content = Vec::new();
        for segment in segments(&clean) {
            match segment {
                Segment::Text(text) | Segment::Italics(text) => push_plain(&mut content, text),
                Segment::Footnote(block) => {
                    if let Some(note_id) = add_footnote(chapter, block, 0) {
                        content.push(VerseContent::footnote(note_id));
                    }
                }
                _ => {}
            }
        }

        chapter
            .content
            .push(ChapterContent::HebrewSubtitle(HebrewSubtitle { content }));
    }

    fn start_verse(&mut self, tag: VerseTag, reference: &str, number: &str) {
        let log = self.log;

        let root = self.root();
        if root.id.is_none() {
            root.id = reference
                .split("::")
                .next()
                .and_then(|n| n.trim().parse::<u32>().ok())
                .and_then(BookId::from_number);
        }

        let Some(chapter_idx) = self.state.chapter() else {
            self.root().warn(format!("Verse {} appears outside of a chapter", number), log);
            return;
        };

        let Some(number) = number.parse::<u32>().ok().filter(|n| *n > 0) else {
            self.root().warn(format!("Invalid verse number: {}", number), log);
            self.state = State::InChapter { chapter: chapter_idx };
            return;
        };

        let Some(chapter) = self.chapter_at(chapter_idx) else { return };
        if tag.starts_paragraph() && chapter.verses().next().is_some() {
            chapter.content.push(ChapterContent::LineBreak);
        }
        chapter.content.push(ChapterContent::Verse(Verse::new(number)));
        let verse = chapter.content.len() - 1;

        self.poem = tag.is_poem();
        self.state = State::InVerse { chapter: chapter_idx, verse };
    }

    fn add_body(&mut self, text: &str) {
        let State::InVerse { chapter: chapter_idx, verse: verse_idx } = self.state else {
            if !text.trim().is_empty() {
                self.log.debug(&format!("Ignoring text outside of a verse: {}", text.trim()));
            }
            return;
        };

        let poem = self.poem;
        let mut words_of_jesus = self.words_of_jesus;
        let clean = collapse_whitespace(text);

        let Some(chapter) = self.chapter_at(chapter_idx) else { return };
        let chapter_number = chapter.number;
        let Chapter { content, footnotes, .. } = chapter;
        let Some(ChapterContent::Verse(verse)) = content.get_mut(verse_idx) else { return };

        let mut after_red_letter_start = false;
        for segment in segments(&clean) {
            let continuation = std::mem::take(&mut after_red_letter_start);
            match segment {
                Segment::Text(text) => {
                    let text = if continuation { strip_continuation(text) } else { text };
                    push_text(&mut verse.content, text, poem, words_of_jesus);
                }
                Segment::Italics(text) => {
                    if !text.is_empty() {
                        verse.content.push(VerseContent::Formatted(FormattedText {
                            text: text.to_string(),
                            poem: poem.then_some(1),
                            words_of_jesus,
                            italics: true,
                            ..Default::default()
                        }));
                    }
                }
                Segment::Footnote(block) => {
                    if let Some(text) = footnote_text(block) {
                        let note_id = footnotes.len() as u32 + 1;
                        footnotes.push(Footnote {
                            note_id,
                            text,
                            caller: Caller::Generated,
                            reference: Some(FootnoteVerseRef { chapter: chapter_number, verse: verse.number }),
                        });
                        verse.content.push(VerseContent::footnote(note_id));
                    }
                }
                Segment::RedLetterStart => {
                    words_of_jesus = true;
                    after_red_letter_start = true;
                }
                Segment::RedLetterEnd => words_of_jesus = false,
                Segment::CrossReference | Segment::Tag => {}
            }
        }

        self.words_of_jesus = words_of_jesus;
    }
}

/// A `+` right after `<RS>` marks a quotation carried over from the previous
/// paragraph; it is dropped together with the repeated opening quote.
fn strip_continuation(text: &str) -> &str {
    match text.strip_prefix('+') {
        Some(rest) => rest.strip_prefix(OPENING_QUOTES).unwrap_or(rest),
        None => text,
    }
}

fn push_plain(content: &mut Vec<VerseContent>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(VerseContent::Text(last)) = content.last_mut() {
        last.push_str(text);
        return;
    }
    content.push(VerseContent::Text(text.to_string()));
}

/// Append a run of text, joining it with the previous run when the attributes match.
fn push_text(content: &mut Vec<VerseContent>, text: &str, poem: bool, words_of_jesus: bool) {
    if text.is_empty() {
        return;
    }
    if !poem && !words_of_jesus {
        push_plain(content, text);
        return;
    }

    let style = FormattedText {
        poem: poem.then_some(1),
        words_of_jesus,
        ..Default::default()
    };
    if let Some(VerseContent::Formatted(last)) = content.last_mut() {
        if last.same_style(&style) {
            last.text.push_str(text);
            return;
        }
    }
    content.push(VerseContent::Formatted(FormattedText { text: text.to_string(), ..style }));
}

fn footnote_text(block: &str) -> Option<String> {
    let inner = block.strip_prefix("<$F").unwrap_or(block);
    let inner = inner.strip_suffix("$E>").unwrap_or(inner);
    let inner = RE_FOOTNOTE_META.replace_all(inner, "");
    let inner = RE_ANY_TAG.replace_all(&inner, "");
    let text = inner.replace(['{', '}'], "").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn add_footnote(chapter: &mut Chapter, block: &str, verse: u32) -> Option<u32> {
    let text = footnote_text(block)?;
    let note_id = chapter.footnotes.len() as u32 + 1;
    chapter.footnotes.push(Footnote {
        note_id,
        text,
        caller: Caller::Generated,
        reference: Some(FootnoteVerseRef { chapter: chapter.number, verse }),
    });
    Some(note_id)
}
