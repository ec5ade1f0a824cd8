//! Parser for the study-note XML dialect.
//!
//! ```xml
//! <items release="1.25">
//!   <item name="Gen.1.1" typename="StudyNote">
//!     <refs>Gen.1.1</refs>
//!     <body><p>...</p></body>
//!   </item>
//! </items>
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::parser::iterators::{children_of, NodeCursor};
use crate::parser::xml_dom::{NodeId, XmlDocument, XmlNodeData};
use crate::reference::{parse_verse_reference, VerseRef};
use crate::types::{CommentaryParseTree, CommentaryProfileNode};

lazy_static! {
    // AbrahamProfile, "Sea of Galilee"
    static ref RE_CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z])\s*([A-Z])").unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    StudyNote,
    BookIntro,
    BookIntroSummary,
    Profile,
}

impl ItemKind {
    fn from_typename(typename: &str) -> Option<Self> {
        match typename {
            "StudyNote" => Some(ItemKind::StudyNote),
            "BookIntro" => Some(ItemKind::BookIntro),
            "BookIntroSummary" => Some(ItemKind::BookIntroSummary),
            "Profile" => Some(ItemKind::Profile),
            _ => None,
        }
    }
}

/// The pieces of an `<item>` that the parser reads.
#[derive(Default)]
struct ItemParts {
    refs: Option<NodeId>,
    title: Option<NodeId>,
    body: Option<NodeId>,
}

pub struct TyndaleXmlParser;

impl TyndaleXmlParser {
    pub fn parse(xml: &str, log: &dyn Log) -> Result<CommentaryParseTree> {
        let doc = XmlDocument::parse(xml)?;
        let root = doc
            .document_element()
            .ok_or_else(|| ParseError::MissingElement("items".to_string()))?;

        let mut tree = CommentaryParseTree::new();
        let mut cursor = NodeCursor::descendants(&doc, root);

        while let Some(node) = cursor.next() {
            if !doc.is_named(node, "item") {
                continue;
            }
            let kind = doc.attr(node, "typename").and_then(ItemKind::from_typename);
            let name = doc.attr(node, "name").unwrap_or_default().to_string();

            let mut parts = ItemParts::default();
            for child in children_of(&mut cursor, &doc, node) {
                match doc.name(child) {
                    Some("refs") if parts.refs.is_none() => parts.refs = Some(child),
                    Some("title") if parts.title.is_none() => parts.title = Some(child),
                    Some("body") if parts.body.is_none() => parts.body = Some(child),
                    _ => {}
                }
            }

            let Some(kind) = kind else { continue };
            apply_item(&doc, kind, &name, &parts, &mut tree, log)?;
        }

        Ok(tree)
    }
}

fn apply_item(
    doc: &XmlDocument,
    kind: ItemKind,
    name: &str,
    parts: &ItemParts,
    tree: &mut CommentaryParseTree,
    log: &dyn Log,
) -> Result<()> {
    let refs = parts
        .refs
        .map(|r| doc.text_content(r))
        .filter(|r| !r.is_empty());
    let (Some(refs), Some(body)) = (refs, parts.body) else {
        log.warn(&format!("Skipping {:?} item without refs or body: {}", kind, name));
        return Ok(());
    };

    let reference = resolve_reference(&refs)?;
    let content = format_content(doc, body);

    match kind {
        ItemKind::StudyNote => {
            tree.book_mut(reference.book)
                .chapter_mut(reference.chapter)
                .verse_mut(reference.verse)
                .content
                .push(content);
        }
        ItemKind::BookIntro => tree.book_mut(reference.book).introduction = Some(content),
        ItemKind::BookIntroSummary => tree.book_mut(reference.book).introduction_summary = Some(content),
        ItemKind::Profile => {
            let title = parts.title.map(|t| doc.text_content(t)).filter(|t| !t.is_empty());
            let Some(subject) = title.filter(|_| !name.is_empty()) else {
                log.warn(&format!("Skipping profile item without a name or title: {}", name));
                return Ok(());
            };
            tree.profiles.push(CommentaryProfileNode {
                id: to_kebab_case(name),
                subject,
                reference: Some(reference),
                content: vec![content],
            });
        }
    }

    Ok(())
}

fn resolve_reference(refs: &str) -> Result<VerseRef> {
    parse_verse_reference(refs).ok_or_else(|| ParseError::InvalidReference(refs.to_string()))
}

/// `SeaOfGalilee` becomes `sea-of-galilee`.
pub fn to_kebab_case(name: &str) -> String {
    RE_CAMEL_BOUNDARY.replace_all(name, "$1-$2").to_lowercase()
}

/// Flatten a note body to text. Paragraphs and `<br>` end lines; each line is
/// whitespace-collapsed and the whole result trimmed.
pub fn format_content(doc: &XmlDocument, node: NodeId) -> String {
    let mut raw = String::new();
    collect_text(doc, node, &mut raw);

    raw.split('\n')
        .map(|line| RE_WHITESPACE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn collect_text(doc: &XmlDocument, node: NodeId, out: &mut String) {
    match &doc.node(node).data {
        XmlNodeData::Text(text) => out.push_str(text),
        XmlNodeData::Element { name, .. } if name == "p" => {
            out.push_str(&doc.text_content(node));
            out.push('\n');
        }
        XmlNodeData::Element { name, .. } if name == "br" => out.push('\n'),
        XmlNodeData::Element { .. } | XmlNodeData::Document => {
            for child in doc.children(node) {
                collect_text(doc, *child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_kebab_case() {
        assert_eq!(to_kebab_case("SeaOfGalilee"), "sea-of-galilee");
        assert_eq!(to_kebab_case("Abraham"), "abraham");
        assert_eq!(to_kebab_case("John Mark"), "john-mark");
    }

    #[test]
    fn test_format_content_lines() {
        let doc = XmlDocument::parse("<body>\n<p>One   two</p>\n<p>Three<br/>four</p>\n</body>").unwrap();
        let body = doc.document_element().unwrap();
        assert_eq!(format_content(&doc, body), "One two\n\nThreefour");
    }

    #[test]
    fn test_format_content_br_outside_paragraph() {
        let doc = XmlDocument::parse("<body><span>a</span><br/><span> b </span></body>").unwrap();
        let body = doc.document_element().unwrap();
        assert_eq!(format_content(&doc, body), "a\nb");
    }
}
