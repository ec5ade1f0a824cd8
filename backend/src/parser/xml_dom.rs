//! Arena DOM for the XML dialects.
//!
//! Nodes are allocated in document order, so the arena index is the pre-order
//! position and every element's subtree is the contiguous index range
//! `id + 1 .. subtree_end`. The cursor in `iterators` walks those indices.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ParseError, Result};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNodeData {
    Document,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct XmlNode {
    pub data: XmlNodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// One past the last descendant.
    subtree_end: u32,
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a whole document. Syntax errors, mismatched and unclosed tags fail.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut doc = XmlDocument {
            nodes: vec![XmlNode {
                data: XmlNodeData::Document,
                parent: None,
                children: Vec::new(),
                subtree_end: 1,
            }],
        };

        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<NodeId> = vec![doc.root()];

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = doc.open_element(&e, stack_top(&stack));
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let id = doc.open_element(&e, stack_top(&stack));
                    doc.close(id);
                }
                Event::End(_) => {
                    if stack.len() <= 1 {
                        return Err(ParseError::MalformedXml("unexpected closing tag".to_string()));
                    }
                    if let Some(id) = stack.pop() {
                        doc.close(id);
                    }
                }
                Event::Text(e) => {
                    let text = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        // HTML entities such as &nbsp; show up in note bodies
                        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&e)).into_owned(),
                    };
                    doc.append_text(stack_top(&stack), text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    doc.append_text(stack_top(&stack), text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() > 1 {
            let name = doc.name(stack_top(&stack)).unwrap_or_default().to_string();
            return Err(ParseError::MalformedXml(format!("unclosed element <{}>", name)));
        }
        doc.close(doc.root());

        Ok(doc)
    }

    fn alloc(&mut self, data: XmlNodeData, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(XmlNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
            subtree_end: id.0 + 1,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    fn open_element(&mut self, e: &BytesStart, parent: NodeId) -> NodeId {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let attrs = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = match attr.unescape_value() {
                    Ok(v) => v.into_owned(),
                    Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                };
                (key, value)
            })
            .collect();
        self.alloc(XmlNodeData::Element { name, attrs }, parent)
    }

    fn append_text(&mut self, parent: NodeId, text: String) {
        if parent == self.root() && text.trim().is_empty() {
            return;
        }
        let id = self.alloc(XmlNodeData::Text(text), parent);
        self.close(id);
    }

    fn close(&mut self, id: NodeId) {
        let end = self.nodes.len() as u32;
        self.nodes[id.index()].subtree_end = end;
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.index()]
    }

    /// The single top-level element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.node(self.root())
            .children
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, XmlNodeData::Element { .. })
    }

    /// Element name, without namespace prefix.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            XmlNodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.node(id).data {
            XmlNodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            XmlNodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Arena indices of all descendants of `id`, in document order.
    pub fn descendant_range(&self, id: NodeId) -> Range<u32> {
        (id.0 + 1)..self.node(id).subtree_end
    }

    /// Whether `node` lies strictly inside the subtree of `ancestor`.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.descendant_range(ancestor).contains(&node.0)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendant_range(id)
            .filter_map(|i| self.text(NodeId(i)))
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The closest element before `id` under the same parent, skipping text.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos].iter().rev().copied().find(|s| self.is_element(*s))
    }

    /// First element named `name` below `id`, in document order.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendant_range(id)
            .map(NodeId)
            .find(|n| self.is_named(*n, name))
    }
}

fn stack_top(stack: &[NodeId]) -> NodeId {
    stack.last().copied().unwrap_or(NodeId(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structure() {
        let doc = XmlDocument::parse(r#"<?xml version="1.0"?><a x="1"><b>one &amp; two</b><c/>tail</a>"#).unwrap();
        let a = doc.document_element().unwrap();
        assert_eq!(doc.name(a), Some("a"));
        assert_eq!(doc.attr(a, "x"), Some("1"));
        assert_eq!(doc.children(a).len(), 3);

        let b = doc.find_descendant(a, "b").unwrap();
        assert_eq!(doc.text_content(b), "one & two");
        assert_eq!(doc.text_content(a), "one & twotail");

        let c = doc.find_descendant(a, "c").unwrap();
        assert!(doc.is_descendant(c, a));
        assert!(!doc.is_descendant(c, b));
        assert!(doc.descendant_range(c).is_empty());
    }

    #[test]
    fn test_previous_element_sibling() {
        let doc = XmlDocument::parse("<a><b/> text <c/><d><e/></d></a>").unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.find_descendant(a, "b").unwrap();
        let c = doc.find_descendant(a, "c").unwrap();
        let e = doc.find_descendant(a, "e").unwrap();
        assert_eq!(doc.previous_element_sibling(c), Some(b));
        assert_eq!(doc.previous_element_sibling(b), None);
        assert_eq!(doc.previous_element_sibling(e), None);
        assert_eq!(doc.previous_element_sibling(a), None);
    }

    #[test]
    fn test_html_entity_fallback() {
        let doc = XmlDocument::parse("<p>a&nbsp;b</p>").unwrap();
        let p = doc.document_element().unwrap();
        assert_eq!(doc.text_content(p), "a\u{a0}b");
    }

    #[test]
    fn test_malformed() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a><b>").is_err());
    }
}
