//! Backtrackable depth-first traversal over an `XmlDocument`.
//!
//! `NodeCursor` is an index into the materialized pre-order node list of a
//! subtree. Consumers can look ahead with `peek`, consume with `next`/`advance`
//! and step back a bounded number of nodes with `rewind`. `children_of` hands
//! out a reader limited to one subtree that leaves the shared cursor just
//! after that subtree when it is finished or dropped.

use thiserror::Error;

use super::xml_dom::{NodeId, XmlDocument};

/// How many already produced nodes can be re-observed with `rewind`.
pub const DEFAULT_LOOKBACK: usize = 2;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot rewind {requested} nodes, only {available} available")]
pub struct RewindError {
    pub requested: usize,
    pub available: usize,
}

#[derive(Debug, Clone)]
pub struct NodeCursor {
    nodes: Vec<NodeId>,
    pos: usize,
    /// Furthest position ever reached, the lookback window ends here.
    furthest: usize,
    lookback: usize,
}

impl NodeCursor {
    pub fn new(nodes: Vec<NodeId>, lookback: usize) -> Self {
        NodeCursor { nodes, pos: 0, furthest: 0, lookback }
    }

    /// All descendants of `node` in document order, `node` itself excluded.
    pub fn descendants(doc: &XmlDocument, node: NodeId) -> Self {
        let nodes = doc.descendant_range(node).map(NodeId).collect();
        NodeCursor::new(nodes, DEFAULT_LOOKBACK)
    }

    /// The node `n` places ahead without consuming it; `peek(0)` is the next node.
    pub fn peek(&self, n: usize) -> Option<NodeId> {
        self.nodes.get(self.pos + n).copied()
    }

    /// Consume `n` nodes, stopping at the end.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.nodes.len());
        self.furthest = self.furthest.max(self.pos);
    }

    /// Step back so the last `n` produced nodes are produced again.
    pub fn rewind(&mut self, n: usize) -> Result<(), RewindError> {
        let available = self.pos - self.furthest.saturating_sub(self.lookback);
        if n > available {
            return Err(RewindError { requested: n, available });
        }
        self.pos -= n;
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.nodes.len()
    }
}

impl Iterator for NodeCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.peek(0)?;
        self.advance(1);
        Some(node)
    }
}

/// Reader over the part of a shared cursor that lies inside `parent`.
pub struct Children<'c, 'd> {
    cursor: &'c mut NodeCursor,
    doc: &'d XmlDocument,
    parent: NodeId,
    done: bool,
}

/// Yield nodes from `cursor` while they descend from `parent`.
///
/// The first node outside the subtree is handed back with a single
/// `rewind(1)`, so the next consumer of `cursor` starts right there.
pub fn children_of<'c, 'd>(cursor: &'c mut NodeCursor, doc: &'d XmlDocument, parent: NodeId) -> Children<'c, 'd> {
    Children { cursor, doc, parent, done: false }
}

impl Iterator for Children<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.done {
            return None;
        }
        match self.cursor.next() {
            Some(node) if self.doc.is_descendant(node, self.parent) => Some(node),
            Some(_) => {
                self.done = true;
                // A node was just produced, so one step back is always in the window.
                let _ = self.cursor.rewind(1);
                None
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl Drop for Children<'_, '_> {
    fn drop(&mut self) {
        // Abandoned early: skip the rest of the subtree without producing it.
        while !self.done {
            match self.cursor.peek(0) {
                Some(node) if self.doc.is_descendant(node, self.parent) => self.cursor.advance(1),
                _ => self.done = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"<div id="0">
    <div id="1"><div id="2">abc</div><div id="3">def</div></div>
    <div id="4"><div id="5">ghi</div><div id="6">jfk</div></div>
    <div id="7"><div id="8">lmn</div><div id="9">opq</div></div>
</div>"#;

    fn label(doc: &XmlDocument, node: NodeId) -> String {
        match doc.attr(node, "id") {
            Some(id) => id.to_string(),
            None => match doc.text(node) {
                Some(t) if t.trim().is_empty() => "#space".to_string(),
                Some(t) => t.to_string(),
                None => "?".to_string(),
            },
        }
    }

    fn find(doc: &XmlDocument, id: &str) -> NodeId {
        (0..doc.len() as u32)
            .map(NodeId)
            .find(|n| doc.attr(*n, "id") == Some(id))
            .unwrap()
    }

    #[test]
    fn test_iterates_all_descendants_in_order() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.document_element().unwrap();
        let labels: Vec<String> = NodeCursor::descendants(&doc, root).map(|n| label(&doc, n)).collect();
        assert_eq!(
            labels,
            vec!["#space", "1", "2", "abc", "3", "def", "#space", "4", "5", "ghi", "6", "jfk",
                 "#space", "7", "8", "lmn", "9", "opq", "#space"]
        );
    }

    #[test]
    fn test_children_of_does_not_exhaust_cursor() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.document_element().unwrap();
        let one = find(&doc, "1");

        let mut cursor = NodeCursor::descendants(&doc, root);
        for node in cursor.by_ref() {
            if node == one {
                break;
            }
        }

        let inner: Vec<String> = children_of(&mut cursor, &doc, one).map(|n| label(&doc, n)).collect();
        assert_eq!(inner, vec!["2", "abc", "3", "def"]);

        let rest: Vec<String> = cursor.map(|n| label(&doc, n)).collect();
        assert_eq!(rest[0], "#space");
        assert_eq!(rest[1], "4");
        assert_eq!(rest.len(), 13);
    }

    #[test]
    fn test_dropped_children_reader_skips_subtree() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.document_element().unwrap();
        let four = find(&doc, "4");

        let mut cursor = NodeCursor::descendants(&doc, root);
        while let Some(node) = cursor.next() {
            if node == four {
                break;
            }
        }
        {
            let mut kids = children_of(&mut cursor, &doc, four);
            assert_eq!(kids.next().map(|n| label(&doc, n)), Some("5".to_string()));
        }
        assert_eq!(cursor.peek(0).map(|n| label(&doc, n)), Some("#space".to_string()));
        assert_eq!(cursor.peek(1).map(|n| label(&doc, n)), Some("7".to_string()));
    }

    #[test]
    fn test_rewind_is_bounded() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let root = doc.document_element().unwrap();
        let mut cursor = NodeCursor::descendants(&doc, root);

        assert_eq!(cursor.rewind(1), Err(RewindError { requested: 1, available: 0 }));

        let first = cursor.next().unwrap();
        let second = cursor.next().unwrap();
        cursor.advance(2);
        assert_eq!(cursor.position(), 4);
        assert!(cursor.rewind(3).is_err());

        cursor.rewind(2).unwrap();
        cursor.advance(2);

        let mut cursor = NodeCursor::descendants(&doc, root);
        cursor.advance(2);
        cursor.rewind(2).unwrap();
        assert_eq!(cursor.next(), Some(first));
        assert_eq!(cursor.next(), Some(second));
    }
}
