//! Sibling-ring and descendant iterators (spec §3 "Sibling list").
//!
//! The default iterator on a container skips non-element siblings;
//! [`AllNodes`] exposes every sibling. Both share the ring-walk and
//! termination logic because the sentinel is a real arena node of kind
//! [`super::NodeKind::Header`].

use super::{Document, NodeId, NodeKind};

pub struct AllNodes<'a> {
    doc: &'a Document,
    head: NodeId,
    cur: NodeId,
    done: bool,
}

impl<'a> AllNodes<'a> {
    pub(crate) fn new(doc: &'a Document, container: Option<NodeId>) -> Self {
        let head = doc.head_of(container);
        AllNodes { doc, head, cur: head, done: false }
    }
}

impl<'a> Iterator for AllNodes<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.done {
            return None;
        }
        let next = self.doc.record(self.cur).next.unwrap();
        if next == self.head {
            self.done = true;
            return None;
        }
        self.cur = next;
        Some(next)
    }
}

pub struct Children<'a> {
    inner: AllNodes<'a>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(doc: &'a Document, container: Option<NodeId>) -> Self {
        Children { inner: AllNodes::new(doc, container) }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        for id in &mut self.inner {
            if self.inner.doc.kind(id) == NodeKind::Element {
                return Some(id);
            }
        }
        None
    }
}

/// Pre-order walk of `container`'s subtree (container excluded), visiting
/// every node kind.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(doc: &'a Document, container: Option<NodeId>) -> Self {
        let mut stack: Vec<NodeId> = doc.all_nodes(container).collect();
        stack.reverse();
        Descendants { doc, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if self.doc.is_element(id) {
            let mut kids: Vec<NodeId> = self.doc.all_nodes(Some(id)).collect();
            kids.reverse();
            self.stack.extend(kids);
        }
        Some(id)
    }
}
