//! The DOM data model (spec §3, §4.C).
//!
//! Grounded in `roxmltree`'s arena (`Vec<NodeData>` addressed by `NodeId`),
//! generalized per Design Note §9 option (b): nodes own their strings
//! instead of borrowing from the input, the arena supports erase/reuse via
//! a free-list of vacant slots, and every container (the document itself,
//! and every element) owns a `Header` sentinel so its children form a
//! circular doubly-linked ring instead of roxmltree's simpler
//! last-child-pointer tree.

mod attributes;
mod iter;
mod namespaces;
pub mod write;

pub use attributes::{Attribute, AttributeSet};
pub use iter::{AllNodes, Children, Descendants};
pub use write::FormatOptions;

use crate::dtd::Dtd;
use crate::error::DomError;
use std::fmt;

/// An index into a [`Document`]'s node arena.
///
/// Never invalidated by unrelated mutations: once a node is erased its slot
/// is only reused after being pushed back onto the free-list, so a stale
/// `NodeId` either still points at the original node or indexes a vacant
/// slot, which panics rather than silently aliasing. A `NodeId` is only
/// ever meaningful against the `Document` that produced it; using one
/// against a different document is a programmer error this type does not
/// detect, exactly like `roxmltree`'s own `NodeId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

/// Tag-kind discriminator (spec §3 "Node kinds").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
    Attribute,
    /// The ring-list sentinel. Not part of the public node-kind vocabulary
    /// in spec §3, but exposed here so callers writing their own iterators
    /// can recognize and skip it the same way the internal ones do.
    Header,
}

#[derive(Debug)]
pub(crate) enum Data {
    Header,
    Element(ElementData),
    Text(String),
    CData(String),
    Comment(String),
    Pi(PiData),
    Attribute(AttributeData),
}

#[derive(Debug)]
pub(crate) struct PiData {
    pub target: String,
    pub data: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub qname: String,
    pub children_head: NodeId,
    pub attributes: AttributeSet,
}

#[derive(Debug)]
pub(crate) struct AttributeData {
    pub qname: String,
    pub value: String,
    pub is_id: bool,
}

pub(crate) struct NodeRecord {
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub data: Data,
}

enum Slot {
    Occupied(NodeRecord),
    Vacant(Option<NodeId>),
}

/// XML declaration version (spec §3 "Document").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum XmlVersion {
    V1_0,
    V1_1,
}

impl Default for XmlVersion {
    fn default() -> Self {
        XmlVersion::V1_0
    }
}

/// The doctype triple (spec §3 "Document").
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// A notation declared in the DTD (spec §3 SPEC_FULL supplement).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NotationDecl {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// An in-memory XML document: the root DOM container plus the metadata
/// spec §3 assigns to it (encoding, version, doctype, notations, format
/// options, CDATA-preservation mode) and the compiled DTD model used for
/// validation (component D).
pub struct Document {
    pub(crate) arena: Vec<Slot>,
    free_head: Option<NodeId>,
    pub(crate) children_head: NodeId,
    pub encoding: String,
    pub version: XmlVersion,
    pub doctype: Option<Doctype>,
    pub preserve_cdata: bool,
    pub notations: Vec<NotationDecl>,
    pub format: FormatOptions,
    pub dtd: Dtd,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Document [")?;
        for child in self.children(None) {
            write_debug_node(self, child, 1, f)?;
        }
        writeln!(f, "]")
    }
}

fn write_debug_node(doc: &Document, id: NodeId, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "    ")?;
    }
    match doc.kind(id) {
        NodeKind::Element => {
            writeln!(f, "Element {:?} {{", doc.qname(id).unwrap())?;
            for child in doc.children(Some(id)) {
                write_debug_node(doc, child, depth + 1, f)?;
            }
            for _ in 0..depth {
                write!(f, "    ")?;
            }
            writeln!(f, "}}")?;
        }
        other => writeln!(f, "{:?}({:?})", other, doc.str(id))?,
    }
    Ok(())
}

impl Document {
    /// Creates an empty document (no root element yet; callers building one
    /// programmatically must append exactly one element child before the
    /// invariants in spec §3 hold).
    pub fn empty() -> Document {
        let mut arena = Vec::new();
        arena.push(Slot::Occupied(NodeRecord {
            parent: None,
            prev: None,
            next: None,
            data: Data::Header,
        }));
        let head = NodeId(0);
        arena[0] = Slot::Occupied(NodeRecord { parent: None, prev: Some(head), next: Some(head), data: Data::Header });

        Document {
            arena,
            free_head: None,
            children_head: head,
            encoding: "UTF-8".to_string(),
            version: XmlVersion::V1_0,
            doctype: None,
            preserve_cdata: false,
            notations: Vec::new(),
            format: FormatOptions::default(),
            dtd: Dtd::default(),
        }
    }

    fn record(&self, id: NodeId) -> &NodeRecord {
        match &self.arena[id.index()] {
            Slot::Occupied(r) => r,
            Slot::Vacant(_) => panic!("use-after-free NodeId {:?}", id),
        }
    }

    fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        match &mut self.arena[id.index()] {
            Slot::Occupied(r) => r,
            Slot::Vacant(_) => panic!("use-after-free NodeId {:?}", id),
        }
    }

    fn alloc(&mut self, rec: NodeRecord) -> NodeId {
        if let Some(id) = self.free_head {
            let next_free = match &self.arena[id.index()] {
                Slot::Vacant(n) => *n,
                Slot::Occupied(_) => unreachable!(),
            };
            self.free_head = next_free;
            self.arena[id.index()] = Slot::Occupied(rec);
            id
        } else {
            let id = NodeId(self.arena.len());
            self.arena.push(Slot::Occupied(rec));
            id
        }
    }

    /// The sentinel id for `container`'s child ring, or the document's
    /// top-level ring if `container` is `None`.
    fn head_of(&self, container: Option<NodeId>) -> NodeId {
        match container {
            None => self.children_head,
            Some(id) => match &self.record(id).data {
                Data::Element(e) => e.children_head,
                _ => panic!("{:?} is not a container", id),
            },
        }
    }

    // ---- introspection -------------------------------------------------

    /// spec §3 "A tag-kind discriminator is exposed".
    pub fn kind(&self, id: NodeId) -> NodeKind {
        match &self.record(id).data {
            Data::Header => NodeKind::Header,
            Data::Element(_) => NodeKind::Element,
            Data::Text(_) => NodeKind::Text,
            Data::CData(_) => NodeKind::CData,
            Data::Comment(_) => NodeKind::Comment,
            Data::Pi(_) => NodeKind::ProcessingInstruction,
            Data::Attribute(_) => NodeKind::Attribute,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Element
    }

    /// The element's qname (`prefix:local` or `local`), if this is an
    /// element or attribute node.
    pub fn qname(&self, id: NodeId) -> Option<&str> {
        match &self.record(id).data {
            Data::Element(e) => Some(&e.qname),
            Data::Attribute(a) => Some(&a.qname),
            _ => None,
        }
    }

    /// The local part of `qname(id)` (after the last `:`).
    pub fn local_name(&self, id: NodeId) -> &str {
        let q = self.qname(id).unwrap_or("");
        match q.find(':') {
            Some(i) => &q[i + 1..],
            None => q,
        }
    }

    /// The prefix part of `qname(id)` (before the first `:`), or `""`.
    pub fn prefix(&self, id: NodeId) -> &str {
        let q = self.qname(id).unwrap_or("");
        match q.find(':') {
            Some(i) => &q[..i],
            None => "",
        }
    }

    /// spec §4.C `str()`: element concatenates children; leaf kinds return
    /// their stored text; attributes return their value.
    pub fn str(&self, id: NodeId) -> String {
        match &self.record(id).data {
            Data::Header => String::new(),
            Data::Element(_) => {
                let mut s = String::new();
                for child in self.all_nodes(Some(id)) {
                    match self.kind(child) {
                        NodeKind::Text | NodeKind::CData => s.push_str(&self.str(child)),
                        NodeKind::Element => s.push_str(&self.str(child)),
                        _ => {}
                    }
                }
                s
            }
            Data::Text(t) | Data::CData(t) | Data::Comment(t) => t.clone(),
            Data::Pi(p) => p.data.clone().unwrap_or_default(),
            Data::Attribute(a) => a.value.clone(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).parent
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match &self.record(id).data {
            Data::Element(e) => e.attributes.ids(),
            _ => &[],
        }
    }

    pub fn attribute_set(&self, id: NodeId) -> Option<&AttributeSet> {
        match &self.record(id).data {
            Data::Element(e) => Some(&e.attributes),
            _ => None,
        }
    }

    pub fn attribute_value(&self, id: NodeId) -> &str {
        match &self.record(id).data {
            Data::Attribute(a) => &a.value,
            _ => "",
        }
    }

    pub fn is_id_attribute(&self, id: NodeId) -> bool {
        match &self.record(id).data {
            Data::Attribute(a) => a.is_id,
            _ => false,
        }
    }

    pub fn pi_target(&self, id: NodeId) -> Option<&str> {
        match &self.record(id).data {
            Data::Pi(p) => Some(&p.target),
            _ => None,
        }
    }

    pub fn pi_data(&self, id: NodeId) -> Option<&str> {
        match &self.record(id).data {
            Data::Pi(p) => p.data.as_deref(),
            _ => None,
        }
    }

    /// spec §3 "An attribute whose qname starts with `xmlns` (and whose 6th
    /// byte is end-of-string or `:`) is a namespace declaration".
    pub fn is_namespace_decl(&self, id: NodeId) -> bool {
        match self.qname(id) {
            Some(q) if self.kind(id) == NodeKind::Attribute => is_xmlns_qname(q),
            _ => false,
        }
    }

    // ---- equality (spec §4.C) ------------------------------------------

    /// Content-structural equality: for elements, compares name, resolved
    /// namespace URI, child sequence (skipping whitespace-only text at the
    /// edges), and attribute set (namespace declarations compared as an
    /// unordered set of URIs, other attributes as a multiset).
    pub fn equals(&self, a: NodeId, b: NodeId) -> bool {
        if self.kind(a) != self.kind(b) {
            return false;
        }
        match self.kind(a) {
            NodeKind::Element => self.elements_equal(a, b),
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => self.str(a) == self.str(b),
            NodeKind::ProcessingInstruction => {
                self.pi_target(a) == self.pi_target(b) && self.pi_data(a) == self.pi_data(b)
            }
            NodeKind::Attribute => {
                self.qname(a) == self.qname(b)
                    && self.is_id_attribute(a) == self.is_id_attribute(b)
                    && self.attribute_value(a) == self.attribute_value(b)
            }
            _ => true,
        }
    }

    fn elements_equal(&self, a: NodeId, b: NodeId) -> bool {
        if self.local_name(a) != self.local_name(b) {
            return false;
        }
        if self.namespace_for_prefix(a, self.prefix(a)) != self.namespace_for_prefix(b, self.prefix(b)) {
            return false;
        }

        let mut ns_a: Vec<&str> = Vec::new();
        let mut ns_b: Vec<&str> = Vec::new();
        let mut attrs_a: Vec<(&str, &str)> = Vec::new();
        let mut attrs_b: Vec<(&str, &str)> = Vec::new();
        for &id in self.attributes(a) {
            if self.is_namespace_decl(id) {
                ns_a.push(self.attribute_value(id));
            } else {
                attrs_a.push((self.qname(id).unwrap(), self.attribute_value(id)));
            }
        }
        for &id in self.attributes(b) {
            if self.is_namespace_decl(id) {
                ns_b.push(self.attribute_value(id));
            } else {
                attrs_b.push((self.qname(id).unwrap(), self.attribute_value(id)));
            }
        }
        ns_a.sort_unstable();
        ns_b.sort_unstable();
        attrs_a.sort_unstable();
        attrs_b.sort_unstable();
        if ns_a != ns_b || attrs_a != attrs_b {
            return false;
        }

        let ca = self.trim_boundary_whitespace(a);
        let cb = self.trim_boundary_whitespace(b);
        if ca.len() != cb.len() {
            return false;
        }
        ca.iter().zip(cb.iter()).all(|(&x, &y)| self.equals(x, y))
    }

    /// The children of `parent`, with any whitespace-only text run at the
    /// very start or end dropped (spec §4.C "skipping text nodes that are
    /// purely whitespace on either side").
    fn trim_boundary_whitespace(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = self.all_nodes(Some(parent)).collect();
        let is_ws_text = |id: NodeId| self.kind(id) == NodeKind::Text && self.str(id).chars().all(crate::chars::is_xml_space);
        while children.first().copied().map(is_ws_text).unwrap_or(false) {
            children.remove(0);
        }
        while children.last().copied().map(is_ws_text).unwrap_or(false) {
            children.pop();
        }
        children
    }

    // ---- iteration -------------------------------------------------------

    /// Default iterator: elements only, in document order.
    pub fn children(&self, container: Option<NodeId>) -> Children<'_> {
        Children::new(self, container)
    }

    /// Every sibling (text, comments, PIs, elements) in document order.
    pub fn all_nodes(&self, container: Option<NodeId>) -> AllNodes<'_> {
        AllNodes::new(self, container)
    }

    pub fn descendants(&self, container: Option<NodeId>) -> Descendants<'_> {
        Descendants::new(self, container)
    }

    pub fn first_child(&self, container: Option<NodeId>) -> Option<NodeId> {
        self.children(container).next()
    }

    pub fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let container = self.parent(id);
        let head = self.head_of(container);
        let mut cur = self.record(id).next?;
        while cur != head {
            if self.is_element(cur) {
                return Some(cur);
            }
            cur = self.record(cur).next?;
        }
        None
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let container = self.parent(id);
        let head = self.head_of(container);
        let n = self.record(id).next?;
        if n == head {
            None
        } else {
            Some(n)
        }
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let container = self.parent(id);
        let head = self.head_of(container);
        let p = self.record(id).prev?;
        if p == head {
            None
        } else {
            Some(p)
        }
    }

    pub fn has_children(&self, container: Option<NodeId>) -> bool {
        self.first_child(container).is_some() || self.all_nodes(container).next().is_some()
    }

    /// The single root element, per invariant 3. Panics if the document has
    /// not yet had one appended — callers that build documents
    /// programmatically must check [`Document::root_element`] returns
    /// `Some` before relying on it.
    pub fn root_element(&self) -> Option<NodeId> {
        self.all_nodes(None).find(|&id| self.is_element(id))
    }

    // ---- mutation (spec §3 "Lifecycle") --------------------------------

    fn new_record(parent: Option<NodeId>, data: Data) -> NodeRecord {
        NodeRecord { parent, prev: None, next: None, data }
    }

    fn link_after(&mut self, head: NodeId, new_id: NodeId) {
        let tail = self.record(head).prev.unwrap();
        self.record_mut(tail).next = Some(new_id);
        self.record_mut(new_id).prev = Some(tail);
        self.record_mut(new_id).next = Some(head);
        self.record_mut(head).prev = Some(new_id);
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = {
            let r = self.record(id);
            (r.prev, r.next)
        };
        if let (Some(p), Some(n)) = (prev, next) {
            self.record_mut(p).next = Some(n);
            self.record_mut(n).prev = Some(p);
        }
    }

    /// Inserts a fresh element node as the last child of `container`
    /// (`None` means the document's top level), returning its id.
    pub fn push_element(&mut self, container: Option<NodeId>, qname: impl Into<String>) -> NodeId {
        let elem_head = {
            let placeholder = self.alloc(NodeRecord { parent: None, prev: None, next: None, data: Data::Header });
            self.record_mut(placeholder).prev = Some(placeholder);
            self.record_mut(placeholder).next = Some(placeholder);
            placeholder
        };
        let id = self.alloc(Self::new_record(
            container,
            Data::Element(ElementData { qname: qname.into(), children_head: elem_head, attributes: AttributeSet::new() }),
        ));
        self.record_mut(elem_head).parent = Some(id);
        let head = self.head_of(container);
        self.link_after(head, id);
        id
    }

    fn push_leaf(&mut self, container: Option<NodeId>, data: Data) -> NodeId {
        let id = self.alloc(Self::new_record(container, data));
        let head = self.head_of(container);
        self.link_after(head, id);
        id
    }

    pub fn push_text(&mut self, container: Option<NodeId>, text: impl Into<String>) -> NodeId {
        self.push_leaf(container, Data::Text(text.into()))
    }

    pub fn push_cdata(&mut self, container: Option<NodeId>, text: impl Into<String>) -> NodeId {
        self.push_leaf(container, Data::CData(text.into()))
    }

    pub fn push_comment(&mut self, container: Option<NodeId>, text: impl Into<String>) -> NodeId {
        self.push_leaf(container, Data::Comment(text.into()))
    }

    pub fn push_pi(&mut self, container: Option<NodeId>, target: impl Into<String>, data: Option<String>) -> NodeId {
        self.push_leaf(container, Data::Pi(PiData { target: target.into(), data }))
    }

    /// Appends text to the trailing text child, creating one if needed
    /// (spec §4.C "add_text").
    pub fn add_text(&mut self, container: NodeId, text: &str) {
        if let Some(last) = self.all_nodes(Some(container)).last() {
            if self.kind(last) == NodeKind::Text {
                if let Data::Text(s) = &mut self.record_mut(last).data {
                    s.push_str(text);
                    return;
                }
            }
        }
        self.push_text(Some(container), text.to_string());
    }

    /// Concatenates text+cdata children only (spec §4.C "get_content").
    pub fn get_content(&self, container: NodeId) -> String {
        let mut s = String::new();
        for child in self.all_nodes(Some(container)) {
            match self.kind(child) {
                NodeKind::Text | NodeKind::CData => s.push_str(&self.str(child)),
                _ => {}
            }
        }
        s
    }

    /// Removes all text+cdata children and appends one text node (spec
    /// §4.C "set_content").
    pub fn set_content(&mut self, container: NodeId, text: &str) {
        let to_remove: Vec<NodeId> = self
            .all_nodes(Some(container))
            .filter(|&c| matches!(self.kind(c), NodeKind::Text | NodeKind::CData))
            .collect();
        for id in to_remove {
            self.erase(id);
        }
        self.push_text(Some(container), text.to_string());
    }

    /// Merges consecutive text siblings (spec §4.C "flatten_text").
    pub fn flatten_text(&mut self, container: NodeId) {
        let mut run_start: Option<NodeId> = None;
        let children: Vec<NodeId> = self.all_nodes(Some(container)).collect();
        for child in children {
            if self.kind(child) == NodeKind::Text {
                match run_start {
                    None => run_start = Some(child),
                    Some(start) => {
                        let text = self.str(child);
                        if let Data::Text(s) = &mut self.record_mut(start).data {
                            s.push_str(&text);
                        }
                        self.erase(child);
                    }
                }
            } else {
                run_start = None;
            }
        }
    }

    /// Sets (replacing any existing value) an attribute on `element`.
    /// Duplicate-key insert replaces in place, preserving order (spec §3
    /// "Attributes").
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        qname: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let qname = qname.into();
        let value = value.into();
        let existing = {
            let attrs = match &self.record(element).data {
                Data::Element(e) => &e.attributes,
                _ => return Err(DomError::NotAnElement),
            };
            attrs.find(&qname)
        };
        if let Some(existing_id) = existing {
            if let Data::Attribute(a) = &mut self.record_mut(existing_id).data {
                a.value = value;
            }
            return Ok(());
        }
        let attr_id = self.alloc(NodeRecord {
            parent: Some(element),
            prev: None,
            next: None,
            data: Data::Attribute(AttributeData { qname: qname.clone(), value, is_id: false }),
        });
        if let Data::Element(e) = &mut self.record_mut(element).data {
            e.attributes.push(attr_id, qname);
        }
        Ok(())
    }

    pub fn mark_id_attribute(&mut self, attr_id: NodeId) {
        if let Data::Attribute(a) = &mut self.record_mut(attr_id).data {
            a.is_id = true;
        }
    }

    pub fn attribute_value_by_qname(&self, element: NodeId, qname: &str) -> Option<&str> {
        let attrs = self.attribute_set(element)?;
        let id = attrs.find(qname)?;
        Some(self.attribute_value(id))
    }

    pub fn remove_attribute(&mut self, element: NodeId, qname: &str) -> bool {
        let id = match self.attribute_set(element).and_then(|a| a.find(qname)) {
            Some(id) => id,
            None => return false,
        };
        if let Data::Element(e) = &mut self.record_mut(element).data {
            e.attributes.remove(qname);
        }
        self.free(id);
        true
    }

    /// Erases `id` and its entire subtree. Iterates with an explicit
    /// worklist so a pathologically deep document can't overflow the
    /// stack (spec §3 "Lifecycle", Design Note §9).
    pub fn erase(&mut self, id: NodeId) {
        self.unlink(id);
        let mut worklist = vec![id];
        while let Some(cur) = worklist.pop() {
            if let Data::Element(e) = &self.record(cur).data {
                let head = e.children_head;
                let mut node = self.record(head).next.unwrap();
                while node != head {
                    let next = self.record(node).next.unwrap();
                    worklist.push(node);
                    node = next;
                }
                for &attr in e.attributes.ids().to_vec().iter() {
                    self.free(attr);
                }
                worklist.push(head);
            }
            self.free(cur);
        }
    }

    fn free(&mut self, id: NodeId) {
        self.arena[id.index()] = Slot::Vacant(self.free_head);
        self.free_head = Some(id);
    }

    /// O(1) swap of two containers' child rings by exchanging their
    /// sentinels' links and re-pointing the first level of children at the
    /// new parent (spec §4.C "Sibling swap").
    pub fn swap_children(&mut self, a: NodeId, b: NodeId) -> Result<(), DomError> {
        let (head_a, head_b) = match (&self.record(a).data, &self.record(b).data) {
            (Data::Element(ea), Data::Element(eb)) => (ea.children_head, eb.children_head),
            _ => return Err(DomError::NotAnElement),
        };
        let mut node = self.record(head_a).next.unwrap();
        while node != head_a {
            let next = self.record(node).next.unwrap();
            self.record_mut(node).parent = Some(b);
            node = next;
        }
        let mut node = self.record(head_b).next.unwrap();
        while node != head_b {
            let next = self.record(node).next.unwrap();
            self.record_mut(node).parent = Some(a);
            node = next;
        }
        if let Data::Element(ea) = &mut self.record_mut(a).data {
            ea.children_head = head_b;
        }
        if let Data::Element(eb) = &mut self.record_mut(b).data {
            eb.children_head = head_a;
        }
        self.record_mut(head_a).parent = Some(b);
        self.record_mut(head_b).parent = Some(a);
        Ok(())
    }

    // ---- invariant checks (used by tests) -------------------------------

    #[doc(hidden)]
    pub fn check_ring_invariant(&self, container: Option<NodeId>) -> Result<(), DomError> {
        let head = self.head_of(container);
        let mut cur = head;
        loop {
            let r = self.record(cur);
            let next = r.next.unwrap();
            if self.record(next).prev != Some(cur) {
                return Err(DomError::NotAChild);
            }
            cur = next;
            if cur == head {
                break;
            }
        }
        Ok(())
    }
}

pub(crate) fn is_xmlns_qname(q: &str) -> bool {
    q == "xmlns" || q.starts_with("xmlns:")
}

pub use namespaces::*;
