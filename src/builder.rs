//! The document builder (spec §4.G): subscribes to SAX events and builds a
//! DOM, tracking namespace declarations and applying doctype defaults.
//!
//! Grounded in `roxmltree::parse`'s tree-construction pass, adapted from
//! "push straight into a borrowed arena while tokenizing" to "subscribe to
//! events fired by [`crate::parser`]", since parsing and tree-building are
//! separate components here (§2 component F vs G).

use crate::dom::{Doctype, Document, NodeId, NotationDecl, XmlVersion};
use crate::dtd::AttType;
use crate::parser::SaxHandler;

/// User hook for non-fatal validity reports (spec §4.F "Validation hook",
/// §7 kind 3). The default does nothing but log.
pub type InvalidationCallback = Box<dyn FnMut(&str)>;

/// Builds a [`Document`] from SAX events (spec §4.G).
pub struct DocumentBuilder {
    pub doc: Document,
    stack: Vec<NodeId>,
    in_cdata: bool,
    on_invalid: Option<InvalidationCallback>,
}

impl DocumentBuilder {
    pub fn new(preserve_cdata: bool) -> Self {
        let mut doc = Document::empty();
        doc.preserve_cdata = preserve_cdata;
        DocumentBuilder { doc, stack: Vec::new(), in_cdata: false, on_invalid: None }
    }

    pub fn with_invalidation_callback(mut self, cb: InvalidationCallback) -> Self {
        self.on_invalid = Some(cb);
        self
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    fn current_container(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }
}

impl SaxHandler for DocumentBuilder {
    fn xml_decl(&mut self, version: XmlVersion, encoding: Option<&str>, standalone: Option<bool>) {
        self.doc.version = version;
        if let Some(enc) = encoding {
            self.doc.encoding = enc.to_string();
        }
        if let Some(standalone) = standalone {
            self.doc.dtd.standalone = standalone;
        }
    }

    fn doctype_decl(&mut self, doctype: &Doctype) {
        self.doc.doctype = Some(doctype.clone());
    }

    fn start_namespace_decl(&mut self, _prefix: &str, _uri: &str) {
        // The declaration itself reaches the DOM as a regular `xmlns*`
        // attribute in `start_element`'s attribute list; this event exists
        // for observers that only want the push/pop, not the attribute.
    }

    fn end_namespace_decl(&mut self, _prefix: &str) {}

    fn start_element(&mut self, qname: &str, attrs: &[(String, String)]) {
        let container = self.current_container();
        let id = self.doc.push_element(container, qname.to_string());
        for (name, value) in attrs {
            self.doc.set_attribute(id, name.clone(), value.clone()).expect("freshly pushed element");
        }
        if let Some(decl) = self.doc.dtd.element(qname) {
            let id_attrs: Vec<String> =
                decl.attributes.iter().filter(|a| a.att_type == AttType::Id).map(|a| a.name.clone()).collect();
            for name in id_attrs {
                if let Some(attr_id) = self.doc.attribute_set(id).and_then(|set| set.find(&name)) {
                    self.doc.mark_id_attribute(attr_id);
                }
            }
        }
        self.stack.push(id);
    }

    fn end_element(&mut self, _qname: &str) {
        self.stack.pop();
    }

    fn character_data(&mut self, text: &str) {
        let Some(container) = self.current_container() else { return };
        if self.in_cdata && self.doc.preserve_cdata {
            self.doc.push_cdata(Some(container), text.to_string());
        } else {
            self.doc.add_text(container, text);
        }
    }

    fn start_cdata_section(&mut self) {
        self.in_cdata = true;
    }

    fn end_cdata_section(&mut self) {
        self.in_cdata = false;
    }

    fn comment(&mut self, text: &str) {
        let container = self.current_container();
        self.doc.push_comment(container, text.to_string());
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        let container = self.current_container();
        self.doc.push_pi(container, target.to_string(), data.map(str::to_string));
    }

    fn notation_decl(&mut self, notation: &NotationDecl) {
        self.doc.notations.push(notation.clone());
    }

    fn report_invalidation(&mut self, msg: &str) {
        match &mut self.on_invalid {
            Some(cb) => cb(msg),
            None => log::warn!("{}", msg),
        }
    }
}
