//! Hierarchical namespace resolution (spec §3 "Qualified names", §4.C
//! "Namespace resolution").

use super::{Document, NodeId, NodeKind};

pub const NS_XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
pub const NS_XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

impl Document {
    /// The URI bound to `prefix` at `element`: the value of the nearest
    /// ancestor's `xmlns` (if `prefix` is empty) or `xmlns:prefix`
    /// attribute, walking up through the parent chain.
    pub fn namespace_for_prefix(&self, element: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(NS_XML_URI);
        }
        let decl_qname = if prefix.is_empty() { "xmlns".to_string() } else { format!("xmlns:{}", prefix) };

        let mut cur = Some(element);
        while let Some(id) = cur {
            if self.kind(id) == NodeKind::Element {
                if let Some(v) = self.attribute_value_by_qname(id, &decl_qname) {
                    return if v.is_empty() { None } else { Some(v) };
                }
            }
            cur = self.parent(id);
        }
        None
    }

    /// The inverse of [`Document::namespace_for_prefix`]: returns
    /// `(prefix, found)` because the empty prefix is legal.
    pub fn prefix_for_namespace(&self, element: NodeId, uri: &str) -> (String, bool) {
        if uri == NS_XML_URI {
            return ("xml".to_string(), true);
        }
        let mut cur = Some(element);
        while let Some(id) = cur {
            if self.kind(id) == NodeKind::Element {
                for &attr in self.attributes(id) {
                    if self.is_namespace_decl(attr) && self.attribute_value(attr) == uri {
                        let q = self.qname(attr).unwrap();
                        let prefix = match q.find(':') {
                            Some(i) => &q[i + 1..],
                            None => "",
                        };
                        return (prefix.to_string(), true);
                    }
                }
            }
            cur = self.parent(id);
        }
        (String::new(), false)
    }

    /// All `(prefix, uri)` bindings visible at `element`, nearest-ancestor
    /// wins on prefix collision. Used by the namespace axis (spec §4.I).
    pub fn visible_namespaces(&self, element: NodeId) -> Vec<(String, String, NodeId)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut cur = Some(element);
        while let Some(id) = cur {
            if self.kind(id) == NodeKind::Element {
                for &attr in self.attributes(id) {
                    if self.is_namespace_decl(attr) {
                        let q = self.qname(attr).unwrap();
                        let prefix = if q == "xmlns" { String::new() } else { q[6..].to_string() };
                        if seen.insert(prefix.clone()) {
                            out.push((prefix, self.attribute_value(attr).to_string(), attr));
                        }
                    }
                }
            }
            cur = self.parent(id);
        }
        out
    }

    /// Walks `element`'s subtree and, for each prefix used by an element or
    /// attribute name, either rewrites it to an existing `dest`-side prefix
    /// bound to the same URI, or declares a new `xmlns:p` attribute on
    /// `dest` (spec §4.C "fix_namespaces"). `dest` must already be attached
    /// under a document (so its own ancestor chain resolves correctly).
    pub fn fix_namespaces(&mut self, element: NodeId, dest: NodeId) {
        let mut counter = 0u32;
        let ids: Vec<NodeId> = std::iter::once(element).chain(self.descendants(Some(element))).collect();
        for id in ids {
            if !self.is_element(id) {
                continue;
            }
            let prefix = self.prefix(id).to_string();
            if prefix.is_empty() {
                continue;
            }
            if let Some(uri) = self.namespace_for_prefix(id, &prefix).map(|s| s.to_string()) {
                let (dest_prefix, found) = self.prefix_for_namespace(dest, &uri);
                if found && dest_prefix == prefix {
                    continue;
                }
                if found {
                    let local = self.local_name(id).to_string();
                    let new_qname = if dest_prefix.is_empty() { local } else { format!("{}:{}", dest_prefix, local) };
                    self.rename_element(id, new_qname);
                } else {
                    counter += 1;
                    let decl = format!("xmlns:{}", prefix);
                    if self.namespace_for_prefix(dest, &prefix) != Some(uri.as_str()) {
                        self.set_attribute(dest, format!("{}{}", decl, if counter > 1 { counter.to_string() } else { String::new() }), uri)
                            .expect("fix_namespaces: dest must be an element");
                    }
                }
            }
        }
    }

    pub(crate) fn rename_element(&mut self, id: NodeId, new_qname: String) {
        if let super::Data::Element(e) = &mut self.record_mut(id).data {
            e.qname = new_qname;
        }
    }
}
