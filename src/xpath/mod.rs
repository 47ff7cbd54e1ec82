//! XPath 1.0 expression compilation and evaluation (spec §4.H, §4.I).
//!
//! Split the way `petty-xpath1` splits its own sub-crate: `ast` (expression
//! tree), `lexer`/`parser` (text to tree), `value` (the four-type object
//! system), `eval`/`functions` (tree-walking evaluation). See `DESIGN.md`
//! for where this crate's architecture deliberately parts ways with that
//! crate's `nom`-combinator parsing style.

mod ast;
mod error;
mod eval;
mod functions;
mod lexer;
mod parser;
mod value;

pub use ast::Expression;
pub use error::Error;
pub use eval::VariableScope;
pub use value::Value;

use crate::dom::{Document, NodeId};

/// A compiled XPath expression, ready to evaluate against any document
/// (spec §4.H "A compiled expression is reusable across documents").
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    expr: Expression,
}

impl XPath {
    pub fn compile(text: &str) -> Result<XPath, Error> {
        Ok(XPath { expr: parser::parse(text)? })
    }

    /// Evaluates this expression with `node` as the context node and an
    /// empty variable scope.
    pub fn evaluate(&self, doc: &Document, node: NodeId) -> Value {
        self.evaluate_with(doc, node, VariableScope::new())
    }

    pub fn evaluate_with(&self, doc: &Document, node: NodeId, vars: VariableScope) -> Value {
        let ctx = eval::Context::new(doc, node, vars);
        eval::eval(&self.expr, &ctx)
    }

    /// spec §4.I "Matches": true if `node` is a member of the node-set this
    /// expression selects, evaluated from the document's root element.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        eval::matches(&self.expr, doc, node)
    }
}

/// Parses and evaluates `text` in one step, as a location path rooted at
/// `node`.
pub fn select(text: &str, doc: &Document, node: NodeId) -> Result<Value, Error> {
    Ok(XPath::compile(text)?.evaluate(doc, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn sample() -> Document {
        let mut doc = Document::empty();
        let r = doc.push_element(None, "r".to_string());
        let a1 = doc.push_element(Some(r), "a".to_string());
        doc.set_attribute(a1, "id".to_string(), "one".to_string()).unwrap();
        doc.push_text(Some(a1), "first".to_string());
        let a2 = doc.push_element(Some(r), "a".to_string());
        doc.push_text(Some(a2), "second".to_string());
        doc
    }

    #[test]
    fn selects_children_by_name() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let xp = XPath::compile("a").unwrap();
        let result = xp.evaluate(&doc, root);
        assert_eq!(result.to_node_set().len(), 2);
    }

    #[test]
    fn predicate_filters_by_position() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let xp = XPath::compile("a[2]").unwrap();
        let nodes = xp.evaluate(&doc, root).to_node_set();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.str(nodes[0]), "second");
    }

    #[test]
    fn string_function_reads_attribute() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let xp = XPath::compile("string(a[1]/@id)").unwrap();
        assert_eq!(xp.evaluate(&doc, root).to_string_with(Some(&doc)), "one");
    }

    #[test]
    fn descendant_or_self_abbreviation() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let xp = XPath::compile("//a").unwrap();
        assert_eq!(xp.evaluate(&doc, root).to_node_set().len(), 2);
    }

    #[test]
    fn matches_reports_membership() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let first_a = doc.children(Some(root)).next().unwrap();
        let xp = XPath::compile("//a[@id]").unwrap();
        assert!(xp.matches(&doc, first_a));
    }
}
