use pretty_assertions::assert_eq;
use xmldom::dtd::validator::Validator;
use xmldom::parser::ParsingOptions;
use xmldom::{Document, DocumentBuilder, ParseXmlStrExt, XPath};

/// spec §8 scenario: parse then reserialize, byte-identical for input with
/// no redundant whitespace or attribute-quoting differences.
#[test]
fn parse_and_reserialize_round_trips() {
    let xml = r#"<root attr="1"><child>text</child><!--c--></root>"#;
    let doc = Document::parse(xml.as_bytes()).unwrap();
    let mut out = Vec::new();
    doc.write_to(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), xml);
}

/// spec §8 scenario: entity expansion, both builtin and DTD-declared.
#[test]
fn entity_expansion_builtin_and_declared() {
    let xml = br#"<!DOCTYPE r [
        <!ENTITY company "Acme &amp; Co">
    ]>
    <r>&company; is &lt;great&gt;</r>"#;
    let doc = Document::parse(xml).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.str(root), "Acme & Co is <great>");
}

/// spec §8 scenario: a runaway cyclic entity reference is rejected rather
/// than expanded into an unbounded string.
#[test]
fn cyclic_entity_reference_is_rejected() {
    let xml = br#"<!DOCTYPE r [
        <!ENTITY a "&b;">
        <!ENTITY b "&a;">
    ]>
    <r>&a;</r>"#;
    let result = Document::parse(xml);
    assert!(result.is_err());
}

/// spec §8 scenario: DTD content-spec validation reports a mismatch through
/// the invalidation callback without aborting the parse.
#[test]
fn dtd_content_spec_validation_reports_mismatch() {
    let xml = br#"<!DOCTYPE r [
        <!ELEMENT r (item)+>
        <!ELEMENT item (#PCDATA)>
        <!ELEMENT stray (#PCDATA)>
    ]>
    <r><item>ok</item><stray>unexpected</stray></r>"#;

    let reports = std::cell::RefCell::new(Vec::new());
    let mut builder = DocumentBuilder::new(false).with_invalidation_callback(Box::new(|msg: &str| {
        reports.borrow_mut().push(msg.to_string());
    }));
    let opt = ParsingOptions { validate: true, ..ParsingOptions::default() };
    xmldom::parser::parse(std::str::from_utf8(xml).unwrap(), &mut builder.doc.dtd, &opt, &mut builder).unwrap();
    let doc = builder.into_document();

    assert!(doc.root_element().is_some());
    assert!(!reports.borrow().is_empty(), "expected at least one validity report for the stray child");
}

/// spec §8 scenario: a content-spec validator run directly against a
/// sequence of child names (rather than through a full parse).
#[test]
fn validator_accepts_and_rejects_child_sequences() {
    let xml = br#"<!DOCTYPE r [
        <!ELEMENT r (a, b)>
        <!ELEMENT a (#PCDATA)>
        <!ELEMENT b (#PCDATA)>
    ]>
    <r><a/><b/></r>"#;
    let doc = Document::parse(xml).unwrap();
    let decl = doc.dtd.element("r").unwrap().clone();

    let mut ok = Validator::new(Some(&decl));
    assert!(ok.allow("a"));
    assert!(ok.allow("b"));
    assert!(ok.done());

    let mut bad = Validator::new(Some(&decl));
    assert!(bad.allow("b"));
    assert!(!bad.done() || !bad.allow("a"));
}

/// spec §8 scenario: namespace-qualified XPath selection and namespace-uri().
#[test]
fn namespace_qualified_xpath() {
    let xml = r#"<root xmlns:a="urn:a" xmlns:b="urn:b"><a:item/><b:item/></root>"#;
    let doc = xml.parse_xml().unwrap();
    let root = doc.root_element().unwrap();

    let all_items = XPath::compile("*").unwrap().evaluate(&doc, root).to_node_set();
    assert_eq!(all_items.len(), 2);

    let a_item = all_items[0];
    assert_eq!(doc.namespace_for_prefix(a_item, doc.prefix(a_item)), Some("urn:a"));

    let uri_expr = XPath::compile("namespace-uri(*[1])").unwrap();
    assert_eq!(uri_expr.evaluate(&doc, root).to_string_with(Some(&doc)), "urn:a");
}

/// spec §8 scenario: predicates and axes together, including a reverse axis.
#[test]
fn xpath_predicates_and_axes() {
    let xml = r#"<r><a id="1"/><a id="2"/><a id="3"/></r>"#;
    let doc = xml.parse_xml().unwrap();
    let root = doc.root_element().unwrap();

    let last_a = XPath::compile("a[last()]").unwrap().evaluate(&doc, root).to_node_set();
    assert_eq!(last_a.len(), 1);
    assert_eq!(doc.attribute_value_by_qname(last_a[0], "id"), Some("3"));

    let third = doc.children(Some(root)).nth(2).unwrap();
    let preceding = XPath::compile("preceding-sibling::a").unwrap().evaluate(&doc, third).to_node_set();
    assert_eq!(preceding.len(), 2);
}

/// spec §8 scenario: CDATA sections, both preserved as their own node kind
/// and folded into surrounding text depending on `ParsingOptions`.
#[test]
fn cdata_preservation_modes() {
    let xml = b"<r>before<![CDATA[<raw>&amp;</raw>]]>after</r>";

    let preserved = Document::parse_with_options(xml, &ParsingOptions { preserve_cdata: true, ..ParsingOptions::default() }).unwrap();
    let root = preserved.root_element().unwrap();
    assert_eq!(preserved.str(root), "before<raw>&amp;</raw>after");
    assert!(preserved.all_nodes(Some(root)).any(|n| preserved.kind(n) == xmldom::NodeKind::CData));

    let folded = Document::parse_with_options(xml, &ParsingOptions { preserve_cdata: false, ..ParsingOptions::default() }).unwrap();
    let root2 = folded.root_element().unwrap();
    assert_eq!(folded.str(root2), "before<raw>&amp;</raw>after");
    assert!(!folded.all_nodes(Some(root2)).any(|n| folded.kind(n) == xmldom::NodeKind::CData));
}

/// invariant: the sibling ring stays well-formed after arbitrary erase.
#[test]
fn sibling_ring_invariant_holds_after_erase() {
    let mut doc = Document::parse(b"<r><a/><b/><c/></r>").unwrap();
    let root = doc.root_element().unwrap();
    let b = doc.children(Some(root)).nth(1).unwrap();
    doc.erase(b);
    assert!(doc.check_ring_invariant(Some(root)).is_ok());
    let names: Vec<&str> = doc.children(Some(root)).map(|n| doc.local_name(n)).collect();
    assert_eq!(names, vec!["a", "c"]);
}

/// invariant: namespace bindings are inherited down the tree and overridden
/// by a closer declaration.
#[test]
fn namespace_inheritance_and_override() {
    let xml = r#"<r xmlns="urn:outer"><inner xmlns="urn:inner"><leaf/></inner><sibling/></r>"#;
    let doc = xml.parse_xml().unwrap();
    let root = doc.root_element().unwrap();
    let inner = doc.children(Some(root)).next().unwrap();
    let leaf = doc.children(Some(inner)).next().unwrap();
    let sibling = doc.children(Some(root)).nth(1).unwrap();

    assert_eq!(doc.namespace_for_prefix(leaf, ""), Some("urn:inner"));
    assert_eq!(doc.namespace_for_prefix(sibling, ""), Some("urn:outer"));
}

/// invariant: XPath evaluation is deterministic across repeated runs of the
/// same compiled expression.
#[test]
fn xpath_determinism() {
    let doc = "<r><a/><b/><a/></r>".parse_xml().unwrap();
    let root = doc.root_element().unwrap();
    let xp = XPath::compile("//a").unwrap();
    let first = xp.evaluate(&doc, root).to_node_set();
    let second = xp.evaluate(&doc, root).to_node_set();
    assert_eq!(first, second);
}

/// invariant: node-sets produced by `//` come back in document order,
/// regardless of the traversal order internal to evaluation.
#[test]
fn xpath_results_are_in_document_order() {
    let doc = "<r><x><a/></x><a/><y><a/></y></r>".parse_xml().unwrap();
    let root = doc.root_element().unwrap();
    let nodes = XPath::compile("//a").unwrap().evaluate(&doc, root).to_node_set();
    assert_eq!(nodes.len(), 3);
    let walked: Vec<_> = doc.descendants(None).filter(|&n| doc.local_name(n) == "a").collect();
    assert_eq!(nodes, walked);
}

/// invariant: the attribute set behaves as a set keyed on qname — inserting
/// a duplicate name replaces the value in place rather than appending.
#[test]
fn attribute_set_duplicate_insert_replaces() {
    let mut doc = Document::parse(b"<r a=\"1\"/>").unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.attributes(root).len(), 1);
    doc.set_attribute(root, "a", "2").unwrap();
    assert_eq!(doc.attributes(root).len(), 1);
    assert_eq!(doc.attribute_value_by_qname(root, "a"), Some("2"));
}
