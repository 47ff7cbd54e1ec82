//! An in-memory XML DOM with DTD validation and XPath 1.0 querying (spec §1).
//!
//! Mirrors `roxmltree`'s two-arity `Document::parse`/`parse_with_options`
//! entry points, but the result is mutable: [`DocumentBuilder`] assembles a
//! tree of owned nodes while the streaming [`parser`] drives it through SAX
//! events, and the same [`dtd::Dtd`] populated during the DOCTYPE is carried
//! forward onto the returned [`dom::Document`] for reuse by the DTD
//! validator and by `id()` lookups in [`xpath`].

pub mod builder;
pub mod chars;
pub mod dom;
pub mod dtd;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod xpath;

pub use builder::DocumentBuilder;
pub use dom::{Document, NodeId, NodeKind};
pub use error::{DomError, EncodingError, TextPos, ValidityError, WellFormedError};
pub use parser::{ParsingOptions, SaxHandler};
pub use xpath::{Value, XPath};

use std::path::Path;

/// Every way parsing a document can fail (spec §7): a byte-decoding problem
/// or a well-formedness violation. DTD validity problems are never fatal —
/// they're reported through [`ParsingOptions`]'s invalidation callback
/// instead (spec §7 kind 3).
#[derive(Debug)]
pub enum ParseError {
    Encoding(EncodingError),
    WellFormed(WellFormedError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::Encoding(e) => write!(f, "{}", e),
            ParseError::WellFormed(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<EncodingError> for ParseError {
    fn from(e: EncodingError) -> Self {
        ParseError::Encoding(e)
    }
}

impl From<WellFormedError> for ParseError {
    fn from(e: WellFormedError) -> Self {
        ParseError::WellFormed(e)
    }
}

impl Document {
    /// Decodes and parses `bytes` with the default [`ParsingOptions`] (spec
    /// §6 "`Document::parse`").
    pub fn parse(bytes: &[u8]) -> Result<Document, ParseError> {
        Document::parse_with_options(bytes, &ParsingOptions::default())
    }

    /// Decodes and parses `bytes` with caller-supplied `opt` (spec §6
    /// "`Document::parse_with_options`"). DTD declarations are merged into
    /// the same [`dtd::Dtd`] the returned document carries, so ID-attribute
    /// marking and later `id()` lookups see the whole DOCTYPE.
    pub fn parse_with_options(bytes: &[u8], opt: &ParsingOptions) -> Result<Document, ParseError> {
        let text = encoding::decode(bytes)?;
        let mut builder = DocumentBuilder::new(opt.preserve_cdata);
        parser::parse(&text, &mut builder.doc.dtd, opt, &mut builder)?;
        Ok(builder.into_document())
    }

    /// Like [`Document::parse_with_options`], but external SYSTEM
    /// identifiers are resolved by `loader` instead of the default local
    /// file loader.
    pub fn parse_with_loader(
        bytes: &[u8],
        opt: &ParsingOptions,
        loader: &dyn parser::EntityLoader,
    ) -> Result<Document, ParseError> {
        let text = encoding::decode(bytes)?;
        let mut builder = DocumentBuilder::new(opt.preserve_cdata);
        parser::parse_with_loader(&text, &mut builder.doc.dtd, opt, &mut builder, loader)?;
        Ok(builder.into_document())
    }

    /// Convenience entry point resolving external SYSTEM identifiers
    /// relative to `path`'s parent directory.
    pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
        let bytes = std::fs::read(path).map_err(|_| ParseError::Encoding(EncodingError::Truncated))?;
        let mut opt = ParsingOptions::default();
        opt.base_dir = path.parent().map(Path::to_path_buf);
        Document::parse_with_options(&bytes, &opt)
    }
}

/// The idiomatic stand-in for spec §6's `""_xml` literal operator: Rust has
/// no user-definable literal suffixes, so this extension trait plays the
/// same role via a method call.
pub trait ParseXmlStrExt {
    fn parse_xml(&self) -> Result<Document, ParseError>;
}

impl ParseXmlStrExt for str {
    fn parse_xml(&self) -> Result<Document, ParseError> {
        Document::parse(self.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let doc = Document::parse(b"<root/>").unwrap();
        assert_eq!(doc.local_name(doc.root_element().unwrap()), "root");
    }

    #[test]
    fn parse_xml_str_ext_round_trips() {
        let doc = "<a><b>text</b></a>".parse_xml().unwrap();
        let mut out = Vec::new();
        doc.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<a><b>text</b></a>");
    }

    #[test]
    fn dtd_marked_id_attribute_is_visible_after_parse() {
        let xml = br#"<!DOCTYPE r [
            <!ELEMENT r (item)*>
            <!ELEMENT item (#PCDATA)>
            <!ATTLIST item key ID #REQUIRED>
        ]>
        <r><item key="a"/><item key="b"/></r>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element().unwrap();
        let first_item = doc.children(Some(root)).next().unwrap();
        let key_attr = doc.attribute_set(first_item).unwrap().find("key").unwrap();
        assert!(doc.is_id_attribute(key_attr));
    }

    #[test]
    fn builtin_entities_resolve_without_doctype() {
        let doc = Document::parse(b"<r>&lt;&amp;&gt;</r>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.str(root), "<&>");
    }
}
