//! The SAX-style parser (spec §4.F "Parser"): a pull-mode tokenizer with a
//! recursive-descent control layer that invokes user-supplied event
//! callbacks.
//!
//! Grounded in `roxmltree::parse`/`roxmltree::tokenizer`'s overall shape
//! (a `Stream` cursor driving markup recognition, errors carrying a
//! `TextPos`), generalized to emit SAX events instead of directly building
//! a borrowed tree, since this crate's DOM is built separately by
//! [`crate::builder::DocumentBuilder`] (spec §4.G) and mutated afterwards.

pub mod content_spec;
pub mod dtd_parse;
pub mod entities;
pub mod stream;

use crate::chars;
use crate::dom::{Doctype, NotationDecl, XmlVersion};
use crate::dtd::validator::{ContentSpecKind, Validator};
use crate::dtd::Dtd;
use crate::error::WellFormedError;
use entities::LoopDetector;
use std::path::{Path, PathBuf};
use stream::Stream;

/// Parse-time toggles (spec §4.F, §6), mirroring `roxmltree::ParsingOptions`:
/// a `Clone` struct with a `Default` impl passed by value.
#[derive(Clone, Debug)]
pub struct ParsingOptions {
    /// Whether `<!DOCTYPE ...>` is even recognized; when `false` a DOCTYPE
    /// in the input is a well-formedness error.
    pub allow_dtd: bool,
    /// Whether DTD content-model/attribute validation runs at all.
    pub validate: bool,
    /// Markup nesting depth cap (Design Note §9 "an implementation should
    /// cap nesting").
    pub max_depth: u32,
    /// Whether `<![CDATA[...]]>` sections become their own node kind
    /// (`true`) or are folded into surrounding text (`false`).
    pub preserve_cdata: bool,
    /// Base directory external SYSTEM identifiers are resolved against by
    /// the default loader.
    pub base_dir: Option<PathBuf>,
}

impl Default for ParsingOptions {
    fn default() -> Self {
        ParsingOptions { allow_dtd: true, validate: false, max_depth: 1024, preserve_cdata: false, base_dir: None }
    }
}

/// A user-supplied resolver for external DTD subsets and external entities
/// (spec §4.F "External entity loading").
pub trait EntityLoader {
    fn load(&self, base: Option<&Path>, public_id: Option<&str>, system_id: &str) -> Option<Vec<u8>>;
}

/// Resolves `system_id` against `base` (or the current directory) and reads
/// a local file (spec §4.F "a default loader resolves the system id against
/// the document's configured base directory and opens a local file").
pub struct DefaultFileLoader;

impl EntityLoader for DefaultFileLoader {
    fn load(&self, base: Option<&Path>, _public_id: Option<&str>, system_id: &str) -> Option<Vec<u8>> {
        let path = match base {
            Some(dir) => dir.join(system_id),
            None => PathBuf::from(system_id),
        };
        std::fs::read(&path).ok()
    }
}

/// SAX-style event sink (spec §4.F/§4.G). Every method has a no-op default
/// so implementors only override the events they care about.
#[allow(unused_variables)]
pub trait SaxHandler {
    fn xml_decl(&mut self, version: XmlVersion, encoding: Option<&str>, standalone: Option<bool>) {}
    fn doctype_decl(&mut self, doctype: &Doctype) {}
    fn start_namespace_decl(&mut self, prefix: &str, uri: &str) {}
    fn end_namespace_decl(&mut self, prefix: &str) {}
    fn start_element(&mut self, qname: &str, attrs: &[(String, String)]) {}
    fn end_element(&mut self, qname: &str) {}
    fn character_data(&mut self, text: &str) {}
    fn start_cdata_section(&mut self) {}
    fn end_cdata_section(&mut self) {}
    fn comment(&mut self, text: &str) {}
    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {}
    fn notation_decl(&mut self, notation: &NotationDecl) {}
    fn report_invalidation(&mut self, msg: &str) {}
}

/// Parses `text` (already decoded) against `handler`, merging any DTD
/// declarations encountered into `dtd`. Uses [`DefaultFileLoader`] for
/// external subsets.
pub fn parse<H: SaxHandler>(text: &str, dtd: &mut Dtd, opt: &ParsingOptions, handler: &mut H) -> Result<(), WellFormedError> {
    parse_with_loader(text, dtd, opt, handler, &DefaultFileLoader)
}

pub fn parse_with_loader<H: SaxHandler>(
    text: &str,
    dtd: &mut Dtd,
    opt: &ParsingOptions,
    handler: &mut H,
    loader: &dyn EntityLoader,
) -> Result<(), WellFormedError> {
    let mut p = Parser { opt: opt.clone(), version: XmlVersion::V1_0, validators: Vec::new(), ns_scopes: Vec::new() };
    let mut s = Stream::new(text);
    let mut detector = LoopDetector::new();

    p.parse_xml_decl(&mut s, handler)?;
    let mut seen_doctype = false;
    let mut seen_root = false;

    loop {
        s.skip_spaces();
        if s.at_end() {
            break;
        }
        if s.starts_with("<!--") {
            p.parse_comment(&mut s, handler)?;
        } else if s.starts_with("<?") {
            p.parse_pi(&mut s, handler)?;
        } else if s.starts_with("<!DOCTYPE") {
            if seen_doctype || seen_root {
                return Err(WellFormedError::MalformedDoctype { pos: s.pos() });
            }
            if !p.opt.allow_dtd {
                return Err(WellFormedError::MalformedDoctype { pos: s.pos() });
            }
            dtd_parse::parse_doctype(&mut s, dtd, handler, &p.opt, loader, &mut detector)?;
            seen_doctype = true;
        } else if s.starts_with('<') {
            if seen_root {
                return Err(WellFormedError::MultipleRootElements { pos: s.pos() });
            }
            p.parse_element(&mut s, dtd, handler, &mut detector, 1)?;
            seen_root = true;
        } else {
            return Err(WellFormedError::UnclosedTag { pos: s.pos() });
        }
    }

    if !seen_root {
        return Err(WellFormedError::NoRootElement);
    }
    Ok(())
}

struct Parser {
    opt: ParsingOptions,
    version: XmlVersion,
    validators: Vec<(String, Validator)>,
    ns_scopes: Vec<Vec<String>>,
}

impl Parser {
    fn parse_xml_decl<H: SaxHandler>(&mut self, s: &mut Stream, handler: &mut H) -> Result<(), WellFormedError> {
        if !s.starts_with("<?xml") {
            return Ok(());
        }
        // Disambiguate from a PI literally named `xmlfoo`.
        let save = s.clone();
        s.advance(5);
        if s.curr_char().map(|c| chars::is_name_char(c)).unwrap_or(false) {
            *s = save;
            return Ok(());
        }
        s.skip_spaces();
        let mut version = XmlVersion::V1_0;
        let mut encoding: Option<String> = None;
        let mut standalone: Option<bool> = None;

        if s.consume_str("version") {
            s.skip_spaces();
            if !s.consume_char('=') {
                return Err(malformed(s));
            }
            s.skip_spaces();
            let v = read_quoted_literal(s)?;
            version = match v.as_str() {
                "1.0" => XmlVersion::V1_0,
                "1.1" => XmlVersion::V1_1,
                _ => return Err(malformed(s)),
            };
            s.skip_spaces();
        }
        if s.consume_str("encoding") {
            s.skip_spaces();
            if !s.consume_char('=') {
                return Err(malformed(s));
            }
            s.skip_spaces();
            encoding = Some(read_quoted_literal(s)?);
            s.skip_spaces();
        }
        if s.consume_str("standalone") {
            s.skip_spaces();
            if !s.consume_char('=') {
                return Err(malformed(s));
            }
            s.skip_spaces();
            let v = read_quoted_literal(s)?;
            standalone = Some(match v.as_str() {
                "yes" => true,
                "no" => false,
                _ => return Err(malformed(s)),
            });
            s.skip_spaces();
        }
        if !s.consume_str("?>") {
            return Err(malformed(s));
        }
        self.version = version;
        handler.xml_decl(version, encoding.as_deref(), standalone);
        Ok(())
    }

    fn is_valid_char(&self, c: char) -> bool {
        match self.version {
            XmlVersion::V1_0 => chars::is_valid_xml_1_0_char(c),
            XmlVersion::V1_1 => chars::is_valid_xml_1_1_char(c),
        }
    }

    fn parse_comment<H: SaxHandler>(&mut self, s: &mut Stream, handler: &mut H) -> Result<(), WellFormedError> {
        s.advance(4);
        let start = s.pos;
        loop {
            if s.starts_with("--") {
                if s.starts_with("-->") {
                    break;
                }
                return Err(WellFormedError::CommentContainsDoubleHyphen { pos: s.pos() });
            }
            if s.at_end() {
                return Err(WellFormedError::UnexpectedEof);
            }
            s.advance_char();
        }
        let text = &s.text[start..s.pos];
        s.advance(3);
        handler.comment(text);
        Ok(())
    }

    fn parse_pi<H: SaxHandler>(&mut self, s: &mut Stream, handler: &mut H) -> Result<(), WellFormedError> {
        s.advance(2);
        let target = s.consume_name().ok_or_else(|| WellFormedError::MalformedProcessingInstruction { pos: s.pos() })?.to_string();
        s.skip_spaces();
        let start = s.pos;
        let data = s.consume_until("?>");
        if !s.consume_str("?>") {
            return Err(WellFormedError::MalformedProcessingInstruction { pos: s.pos() });
        }
        let data = if data.is_empty() { None } else { Some(&s.text[start..start + data.len()]) };
        handler.processing_instruction(&target, data);
        Ok(())
    }

    fn parse_element<H: SaxHandler>(
        &mut self,
        s: &mut Stream,
        dtd: &mut Dtd,
        handler: &mut H,
        detector: &mut LoopDetector,
        depth: u32,
    ) -> Result<(), WellFormedError> {
        if depth > self.opt.max_depth {
            return Err(WellFormedError::ExcessiveNesting { pos: s.pos(), limit: self.opt.max_depth });
        }
        if !s.consume_char('<') {
            return Err(malformed(s));
        }
        let qname = s.consume_name().ok_or_else(|| WellFormedError::InvalidName { pos: s.pos() })?.to_string();

        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            let had_space = s.skip_spaces_required();
            if s.starts_with("/>") || s.starts_with('>') {
                break;
            }
            if !had_space {
                return Err(WellFormedError::UnclosedTag { pos: s.pos() });
            }
            let attr_name = s.consume_name().ok_or_else(|| WellFormedError::InvalidName { pos: s.pos() })?.to_string();
            s.skip_spaces();
            if !s.consume_char('=') {
                return Err(WellFormedError::UnclosedTag { pos: s.pos() });
            }
            s.skip_spaces();
            let raw_value = self.parse_attribute_value(s, dtd, detector)?;
            if attrs.iter().any(|(n, _)| *n == attr_name) {
                return Err(WellFormedError::DuplicatedAttribute { name: attr_name, pos: s.pos() });
            }
            attrs.push((attr_name, raw_value));
        }

        // Fire the namespace-declaration events per spec §4.F before
        // `start_element`, exactly like the builder expects.
        let mut declared_here = Vec::new();
        for (name, value) in &attrs {
            if crate::dom::is_xmlns_qname(name) {
                let prefix = if name == "xmlns" { String::new() } else { name[6..].to_string() };
                handler.start_namespace_decl(&prefix, value);
                declared_here.push(prefix);
            }
        }
        self.ns_scopes.push(declared_here);

        let decl = dtd.element(&qname).cloned();
        if self.opt.validate && decl.is_none() && !dtd.elements.is_empty() {
            handler.report_invalidation(&format!("element '{}' was not declared in the DTD", qname));
        }
        let normalized_attrs = self.normalize_attributes(&qname, attrs, dtd, handler);

        if self.opt.validate {
            self.validators.push((qname.clone(), Validator::new(decl.as_ref())));
        }

        if s.consume_str("/>") {
            handler.start_element(&qname, &normalized_attrs);
            handler.end_element(&qname);
            self.pop_namespace_scope(handler);
            if self.opt.validate {
                self.finish_element(&qname, handler);
            }
            return Ok(());
        }
        if !s.consume_char('>') {
            return Err(WellFormedError::UnclosedTag { pos: s.pos() });
        }
        handler.start_element(&qname, &normalized_attrs);

        self.parse_content(s, dtd, handler, detector, depth)?;

        if !s.consume_str("</") {
            return Err(WellFormedError::UnclosedTag { pos: s.pos() });
        }
        let close_name = s.consume_name().ok_or_else(|| WellFormedError::InvalidName { pos: s.pos() })?;
        if close_name != qname {
            return Err(WellFormedError::UnexpectedCloseTag { expected: qname, actual: close_name.to_string(), pos: s.pos() });
        }
        s.skip_spaces();
        if !s.consume_char('>') {
            return Err(WellFormedError::UnclosedTag { pos: s.pos() });
        }
        handler.end_element(&qname);
        self.pop_namespace_scope(handler);
        if self.opt.validate {
            self.finish_element(&qname, handler);
        }
        Ok(())
    }

    fn pop_namespace_scope<H: SaxHandler>(&mut self, handler: &mut H) {
        if let Some(prefixes) = self.ns_scopes.pop() {
            for prefix in prefixes.into_iter().rev() {
                handler.end_namespace_decl(&prefix);
            }
        }
    }

    fn finish_element<H: SaxHandler>(&mut self, qname: &str, handler: &mut H) {
        if let Some((name, v)) = self.validators.pop() {
            debug_assert_eq!(name, qname);
            if !v.done() {
                handler.report_invalidation(&format!("element '{}' ended before its content model was satisfied", qname));
            }
        }
    }

    /// Applies DTD-driven normalization/defaulting (spec §4.E/§4.F), or the
    /// bare XML-1.0 default (expand-only) normalization when no declaration
    /// is in scope.
    fn normalize_attributes<H: SaxHandler>(
        &self,
        element: &str,
        mut attrs: Vec<(String, String)>,
        dtd: &Dtd,
        handler: &mut H,
    ) -> Vec<(String, String)> {
        let decl = dtd.element(element);
        if let Some(decl) = decl {
            for (name, value) in attrs.iter_mut() {
                if let Some(attr_decl) = decl.attribute(name) {
                    match attr_decl.normalize(element, value, dtd) {
                        Ok(normalized) => *value = normalized,
                        Err(e) => {
                            if self.opt.validate {
                                handler.report_invalidation(&e.to_string());
                            }
                        }
                    }
                } else if self.opt.validate && decl.user_declared {
                    handler.report_invalidation(&format!("attribute '{}' of '{}' was not declared in the DTD", name, element));
                }
            }
            for attr_decl in &decl.attributes {
                let present = attrs.iter().any(|(n, _)| n == &attr_decl.name);
                if !present {
                    match &attr_decl.default_kind {
                        crate::dtd::DefaultKind::Required => {
                            if self.opt.validate {
                                handler.report_invalidation(&format!(
                                    "element '{}' is missing required attribute '{}'",
                                    element, attr_decl.name
                                ));
                            }
                        }
                        crate::dtd::DefaultKind::Fixed | crate::dtd::DefaultKind::Default => {
                            if let Some(v) = &attr_decl.default_value {
                                if dtd.standalone && attr_decl.external {
                                    log::warn!(
                                        "attribute '{}' of '{}' defaults from the external subset but the document is standalone=\"yes\"",
                                        attr_decl.name, element
                                    );
                                }
                                attrs.push((attr_decl.name.clone(), v.clone()));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        attrs
    }

    /// Reads a quoted attribute value, expanding entity/character
    /// references and normalizing literal whitespace to spaces (spec §4.F
    /// "Attribute normalization").
    fn parse_attribute_value(&mut self, s: &mut Stream, dtd: &Dtd, detector: &mut LoopDetector) -> Result<String, WellFormedError> {
        let quote = s.curr_char().filter(|&c| c == '"' || c == '\'').ok_or_else(|| WellFormedError::UnquotedAttributeValue { pos: s.pos() })?;
        s.advance_char();
        let mut out = String::new();
        loop {
            let c = s.curr_char().ok_or(WellFormedError::UnexpectedEof)?;
            if c == quote {
                s.advance_char();
                break;
            }
            if c == '<' {
                return Err(WellFormedError::InvalidAttributeValue { pos: s.pos() });
            }
            if c == '&' {
                self.expand_reference_into(s, dtd, detector, &mut out, true)?;
                continue;
            }
            if chars::is_xml_space(c) {
                out.push(' ');
                s.advance_char();
                continue;
            }
            if !self.is_valid_char(c) {
                return Err(WellFormedError::Encoding(crate::error::EncodingError::IllegalChar { offset: s.pos, ch: c }));
            }
            out.push(c);
            s.advance_char();
        }
        Ok(out)
    }

    /// Expands one `&...;` reference at the cursor into `out`. Character
    /// references always append the literal decoded character (never
    /// whitespace-normalized, spec §4.F). General entity references, when
    /// `in_attribute` is true, must not contain markup and are expanded
    /// textually (with interior literal whitespace still normalized);
    /// otherwise the expansion is routed back through content parsing so
    /// markup-bearing entity values are fully honored.
    fn expand_reference_into(
        &mut self,
        s: &mut Stream,
        dtd: &Dtd,
        detector: &mut LoopDetector,
        out: &mut String,
        in_attribute: bool,
    ) -> Result<(), WellFormedError> {
        s.advance_char(); // '&'
        if s.consume_char('#') {
            let hex = s.consume_char('x');
            let digits_start = s.pos;
            while s.curr_char().map(|c| c.is_ascii_hexdigit()).unwrap_or(false) {
                s.advance_char();
            }
            let digits = &s.text[digits_start..s.pos];
            if !s.consume_char(';') || digits.is_empty() {
                return Err(WellFormedError::MalformedCharacterReference { pos: s.pos() });
            }
            let ch = entities::decode_char_ref(digits, hex).ok_or(WellFormedError::MalformedCharacterReference { pos: s.pos() })?;
            if !self.is_valid_char(ch) {
                return Err(WellFormedError::MalformedCharacterReference { pos: s.pos() });
            }
            out.push(ch);
            return Ok(());
        }

        let name = s.consume_name().ok_or(WellFormedError::MalformedEntityReference { pos: s.pos() })?.to_string();
        if !s.consume_char(';') {
            return Err(WellFormedError::MalformedEntityReference { pos: s.pos() });
        }
        if let Some(builtin) = entities::builtin_replacement(&name) {
            out.push_str(builtin);
            return Ok(());
        }
        let entity = dtd
            .general_entities
            .get(&name)
            .ok_or(WellFormedError::UnknownEntityReference { name: name.clone(), pos: s.pos() })?;
        if entity.ndata.is_some() {
            return Err(WellFormedError::UnknownEntityReference { name, pos: s.pos() });
        }
        if dtd.standalone && entity.external {
            log::warn!(
                "entity '{}' is declared only in the external subset but the document is standalone=\"yes\"",
                name
            );
        }
        if detector.enter(&name).is_err() {
            return Err(WellFormedError::EntityReferenceLoop { pos: s.pos() });
        }
        let value = entity.value.clone();
        let expanded = self.expand_text_fragment(&value, dtd, detector, in_attribute)?;
        detector.exit();
        out.push_str(&expanded);
        Ok(())
    }

    /// Expands all references within an already-extracted entity
    /// replacement-text fragment. In attribute position this is pure text
    /// (markup is illegal there); used recursively so nested entities work.
    fn expand_text_fragment(&mut self, text: &str, dtd: &Dtd, detector: &mut LoopDetector, in_attribute: bool) -> Result<String, WellFormedError> {
        let mut out = String::new();
        let mut s = Stream::new(text);
        while let Some(c) = s.curr_char() {
            if c == '&' {
                self.expand_reference_into(&mut s, dtd, detector, &mut out, in_attribute)?;
            } else {
                if chars::is_xml_space(c) && in_attribute {
                    out.push(' ');
                } else {
                    out.push(c);
                }
                s.advance_char();
            }
        }
        Ok(out)
    }

    /// Parses element content up to (not including) the matching `</`.
    fn parse_content<H: SaxHandler>(
        &mut self,
        s: &mut Stream,
        dtd: &mut Dtd,
        handler: &mut H,
        detector: &mut LoopDetector,
        depth: u32,
    ) -> Result<(), WellFormedError> {
        loop {
            if s.starts_with("</") || s.at_end() {
                return Ok(());
            }
            if s.starts_with("<!--") {
                self.parse_comment(s, handler)?;
            } else if s.starts_with("<![CDATA[") {
                self.parse_cdata(s, handler)?;
            } else if s.starts_with("<?") {
                self.parse_pi(s, handler)?;
            } else if s.starts_with('<') {
                self.parse_element(s, dtd, handler, detector, depth + 1)?;
            } else if s.starts_with('&') {
                let mut buf = String::new();
                self.expand_reference_into(s, dtd, detector, &mut buf, false)?;
                self.check_char_data(&buf, handler);
                handler.character_data(&buf);
            } else {
                let start = s.pos;
                while let Some(c) = s.curr_char() {
                    if c == '<' || c == '&' {
                        break;
                    }
                    if !self.is_valid_char(c) {
                        return Err(WellFormedError::Encoding(crate::error::EncodingError::IllegalChar { offset: s.pos, ch: c }));
                    }
                    s.advance_char();
                }
                let text = &s.text[start..s.pos];
                self.check_char_data(text, handler);
                handler.character_data(text);
            }
        }
    }

    /// Validity check for character data in non-`Mixed` content (spec
    /// §4.F "Validation hook"): reports, but never fails well-formedness.
    fn check_char_data<H: SaxHandler>(&mut self, text: &str, handler: &mut H) {
        if !self.opt.validate || text.chars().all(chars::is_xml_space) {
            return;
        }
        if let Some((name, v)) = self.validators.last() {
            if v.content_spec() == ContentSpecKind::Children || v.content_spec() == ContentSpecKind::Empty {
                handler.report_invalidation(&format!("character data is not allowed inside '{}'", name));
            }
        }
    }

    fn parse_cdata<H: SaxHandler>(&mut self, s: &mut Stream, handler: &mut H) -> Result<(), WellFormedError> {
        s.advance("<![CDATA[".len());
        let start = s.pos;
        loop {
            if s.starts_with("]]>") {
                break;
            }
            if s.at_end() {
                return Err(WellFormedError::MalformedCdataSection { pos: s.pos() });
            }
            let c = s.curr_char().unwrap();
            if !self.is_valid_char(c) {
                return Err(WellFormedError::Encoding(crate::error::EncodingError::IllegalChar { offset: s.pos, ch: c }));
            }
            s.advance_char();
        }
        let text = &s.text[start..s.pos];
        s.advance(3);
        if self.opt.preserve_cdata {
            handler.start_cdata_section();
            handler.character_data(text);
            handler.end_cdata_section();
        } else {
            handler.character_data(text);
        }
        Ok(())
    }
}

fn read_quoted_literal(s: &mut Stream) -> Result<String, WellFormedError> {
    let quote = s.curr_char().filter(|&c| c == '"' || c == '\'').ok_or_else(|| malformed(s))?;
    s.advance_char();
    let text = s.consume_until(&quote.to_string()).to_string();
    if !s.consume_char(quote) {
        return Err(malformed(s));
    }
    Ok(text)
}

fn malformed(s: &Stream) -> WellFormedError {
    WellFormedError::MalformedDoctype { pos: s.pos() }
}
