//! DOCTYPE / internal & external subset parsing (spec §4.F "`<!DOCTYPE
//! ...>`", "`<!ENTITY ...>`, `<!ELEMENT ...>`, `<!ATTLIST ...>`,
//! `<!NOTATION ...>`", "Parameter entity references").

use super::entities::LoopDetector;
use super::stream::Stream;
use super::{content_spec, EntityLoader, ParsingOptions, SaxHandler};
use crate::dom::{Doctype, NotationDecl};
use crate::dtd::{AttType, AttributeDecl, DefaultKind, Dtd, GeneralEntity, ParameterEntity};
use crate::error::WellFormedError;

/// Parses a whole `<!DOCTYPE ...>` declaration (the cursor must be positioned
/// right before the leading `<`), merging any declarations found into `dtd`
/// and firing `doctype_decl`/`notation_decl` on `handler`.
pub fn parse_doctype<H: SaxHandler>(
    s: &mut Stream,
    dtd: &mut Dtd,
    handler: &mut H,
    opt: &ParsingOptions,
    loader: &dyn EntityLoader,
    detector: &mut LoopDetector,
) -> Result<Doctype, WellFormedError> {
    if !s.consume_str("<!DOCTYPE") {
        return Err(malformed(s));
    }
    if !s.skip_spaces_required() {
        return Err(malformed(s));
    }
    let name = s.consume_name().ok_or_else(|| malformed(s))?.to_string();
    s.skip_spaces();
    let (public_id, system_id) = parse_external_id(s)?;
    s.skip_spaces();

    if s.consume_char('[') {
        parse_internal_subset(s, dtd, handler, detector)?;
        s.skip_spaces();
        if !s.consume_char(']') {
            return Err(malformed(s));
        }
        s.skip_spaces();
    }
    if !s.consume_char('>') {
        return Err(malformed(s));
    }

    if opt.allow_dtd {
        if let Some(sysid) = &system_id {
            if let Some(bytes) = loader.load(opt.base_dir.as_deref(), public_id.as_deref(), sysid) {
                match crate::encoding::decode(&bytes) {
                    Ok(text) => parse_external_subset(&text, dtd, handler, detector)?,
                    Err(e) => log::warn!("external DTD subset '{}' failed to decode: {}", sysid, e),
                }
            } else {
                log::debug!("no loader result for external DTD subset '{}'", sysid);
            }
        }
    }

    let doctype = Doctype { name, public_id, system_id };
    handler.doctype_decl(&doctype);
    Ok(doctype)
}

/// Parses a full external subset document (already loaded and decoded) as a
/// flat list of markup declarations, marking everything found as
/// `external: true`.
fn parse_external_subset<H: SaxHandler>(
    text: &str,
    dtd: &mut Dtd,
    handler: &mut H,
    detector: &mut LoopDetector,
) -> Result<(), WellFormedError> {
    let mut s = Stream::new(text);
    parse_decl_sequence(&mut s, dtd, handler, detector, true)
}

fn parse_internal_subset<H: SaxHandler>(
    s: &mut Stream,
    dtd: &mut Dtd,
    handler: &mut H,
    detector: &mut LoopDetector,
) -> Result<(), WellFormedError> {
    parse_decl_sequence(s, dtd, handler, detector, false)
}

fn parse_decl_sequence<H: SaxHandler>(
    s: &mut Stream,
    dtd: &mut Dtd,
    handler: &mut H,
    detector: &mut LoopDetector,
    external: bool,
) -> Result<(), WellFormedError> {
    loop {
        s.skip_spaces();
        if s.at_end() || s.starts_with("]") {
            return Ok(());
        }
        if s.consume_str("<!--") {
            s.consume_until("-->");
            if !s.consume_str("-->") {
                return Err(malformed(s));
            }
        } else if s.starts_with("<?") {
            s.advance(2);
            s.consume_name();
            s.consume_until("?>");
            if !s.consume_str("?>") {
                return Err(malformed(s));
            }
        } else if s.starts_with("<![") {
            parse_conditional_section(s, dtd, handler, detector)?;
        } else if s.consume_char('%') {
            let name = s.consume_name().ok_or_else(|| malformed(s))?.to_string();
            if !s.consume_char(';') {
                return Err(malformed(s));
            }
            let value = match dtd.parameter_entities.get(&name) {
                Some(pe) => pe.value.clone(),
                None => return Err(WellFormedError::UnknownEntityReference { name, pos: s.pos() }),
            };
            if detector.enter(&name).is_err() {
                return Err(WellFormedError::EntityReferenceLoop { pos: s.pos() });
            }
            let mut inner = Stream::new(&value);
            parse_decl_sequence(&mut inner, dtd, handler, detector, external)?;
            detector.exit();
        } else if s.starts_with("<!ENTITY") {
            parse_entity_decl(s, dtd, detector, external)?;
        } else if s.starts_with("<!ELEMENT") {
            parse_element_decl(s, dtd, detector, external)?;
        } else if s.starts_with("<!ATTLIST") {
            parse_attlist_decl(s, dtd, detector, external)?;
        } else if s.starts_with("<!NOTATION") {
            parse_notation_decl(s, dtd, handler, detector)?;
        } else {
            return Err(malformed(s));
        }
    }
}

/// `<![INCLUDE[ ... ]]>` / `<![IGNORE[ ... ]]>` (external subset only, but
/// tolerated wherever encountered).
fn parse_conditional_section<H: SaxHandler>(
    s: &mut Stream,
    dtd: &mut Dtd,
    handler: &mut H,
    detector: &mut LoopDetector,
) -> Result<(), WellFormedError> {
    s.advance(2); // "<!"
    if !s.consume_char('[') {
        return Err(malformed(s));
    }
    s.skip_spaces();
    let include = if s.consume_str("INCLUDE") {
        true
    } else if s.consume_str("IGNORE") {
        false
    } else {
        return Err(malformed(s));
    };
    s.skip_spaces();
    if !s.consume_char('[') {
        return Err(malformed(s));
    }

    let body_start = s.pos;
    let mut nesting = 1i32;
    loop {
        if s.at_end() {
            return Err(WellFormedError::MalformedDoctype { pos: s.pos() });
        }
        if s.starts_with("<![") {
            nesting += 1;
            s.advance(3);
        } else if s.starts_with("]]>") {
            nesting -= 1;
            if nesting == 0 {
                break;
            }
            s.advance(3);
        } else {
            s.advance_char();
        }
    }
    let body = s.text[body_start..s.pos].to_string();
    s.consume_str("]]>");

    if include {
        let mut inner = Stream::new(&body);
        parse_decl_sequence(&mut inner, dtd, handler, detector, true)?;
    }
    Ok(())
}

fn parse_external_id(s: &mut Stream) -> Result<(Option<String>, Option<String>), WellFormedError> {
    if s.consume_str("PUBLIC") {
        s.skip_spaces();
        let public_id = parse_quoted(s)?;
        s.skip_spaces();
        if s.starts_with('"') || s.starts_with('\'') {
            let system_id = parse_quoted(s)?;
            Ok((Some(public_id), Some(system_id)))
        } else {
            Ok((Some(public_id), None))
        }
    } else if s.consume_str("SYSTEM") {
        s.skip_spaces();
        let system_id = parse_quoted(s)?;
        Ok((None, Some(system_id)))
    } else {
        Ok((None, None))
    }
}

/// Reads a quoted literal, decoding character references (`&#NN;`/`&#xHH;`)
/// immediately per the XML `EntityValue` production; general entity
/// references are left untouched to be expanded when the value is used.
fn parse_quoted(s: &mut Stream) -> Result<String, WellFormedError> {
    let quote = s.curr_char().filter(|&c| c == '"' || c == '\'').ok_or_else(|| malformed(s))?;
    s.advance_char();
    let mut out = String::new();
    loop {
        let c = s.curr_char().ok_or(WellFormedError::UnexpectedEof)?;
        if c == quote {
            s.advance_char();
            break;
        }
        if c == '&' && s.rest()[1..].starts_with('#') {
            let start = s.pos;
            s.advance(2);
            let hex = s.consume_char('x');
            let digits_start = s.pos;
            while s.curr_char().map(|c| c.is_ascii_hexdigit()).unwrap_or(false) {
                s.advance_char();
            }
            let digits = &s.text[digits_start..s.pos];
            if !s.consume_char(';') {
                s.pos = start;
                out.push(c);
                s.advance_char();
                continue;
            }
            match super::entities::decode_char_ref(digits, hex) {
                Some(ch) => out.push(ch),
                None => return Err(WellFormedError::MalformedCharacterReference { pos: s.pos() }),
            }
        } else {
            out.push(c);
            s.advance_char();
        }
    }
    Ok(out)
}

fn consume_decl_body<'a>(s: &mut Stream<'a>) -> Result<&'a str, WellFormedError> {
    let start = s.pos;
    let mut paren_depth = 0i32;
    let mut quote: Option<char> = None;
    loop {
        let c = s.curr_char().ok_or(WellFormedError::UnexpectedEof)?;
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                s.advance_char();
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    s.advance_char();
                }
                '(' => {
                    paren_depth += 1;
                    s.advance_char();
                }
                ')' => {
                    paren_depth -= 1;
                    s.advance_char();
                }
                '>' if paren_depth <= 0 => {
                    let body = &s.text[start..s.pos];
                    s.advance_char();
                    return Ok(body);
                }
                _ => {
                    s.advance_char();
                }
            },
        }
    }
}

/// Expands `%name;` parameter-entity references textually, recursively.
fn expand_pe(text: &str, dtd: &Dtd, detector: &mut LoopDetector) -> Result<String, WellFormedError> {
    let mut out = String::with_capacity(text.len());
    let mut s = Stream::new(text);
    while let Some(c) = s.curr_char() {
        if c == '%' {
            let mark = s.pos;
            s.advance_char();
            if let Some(name) = s.consume_name() {
                if s.consume_char(';') {
                    let value = match dtd.parameter_entities.get(name) {
                        Some(pe) => pe.value.clone(),
                        None => return Err(WellFormedError::UnknownEntityReference { name: name.to_string(), pos: s.pos() }),
                    };
                    if detector.enter(name).is_err() {
                        return Err(WellFormedError::EntityReferenceLoop { pos: s.pos() });
                    }
                    let expanded = expand_pe(&value, dtd, detector)?;
                    detector.exit();
                    out.push_str(&expanded);
                    continue;
                }
            }
            s.pos = mark;
            out.push(c);
            s.advance_char();
        } else {
            out.push(c);
            s.advance_char();
        }
    }
    Ok(out)
}

fn parse_entity_decl(s: &mut Stream, dtd: &mut Dtd, detector: &mut LoopDetector, external: bool) -> Result<(), WellFormedError> {
    s.advance("<!ENTITY".len());
    let body = consume_decl_body(s)?;
    let expanded = expand_pe(body, dtd, detector)?;
    let mut bs = Stream::new(expanded.trim());
    bs.skip_spaces();
    let is_param = bs.consume_char('%');
    if is_param {
        bs.skip_spaces();
    }
    let name = bs.consume_name().ok_or_else(|| malformed(&bs))?.to_string();
    bs.skip_spaces();

    if bs.starts_with('"') || bs.starts_with('\'') {
        let value = parse_quoted(&mut bs)?;
        if is_param {
            dtd.parameter_entities.entry(name.clone()).or_insert(ParameterEntity { name, value, external });
        } else {
            dtd.general_entities.entry(name.clone()).or_insert(GeneralEntity {
                name,
                value,
                external,
                parsed: true,
                ndata: None,
            });
        }
    } else {
        let (_public_id, system_id) = parse_external_id(&mut bs)?;
        bs.skip_spaces();
        let mut ndata = None;
        if bs.consume_str("NDATA") {
            bs.skip_spaces();
            ndata = bs.consume_name().map(str::to_string);
        }
        if is_param {
            dtd.parameter_entities.entry(name.clone()).or_insert(ParameterEntity { name, value: String::new(), external: true });
        } else {
            dtd.general_entities.entry(name.clone()).or_insert(GeneralEntity {
                name,
                value: system_id.unwrap_or_default(),
                external: true,
                parsed: ndata.is_none(),
                ndata,
            });
        }
    }
    Ok(())
}

fn parse_element_decl(s: &mut Stream, dtd: &mut Dtd, detector: &mut LoopDetector, external: bool) -> Result<(), WellFormedError> {
    s.advance("<!ELEMENT".len());
    let body = consume_decl_body(s)?;
    let expanded = expand_pe(body, dtd, detector)?;
    let mut bs = Stream::new(expanded.trim());
    bs.skip_spaces();
    let name = bs.consume_name().ok_or_else(|| malformed(&bs))?.to_string();
    bs.skip_spaces();
    let content_spec = content_spec::parse_content_spec(bs.rest())?;

    let decl = dtd.ensure_element(&name);
    decl.content_spec = Some(content_spec);
    decl.user_declared = true;
    decl.external = external;
    Ok(())
}

fn parse_attlist_decl(s: &mut Stream, dtd: &mut Dtd, detector: &mut LoopDetector, external: bool) -> Result<(), WellFormedError> {
    s.advance("<!ATTLIST".len());
    let body = consume_decl_body(s)?;
    let expanded = expand_pe(body, dtd, detector)?;
    let mut bs = Stream::new(expanded.trim());
    bs.skip_spaces();
    let element_name = bs.consume_name().ok_or_else(|| malformed(&bs))?.to_string();

    let mut decls = Vec::new();
    loop {
        bs.skip_spaces();
        if bs.at_end() {
            break;
        }
        let attr_name = bs.consume_name().ok_or_else(|| malformed(&bs))?.to_string();
        bs.skip_spaces();
        let att_type = parse_att_type(&mut bs)?;
        bs.skip_spaces();
        let (default_kind, default_value) = parse_default_decl(&mut bs)?;
        decls.push(AttributeDecl { name: attr_name, att_type, default_kind, default_value, external });
    }

    let decl = dtd.ensure_element(&element_name);
    for new_decl in decls {
        if decl.attribute(&new_decl.name).is_none() {
            decl.attributes.push(new_decl);
        }
    }
    Ok(())
}

fn parse_att_type(s: &mut Stream) -> Result<AttType, WellFormedError> {
    if s.consume_str("CDATA") {
        Ok(AttType::CData)
    } else if s.consume_str("IDREFS") {
        Ok(AttType::IdRefs)
    } else if s.consume_str("IDREF") {
        Ok(AttType::IdRef)
    } else if s.consume_str("ID") {
        Ok(AttType::Id)
    } else if s.consume_str("ENTITIES") {
        Ok(AttType::Entities)
    } else if s.consume_str("ENTITY") {
        Ok(AttType::Entity)
    } else if s.consume_str("NMTOKENS") {
        Ok(AttType::NmTokens)
    } else if s.consume_str("NMTOKEN") {
        Ok(AttType::NmToken)
    } else if s.consume_str("NOTATION") {
        s.skip_spaces();
        Ok(AttType::Notation(parse_name_list(s)?))
    } else if s.starts_with('(') {
        Ok(AttType::Enumerated(parse_name_list(s)?))
    } else {
        Err(malformed(s))
    }
}

fn parse_name_list(s: &mut Stream) -> Result<Vec<String>, WellFormedError> {
    if !s.consume_char('(') {
        return Err(malformed(s));
    }
    let mut names = Vec::new();
    loop {
        s.skip_spaces();
        let name = s.consume_name().ok_or_else(|| malformed(s))?;
        names.push(name.to_string());
        s.skip_spaces();
        if s.consume_char('|') {
            continue;
        }
        break;
    }
    if !s.consume_char(')') {
        return Err(malformed(s));
    }
    Ok(names)
}

fn parse_default_decl(s: &mut Stream) -> Result<(DefaultKind, Option<String>), WellFormedError> {
    if s.consume_str("#REQUIRED") {
        Ok((DefaultKind::Required, None))
    } else if s.consume_str("#IMPLIED") {
        Ok((DefaultKind::Implied, None))
    } else if s.consume_str("#FIXED") {
        s.skip_spaces();
        let value = parse_quoted(s)?;
        Ok((DefaultKind::Fixed, Some(value)))
    } else {
        let value = parse_quoted(s)?;
        Ok((DefaultKind::Default, Some(value)))
    }
}

fn parse_notation_decl<H: SaxHandler>(s: &mut Stream, dtd: &Dtd, handler: &mut H, detector: &mut LoopDetector) -> Result<(), WellFormedError> {
    s.advance("<!NOTATION".len());
    let body = consume_decl_body(s)?;
    let expanded = expand_pe(body, dtd, detector)?;
    let mut bs = Stream::new(expanded.trim());
    bs.skip_spaces();
    let name = bs.consume_name().ok_or_else(|| malformed(&bs))?.to_string();
    bs.skip_spaces();
    let (public_id, system_id) = parse_external_id(&mut bs)?;
    handler.notation_decl(&NotationDecl { name, public_id, system_id });
    Ok(())
}

fn malformed(s: &Stream) -> WellFormedError {
    WellFormedError::MalformedDoctype { pos: s.pos() }
}
