//! Parses a declared content-spec string (the text between an `<!ELEMENT
//! name` and the closing `>`) into a [`ContentSpec`] tree (spec §3 "Content
//! specs", §4.D "Compilation").

use crate::dtd::{ContentSpec, Quantifier};
use crate::error::WellFormedError;
use crate::parser::stream::Stream;

pub fn parse_content_spec(text: &str) -> Result<ContentSpec, WellFormedError> {
    let mut s = Stream::new(text.trim());
    s.skip_spaces();
    if s.consume_str("EMPTY") {
        return Ok(ContentSpec::Empty);
    }
    if s.consume_str("ANY") {
        return Ok(ContentSpec::Any);
    }
    let spec = parse_group(&mut s)?;
    s.skip_spaces();
    Ok(spec)
}

/// Parses one parenthesized group, including the trailing quantifier and
/// (for a top-level `#PCDATA` group) the mixed-content shape.
fn parse_group(s: &mut Stream) -> Result<ContentSpec, WellFormedError> {
    if !s.consume_char('(') {
        return parse_name_particle(s);
    }
    s.skip_spaces();

    if s.starts_with("#PCDATA") {
        s.advance("#PCDATA".len());
        let mut names = Vec::new();
        s.skip_spaces();
        while s.consume_char('|') {
            s.skip_spaces();
            let name = s.consume_name().ok_or_else(|| malformed(s))?;
            names.push(ContentSpec::Element(name.to_string()));
            s.skip_spaces();
        }
        if !s.consume_char(')') {
            return Err(malformed(s));
        }
        // `(#PCDATA)` (no star) or `(#PCDATA|a|b)*`.
        s.consume_char('*');
        return Ok(ContentSpec::Choice(names, true));
    }

    let mut particles = vec![parse_group(s)?];
    s.skip_spaces();
    let mut is_choice = false;
    loop {
        if s.consume_char(',') {
            s.skip_spaces();
            particles.push(parse_group(s)?);
        } else if s.consume_char('|') {
            is_choice = true;
            s.skip_spaces();
            particles.push(parse_group(s)?);
        } else {
            break;
        }
        s.skip_spaces();
    }
    if !s.consume_char(')') {
        return Err(malformed(s));
    }

    let base = if particles.len() == 1 {
        particles.into_iter().next().unwrap()
    } else if is_choice {
        ContentSpec::Choice(particles, false)
    } else {
        ContentSpec::Seq(particles)
    };
    Ok(apply_quantifier(s, base))
}

fn parse_name_particle(s: &mut Stream) -> Result<ContentSpec, WellFormedError> {
    let name = s.consume_name().ok_or_else(|| malformed(s))?;
    Ok(apply_quantifier(s, ContentSpec::Element(name.to_string())))
}

fn apply_quantifier(s: &mut Stream, base: ContentSpec) -> ContentSpec {
    if s.consume_char('?') {
        ContentSpec::Repeated(Box::new(base), Quantifier::Optional)
    } else if s.consume_char('*') {
        ContentSpec::Repeated(Box::new(base), Quantifier::ZeroOrMore)
    } else if s.consume_char('+') {
        ContentSpec::Repeated(Box::new(base), Quantifier::OneOrMore)
    } else {
        base
    }
}

fn malformed(s: &Stream) -> WellFormedError {
    WellFormedError::MalformedDoctype { pos: s.pos() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_and_any() {
        assert!(matches!(parse_content_spec("EMPTY").unwrap(), ContentSpec::Empty));
        assert!(matches!(parse_content_spec("ANY").unwrap(), ContentSpec::Any));
    }

    #[test]
    fn parses_sequence_with_quantifiers() {
        let spec = parse_content_spec("(b, c?, d+)").unwrap();
        match spec {
            ContentSpec::Seq(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected Seq"),
        }
    }

    #[test]
    fn parses_mixed_content() {
        let spec = parse_content_spec("(#PCDATA|a|b)*").unwrap();
        match spec {
            ContentSpec::Choice(children, true) => assert_eq!(children.len(), 2),
            _ => panic!("expected mixed Choice"),
        }
    }

    #[test]
    fn parses_nested_choice() {
        let spec = parse_content_spec("(a, (b|c)+)").unwrap();
        if let ContentSpec::Seq(children) = spec {
            assert!(matches!(children[1], ContentSpec::Repeated(_, Quantifier::OneOrMore)));
        } else {
            panic!("expected Seq");
        }
    }
}
