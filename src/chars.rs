//! Text & character classification (spec §4.A).
//!
//! Grounded in `roxmltree::tokenizer::XmlCharExt`, extended to cover the
//! full codepoint range (the teacher only classified ASCII bytes plus a
//! handful of wide ranges needed for name characters) and the XML 1.1
//! character set plus system-literal / public-id productions that spec.md
//! §4.A calls out but the teacher never implemented.

/// `:`, `_`, `A-Z`, `a-z`, and the Latin-1/CJK supplement ranges from the
/// XML 1.0 `NameStartChar` production.
#[inline]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c as u32, 0x3A | 0x5F | 0x41..=0x5A | 0x61..=0x7A)
        || matches!(c as u32,
            0x00C0..=0x00D6
            | 0x00D8..=0x00F6
            | 0x00F8..=0x02FF
            | 0x0370..=0x037D
            | 0x037F..=0x1FFF
            | 0x200C..=0x200D
            | 0x2070..=0x218F
            | 0x2C00..=0x2FEF
            | 0x3001..=0xD7FF
            | 0xF900..=0xFDCF
            | 0xFDF0..=0xFFFD
            | 0x10000..=0xEFFFF)
}

/// `NameStartChar` plus `-`, `.`, digits, and combining marks
/// (`NameChar` production).
#[inline]
pub fn is_name_char(c: char) -> bool {
    if is_name_start_char(c) {
        return true;
    }
    matches!(c as u32,
        0x2D | 0x2E | 0x30..=0x39 | 0xB7
        | 0x0300..=0x036F
        | 0x203F..=0x2040)
}

/// Whitespace per the XML `S` production: `[ \t\r\n]`.
#[inline]
pub fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// XML 1.0 `Char` production: tab, CR, LF, and `[0x20-0xD7FF] | [0xE000-0xFFFD] | [0x10000-0x10FFFF]`.
#[inline]
pub fn is_valid_xml_1_0_char(c: char) -> bool {
    matches!(c as u32,
        0x9 | 0xA | 0xD
        | 0x20..=0xD7FF
        | 0xE000..=0xFFFD
        | 0x10000..=0x10FFFF)
}

/// XML 1.1 `Char` production: like 1.0, but also permits the C0/C1 control
/// characters (except NUL) when they appear as character references — the
/// raw control range `[0x1-0x1F]` minus tab/CR/LF, and `[0x7F-0x84]`,
/// `[0x86-0x9F]`, are additionally accepted.
#[inline]
pub fn is_valid_xml_1_1_char(c: char) -> bool {
    if c == '\u{0}' {
        return false;
    }
    matches!(c as u32,
        0x1..=0xD7FF
        | 0xE000..=0xFFFD
        | 0x10000..=0x10FFFF)
}

/// `SystemLiteral` production: any character except the surrounding quote
/// (the caller picks the quote); here just "is a valid XML char".
#[inline]
pub fn is_valid_system_literal_char(c: char) -> bool {
    is_valid_xml_1_0_char(c)
}

/// `PubidChar` production: a restrictive subset of ASCII used in public
/// identifiers.
#[inline]
pub fn is_valid_public_id_char(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n')
        || c.is_ascii_alphanumeric()
        || matches!(c, '-' | '\'' | '(' | ')' | '+' | ',' | '.' | '/' | ':' | '=' | '?' | ';'
            | '!' | '*' | '#' | '@' | '$' | '_' | '%')
}

/// Appends `c`'s UTF-8 encoding to `buf`.
#[inline]
pub fn push_codepoint(buf: &mut String, c: char) {
    buf.push(c);
}

/// Removes and returns the last codepoint of `buf`, if any.
#[inline]
pub fn pop_codepoint(buf: &mut String) -> Option<char> {
    buf.pop()
}

/// Advances `s[*pos..]` one codepoint forward, returning it.
///
/// Returns `None` at end of input. `*pos` is a byte offset; the caller is
/// responsible for having validated `s` as UTF-8 (it always is here, since
/// [`crate::encoding`] only ever hands the parser a `String`).
#[inline]
pub fn advance_char(s: &str, pos: &mut usize) -> Option<char> {
    let rest = &s[*pos..];
    let c = rest.chars().next()?;
    *pos += c.len_utf8();
    Some(c)
}

/// Trims ASCII whitespace from both ends, in place conceptually (returns a
/// borrowed slice; callers that need an owned trimmed copy call `.to_owned()`).
#[inline]
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| is_xml_space(c))
}

/// Collapses runs of XML whitespace to a single `' '` and trims the ends,
/// as required when normalizing non-CDATA attribute values (spec §4.F).
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true; // true so leading space is dropped
    for c in s.chars() {
        if is_xml_space(c) {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_chars() {
        assert!(is_name_start_char('a'));
        assert!(is_name_start_char('_'));
        assert!(is_name_start_char(':'));
        assert!(!is_name_start_char('-'));
        assert!(!is_name_start_char('1'));
        assert!(is_name_char('1'));
        assert!(is_name_char('-'));
        assert!(is_name_char('.'));
    }

    #[test]
    fn xml_1_0_vs_1_1_chars() {
        assert!(!is_valid_xml_1_0_char('\u{1}'));
        assert!(is_valid_xml_1_1_char('\u{1}'));
        assert!(!is_valid_xml_1_1_char('\u{0}'));
        assert!(is_valid_xml_1_0_char('\t'));
        assert!(is_valid_xml_1_1_char('\t'));
    }

    #[test]
    fn collapse() {
        assert_eq!(collapse_whitespace("  a   b  c "), "a b c");
        assert_eq!(collapse_whitespace("a"), "a");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn advance() {
        let s = "a\u{00e9}b";
        let mut pos = 0;
        assert_eq!(advance_char(s, &mut pos), Some('a'));
        assert_eq!(advance_char(s, &mut pos), Some('\u{00e9}'));
        assert_eq!(advance_char(s, &mut pos), Some('b'));
        assert_eq!(advance_char(s, &mut pos), None);
    }
}
