//! A byte-offset cursor over a decoded `&str` (spec §4.F "Markup scanner").
//!
//! Grounded in `roxmltree`'s internal `Stream` (used throughout
//! `tokenizer.rs`/`parse.rs` as `s.advance`, `s.skip_spaces`,
//! `s.starts_with`, `s.curr_byte`, `s.gen_text_pos`), reimplemented here
//! over owned, mutable input instead of a borrowed `&'d str`, since this
//! crate builds an owned DOM rather than borrowing from the source text.

use crate::chars::is_xml_space;
use crate::error::TextPos;

#[derive(Clone)]
pub struct Stream<'a> {
    pub text: &'a str,
    pub pos: usize,
}

impl<'a> Stream<'a> {
    pub fn new(text: &'a str) -> Self {
        Stream { text, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn curr_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn advance_char(&mut self) -> Option<char> {
        let c = self.curr_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn skip_spaces(&mut self) {
        while let Some(c) = self.curr_char() {
            if is_xml_space(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn skip_spaces_required(&mut self) -> bool {
        let start = self.pos;
        self.skip_spaces();
        self.pos != start
    }

    pub fn consume_char(&mut self, expected: char) -> bool {
        if self.curr_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consumes up to (not including) the next occurrence of `needle`,
    /// returning the consumed slice. Leaves the cursor at end of input if
    /// `needle` never occurs.
    pub fn consume_until(&mut self, needle: &str) -> &'a str {
        let rest = self.rest();
        match rest.find(needle) {
            Some(i) => {
                let s = &rest[..i];
                self.pos += i;
                s
            }
            None => {
                let s = rest;
                self.pos = self.text.len();
                s
            }
        }
    }

    /// Consumes an XML `Name` production, returning it or `None` if the
    /// cursor isn't at a valid name-start character.
    pub fn consume_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let c = self.curr_char()?;
        if !crate::chars::is_name_start_char(c) {
            return None;
        }
        self.pos += c.len_utf8();
        while let Some(c) = self.curr_char() {
            if crate::chars::is_name_char(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Some(&self.text[start..self.pos])
    }

    pub fn pos(&self) -> TextPos {
        TextPos::from_offset(self.text, self.pos)
    }
}
