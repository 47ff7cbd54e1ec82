//! XPath syntax errors (spec §7 kind 4).
//!
//! Hand-rolled with a manual `Display`/`Error` impl, matching
//! [`crate::error::WellFormedError`] rather than pulling in `thiserror` the
//! way `petty-xpath1::error` does, to keep this crate's error taxonomy in
//! one idiom.

use std::fmt;

#[derive(Clone, PartialEq, Debug)]
pub enum Error {
    UnexpectedEnd,
    UnexpectedToken(String),
    UnknownAxis(String),
    UnknownFunction(String),
    WrongArity { name: String, got: usize },
    TrailingInput(String),
    MalformedNumber(String),
    UnterminatedLiteral,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedEnd => write!(f, "unexpected end of XPath expression"),
            Error::UnexpectedToken(t) => write!(f, "unexpected token '{}'", t),
            Error::UnknownAxis(name) => write!(f, "unknown axis '{}'", name),
            Error::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
            Error::WrongArity { name, got } => write!(f, "function '{}' called with {} argument(s)", name, got),
            Error::TrailingInput(rest) => write!(f, "unexpected trailing input '{}'", rest),
            Error::MalformedNumber(s) => write!(f, "malformed number '{}'", s),
            Error::UnterminatedLiteral => write!(f, "unterminated string literal"),
        }
    }
}

impl std::error::Error for Error {}
