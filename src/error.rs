//! The error taxonomy (spec §7): one typed error per fallible subsystem.
//!
//! Every variant that can be attributed to a place in the source text carries
//! a [`TextPos`]. Errors are never swallowed; validity errors are the only
//! kind that can be reported without aborting the parse (see
//! [`crate::parser::InvalidationCallback`]).

use std::fmt;

/// A 1-based line/column position in the original document.
///
/// Mirrors `roxmltree::TextPos`: computed lazily from a byte offset, never
/// carried around eagerly, since most documents are never asked for it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextPos {
    pub row: u32,
    pub col: u32,
}

impl TextPos {
    pub fn new(row: u32, col: u32) -> Self {
        TextPos { row, col }
    }

    /// Computes a `TextPos` for a byte offset into `text`.
    ///
    /// This is `O(n)` in the offset; callers should only do this when
    /// reporting an error to a human, not on a hot path.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut row: u32 = 1;
        let mut col: u32 = 1;
        for ch in text[..offset].chars() {
            if ch == '\n' {
                row += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        TextPos { row, col }
    }
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// Encoding errors (spec §7 kind 1): malformed UTF-8/16 or an illegal
/// codepoint for the active XML version. Fatal to parsing.
#[derive(Clone, PartialEq, Debug)]
pub enum EncodingError {
    /// The input doesn't start with a recognizable BOM and declares an
    /// encoding the parser doesn't support.
    UnsupportedEncoding(String),
    /// A byte sequence could not be decoded under the detected encoding.
    MalformedSequence { offset: usize },
    /// A decoded codepoint is not a valid XML 1.0/1.1 character.
    IllegalChar { offset: usize, ch: char },
    /// Input too short to contain a valid document.
    Truncated,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodingError::UnsupportedEncoding(name) => {
                write!(f, "unsupported encoding '{}'", name)
            }
            EncodingError::MalformedSequence { offset } => {
                write!(f, "malformed byte sequence at offset {}", offset)
            }
            EncodingError::IllegalChar { offset, ch } => {
                write!(f, "character {:?} at offset {} is not valid XML", ch, offset)
            }
            EncodingError::Truncated => write!(f, "input ended before a complete document"),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Well-formedness errors (spec §7 kind 2): fatal to parsing, always carry a
/// position.
#[derive(Clone, PartialEq, Debug)]
pub enum WellFormedError {
    UnclosedTag { pos: TextPos },
    UnexpectedCloseTag { expected: String, actual: String, pos: TextPos },
    UnquotedAttributeValue { pos: TextPos },
    DuplicatedAttribute { name: String, pos: TextPos },
    InvalidAttributeValue { pos: TextPos },
    MalformedEntityReference { pos: TextPos },
    UnknownEntityReference { name: String, pos: TextPos },
    EntityReferenceLoop { pos: TextPos },
    MalformedCharacterReference { pos: TextPos },
    CommentContainsDoubleHyphen { pos: TextPos },
    MalformedProcessingInstruction { pos: TextPos },
    MalformedCdataSection { pos: TextPos },
    MalformedDoctype { pos: TextPos },
    NoRootElement,
    MultipleRootElements { pos: TextPos },
    ExcessiveNesting { pos: TextPos, limit: u32 },
    InvalidName { pos: TextPos },
    UnexpectedEof,
    Encoding(EncodingError),
}

impl fmt::Display for WellFormedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WellFormedError::UnclosedTag { pos } => write!(f, "unclosed tag at {}", pos),
            WellFormedError::UnexpectedCloseTag { expected, actual, pos } => {
                write!(f, "expected closing tag '{}', found '{}' at {}", expected, actual, pos)
            }
            WellFormedError::UnquotedAttributeValue { pos } => {
                write!(f, "attribute value must be quoted at {}", pos)
            }
            WellFormedError::DuplicatedAttribute { name, pos } => {
                write!(f, "attribute '{}' at {} is already defined", name, pos)
            }
            WellFormedError::InvalidAttributeValue { pos } => {
                write!(f, "unescaped '<' found in attribute value at {}", pos)
            }
            WellFormedError::MalformedEntityReference { pos } => {
                write!(f, "malformed entity reference at {}", pos)
            }
            WellFormedError::UnknownEntityReference { name, pos } => {
                write!(f, "unknown entity reference '{}' at {}", name, pos)
            }
            WellFormedError::EntityReferenceLoop { pos } => {
                write!(f, "a possible entity reference loop is detected at {}", pos)
            }
            WellFormedError::MalformedCharacterReference { pos } => {
                write!(f, "malformed character reference at {}", pos)
            }
            WellFormedError::CommentContainsDoubleHyphen { pos } => {
                write!(f, "comment must not contain '--' at {}", pos)
            }
            WellFormedError::MalformedProcessingInstruction { pos } => {
                write!(f, "malformed processing instruction at {}", pos)
            }
            WellFormedError::MalformedCdataSection { pos } => {
                write!(f, "malformed CDATA section at {}", pos)
            }
            WellFormedError::MalformedDoctype { pos } => {
                write!(f, "malformed DOCTYPE declaration at {}", pos)
            }
            WellFormedError::NoRootElement => write!(f, "the document has no root element"),
            WellFormedError::MultipleRootElements { pos } => {
                write!(f, "a second root element was found at {}", pos)
            }
            WellFormedError::ExcessiveNesting { pos, limit } => {
                write!(f, "element nesting exceeded {} levels at {}", limit, pos)
            }
            WellFormedError::InvalidName { pos } => write!(f, "invalid name at {}", pos),
            WellFormedError::UnexpectedEof => write!(f, "unexpected end of input"),
            WellFormedError::Encoding(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WellFormedError {}

impl From<EncodingError> for WellFormedError {
    fn from(e: EncodingError) -> Self {
        WellFormedError::Encoding(e)
    }
}

/// Validity errors (spec §7 kind 3): DTD violations. Non-fatal by default;
/// routed through [`crate::parser::InvalidationCallback`].
#[derive(Clone, PartialEq, Debug)]
pub enum ValidityError {
    UnexpectedChild { parent: String, child: String },
    UnexpectedCharacterData { parent: String },
    ContentNotSatisfied { parent: String },
    MissingRequiredAttribute { element: String, attribute: String },
    InvalidAttributeValue { element: String, attribute: String, value: String },
    FixedAttributeMismatch { element: String, attribute: String, expected: String, actual: String },
    UndeclaredElement { name: String },
    UndeclaredAttribute { element: String, attribute: String },
    DuplicateIdValue { value: String },
    UnknownIdref { value: String },
}

impl fmt::Display for ValidityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidityError::UnexpectedChild { parent, child } => {
                write!(f, "element '{}' is not allowed inside '{}'", child, parent)
            }
            ValidityError::UnexpectedCharacterData { parent } => {
                write!(f, "character data is not allowed inside '{}'", parent)
            }
            ValidityError::ContentNotSatisfied { parent } => {
                write!(f, "element '{}' ended before its content model was satisfied", parent)
            }
            ValidityError::MissingRequiredAttribute { element, attribute } => {
                write!(f, "element '{}' is missing required attribute '{}'", element, attribute)
            }
            ValidityError::InvalidAttributeValue { element, attribute, value } => {
                write!(f, "attribute '{}' of '{}' has invalid value '{}'", attribute, element, value)
            }
            ValidityError::FixedAttributeMismatch { element, attribute, expected, actual } => {
                write!(
                    f,
                    "attribute '{}' of '{}' is #FIXED to '{}' but was given '{}'",
                    attribute, element, expected, actual
                )
            }
            ValidityError::UndeclaredElement { name } => {
                write!(f, "element '{}' was not declared in the DTD", name)
            }
            ValidityError::UndeclaredAttribute { element, attribute } => {
                write!(f, "attribute '{}' of '{}' was not declared in the DTD", attribute, element)
            }
            ValidityError::DuplicateIdValue { value } => {
                write!(f, "ID value '{}' is used more than once", value)
            }
            ValidityError::UnknownIdref { value } => {
                write!(f, "IDREF '{}' does not refer to any element", value)
            }
        }
    }
}

impl std::error::Error for ValidityError {}

/// Programmer errors (spec §7 kind 5): DOM API misuse.
#[derive(Clone, PartialEq, Debug)]
pub enum DomError {
    NotAChild,
    NotAnElement,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DomError::NotAChild => write!(f, "node is not a child of the given parent"),
            DomError::NotAnElement => write!(f, "node is not an element"),
        }
    }
}

impl std::error::Error for DomError {}
