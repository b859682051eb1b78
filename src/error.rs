use std::fmt::{self, Display};

use thiserror::Error;

use crate::position::Position;

/// Any failure while reading Mage source. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Escape(#[from] EscapeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    /// Byte offset into the source the error points at.
    pub fn offset(&self) -> usize {
        match self {
            Error::Lex(err) => err.offset,
            Error::Escape(err) => err.offset,
            Error::Parse(err) => err.offset,
        }
    }

    /// 1-based line and column of the error within `source`.
    pub fn location(&self, source: &str) -> (usize, usize) {
        let offset = self.offset().min(source.len());
        (0..=offset)
            .rev()
            .find_map(|idx| Position::new(source, idx))
            .map_or((1, 1), |pos| pos.line_col())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// Reached a newline or the end of input before the closing quote. The
    /// offset is that of the opening quote.
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOverflow(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct EscapeError {
    pub kind: EscapeErrorKind,
    /// Offset of the backslash that starts the escape.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeErrorKind {
    /// Nothing recognised after the backslash.
    #[error("invalid escape sequence '\\{0}'")]
    Unknown(char),
    /// Backslash at the end of input.
    #[error("incomplete escape sequence")]
    Incomplete,
    #[error("escape names invalid code point {0:#x}")]
    InvalidCodePoint(u32),
    #[error("unknown character name {0:?}")]
    UnknownName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    /// Text of the offending token, `None` at end of input.
    pub found: Option<String>,
    pub expected: Option<&'static str>,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)?;
        match &self.found {
            Some(found) => write!(f, ": found '{}'", found)?,
            None => write!(f, ": found end of input")?,
        }
        if let Some(expected) = self.expected {
            write!(f, ", expected {}", expected)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("expected an expression")]
    EmptyExpression,
    #[error("unterminated parenthesis")]
    UnterminatedGroup,
    #[error("unterminated module")]
    UnterminatedModule,
    #[error("missing right-hand side of '|'")]
    DanglingChoice,
    #[error("malformed repeat bound")]
    MalformedRepeat,
    #[error("postfix modifiers must be parenthesized to stack")]
    StackedModifier,
    #[error("rule name must be followed by '='")]
    ExpectedEquals,
    #[error("expected a rule or module")]
    ExpectedElement,
    /// Parentheses nested deeper than `parser::MAX_NESTING`.
    #[error("parentheses nested too deeply")]
    NestingTooDeep,
}

/// A string that is not a valid Mage identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier {0:?}")]
pub struct InvalidIdentifier(pub String);

pub type Result<T, E = Error> = std::result::Result<T, E>;
