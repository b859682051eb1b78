use std::fmt::{self, Display};

use crate::escape::LiteralText;
use crate::span::Span;

pub const KEYWORD_MOD: &str = "mod";
pub const KEYWORD_PUB: &str = "pub";
pub const KEYWORD_TOKEN: &str = "token";

pub const KEYWORDS: &[&str] = &[KEYWORD_MOD, KEYWORD_PUB, KEYWORD_TOKEN];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Also covers the keywords; the parser checks the text.
    Identifier,
    Integer(u64),
    /// A string literal with its escapes already decoded.
    Literal(LiteralText),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Pipe,
    Question,
    Plus,
    Star,
    Comma,
    Colon,
    Equals,
}

impl TokenKind {
    /// The single-character punctuation token for `ch`.
    pub fn punctuation(ch: char) -> Option<Self> {
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '|' => TokenKind::Pipe,
            '?' => TokenKind::Question,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Integer(_) => write!(f, "integer"),
            TokenKind::Literal(_) => write!(f, "string literal"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Equals => write!(f, "'='"),
        }
    }
}

/// A token represents a span over the source text along with what was
/// recognised there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span<'a>,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: Span<'a>) -> Self {
        Token { kind, span }
    }

    /// The raw source text of the token, quotes and escapes included.
    pub fn as_str(&self) -> &'a str {
        self.span.as_str()
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// True if this is an identifier spelled exactly `keyword`.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is_identifier() && self.as_str() == keyword
    }

    pub fn is_any_keyword(&self) -> bool {
        self.is_identifier() && KEYWORDS.contains(&self.as_str())
    }
}
