//! Escape sequences inside string literals.
//!
//! The lexer calls [`decode_escape`] whenever it meets a backslash in a
//! literal body. Printing a [`LiteralText`] goes the other way and is used
//! when writing literals back out as Mage source.

use std::fmt::{self, Display, Write};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while_m_n},
    character::complete::{char, one_of},
    combinator::{map, map_res, opt, value},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{EscapeError, EscapeErrorKind};

/// Resolves the NAME of a `\N{NAME}` escape to a character.
///
/// Implemented for any `Fn(&str) -> Option<char>`, so a closure over a name
/// table works as a resolver.
pub trait NameResolver {
    fn resolve(&self, name: &str) -> Option<char>;
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Option<char>,
{
    fn resolve(&self, name: &str) -> Option<char> {
        self(name)
    }
}

/// Decoded text of a string literal.
///
/// A `\N{NAME}` escape that no resolver answered is kept apart from the
/// text, at the byte index where it occurred, so it stays distinct from the
/// escaped-backslash spelling `\\N{NAME}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LiteralText {
    text: String,
    unresolved: Vec<(usize, String)>,
}

impl LiteralText {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded characters, without any unresolved names.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Unresolved `\N{NAME}` escapes as `(byte index into text, NAME)`, in
    /// source order.
    pub fn unresolved(&self) -> &[(usize, String)] {
        &self.unresolved
    }

    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn push_unresolved(&mut self, name: &str) {
        self.unresolved.push((self.text.len(), name.to_owned()));
    }
}

impl From<&str> for LiteralText {
    fn from(text: &str) -> Self {
        LiteralText {
            text: text.to_owned(),
            unresolved: Vec::new(),
        }
    }
}

impl From<String> for LiteralText {
    fn from(text: String) -> Self {
        LiteralText {
            text,
            unresolved: Vec::new(),
        }
    }
}

/// Prints as a quoted Mage literal that decodes back to the same value.
impl Display for LiteralText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char('"')?;
        let mut last = 0;
        for (idx, name) in &self.unresolved {
            write_escaped(f, &self.text[last..*idx])?;
            write!(f, "\\N{{{}}}", name)?;
            last = *idx;
        }
        write_escaped(f, &self.text[last..])?;
        f.write_char('"')
    }
}

/// What followed a backslash, before it is turned into characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeSequence<'a> {
    /// `\uXXXX` or `\UXXXXXXXX`.
    CodePoint(u32),
    /// `\xXX`.
    Byte(u8),
    /// `\NNN`, up to three decimal digits.
    Decimal(u32),
    /// Backslash at the end of a line.
    LineContinuation,
    Char(char),
    /// `\N{NAME}`.
    Named(&'a str),
}

impl<'a> EscapeSequence<'a> {
    /// Append the decoded characters to `out`. `offset` is the position of
    /// the backslash, used for errors.
    pub fn decode_into(
        &self,
        out: &mut LiteralText,
        resolver: Option<&dyn NameResolver>,
        offset: usize,
    ) -> Result<(), EscapeError> {
        match *self {
            EscapeSequence::CodePoint(code) | EscapeSequence::Decimal(code) => {
                let ch = char::from_u32(code).ok_or(EscapeError {
                    kind: EscapeErrorKind::InvalidCodePoint(code),
                    offset,
                })?;
                out.push(ch);
            }
            EscapeSequence::Byte(byte) => out.push(char::from(byte)),
            EscapeSequence::LineContinuation => {}
            EscapeSequence::Char(ch) => out.push(ch),
            EscapeSequence::Named(name) => match resolver {
                Some(resolver) => {
                    let ch = resolver.resolve(name).ok_or_else(|| EscapeError {
                        kind: EscapeErrorKind::UnknownName(name.to_owned()),
                        offset,
                    })?;
                    out.push(ch);
                }
                None => out.push_unresolved(name),
            },
        }
        Ok(())
    }
}

fn hex_digits(input: &str, count: usize) -> IResult<&str, u32> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_hexdigit()),
        |digits: &str| u32::from_str_radix(digits, 16),
    )(input)
}

fn decimal_digits(input: &str) -> IResult<&str, u32> {
    map_res(
        take_while_m_n(1, 3, |c: char| c.is_ascii_digit()),
        |digits: &str| digits.parse::<u32>(),
    )(input)
}

fn control_char(ch: char) -> char {
    match ch {
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0B}',
        // quotes and backslash stand for themselves
        ch => ch,
    }
}

/// Recognise the escape that follows a backslash. `input` starts right after
/// the backslash. Alternatives are tried in priority order.
pub fn escape_sequence(input: &str) -> IResult<&str, EscapeSequence<'_>> {
    alt((
        map(preceded(char('u'), |i| hex_digits(i, 4)), EscapeSequence::CodePoint),
        map(preceded(char('U'), |i| hex_digits(i, 8)), EscapeSequence::CodePoint),
        map(preceded(char('x'), |i| hex_digits(i, 2)), |byte| {
            EscapeSequence::Byte(byte as u8)
        }),
        map(decimal_digits, EscapeSequence::Decimal),
        value(
            EscapeSequence::LineContinuation,
            pair(opt(char('\r')), char('\n')),
        ),
        map(one_of("'\"abfrntv\\"), |ch| {
            EscapeSequence::Char(control_char(ch))
        }),
        map(
            delimited(tag("N{"), is_not("}"), char('}')),
            EscapeSequence::Named,
        ),
    ))(input)
}

/// Decode the escape at the start of `input`, which must begin with the
/// backslash found at byte `offset` of the source. Returns the input left
/// after the escape.
pub fn decode_escape<'a>(
    input: &'a str,
    offset: usize,
    resolver: Option<&dyn NameResolver>,
    out: &mut LiteralText,
) -> Result<&'a str, EscapeError> {
    let body = input.strip_prefix('\\').unwrap_or(input);
    let (rest, seq) = escape_sequence(body).map_err(|_| EscapeError {
        kind: match body.chars().next() {
            Some(ch) => EscapeErrorKind::Unknown(ch),
            None => EscapeErrorKind::Incomplete,
        },
        offset,
    })?;
    seq.decode_into(out, resolver, offset)?;
    Ok(rest)
}

/// Quote `text` as a Mage string literal that decodes back to `text`.
pub fn escape_str(text: &str) -> String {
    LiteralText::from(text).to_string()
}

fn write_escaped(f: &mut fmt::Formatter, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            ch if ch.is_control() => {
                let code = u32::from(ch);
                if code <= 0xFF {
                    write!(f, "\\x{:02X}", code)?;
                } else {
                    write!(f, "\\u{:04X}", code)?;
                }
            }
            ch => f.write_char(ch)?,
        }
    }
    Ok(())
}
