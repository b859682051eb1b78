use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, alphanumeric1, digit1, multispace0},
    combinator::recognize,
    multi::many0,
    sequence::pair,
    IResult,
};

use crate::error::{LexError, LexErrorKind, Result};
use crate::escape::{decode_escape, LiteralText, NameResolver};
use crate::position::Position;
use crate::tokens::{Token, TokenKind};

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

pub fn integer(input: &str) -> IResult<&str, &str> {
    digit1(input)
}

/// A run of literal characters that need no decoding.
fn literal_run(input: &str) -> IResult<&str, &str> {
    is_not("\\\"\n")(input)
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Splits Mage source into tokens, decoding literal escapes on the way.
///
/// Yields `Result`s; after the first error the lexer is exhausted.
pub struct Lexer<'a> {
    pos: Position<'a>,
    resolver: Option<&'a dyn NameResolver>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            pos: Position { input, idx: 0 },
            resolver: None,
        }
    }

    /// Lexer that resolves `\N{NAME}` escapes through `resolver`.
    pub fn with_resolver(input: &'a str, resolver: &'a dyn NameResolver) -> Self {
        Lexer {
            pos: Position { input, idx: 0 },
            resolver: Some(resolver),
        }
    }

    pub fn input(&self) -> &'a str {
        self.pos.input
    }

    /// Byte offset of the cursor.
    pub fn offset(&self) -> usize {
        self.pos.idx
    }

    /// Scan the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        self.skip_whitespace();
        if self.pos.is_eof() {
            return Ok(None);
        }

        let start = self.pos.idx;
        let rest = self.pos.rest();

        let kind = if let Ok((rem, _)) = identifier(rest) {
            self.pos.advance_to(rem);
            TokenKind::Identifier
        } else if let Ok((rem, digits)) = integer(rest) {
            let value = digits.parse::<u64>().map_err(|_| LexError {
                kind: LexErrorKind::IntegerOverflow(digits.to_owned()),
                offset: start,
            })?;
            self.pos.advance_to(rem);
            TokenKind::Integer(value)
        } else if rest.starts_with('"') {
            self.literal()?
        } else {
            let ch = rest.chars().next().unwrap_or_default();
            let kind = TokenKind::punctuation(ch).ok_or(LexError {
                kind: LexErrorKind::UnexpectedChar(ch),
                offset: start,
            })?;
            self.pos.idx += ch.len_utf8();
            kind
        };

        let token = Token::new(kind, self.pos.span_from(start));
        log::trace!("[lex] {} {:?} at {}", token.kind, token.as_str(), start);
        Ok(Some(token))
    }

    fn skip_whitespace(&mut self) {
        if let Ok((rem, _)) = whitespace(self.pos.rest()) {
            self.pos.advance_to(rem);
        }
    }

    /// Scan a literal starting at the opening quote. The body alternates
    /// between raw runs and escapes, concatenated in order.
    fn literal(&mut self) -> Result<TokenKind> {
        let open = self.pos.idx;
        self.pos.match_str("\"");

        let mut text = LiteralText::new();
        loop {
            let rest = self.pos.rest();
            if let Ok((rem, run)) = literal_run(rest) {
                text.push_str(run);
                self.pos.advance_to(rem);
                continue;
            }
            match rest.chars().next() {
                Some('"') => {
                    self.pos.match_str("\"");
                    return Ok(TokenKind::Literal(text));
                }
                Some('\\') => {
                    let rem = decode_escape(rest, self.pos.idx, self.resolver, &mut text)?;
                    self.pos.advance_to(rem);
                }
                _ => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedLiteral,
                        offset: open,
                    }
                    .into())
                }
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.next_token();
        if res.is_err() {
            self.pos.idx = self.pos.input.len();
        }
        res.transpose()
    }
}

/// Tokenize the whole input, stopping at the first error.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EscapeError, EscapeErrorKind, Error};

    struct TestCase<T> {
        input: &'static str,
        // Some indicates success, None indicates error.
        out: Option<T>,
    }

    fn kinds(input: &str) -> Result<Vec<TokenKind>> {
        Ok(tokenize(input)?.into_iter().map(|tok| tok.kind).collect())
    }

    #[test]
    fn parse_identifier() {
        let tests = vec![
            TestCase {
                input: "hello",
                out: Some(("", "hello")),
            },
            TestCase {
                input: "_under_score9 rest",
                out: Some((" rest", "_under_score9")),
            },
            TestCase {
                input: "a1=b",
                out: Some(("=b", "a1")),
            },
            TestCase {
                input: "9lives",
                out: None,
            },
            TestCase {
                input: "élan",
                out: None,
            },
        ];

        for t in tests {
            let res = identifier(t.input);
            match t.out {
                Some(out) => assert_eq!(res, Ok(out)),
                None => assert!(res.is_err(), "expected error: {:?}", res),
            }
        }
    }

    #[test]
    fn lex_token_kinds() {
        let tests = vec![
            TestCase {
                input: "",
                out: Some(vec![]),
            },
            TestCase {
                input: "  \t\r\n ",
                out: Some(vec![]),
            },
            TestCase {
                input: "pub token foo = bar",
                out: Some(vec![
                    TokenKind::Identifier,
                    TokenKind::Identifier,
                    TokenKind::Identifier,
                    TokenKind::Equals,
                    TokenKind::Identifier,
                ]),
            },
            TestCase {
                input: "x{2,007}",
                out: Some(vec![
                    TokenKind::Identifier,
                    TokenKind::LBrace,
                    TokenKind::Integer(2),
                    TokenKind::Comma,
                    TokenKind::Integer(7),
                    TokenKind::RBrace,
                ]),
            },
            TestCase {
                input: "l:(a|\"b\")?+*",
                out: Some(vec![
                    TokenKind::Identifier,
                    TokenKind::Colon,
                    TokenKind::LParen,
                    TokenKind::Identifier,
                    TokenKind::Pipe,
                    TokenKind::Literal("b".into()),
                    TokenKind::RParen,
                    TokenKind::Question,
                    TokenKind::Plus,
                    TokenKind::Star,
                ]),
            },
            TestCase {
                input: "\"a\\tb\\x41\\\n\"",
                out: Some(vec![TokenKind::Literal("a\tbA".into())]),
            },
            TestCase {
                input: "\"\"",
                out: Some(vec![TokenKind::Literal(LiteralText::new())]),
            },
            TestCase {
                input: "a - b",
                out: None,
            },
            TestCase {
                input: "\"open",
                out: None,
            },
        ];

        for t in tests {
            let res = kinds(t.input);
            match t.out {
                Some(out) => assert_eq!(res, Ok(out), "input: {:?}", t.input),
                None => assert!(res.is_err(), "expected error for {:?}: {:?}", t.input, res),
            }
        }
    }

    #[test]
    fn lex_spans() {
        let input = "rule = \"a\\\"b\" x";
        let toks = tokenize(input).unwrap();
        let texts: Vec<&str> = toks.iter().map(|tok| tok.as_str()).collect();
        assert_eq!(texts, vec!["rule", "=", "\"a\\\"b\"", "x"]);
        assert_eq!(toks[2].offset(), 7);
        assert_eq!(toks[2].kind, TokenKind::Literal("a\"b".into()));

        let whole = crate::span::Span {
            s: input,
            start: 0,
            end: input.len(),
        };
        for tok in &toks {
            assert!(whole.contains(&tok.span), "token: {:?}", tok);
        }
    }

    #[test]
    fn lex_errors() {
        assert_eq!(
            tokenize("rule = \"unterminated"),
            Err(Error::Lex(LexError {
                kind: LexErrorKind::UnterminatedLiteral,
                offset: 7,
            }))
        );
        assert_eq!(
            tokenize("a = \"line\nbreak\""),
            Err(Error::Lex(LexError {
                kind: LexErrorKind::UnterminatedLiteral,
                offset: 4,
            }))
        );
        assert_eq!(
            tokenize("a = b;"),
            Err(Error::Lex(LexError {
                kind: LexErrorKind::UnexpectedChar(';'),
                offset: 5,
            }))
        );
        assert_eq!(
            tokenize("x{99999999999999999999}"),
            Err(Error::Lex(LexError {
                kind: LexErrorKind::IntegerOverflow("99999999999999999999".to_owned()),
                offset: 2,
            }))
        );
        assert_eq!(
            tokenize("a = \"bad \\z\""),
            Err(Error::Escape(EscapeError {
                kind: EscapeErrorKind::Unknown('z'),
                offset: 9,
            }))
        );
    }

    #[test]
    fn lexer_stops_after_error() {
        let mut lexer = Lexer::new("a ; b");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
        assert_eq!(lexer.offset(), lexer.input().len());
    }

    #[test]
    fn lex_named_escape_with_resolver() {
        let resolver = |name: &str| if name == "SPACE" { Some(' ') } else { None };
        let mut lexer = Lexer::with_resolver("\"a\\N{SPACE}b\"", &resolver);
        let tok = lexer.next_token().unwrap().unwrap();
        assert_eq!(tok.kind, TokenKind::Literal("a b".into()));
    }
}
