//! Recursive descent over the token stream.
//!
//! Declarations are parsed top-down. Rule bodies go through a precedence
//! climbing loop with two binary operators: choice (`|`) and sequence, which
//! has no operator symbol and is implied whenever one primary expression
//! directly follows another. Sequence binds tighter; both are left
//! associative.

use std::collections::VecDeque;

use crate::error::{Error, ParseError, ParseErrorKind, Result};
use crate::escape::NameResolver;
use crate::lexer::Lexer;
use crate::tokens::{Token, TokenKind, KEYWORD_MOD, KEYWORD_PUB, KEYWORD_TOKEN};
use crate::{Expr, Identifier, Module, ModuleElement, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Choice,
    Sequence,
}

impl BinaryOp {
    fn binding_power(self) -> u8 {
        match self {
            BinaryOp::Choice => 1,
            BinaryOp::Sequence => 2,
        }
    }

    fn build(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            BinaryOp::Choice => Expr::Choice(Box::new(lhs), Box::new(rhs)),
            BinaryOp::Sequence => Expr::Sequence(Box::new(lhs), Box::new(rhs)),
        }
    }
}

const PRIMARY: &str = "literal, reference or '('";

/// Deepest parenthesized group accepted in a rule body.
pub const MAX_NESTING: usize = 128;

/// A single parse of one source text. Owns the cursor and the lookahead
/// buffer; consumed by the `parse_*` entry points.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token<'a>>,
    /// Open groups around the current position.
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            depth: 0,
        }
    }

    /// Parser that resolves `\N{NAME}` escapes through `resolver`. Without
    /// one, named escapes are left unresolved in the literal.
    pub fn with_resolver(source: &'a str, resolver: &'a dyn NameResolver) -> Self {
        Parser {
            lexer: Lexer::with_resolver(source, resolver),
            lookahead: VecDeque::new(),
            depth: 0,
        }
    }

    /// Parse a whole file into the anonymous root module.
    pub fn parse_module(mut self) -> Result<Module> {
        let elements = self.module_elements(None)?;
        log::debug!("parsed {} top-level elements", elements.len());
        Ok(Module {
            name: None,
            elements,
        })
    }

    /// Parse a single rule spanning the whole input.
    pub fn parse_rule(mut self) -> Result<Rule> {
        let rule = self.rule()?;
        self.expect_eof()?;
        Ok(rule)
    }

    /// Parse a single expression spanning the whole input.
    pub fn parse_expr(mut self) -> Result<Expr> {
        let expr = self.expr()?;
        self.expect_eof()?;
        Ok(expr)
    }

    fn peek_nth(&mut self, n: usize) -> Result<Option<Token<'a>>> {
        while self.lookahead.len() <= n {
            match self.lexer.next_token()? {
                Some(tok) => self.lookahead.push_back(tok),
                None => return Ok(None),
            }
        }
        Ok(self.lookahead.get(n).cloned())
    }

    fn peek(&mut self) -> Result<Option<Token<'a>>> {
        self.peek_nth(0)
    }

    fn peek_kind(&mut self) -> Result<Option<TokenKind>> {
        Ok(self.peek()?.map(|tok| tok.kind))
    }

    /// Consume the token last returned by `peek`.
    fn bump(&mut self) -> Option<Token<'a>> {
        self.lookahead.pop_front()
    }

    fn nth_is(&mut self, n: usize, kind: &TokenKind) -> Result<bool> {
        Ok(matches!(self.peek_nth(n)?, Some(tok) if tok.kind == *kind))
    }

    /// Error pointing at the next token, or at the end of input.
    fn unexpected(&mut self, kind: ParseErrorKind, expected: Option<&'static str>) -> Error {
        match self.peek() {
            Ok(Some(tok)) => ParseError {
                kind,
                offset: tok.offset(),
                found: Some(tok.as_str().to_owned()),
                expected,
            }
            .into(),
            Ok(None) => ParseError {
                kind,
                offset: self.lexer.input().len(),
                found: None,
                expected,
            }
            .into(),
            Err(err) => err,
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        error: ParseErrorKind,
        expected: &'static str,
    ) -> Result<Token<'a>> {
        if self.nth_is(0, &kind)? {
            if let Some(tok) = self.bump() {
                return Ok(tok);
            }
        }
        Err(self.unexpected(error, Some(expected)))
    }

    fn expect_eof(&mut self) -> Result<()> {
        match self.peek()? {
            Some(_) => Err(self.unexpected(ParseErrorKind::UnexpectedToken, Some("end of input"))),
            None => Ok(()),
        }
    }

    /// True if the next token is `keyword` used as a keyword. A keyword
    /// directly followed by `=` is the name of a rule instead.
    fn at_keyword(&mut self, keyword: &str) -> Result<bool> {
        match self.peek()? {
            Some(tok) if tok.is_keyword(keyword) => Ok(!self.nth_is(1, &TokenKind::Equals)?),
            _ => Ok(false),
        }
    }

    fn module_elements(&mut self, open_brace: Option<usize>) -> Result<Vec<ModuleElement>> {
        let mut elements = Vec::new();
        loop {
            match (self.peek_kind()?, open_brace) {
                (None, None) => return Ok(elements),
                (None, Some(offset)) => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnterminatedModule,
                        offset,
                        found: None,
                        expected: Some("'}'"),
                    }
                    .into())
                }
                (Some(TokenKind::RBrace), Some(_)) => return Ok(elements),
                _ => elements.push(self.module_element()?),
            }
        }
    }

    fn module_element(&mut self) -> Result<ModuleElement> {
        if self.at_keyword(KEYWORD_MOD)? {
            Ok(ModuleElement::Module(self.module()?))
        } else {
            Ok(ModuleElement::Rule(self.rule()?))
        }
    }

    fn module(&mut self) -> Result<Module> {
        self.bump();
        let name = self.identifier("module name")?;
        let open = self.expect(TokenKind::LBrace, ParseErrorKind::UnexpectedToken, "'{'")?;
        log::trace!("[parse] module {} at {}", name, open.offset());

        let elements = self.module_elements(Some(open.offset()))?;
        self.bump();

        Ok(Module {
            name: Some(name),
            elements,
        })
    }

    fn rule(&mut self) -> Result<Rule> {
        let is_public = self.at_keyword(KEYWORD_PUB)?;
        if is_public {
            self.bump();
        }
        let is_token = self.at_keyword(KEYWORD_TOKEN)?;
        if is_token {
            self.bump();
        }

        let name = match self.peek()? {
            Some(tok) if tok.is_identifier() => {
                self.bump();
                Identifier::new_unchecked(tok.as_str())
            }
            _ => return Err(self.unexpected(ParseErrorKind::ExpectedElement, Some("rule or module"))),
        };
        log::trace!("[parse] rule {}", name);

        self.expect(TokenKind::Equals, ParseErrorKind::ExpectedEquals, "'='")?;
        let body = self.expr()?;

        Ok(Rule {
            name,
            is_public,
            is_token,
            body,
        })
    }

    fn identifier(&mut self, expected: &'static str) -> Result<Identifier> {
        match self.peek()? {
            Some(tok) if tok.is_identifier() => {
                self.bump();
                Ok(Identifier::new_unchecked(tok.as_str()))
            }
            _ => Err(self.unexpected(ParseErrorKind::UnexpectedToken, Some(expected))),
        }
    }

    /// Whether the next token can open a primary expression. An identifier
    /// followed by `=` opens the next rule and a keyword opens the next
    /// element, so neither continues the current expression.
    fn at_primary(&mut self) -> Result<bool> {
        let tok = match self.peek()? {
            Some(tok) => tok,
            None => return Ok(false),
        };
        match tok.kind {
            TokenKind::Literal(_) | TokenKind::LParen => Ok(true),
            TokenKind::Identifier => {
                Ok(!tok.is_any_keyword() && !self.nth_is(1, &TokenKind::Equals)?)
            }
            _ => Ok(false),
        }
    }

    fn peek_operator(&mut self) -> Result<Option<BinaryOp>> {
        if self.nth_is(0, &TokenKind::Pipe)? {
            Ok(Some(BinaryOp::Choice))
        } else if self.at_primary()? {
            Ok(Some(BinaryOp::Sequence))
        } else {
            Ok(None)
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        if !self.at_primary()? {
            return Err(self.unexpected(ParseErrorKind::EmptyExpression, Some("expression")));
        }
        self.expr_bp(0)
    }

    /// One primary alone comes back as is; juxtaposed primaries fold into a
    /// left-leaning `Sequence`.
    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.primary()?;

        while let Some(op) = self.peek_operator()? {
            let bp = op.binding_power();
            if bp < min_bp {
                break;
            }
            if op == BinaryOp::Choice {
                self.bump();
                if !self.at_primary()? {
                    return Err(self.unexpected(ParseErrorKind::DanglingChoice, Some("expression")));
                }
            }
            let rhs = self.expr_bp(bp + 1)?;
            lhs = op.build(lhs, rhs);
        }

        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Expr> {
        let label = match self.peek()? {
            Some(tok) if tok.is_identifier() && self.nth_is(1, &TokenKind::Colon)? => {
                self.bump();
                self.bump();
                Some(Identifier::new_unchecked(tok.as_str()))
            }
            _ => None,
        };

        let atom = self.atom()?;
        let expr = self.postfix(atom)?;

        Ok(match label {
            Some(label) => Expr::Labeled {
                label,
                expr: Box::new(expr),
            },
            None => expr,
        })
    }

    fn atom(&mut self) -> Result<Expr> {
        let tok = match self.peek()? {
            Some(tok) => tok,
            None => return Err(self.unexpected(ParseErrorKind::UnexpectedToken, Some(PRIMARY))),
        };

        match tok.kind {
            TokenKind::Literal(text) => {
                self.bump();
                Ok(Expr::Literal(text))
            }
            TokenKind::Identifier if !tok.is_any_keyword() => {
                self.bump();
                Ok(Expr::Reference(Identifier::new_unchecked(tok.as_str())))
            }
            TokenKind::LParen => {
                if self.depth == MAX_NESTING {
                    return Err(self.unexpected(ParseErrorKind::NestingTooDeep, None));
                }
                self.bump();
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                self.expect(TokenKind::RParen, ParseErrorKind::UnterminatedGroup, "')'")?;
                Ok(Expr::Nested(Box::new(inner)))
            }
            _ => Err(self.unexpected(ParseErrorKind::UnexpectedToken, Some(PRIMARY))),
        }
    }

    /// At most one modifier may follow an atom.
    fn postfix(&mut self, atom: Expr) -> Result<Expr> {
        let expr = match self.peek_kind()? {
            Some(TokenKind::Question) => {
                self.bump();
                Expr::Optional(Box::new(atom))
            }
            Some(TokenKind::Star) => {
                self.bump();
                Expr::Many(Box::new(atom))
            }
            Some(TokenKind::Plus) => {
                self.bump();
                Expr::Some(Box::new(atom))
            }
            Some(TokenKind::LBrace) => self.repeat(atom)?,
            _ => return Ok(atom),
        };

        if let Some(kind) = self.peek_kind()? {
            if is_postfix(&kind) {
                return Err(self.unexpected(ParseErrorKind::StackedModifier, None));
            }
        }

        Ok(expr)
    }

    /// `{N}`, `{N,}` or `{N,M}`.
    fn repeat(&mut self, expr: Expr) -> Result<Expr> {
        self.bump();

        let min = match self.peek_kind()? {
            Some(TokenKind::Integer(n)) => {
                self.bump();
                n
            }
            _ => return Err(self.unexpected(ParseErrorKind::MalformedRepeat, Some("integer"))),
        };

        let max = if self.nth_is(0, &TokenKind::Comma)? {
            self.bump();
            match self.peek_kind()? {
                Some(TokenKind::Integer(n)) => {
                    self.bump();
                    Some(n)
                }
                _ => None,
            }
        } else {
            Some(min)
        };

        self.expect(TokenKind::RBrace, ParseErrorKind::MalformedRepeat, "'}'")?;

        Ok(Expr::Repeat {
            expr: Box::new(expr),
            min,
            max,
        })
    }
}

fn is_postfix(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Question | TokenKind::Star | TokenKind::Plus | TokenKind::LBrace
    )
}
