//! Front end for Mage, a small language for describing the lexical and
//! syntactic rules of another language.
//!
//! [`parse`] turns Mage source into a tree of [`Module`]s, [`Rule`]s and
//! [`Expr`]essions. Every AST type prints back as Mage source through
//! `Display` and can be read with `FromStr`.
//!
//! ```text
//! pub token ident = "_"? letter (letter | digit)*
//! mod expr {
//!     pub sum = lhs:term "+" rhs:term | term
//! }
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;

pub mod error;
pub mod escape;
pub mod lexer;
pub mod parser;
mod position;
pub mod span;
pub mod tokens;
mod visit;

pub use error::{Error, InvalidIdentifier, Result};
pub use escape::{LiteralText, NameResolver};
pub use lexer::{tokenize, Lexer};
pub use parser::Parser;
pub use tokens::{Token, TokenKind};

/// Parse a whole Mage file into its anonymous root module.
pub fn parse(source: &str) -> Result<Module> {
    Parser::new(source).parse_module()
}

/// Like [`parse`], resolving `\N{NAME}` escapes through `resolver`.
pub fn parse_with_resolver(source: &str, resolver: &dyn NameResolver) -> Result<Module> {
    Parser::with_resolver(source, resolver).parse_module()
}

/// Parse a lone expression that must span the whole input.
pub fn parse_expr(source: &str) -> Result<Expr> {
    Parser::new(source).parse_expr()
}

/// A rule, module or label name: `[a-zA-Z_][a-zA-Z0-9_]*`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(s: &str) -> Result<Self, InvalidIdentifier> {
        match lexer::identifier(s) {
            Ok(("", _)) => Ok(Self(s.to_owned())),
            _ => Err(InvalidIdentifier(s.to_owned())),
        }
    }

    /// For text the lexer already recognised as an identifier.
    pub(crate) fn new_unchecked(s: &str) -> Self {
        Self(s.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identifier {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The body of a rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    /// Literal text, escapes decoded.
    Literal(LiteralText),
    Reference(Identifier),
    /// `e?`
    Optional(Box<Expr>),
    /// `e*`
    Many(Box<Expr>),
    /// `e+`
    Some(Box<Expr>),
    /// `e{min}`, `e{min,}` or `e{min,max}`. `max` is `None` when unbounded.
    Repeat {
        expr: Box<Expr>,
        min: u64,
        max: Option<u64>,
    },
    /// `(e)`
    Nested(Box<Expr>),
    /// `label:e`
    Labeled { label: Identifier, expr: Box<Expr> },
    /// `a b`
    Sequence(Box<Expr>, Box<Expr>),
    /// `a | b`
    Choice(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn literal(text: &str) -> Self {
        Expr::Literal(LiteralText::from(text))
    }

    pub fn reference(name: Identifier) -> Self {
        Expr::Reference(name)
    }

    pub fn sequence(lhs: Expr, rhs: Expr) -> Self {
        Expr::Sequence(Box::new(lhs), Box::new(rhs))
    }

    pub fn choice(lhs: Expr, rhs: Expr) -> Self {
        Expr::Choice(Box::new(lhs), Box::new(rhs))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(text) => write!(f, "{}", text),
            Expr::Reference(name) => write!(f, "{}", name),
            Expr::Optional(expr) => write!(f, "{}?", expr),
            Expr::Many(expr) => write!(f, "{}*", expr),
            Expr::Some(expr) => write!(f, "{}+", expr),
            Expr::Repeat { expr, min, max } => match max {
                Some(max) if max == min => write!(f, "{}{{{}}}", expr, min),
                Some(max) => write!(f, "{}{{{},{}}}", expr, min, max),
                None => write!(f, "{}{{{},}}", expr, min),
            },
            Expr::Nested(expr) => write!(f, "({})", expr),
            Expr::Labeled { label, expr } => write!(f, "{}:{}", label, expr),
            Expr::Sequence(..) => write_joined(f, &self.flatten_sequence(), " "),
            Expr::Choice(..) => write_joined(f, &self.flatten_choice(), " | "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter, exprs: &[&Expr], sep: &str) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expr(s)
    }
}

/// A named production.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Rule {
    pub name: Identifier,
    pub is_public: bool,
    /// Lexical rule, as opposed to a syntactic one.
    pub is_token: bool,
    pub body: Expr,
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_public {
            write!(f, "{} ", tokens::KEYWORD_PUB)?;
        }
        if self.is_token {
            write!(f, "{} ", tokens::KEYWORD_TOKEN)?;
        }
        write!(f, "{} = {}", self.name, self.body)
    }
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse_rule()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ModuleElement {
    Rule(Rule),
    Module(Module),
}

impl Display for ModuleElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModuleElement::Rule(rule) => writeln!(f, "{}", rule),
            ModuleElement::Module(module) => write!(f, "{}", module),
        }
    }
}

/// A set of rules and nested modules, in source order. The root module of a
/// file has no name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Module {
    pub name: Option<Identifier>,
    pub elements: Vec<ModuleElement>,
}

impl Module {
    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let (inner, pad) = match &self.name {
            Some(name) => {
                let pad = "    ".repeat(depth);
                writeln!(f, "{}{} {} {{", pad, tokens::KEYWORD_MOD, name)?;
                (depth + 1, Some(pad))
            }
            None => (depth, None),
        };

        for element in &self.elements {
            match element {
                ModuleElement::Rule(rule) => writeln!(f, "{}{}", "    ".repeat(inner), rule)?,
                ModuleElement::Module(module) => module.fmt_indented(f, inner)?,
            }
        }

        if let Some(pad) = pad {
            writeln!(f, "{}}}", pad)?;
        }
        Ok(())
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl FromStr for Module {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
