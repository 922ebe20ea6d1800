//! Syntactic analysis.
//!
//! Declarations and statements are parsed by recursive descent,
//! expressions by precedence climbing. Every node type implements
//! [`Parse`]; nodes that are optional in their position parse to
//! `Option<Self>` and return `None` without consuming anything when
//! the next token can't start them.
mod class;
mod expr;
mod stmts;

pub use class::*;
pub use expr::*;
pub use stmts::*;

use crate::{
    error::JackResult,
    token_stream::TokenStream,
    tokens::{Keyword, SourceLine, Span, Token, TokenKind},
};
use smol_str::SmolStr;
use std::{error::Error, fmt};

pub trait Parse: Sized {
    type Output;

    fn parse(input: &mut TokenStream) -> JackResult<Self::Output>;
}

/// Identifier with its location in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: SmolStr,
    pub span: Span,
}

impl Ident {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    /// Starts with an uppercase letter, the convention for class names.
    #[inline]
    pub fn is_capitalized(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase())
    }
}

impl From<Token> for Ident {
    fn from(token: Token) -> Self {
        debug_assert_eq!(token.kind, TokenKind::Ident);
        Ident {
            name: token.literal,
            span: token.span,
        }
    }
}

impl Parse for Ident {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::Ident).map(Ident::from)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    Class(SmolStr),
}

impl Type {
    /// Parse the return type of a subroutine, where `void` is `None`.
    pub fn parse_return(input: &mut TokenStream) -> JackResult<Option<Type>> {
        if input.match_token(TokenKind::Keyword(Keyword::Void)) {
            Ok(None)
        } else {
            Type::parse(input).map(Some)
        }
    }
}

impl Parse for Type {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        use Keyword as K;

        let token = input.next_token()?;
        match token.kind {
            TokenKind::Keyword(K::Int) => Ok(Type::Int),
            TokenKind::Keyword(K::Char) => Ok(Type::Char),
            TokenKind::Keyword(K::Boolean) => Ok(Type::Boolean),
            TokenKind::Ident => Ok(Type::Class(token.literal)),
            kind => {
                let message = format!("expected type, found '{kind}'");
                Err(input.error(token, message))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Boolean => write!(f, "boolean"),
            Type::Class(name) => write!(f, "{name}"),
        }
    }
}

/// Parse a comma separated list of identifiers, terminated by a semicolon.
fn parse_names(input: &mut TokenStream) -> JackResult<Vec<Ident>> {
    let mut names = vec![Ident::parse(input)?];

    while input.match_token(TokenKind::Comma) {
        names.push(Ident::parse(input)?);
    }

    input.consume(TokenKind::Semicolon)?;

    Ok(names)
}

/// Token sequence does not follow the grammar.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    /// The unexpected token, if the error wasn't caused by the
    /// end of the stream.
    pub token: Option<Token>,
    pub line: Option<SourceLine>,
}

impl ParseError {
    pub fn new(source: &str, token: Option<Token>, message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            line: token.as_ref().map(|token| token.span.source_line(source)),
            token,
        }
    }
}

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.line {
            Some(line) => {
                writeln!(f, "syntax error on line {}: {}", line.number, self.message)?;
                write!(f, "{}", line)
            }
            None => write!(f, "syntax error: {}", self.message),
        }
    }
}
