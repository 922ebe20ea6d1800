//! Result and errors.
use crate::{
    compile::CodeGenError,
    lex::LexError,
    parsing::ParseError,
    tokens::{SourceLine, Token},
};
use std::{
    fmt::{self, Display, Formatter},
    io, string,
};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Source text could not be tokenized.
    Lex(LexError),
    /// Token sequence does not follow the grammar.
    Parse(ParseError),
    /// Syntax tree could not be lowered to VM code.
    CodeGen(CodeGenError),
    Io(io::Error),
    Utf8(string::FromUtf8Error),
}

impl JackError {
    /// Line of source code the error refers to, if any.
    pub fn source_line(&self) -> Option<&SourceLine> {
        match self {
            Self::Lex(err) => Some(&err.line),
            Self::Parse(err) => err.line.as_ref(),
            Self::CodeGen(err) => err.line.as_ref(),
            Self::Io(_) | Self::Utf8(_) => None,
        }
    }

    /// The offending token of a syntax error.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Parse(err) => err.token.as_ref(),
            _ => None,
        }
    }
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{}", err),
            Self::Parse(err) => write!(f, "{}", err),
            Self::CodeGen(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {}", err),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lex(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::CodeGen(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
        }
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<ParseError> for JackError {
    fn from(err: ParseError) -> Self {
        JackError::Parse(err)
    }
}

impl From<CodeGenError> for JackError {
    fn from(err: CodeGenError) -> Self {
        JackError::CodeGen(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<string::FromUtf8Error> for JackError {
    fn from(err: string::FromUtf8Error) -> Self {
        JackError::Utf8(err)
    }
}
