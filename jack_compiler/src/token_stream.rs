//! Peekable token stream.
use crate::{
    error::{JackError, JackResult},
    lex::{Lexer, LexerIter},
    parsing::ParseError,
    tokens::{Token, TokenKind},
};
use std::iter::Peekable;

/// Buffered stream of tokens with one token of look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer. A lexical error surfaces as
/// [`JackError::Lex`] from whichever call first encounters it.
pub struct TokenStream<'a> {
    lexer: Peekable<LexerIter<'a>>,
    /// Keep reference to the source so the parser can
    /// build diagnostics from it.
    original: &'a str,
    /// A copy of the previous token.
    /// This can be used to build errors that refer
    /// to the end of the previous token's span.
    prev: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: lexer.into_iter().peekable(),
            prev: None,
        }
    }

    pub fn previous_token(&self) -> Option<&Token> {
        self.prev.as_ref()
    }

    /// Consumes the current token regardless of kind.
    pub fn next_token(&mut self) -> JackResult<Token> {
        match self.lexer.next() {
            Some(Ok(token)) => {
                self.prev = Some(token.clone());
                Ok(token)
            }
            Some(Err(err)) => Err(JackError::Lex(err)),
            None => Err(end_of_source(self.original, self.prev.as_ref())),
        }
    }

    /// Return the current token without advancing the cursor.
    pub fn peek(&mut self) -> JackResult<&Token> {
        match self.lexer.peek() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(JackError::Lex(err.clone())),
            None => Err(end_of_source(self.original, self.prev.as_ref())),
        }
    }

    /// Kind of the current token, or `None` when the stream is
    /// exhausted or failed to lex.
    #[inline]
    pub fn peek_kind(&mut self) -> Option<TokenKind> {
        match self.lexer.peek() {
            Some(Ok(token)) => Some(token.kind),
            _ => None,
        }
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Returns false when token kinds
    /// do not match, or the token stream is at the end.
    ///
    /// Does not consume the token if the types do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        if self.peek_kind() == Some(token_kind) {
            let _ = self.next_token(); // discard
            true
        } else {
            false
        }
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise
    /// a parsing error is returned. The cursor is not advanced if
    /// the token kind does not match.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        let token = self.peek()?;

        if token.kind != token_kind {
            let token = token.clone();
            let message = format!("expected '{}', found '{}'", token_kind, token.kind);
            Err(self.error(token, message))
        } else {
            self.next_token()
        }
    }

    /// Build a parse error pointing at the given token.
    #[cold]
    #[inline(never)]
    pub fn error(&self, token: Token, message: impl ToString) -> JackError {
        ParseError::new(self.original, Some(token), message).into()
    }
}

/// Error for reading past the end-of-source token, located
/// at the last token that was consumed.
#[cold]
fn end_of_source(source: &str, prev: Option<&Token>) -> JackError {
    let mut err = ParseError::new(source, None, "unexpected end of source");
    err.line = prev.map(|token| token.span.source_line(source));
    err.into()
}
