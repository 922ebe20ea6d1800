//! Lexical analysis
use crate::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{Keyword, SourceLine, Span, Token, TokenKind},
};
use smol_str::SmolStr;
use std::{error, fmt};

/// Largest value an integer literal may have.
pub const MAX_INTEGER: u16 = 32767;

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Prime the cursor so it points to the first character.
        cursor.next();

        let start_pos = cursor.offset();

        Self {
            cursor,
            original: source_code,
            start_pos,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Each call starts with the cursor pointing at the start of the
    /// remaining source, and must leave it at the character following
    /// the token it built. Once the source is exhausted every call
    /// returns an [`TokenKind::EOS`] token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as TK;

        self.erase_trivia()?;

        self.start_token();

        match self.cursor.current() {
            '"' => self.consume_string(),
            '0'..='9' => self.consume_number(),
            '_' | 'a'..='z' | 'A'..='Z' => Ok(self.consume_ident()),
            EOF_CHAR if self.cursor.at_end() => Ok(self.make_token(TK::EOS)),
            c => match TokenKind::symbol(c) {
                Some(kind) => Ok(self.make_token(kind)),
                None => Err(self.error(LexErrorKind::UnknownCharacter(c))),
            },
        }
    }

    /// Create a span using the starting position of the current token,
    /// and the offset of the character after the cursor.
    fn make_span(&mut self) -> Span {
        let start = self.start_pos;
        let end = self.cursor.peek_offset();

        // start and end can be equal, and a token can have 0 size.
        debug_assert!(end >= start);
        let size = end - start;

        Span { index: start, size }
    }

    fn fragment(&mut self) -> &'a str {
        let original = self.original;
        self.make_span().fragment(original)
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
    }

    fn make_token(&mut self, kind: TokenKind) -> Token {
        let literal = SmolStr::from(self.fragment());
        self.make_token_with(kind, literal)
    }

    /// Build a token from the position stored by `start_token` up to
    /// and including the current character, then step past it.
    fn make_token_with(&mut self, kind: TokenKind, literal: SmolStr) -> Token {
        let token = Token {
            span: self.make_span(),
            kind,
            literal,
        };

        self.cursor.next();
        debug_assert!(self.cursor.at_end() || self.cursor.offset() == token.span.end());

        token
    }

    #[cold]
    #[inline(never)]
    fn error(&mut self, kind: LexErrorKind) -> LexError {
        let span = self.make_span();
        LexError {
            kind,
            line: span.source_line(self.original),
            span,
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Skip whitespace and comments up to the start of the next token.
    fn erase_trivia(&mut self) -> Result<(), LexError> {
        loop {
            while is_whitespace(self.cursor.current()) {
                self.cursor.next();
            }

            match (self.cursor.current(), self.cursor.peek()) {
                ('/', '/') => self.erase_line_comment(),
                ('/', '*') => self.erase_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        while !is_newline(self.cursor.current()) && !self.cursor.at_end() {
            self.cursor.next();
        }
    }

    /// Erase a `/* ... */` comment, which includes doc comments `/** ... */`.
    fn erase_block_comment(&mut self) -> Result<(), LexError> {
        debug_assert_eq!(self.cursor.current(), '/');

        self.start_token();

        // Opening delimiter
        self.cursor.next();
        self.cursor.next();

        loop {
            if self.cursor.at_end() {
                return Err(self.error(LexErrorKind::UnterminatedComment));
            }

            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return Ok(());
            }

            self.cursor.next();
        }
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        debug_assert!(is_letter(self.cursor.current()));

        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let token_kind = match Keyword::parse(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind)
    }

    /// Make a decimal integer literal token.
    fn consume_number(&mut self) -> Result<Token, LexError> {
        debug_assert!(is_digit(self.cursor.current()));

        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        // Digits running straight into an identifier, like `12ab`.
        if is_letter(self.cursor.peek()) {
            while is_letter_or_digit(self.cursor.peek()) {
                self.cursor.next();
            }
            return Err(self.error(LexErrorKind::MalformedInteger));
        }

        let fragment = self.fragment();

        if fragment.len() > 1 && fragment.starts_with('0') {
            return Err(self.error(LexErrorKind::LeadingZero));
        }

        // Fragments too long for u32 are out of range anyway.
        match fragment.parse::<u32>() {
            Ok(value) if value <= MAX_INTEGER as u32 => Ok(self.make_token(TokenKind::Integer)),
            _ => Err(self.error(LexErrorKind::IntegerOverflow)),
        }
    }

    /// Make a string literal token.
    ///
    /// The literal holds the unescaped content without the quotes.
    fn consume_string(&mut self) -> Result<Token, LexError> {
        debug_assert_eq!(self.cursor.current(), '"');

        let mut content = String::new();

        loop {
            match self.cursor.next() {
                '"' => break,
                '\\' => {
                    if self.cursor.peek() == '"' {
                        self.cursor.next();
                        content.push('"');
                    } else {
                        content.push('\\');
                    }
                }
                c if is_newline(c) => return Err(self.error(LexErrorKind::UnterminatedString)),
                EOF_CHAR if self.cursor.at_end() => return Err(self.error(LexErrorKind::UnterminatedString)),
                c => content.push(c),
            }
        }

        Ok(self.make_token_with(TokenKind::String, SmolStr::from(content)))
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0020}' // space
            | '\u{0009}' // tab
            | '\u{000A}' // line feed
            | '\u{000D}' // carriage return
    )
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Ends after yielding the end-of-source token, or the first error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token();
        self.done = match &result {
            Ok(token) => token.is_eos(),
            Err(_) => true,
        };
        Some(result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    pub line: SourceLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Integer literal larger than [`MAX_INTEGER`].
    IntegerOverflow,
    /// Integer literal of more than one digit that starts with `0`.
    LeadingZero,
    /// Digits immediately followed by identifier characters.
    MalformedInteger,
    UnterminatedString,
    UnterminatedComment,
    UnknownCharacter(char),
}

impl error::Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "lexical error on line {}: {}", self.line.number, self.kind)?;
        write!(f, "{}", self.line)
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use LexErrorKind as K;
        match self {
            K::IntegerOverflow => write!(f, "integer literal exceeds {MAX_INTEGER}"),
            K::LeadingZero => write!(f, "integer literal has a leading zero"),
            K::MalformedInteger => write!(f, "malformed integer literal"),
            K::UnterminatedString => write!(f, "unterminated string literal"),
            K::UnterminatedComment => write!(f, "unterminated block comment"),
            K::UnknownCharacter(c) => write!(f, "unknown character {c:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.unwrap().kind)
            .collect()
    }

    fn lex_error(source: &str) -> LexErrorKind {
        Lexer::new(source)
            .into_iter()
            .find_map(Result::err)
            .expect("expected lexical error")
            .kind
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::EOS]);
        assert_eq!(kinds("  \n\t "), vec![TokenKind::EOS]);
    }

    #[test]
    fn test_eos_repeats() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOS);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOS);
    }

    #[test]
    fn test_token_spans() {
        const CODE: &str = "let x = 42;";
        let tokens: Vec<Token> = Lexer::new(CODE).into_iter().map(Result::unwrap).collect();

        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 1));
        assert_eq!(tokens[3].span, Span::new(8, 2));
        assert_eq!(tokens[3].literal, "42");
        assert_eq!(tokens[5].span, Span::new(11, 0));
    }

    #[test]
    fn test_comments() {
        use TokenKind as T;
        assert_eq!(
            kinds("a // line\n/* block\n */ b /** doc */ c //"),
            vec![T::Ident, T::Ident, T::Ident, T::EOS]
        );
        assert_eq!(kinds("a/b"), vec![T::Ident, T::Slash, T::Ident, T::EOS]);
        assert_eq!(kinds("/*/ x */"), vec![T::EOS]);
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(lex_error("32768"), LexErrorKind::IntegerOverflow);
        assert_eq!(lex_error("99999999999"), LexErrorKind::IntegerOverflow);
        assert_eq!(lex_error("007"), LexErrorKind::LeadingZero);
        assert_eq!(lex_error("12ab"), LexErrorKind::MalformedInteger);
        assert_eq!(kinds("0"), vec![TokenKind::Integer, TokenKind::EOS]);
        assert_eq!(kinds("32767"), vec![TokenKind::Integer, TokenKind::EOS]);
    }

    #[test]
    fn test_string_escapes() {
        let token = Lexer::new(r#""say \"hi\" \n""#).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.literal, r#"say "hi" \n"#);
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_error("\"abc"), LexErrorKind::UnterminatedString);
        assert_eq!(lex_error("\"abc\ndef\""), LexErrorKind::UnterminatedString);
        assert_eq!(lex_error("/* never closed"), LexErrorKind::UnterminatedComment);
        assert_eq!(lex_error("a # b"), LexErrorKind::UnknownCharacter('#'));
    }

    #[test]
    fn test_only_ascii_whitespace() {
        assert_eq!(kinds(" \t\r\nx"), vec![TokenKind::Ident, TokenKind::EOS]);
        assert_eq!(lex_error("a\u{00A0}b"), LexErrorKind::UnknownCharacter('\u{00A0}'));
        assert_eq!(lex_error("\u{FEFF}class"), LexErrorKind::UnknownCharacter('\u{FEFF}'));
    }

    #[test]
    fn test_error_location() {
        let err = Lexer::new("class A {\n  let x = 40000;\n}")
            .into_iter()
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.line.number, 2);
        assert_eq!(err.line.text, "  let x = 40000;");
        assert_eq!(err.span, Span::new(20, 5));
    }
}
