//! Tokens

use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    /// Text of the token.
    ///
    /// For string literals this is the content between the quotes,
    /// with escaped delimiters resolved.
    pub literal: SmolStr,
}

impl Token {
    #[inline]
    pub fn is_eos(&self) -> bool {
        self.kind == TokenKind::EOS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    // Symbols
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Ampersand,    // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~

    // ------------------------------------------------------------------------
    // Complex
    Ident,
    /// Reserved identifiers
    Keyword(Keyword),
    /// Decimal integer literal in the range 0..=32767
    Integer,
    /// String literal
    String,

    // ------------------------------------------------------------------------
    // Special
    /// End-of-source
    EOS,
}

impl TokenKind {
    /// Map a single character to its symbol token kind.
    #[rustfmt::skip]
    pub fn symbol(c: char) -> Option<Self> {
        use TokenKind as T;
        match c {
            '{' => Some(T::LeftBrace),
            '}' => Some(T::RightBrace),
            '(' => Some(T::LeftParen),
            ')' => Some(T::RightParen),
            '[' => Some(T::LeftBracket),
            ']' => Some(T::RightBracket),
            '.' => Some(T::Dot),
            ',' => Some(T::Comma),
            ';' => Some(T::Semicolon),
            '+' => Some(T::Plus),
            '-' => Some(T::Minus),
            '*' => Some(T::Star),
            '/' => Some(T::Slash),
            '&' => Some(T::Ampersand),
            '|' => Some(T::Pipe),
            '<' => Some(T::Less),
            '>' => Some(T::Greater),
            '=' => Some(T::Eq),
            '~' => Some(T::Tilde),
            _   => None,
        }
    }

    #[inline]
    pub fn is_symbol(&self) -> bool {
        !matches!(
            self,
            TokenKind::Ident | TokenKind::Keyword(_) | TokenKind::Integer | TokenKind::String | TokenKind::EOS
        )
    }
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind as T;
        match self {
            T::LeftBrace    => write!(f, "{{"),
            T::RightBrace   => write!(f, "}}"),
            T::LeftParen    => write!(f, "("),
            T::RightParen   => write!(f, ")"),
            T::LeftBracket  => write!(f, "["),
            T::RightBracket => write!(f, "]"),
            T::Dot          => write!(f, "."),
            T::Comma        => write!(f, ","),
            T::Semicolon    => write!(f, ";"),
            T::Plus         => write!(f, "+"),
            T::Minus        => write!(f, "-"),
            T::Star         => write!(f, "*"),
            T::Slash        => write!(f, "/"),
            T::Ampersand    => write!(f, "&"),
            T::Pipe         => write!(f, "|"),
            T::Less         => write!(f, "<"),
            T::Greater      => write!(f, ">"),
            T::Eq           => write!(f, "="),
            T::Tilde        => write!(f, "~"),
            T::Ident        => write!(f, "identifier"),
            T::Keyword(k)   => write!(f, "{k}"),
            T::Integer      => write!(f, "integer literal"),
            T::String       => write!(f, "string literal"),
            T::EOS          => write!(f, "end of source"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,       // class
    Constructor, // constructor
    Function,    // function
    Method,      // method
    Field,       // field
    Static,      // static
    Var,         // var

    // ------------------------------------------------------------------------
    // Types
    Int,         // int
    Char,        // char
    Boolean,     // boolean
    Void,        // void

    // ------------------------------------------------------------------------
    // Constants
    True,        // true
    False,       // false
    Null,        // null
    This,        // this

    // ------------------------------------------------------------------------
    // Statements
    Let,         // let
    Do,          // do
    If,          // if
    Else,        // else
    While,       // while
    Return,      // return
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            // ----------------------------------------------------------------
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Class       => write!(f, "class"),
            Self::Constructor => write!(f, "constructor"),
            Self::Function    => write!(f, "function"),
            Self::Method      => write!(f, "method"),
            Self::Field       => write!(f, "field"),
            Self::Static      => write!(f, "static"),
            Self::Var         => write!(f, "var"),
            // ----------------------------------------------------------------
            Self::Int         => write!(f, "int"),
            Self::Char        => write!(f, "char"),
            Self::Boolean     => write!(f, "boolean"),
            Self::Void        => write!(f, "void"),
            // ----------------------------------------------------------------
            Self::True        => write!(f, "true"),
            Self::False       => write!(f, "false"),
            Self::Null        => write!(f, "null"),
            Self::This        => write!(f, "this"),
            // ----------------------------------------------------------------
            Self::Let         => write!(f, "let"),
            Self::Do          => write!(f, "do"),
            Self::If          => write!(f, "if"),
            Self::Else        => write!(f, "else"),
            Self::While       => write!(f, "while"),
            Self::Return      => write!(f, "return"),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// The line of source text that contains the start of the span,
    /// without its line terminator, and the span of that line.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> (&'a str, Span) {
        let index = usize::min(self.index as usize, text.len());

        let start = text[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = text[index..].find('\n').map(|i| index + i).unwrap_or(text.len());

        // Windows line endings
        let line = text[start..end].trim_end_matches('\r');

        let line_span = Span {
            index: start as u32,
            size: line.len() as u32,
        };

        (line, line_span)
    }

    /// One-based line number of the start of the span.
    pub fn line_number(&self, text: &str) -> usize {
        let index = usize::min(self.index as usize, text.len());
        text[..index].matches('\n').count() + 1
    }

    pub fn source_line(&self, text: &str) -> SourceLine {
        let (line, _) = self.surrounding_line(text);
        SourceLine {
            number: self.line_number(text),
            text: line.to_string(),
        }
    }
}

/// Line of source code attached to diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// One-based line number.
    pub number: usize,
    pub text: String,
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>4} | {}", self.number, self.text)
    }
}
