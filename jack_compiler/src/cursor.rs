//! Character scanner.
use itertools::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Placeholder character returned once the cursor runs past the source.
pub const EOF_CHAR: char = '\0';

/// Forward-only cursor over the characters of the source code.
///
/// The cursor always points to a current character, which starts as a
/// non-existent [`EOF_CHAR`] until the first call to [`Cursor::next`].
pub struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` buffers characters internally, because UTF-8
    /// characters are variable in width and can't be indexed directly.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte position and value of the current character.
    current: (u32, char),
    size: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: multipeek(text.char_indices()),
            current: (0, EOF_CHAR),
            size: text.len() as u32,
        }
    }

    /// Byte position of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0
    }

    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    /// Character after the current one, without advancing.
    pub fn peek(&mut self) -> char {
        self.chars.reset_peek();
        let c = self.chars.peek().map(|(_, c)| *c).unwrap_or(EOF_CHAR);
        self.chars.reset_peek();
        c
    }

    /// Byte position of the character after the current one.
    pub fn peek_offset(&mut self) -> u32 {
        self.chars.reset_peek();
        let offset = self.chars.peek().map(|(i, _)| *i as u32).unwrap_or(self.size);
        self.chars.reset_peek();
        offset
    }

    /// Advance the cursor and return the new current character.
    pub fn next(&mut self) -> char {
        match self.chars.next() {
            Some((index, c)) => self.current = (index as u32, c),
            None => self.current = (self.size, EOF_CHAR),
        }
        self.current.1
    }

    /// Source can contain '\0' characters without being at the end,
    /// so [`EOF_CHAR`] must be confirmed with this.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.size
    }
}
