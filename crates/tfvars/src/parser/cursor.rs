//! scanner primitives and trivia skipping
use super::{ErrorKind, ParseError, Position};

/// Maximum number of arrays/objects open at the same time
pub(crate) const MAX_NESTING: usize = 128;

/// Read position within a borrowed input text
///
/// The cursor only ever moves forward. Lookahead is limited to what [Cursor::peek] and
/// [Cursor::starts_with] expose, there is no backtracking.
#[derive(derive_new::new, Debug, Clone)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    /// byte offset into `text`, always on a char boundary
    #[new(default)]
    offset: usize,
    /// arrays/objects currently open
    #[new(default)]
    nesting: usize,
}

impl<'a> Cursor<'a> {
    pub fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.text[start..self.offset]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }

    pub fn starts_with(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    /// Consumes `literal` if the input continues with it
    pub fn eat(&mut self, literal: &str) -> bool {
        if self.starts_with(literal) {
            self.offset += literal.len();
            return true;
        }

        false
    }

    /// Consumes `n` bytes, `n` must end on a char boundary
    pub fn advance_bytes(&mut self, n: usize) {
        self.offset += n;
    }

    /// Advances while `predicate` holds, returns the consumed text
    pub fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.offset += ch.len_utf8();
        }
        self.slice_from(start)
    }

    /// Returns the rest of the current line (without terminator) and moves past the `\n`
    pub fn take_line(&mut self) -> &'a str {
        let line = self.take_while(|ch| ch != '\n');
        self.eat("\n");
        line
    }

    /// 1-based line and column of the current offset
    pub fn position(&self) -> Position {
        let consumed = &self.text[..self.offset];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |index| index + 1);
        let column = consumed[line_start..].chars().count() + 1;
        Position::new(line, column)
    }

    /// Runs `parse` one array/object level deeper, failing beyond [MAX_NESTING]
    pub fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(ErrorKind::NestingTooDeep));
        }

        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    pub fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::Syntax {
            kind,
            position: self.position(),
        }
    }

    /// Skips whitespace, line comments (`#`, `//`) and nested block comments (`/* */`)
    pub fn skip_trivia(&mut self) -> Result<(), ParseError> {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => {
                    self.take_line();
                }
                '/' if self.starts_with("//") => {
                    self.take_line();
                }
                '/' if self.starts_with("/*") => self.skip_block_comment()?,
                _ => break,
            }
        }

        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.clone();
        let mut depth = 0usize;

        loop {
            if self.eat("/*") {
                depth += 1;
            } else if self.eat("*/") {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else if self.advance().is_none() {
                return Err(start.error(ErrorKind::UnterminatedBlockComment));
            }
        }
    }
}
