//! Character-level scanning shared by the `.bib` and `.aux` parsers.
//!
//! [`CharStream`] wraps the source text, tracks line/column positions and
//! hides carriage returns, so both grammars only ever see `\n` as a line
//! terminator. The lexical helpers on top of it (identifiers, braced and
//! quoted values, expectations) are the building blocks of the two
//! recursive-descent parsers.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Errors raised while parsing a database or a manifest.
///
/// Every variant carries the 1-based line and column where parsing stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected character '{found}' at line {line} col {column} (expected {expected})")]
    UnexpectedChar {
        found: char,
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("Unexpected end of input at line {line} col {column} (expected {expected})")]
    UnexpectedEof {
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("Duplicate field '{field}' in entry '{key}' at line {line} col {column}")]
    DuplicateField {
        key: String,
        field: String,
        line: usize,
        column: usize,
    },

    #[error("Duplicate bibkey '{key}' at line {line} col {column}")]
    DuplicateKey {
        key: String,
        line: usize,
        column: usize,
    },

    #[error("Unexpected tag '\\{tag}' at line {line} col {column}")]
    UnknownTag {
        tag: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// Line where the error was detected.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedChar { line, .. }
            | ParseError::UnexpectedEof { line, .. }
            | ParseError::DuplicateField { line, .. }
            | ParseError::DuplicateKey { line, .. }
            | ParseError::UnknownTag { line, .. } => *line,
        }
    }

    /// Column where the error was detected.
    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedChar { column, .. }
            | ParseError::UnexpectedEof { column, .. }
            | ParseError::DuplicateField { column, .. }
            | ParseError::DuplicateKey { column, .. }
            | ParseError::UnknownTag { column, .. } => *column,
        }
    }
}

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Cursor over source text with position tracking.
///
/// End of input is `None`, and stays `None` on every further call.
pub struct CharStream<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> CharStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Drops carriage returns sitting directly in front of the cursor.
    fn skip_carriage_returns(&mut self) {
        while self.chars.next_if_eq(&'\r').is_some() {}
    }

    /// Returns the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        self.skip_carriage_returns();
        self.chars.peek().copied()
    }

    /// Consumes and returns the next character.
    pub fn advance(&mut self) -> Option<char> {
        self.skip_carriage_returns();
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    // -----------------------------------------------------------------------
    // Lexical helpers
    // -----------------------------------------------------------------------

    /// Skips spaces, tabs and line feeds.
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n')) {
            self.advance();
        }
    }

    /// Consumes everything up to and including the next line feed.
    pub fn skip_line(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                return;
            }
        }
    }

    /// Builds an error for the character under the cursor.
    pub fn unexpected(&mut self, expected: &str) -> ParseError {
        let Position { line, column } = self.position();
        match self.peek() {
            Some(found) => ParseError::UnexpectedChar {
                found,
                expected: expected.to_string(),
                line,
                column,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                line,
                column,
            },
        }
    }

    /// Consumes `expected`, or fails without consuming anything.
    pub fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    /// Reads a run of characters accepted by `accept`.
    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            out.push(ch);
            self.advance();
        }
        out
    }

    /// Reads an identifier: letters, digits, `_`, `-` and `+`.
    pub fn read_identifier(&mut self) -> String {
        self.read_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+'))
    }

    /// Reads a citation key: letters, digits, `_`, `-`, `+`, `:` and `.`.
    pub fn read_bibkey(&mut self) -> String {
        self.read_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | ':' | '.'))
    }

    /// Reads up to (not including) `end`, or to the end of input.
    pub fn read_until(&mut self, end: char) -> String {
        self.read_while(|c| c != end)
    }

    /// Reads a `{...}` value, keeping nested braces verbatim.
    ///
    /// The outermost pair of braces is not part of the returned value.
    pub fn read_braced(&mut self) -> Result<String, ParseError> {
        self.expect('{')?;
        let mut depth = 1usize;
        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.unexpected("'}'"));
            };
            self.advance();
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                }
                _ => {}
            }
            value.push(ch);
        }
    }

    /// Reads a `"..."` value verbatim. Escapes and nested quotes are not supported.
    pub fn read_quoted(&mut self) -> Result<String, ParseError> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(value);
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
                None => return Err(self.unexpected("'\"'")),
            }
        }
    }
}
