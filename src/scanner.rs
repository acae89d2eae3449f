use crate::location::{Position, Span};
use std::str::CharIndices;
use std::sync::Arc;

/// A rune cursor over source text that keeps track of line and column.
///
/// The cursor starts *before* the first rune; call [`Scanner::advance`] once
/// to load it. Column counting is driven by the rune being left behind:
///
/// * leaving a `\n` moves to the next line, column 1;
/// * leaving a `\r` does not move the column, so a `\r\n` pair advances the
///   column once;
/// * leaving any other rune moves one column right.
pub struct Scanner<'a> {
    input: &'a str,
    chars: CharIndices<'a>,
    file: Arc<str>,
    current: char,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    /// Sentinel returned once the input is exhausted.
    pub const EOF: char = '\0';

    pub fn new(input: &'a str, file: impl Into<Arc<str>>) -> Self {
        Self {
            input,
            chars: input.char_indices(),
            file: file.into(),
            current: Self::EOF,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Moves to the next rune and returns it, or [`Scanner::EOF`] at the end.
    pub fn advance(&mut self) -> char {
        if self.current == '\n' {
            self.line += 1;
            self.column = 1;
        } else if self.current != Self::EOF && self.current != '\r' {
            self.column += 1;
        }

        match self.chars.next() {
            Some((offset, c)) => {
                self.offset = offset;
                self.current = c;
            }
            None => {
                self.offset = self.input.len();
                self.current = Self::EOF;
            }
        }
        self.current
    }

    pub fn current(&self) -> char {
        self.current
    }

    pub fn is_eof(&self) -> bool {
        self.current == Self::EOF
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// A zero-width span at the current rune, used for lexical errors and EOF.
    pub fn location(&self) -> Span {
        Span::point(self.position(), self.file.clone())
    }

    /// Source text between two byte offsets previously read from this scanner.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    pub fn create_marker(&self) -> PositionMarker {
        PositionMarker {
            start: self.position(),
            end: self.position(),
            file: self.file.clone(),
        }
    }
}

/// Records two scanner positions and turns them into a [`Span`].
#[derive(Debug, Clone)]
pub struct PositionMarker {
    start: Position,
    end: Position,
    file: Arc<str>,
}

impl PositionMarker {
    pub fn mark_start(&mut self, scanner: &Scanner<'_>) {
        self.start = scanner.position();
    }

    pub fn mark_end(&mut self, scanner: &Scanner<'_>) {
        self.end = scanner.position();
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end, self.file.clone())
    }
}
