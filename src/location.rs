use std::fmt::{self, Display};
use std::sync::Arc;

/// A point in the source text.
///
/// `line` and `column` are 1-based and follow the scanner's counting rules;
/// `offset` is the byte offset of the rune the position points at (the input
/// length once the scanner has run off the end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Position {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A range of source text in a named file. Shared by tokens, AST nodes and
/// diagnostics. The end position is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub file: Arc<str>,
}

impl Span {
    pub fn new(start: Position, end: Position, file: Arc<str>) -> Span {
        Span { start, end, file }
    }

    /// A zero-width span at `pos`.
    pub fn point(pos: Position, file: Arc<str>) -> Span {
        Span::new(pos, pos, file)
    }

    /// Joins `self` with a later span, keeping this span's start and file.
    #[must_use]
    pub fn to(&self, end: &Span) -> Span {
        Span::new(self.start, end.end, self.file.clone())
    }

    /// Byte range into the source, for slicing and miette labels.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start.offset..self.end.offset.max(self.start.offset)
    }

    /// Byte length of the span, never less than one so labels stay visible.
    pub fn label_len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset).max(1)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} in {}", self.start, self.end, self.file)
    }
}
