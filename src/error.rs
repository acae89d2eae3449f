use crate::location::Span;
use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use std::fmt::Display;
use thiserror::Error;

/// The three diagnostic families a contract can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unscannable input: stray characters, unterminated strings, bad numbers.
    InvalidCharacter,
    /// Grammar violations, dangling annotations, malformed annotation calls.
    Syntax,
    /// Unresolved or re-declared symbols, generic misuse, illegal annotations.
    Type,
}

impl ErrorKind {
    /// Stable, caller-facing name of the error kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::InvalidCharacter => "InvalidCharacterError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
        }
    }

    fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidCharacter => "contract::invalid_character",
            ErrorKind::Syntax => "contract::syntax",
            ErrorKind::Type => "contract::type",
        }
    }

    fn help(self) -> &'static str {
        match self {
            ErrorKind::InvalidCharacter => {
                "The lexer could not turn this text into a token."
            }
            ErrorKind::Syntax => "The parser found something it did not expect in this position.",
            ErrorKind::Type => {
                "The contract is well formed but refers to types or annotations incorrectly."
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The single error produced by any stage of the pipeline.
///
/// Stages create errors from a message and a [`Span`]; the source text is
/// attached afterwards with [`ContractError::with_source`] so that miette can
/// render a labelled snippet.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ContractError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    src: Option<NamedSource<String>>,
}

impl ContractError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            src: None,
        }
    }

    pub fn invalid_character(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::InvalidCharacter, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    /// Attaches the text the span points into.
    #[must_use]
    pub fn with_source(mut self, source_text: &str) -> Self {
        self.src = Some(NamedSource::new(
            self.span.file.to_string(),
            source_text.to_string(),
        ));
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn has_source(&self) -> bool {
        self.src.is_some()
    }
}

impl Diagnostic for ContractError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.help()))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.src.as_ref().map(|src| src as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        // Without source text miette cannot resolve the offsets.
        self.src.as_ref()?;
        Some(Box::new(std::iter::once(LabeledSpan::at(
            (self.span.start.offset, self.span.label_len()),
            self.kind.name(),
        ))))
    }
}
