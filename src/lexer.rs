use crate::error::ContractError;
use crate::location::Span;
use crate::scanner::{PositionMarker, Scanner};

/// Reserved words. Only `model` is used by the grammar today.
pub const KEYWORDS: &[&str] = &["model", "rest", "event"];

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenType {
    // == Literals ==
    /// A number made of digits with at most one decimal point: `42`, `3.14`.
    Number,
    /// A string literal delimited by `"` or a backtick. The token literal
    /// holds the content without delimiters.
    String,
    /// A boolean literal. The lexer never produces it (`true` lexes as an
    /// identifier) but the literal grammar accepts it.
    Bool,
    /// A null literal, accepted by the literal grammar like [`TokenType::Bool`].
    Null,
    /// A name: `User`, `email`, `_id`.
    Identifier,
    /// One of [`KEYWORDS`].
    Keyword,
    /// An operator such as `<`, `>`, `==` or `&&`.
    Operator,

    // == Punctuation ==
    /// Comma: `,`
    Comma,
    /// Colon: `:`
    Colon,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Annotation marker: `@`
    At,

    // == Layout ==
    /// A line feed. Newlines are significant to the grammar.
    Newline,
    /// Represents the end of the input file.
    Eof,
}

/// A token with its type, literal text and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ttype: TokenType,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(ttype: TokenType, literal: impl Into<String>, span: Span) -> Token {
        Token {
            ttype,
            literal: literal.into(),
            span,
        }
    }

    pub fn has_type(&self, ttype: TokenType) -> bool {
        self.ttype == ttype
    }

    /// True when both the type and the literal text match.
    pub fn matches(&self, ttype: TokenType, literal: &str) -> bool {
        self.ttype == ttype && self.literal == literal
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

fn invalid_character(scanner: &Scanner<'_>) -> ContractError {
    ContractError::invalid_character(
        format!("Invalid character: {:?}", scanner.current()),
        scanner.location(),
    )
}

pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    /// Reused for every token: marked at the first rune, then past the last.
    marker: PositionMarker,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::new_with_name(input, "source.contract")
    }

    pub fn new_with_name(input: &'a str, name: &str) -> Self {
        let scanner = Scanner::new(input, name);
        let marker = scanner.create_marker();
        Self { scanner, marker }
    }

    /// Turns the whole input into tokens, ending with [`TokenType::Eof`].
    pub fn lex(&mut self) -> Result<Vec<Token>, ContractError> {
        let mut tokens = Vec::new();
        self.scanner.advance();

        while !self.scanner.is_eof() {
            let token = match self.scanner.current() {
                '\t' | '\r' | ' ' => {
                    self.scanner.advance();
                    continue;
                }
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '\n' => self.read_simple(TokenType::Newline),
                '(' => self.read_simple(TokenType::LParen),
                ')' => self.read_simple(TokenType::RParen),
                '{' => self.read_simple(TokenType::LBrace),
                '}' => self.read_simple(TokenType::RBrace),
                '[' => self.read_simple(TokenType::LBracket),
                ']' => self.read_simple(TokenType::RBracket),
                ':' => self.read_simple(TokenType::Colon),
                ',' => self.read_simple(TokenType::Comma),
                '@' => self.read_simple(TokenType::At),
                '+' | '-' | '*' | '/' | '%' | '^' | '=' | '!' | '<' | '>' | '&' | '|' => {
                    self.read_operator()
                }
                c if c.is_ascii_digit() => self.read_number()?,
                c if is_alpha(c) => self.read_identifier(),
                c @ ('"' | '`') => self.read_string(c)?,
                _ => return Err(invalid_character(&self.scanner)),
            };
            tokens.push(token);
        }

        tokens.push(Token::new(TokenType::Eof, "", self.scanner.location()));
        Ok(tokens)
    }

    fn read_simple(&mut self, ttype: TokenType) -> Token {
        self.marker.mark_start(&self.scanner);
        let literal = self.scanner.current().to_string();
        self.scanner.advance();
        self.marker.mark_end(&self.scanner);
        Token::new(ttype, literal, self.marker.span())
    }

    /// Skips a `#` comment together with the line feed that ends it.
    fn skip_comment(&mut self) {
        while !self.scanner.is_eof() && self.scanner.current() != '\n' {
            self.scanner.advance();
        }
        self.scanner.advance();
    }

    fn read_operator(&mut self) -> Token {
        self.marker.mark_start(&self.scanner);
        let first = self.scanner.current();
        let next = self.scanner.advance();
        let mut literal = first.to_string();

        let compound = match (first, next) {
            ('=' | '!' | '<' | '>' | '+' | '-' | '&' | '|', '=') => true,
            ('&', '&') | ('|', '|') => true,
            _ => false,
        };
        if compound {
            literal.push(next);
            self.scanner.advance();
        }

        self.marker.mark_end(&self.scanner);
        Token::new(TokenType::Operator, literal, self.marker.span())
    }

    fn read_number(&mut self) -> Result<Token, ContractError> {
        self.marker.mark_start(&self.scanner);
        let mut has_dot = false;

        loop {
            match self.scanner.current() {
                c if c.is_ascii_digit() => {
                    self.scanner.advance();
                }
                '.' if has_dot => return Err(invalid_character(&self.scanner)),
                '.' => {
                    has_dot = true;
                    self.scanner.advance();
                }
                _ => break,
            }
        }

        self.marker.mark_end(&self.scanner);
        let literal = self.scanner.slice(self.marker.start().offset, self.scanner.offset());
        Ok(Token::new(TokenType::Number, literal, self.marker.span()))
    }

    fn read_identifier(&mut self) -> Token {
        self.marker.mark_start(&self.scanner);
        while is_alphanumeric(self.scanner.current()) {
            self.scanner.advance();
        }
        self.marker.mark_end(&self.scanner);

        let literal = self.scanner.slice(self.marker.start().offset, self.scanner.offset());
        let ttype = if KEYWORDS.contains(&literal) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        Token::new(ttype, literal, self.marker.span())
    }

    /// Reads a string opened by `delimiter`. Backtick strings may span lines,
    /// double-quoted strings may not.
    fn read_string(&mut self, delimiter: char) -> Result<Token, ContractError> {
        let allow_newline = delimiter == '`';
        self.marker.mark_start(&self.scanner);
        self.scanner.advance();
        let start = self.scanner.offset();

        loop {
            match self.scanner.current() {
                Scanner::EOF => {
                    return Err(ContractError::invalid_character(
                        "EOF when scanning string",
                        self.scanner.location(),
                    ))
                }
                '\n' if !allow_newline => return Err(invalid_character(&self.scanner)),
                c if c == delimiter => break,
                _ => {
                    self.scanner.advance();
                }
            }
        }

        let literal = self.scanner.slice(start, self.scanner.offset());
        self.scanner.advance();
        self.marker.mark_end(&self.scanner);
        Ok(Token::new(TokenType::String, literal, self.marker.span()))
    }
}
