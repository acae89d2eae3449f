use crate::lexer::TokenType;
use crate::location::Span;
use std::fmt::{self, Display};

/// An annotation argument: a number, string, bool or null token.
#[derive(Debug, PartialEq, Clone)]
pub struct Literal {
    pub ttype: TokenType,
    pub raw: String,
    pub span: Span,
}

/// The typed value of a [`Literal`].
#[derive(Debug, PartialEq, Clone)]
pub enum LiteralValue {
    Integer(u64),
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

impl Literal {
    /// Number literals become [`LiteralValue::Integer`] or
    /// [`LiteralValue::Number`] only when that type holds them exactly.
    /// Anything larger or more precise keeps its source text as a string.
    pub fn value(&self) -> LiteralValue {
        match self.ttype {
            TokenType::Number => number_value(&self.raw),
            TokenType::Bool => LiteralValue::Bool(self.raw == "true"),
            TokenType::Null => LiteralValue::Null,
            _ => LiteralValue::String(self.raw.clone()),
        }
    }
}

fn number_value(raw: &str) -> LiteralValue {
    if !raw.contains('.') {
        return match raw.parse::<u64>() {
            Ok(n) => LiteralValue::Integer(n),
            Err(_) => LiteralValue::String(raw.to_string()),
        };
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && significant_digits(raw) <= f64::DIGITS as usize => {
            LiteralValue::Number(n)
        }
        _ => LiteralValue::String(raw.to_string()),
    }
}

/// Digits left once leading and trailing zeros are dropped: `007.50` has two.
fn significant_digits(raw: &str) -> usize {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

/// The generic parameter bound by a model, e.g. the `T` in `model Box<T>`.
#[derive(Debug, PartialEq, Clone)]
pub struct TypeVar {
    pub name: String,
    pub span: Span,
}

/// A type reference such as `String` or `Array<User>`.
#[derive(Debug, PartialEq, Clone)]
pub struct TypeDeclaration {
    pub name: String,
    /// The single type argument, if one was written.
    pub generic: Option<Box<TypeDeclaration>>,
    pub span: Span,
}

impl Display for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.generic {
            Some(inner) => write!(f, "{}<{}>", self.name, inner),
            None => write!(f, "{}", self.name),
        }
    }
}

/// `@Name` or `@Name(arg, ...)`.
#[derive(Debug, PartialEq, Clone)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<Literal>,
    pub span: Span,
}

/// The annotations written directly above one model or field. Never empty.
#[derive(Debug, PartialEq, Clone)]
pub struct AnnotationChain {
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

impl AnnotationChain {
    /// First annotation with the given name.
    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModelField {
    pub name: String,
    pub type_decl: TypeDeclaration,
    pub annotations: Option<AnnotationChain>,
    pub span: Span,
}

impl ModelField {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.as_ref().and_then(|chain| chain.get(name))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModelStatement {
    pub name: String,
    pub type_var: Option<TypeVar>,
    pub annotations: Option<AnnotationChain>,
    pub fields: Vec<ModelField>,
    pub span: Span,
}

impl ModelStatement {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.as_ref().and_then(|chain| chain.get(name))
    }

    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A top-level statement. Models are the only statement kind so far.
#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Model(ModelStatement),
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::Model(model) => &model.span,
        }
    }
}

/// The root of a parsed contract.
#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn models(&self) -> impl Iterator<Item = &ModelStatement> {
        self.statements.iter().map(|statement| match statement {
            Statement::Model(model) => model,
        })
    }

    pub fn model(&self, name: &str) -> Option<&ModelStatement> {
        self.models().find(|m| m.name == name)
    }
}

/// A borrowed view over any AST node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Literal(&'a Literal),
    ModelStatement(&'a ModelStatement),
    Annotation(&'a Annotation),
    AnnotationChain(&'a AnnotationChain),
    TypeDeclaration(&'a TypeDeclaration),
    ModelField(&'a ModelField),
    TypeVar(&'a TypeVar),
    Program(&'a Program),
}

impl<'a> Node<'a> {
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Literal(_) => "Literal",
            Node::ModelStatement(_) => "ModelStatement",
            Node::Annotation(_) => "Annotation",
            Node::AnnotationChain(_) => "AnnotationChain",
            Node::TypeDeclaration(_) => "TypeDeclaration",
            Node::ModelField(_) => "ModelField",
            Node::TypeVar(_) => "TypeVar",
            Node::Program(_) => "Program",
        }
    }

    pub fn span(&self) -> &'a Span {
        match *self {
            Node::Literal(n) => &n.span,
            Node::ModelStatement(n) => &n.span,
            Node::Annotation(n) => &n.span,
            Node::AnnotationChain(n) => &n.span,
            Node::TypeDeclaration(n) => &n.span,
            Node::ModelField(n) => &n.span,
            Node::TypeVar(n) => &n.span,
            Node::Program(n) => &n.span,
        }
    }
}

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(statement: &'a Statement) -> Self {
        match statement {
            Statement::Model(model) => Node::ModelStatement(model),
        }
    }
}

impl<'a> From<&'a Program> for Node<'a> {
    fn from(program: &'a Program) -> Self {
        Node::Program(program)
    }
}
