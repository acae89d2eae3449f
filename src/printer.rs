use crate::ast::{Literal, LiteralValue, Node, Program};
use crate::lexer::TokenType;
use std::fmt::{self, Display, Write};

/// Renders an indented, span-free dump of `node` and everything below it.
///
/// ```text
/// [Program]
///   [Model] Name: User
///     [AnnotationChain]
///       @Data
///     [Field] Name: tags
///       [Type] Array
///         [Generic]
///           [Type] String
/// ```
pub fn print_tree(node: Node<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: Node<'_>, indent: usize) -> fmt::Result {
    let prefix = "  ".repeat(indent);
    match node {
        Node::Program(program) => {
            writeln!(out, "{}[Program]", prefix)?;
            for statement in &program.statements {
                write_node(out, Node::from(statement), indent + 1)?;
            }
        }
        Node::ModelStatement(model) => {
            writeln!(out, "{}[Model] Name: {}", prefix, model.name)?;
            if let Some(var) = &model.type_var {
                write_node(out, Node::TypeVar(var), indent + 1)?;
            }
            if let Some(chain) = &model.annotations {
                write_node(out, Node::AnnotationChain(chain), indent + 1)?;
            }
            for field in &model.fields {
                write_node(out, Node::ModelField(field), indent + 1)?;
            }
        }
        Node::TypeVar(var) => {
            writeln!(out, "{}[TypeVar] {}", prefix, var.name)?;
        }
        Node::AnnotationChain(chain) => {
            writeln!(out, "{}[AnnotationChain]", prefix)?;
            for annotation in &chain.annotations {
                write_node(out, Node::Annotation(annotation), indent + 1)?;
            }
        }
        Node::Annotation(annotation) => {
            if annotation.args.is_empty() {
                writeln!(out, "{}@{}", prefix, annotation.name)?;
            } else {
                let args: Vec<String> = annotation.args.iter().map(render_literal).collect();
                writeln!(out, "{}@{}({})", prefix, annotation.name, args.join(", "))?;
            }
        }
        Node::ModelField(field) => {
            writeln!(out, "{}[Field] Name: {}", prefix, field.name)?;
            if let Some(chain) = &field.annotations {
                write_node(out, Node::AnnotationChain(chain), indent + 1)?;
            }
            write_node(out, Node::TypeDeclaration(&field.type_decl), indent + 1)?;
        }
        Node::TypeDeclaration(t) => {
            writeln!(out, "{}[Type] {}", prefix, t.name)?;
            if let Some(inner) = &t.generic {
                writeln!(out, "{}  [Generic]", prefix)?;
                write_node(out, Node::TypeDeclaration(inner), indent + 2)?;
            }
        }
        Node::Literal(literal) => {
            writeln!(out, "{}[Literal] {}", prefix, render_literal(literal))?;
        }
    }
    Ok(())
}

fn render_literal(literal: &Literal) -> String {
    match literal.value() {
        LiteralValue::String(s) if literal.ttype != TokenType::Number => format!("{:?}", s),
        LiteralValue::Bool(b) => b.to_string(),
        LiteralValue::Null => "null".to_string(),
        LiteralValue::String(_) | LiteralValue::Integer(_) | LiteralValue::Number(_) => {
            literal.raw.clone()
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_tree(Node::Program(self)))
    }
}
