use crate::annotations;
use crate::ast::{Annotation, AnnotationChain, Literal, LiteralValue, ModelField, ModelStatement, Program};
use serde::Serialize;

/// An annotation argument in its exported form.
///
/// Number literals no machine type holds exactly are exported as strings
/// with their source text, never as rounded or infinite floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(u64),
    Number(f64),
    Boolean(bool),
    Null,
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal.value() {
            LiteralValue::String(s) => Value::String(s),
            LiteralValue::Integer(n) => Value::Integer(n),
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::Bool(b) => Value::Boolean(b),
            LiteralValue::Null => Value::Null,
        }
    }
}

/// The data a code generator needs from a checked contract, without spans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSchema {
    pub models: Vec<ModelSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_var: Option<String>,
    pub annotations: Vec<AnnotationSchema>,
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationSchema {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub annotations: Vec<AnnotationSchema>,
    pub rules: Vec<Rule>,
}

/// One validation a generated model must perform on a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub(crate) fn to_schema(program: &Program) -> ContractSchema {
    ContractSchema {
        models: program.models().map(model_schema).collect(),
    }
}

fn model_schema(model: &ModelStatement) -> ModelSchema {
    ModelSchema {
        name: model.name.clone(),
        type_var: model.type_var.as_ref().map(|var| var.name.clone()),
        annotations: annotation_schemas(model.annotations.as_ref()),
        fields: model.fields.iter().map(field_schema).collect(),
    }
}

fn field_schema(field: &ModelField) -> FieldSchema {
    FieldSchema {
        name: field.name.clone(),
        type_name: field.type_decl.to_string(),
        annotations: annotation_schemas(field.annotations.as_ref()),
        rules: validation_rules(field),
    }
}

fn annotation_schemas(chain: Option<&AnnotationChain>) -> Vec<AnnotationSchema> {
    chain
        .map(|chain| {
            chain
                .annotations
                .iter()
                .map(|annotation| AnnotationSchema {
                    name: annotation.name.clone(),
                    args: annotation.args.iter().map(Value::from).collect(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts the validator annotations of `field` as rules.
///
/// Single-argument validators carry only a message; two-argument validators
/// carry a value followed by a message. Modifiers produce no rule.
pub fn validation_rules(field: &ModelField) -> Vec<Rule> {
    let Some(chain) = &field.annotations else {
        return Vec::new();
    };
    chain.annotations.iter().filter_map(rule_for).collect()
}

fn rule_for(annotation: &Annotation) -> Option<Rule> {
    let def = annotations::field_annotation(&annotation.name)?;
    if !def.is_validator() {
        return None;
    }

    match annotation.args.as_slice() {
        [message, ..] if def.min_args == 1 => Some(Rule {
            rule: annotation.name.clone(),
            value: None,
            message: Some(message.raw.clone()),
        }),
        [value, message, ..] => Some(Rule {
            rule: annotation.name.clone(),
            value: Some(Value::from(value)),
            message: Some(message.raw.clone()),
        }),
        _ => None,
    }
}
