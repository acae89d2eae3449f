//! The fixed table of annotations a contract may use.
//!
//! Every entry names where the annotation may appear, which field types it
//! accepts and how many arguments it needs at minimum. The checker enforces
//! the table and the serializer reads it to tell validators apart from plain
//! modifiers.

/// What an annotation decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTarget {
    Model,
    Field,
}

/// Whether an annotation produces a validation rule or only changes code shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Modifier,
    Validator,
}

/// The field types an annotation may be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Any,
    /// Outer type names only: `Array<String>` counts as `Array`.
    Only(&'static [&'static str]),
}

impl Applicability {
    pub fn allows(&self, type_name: &str) -> bool {
        match self {
            Applicability::Any => true,
            Applicability::Only(names) => names.iter().any(|name| *name == type_name),
        }
    }
}

/// Definition of a built-in annotation.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationDef {
    pub name: &'static str,
    pub target: AnnotationTarget,
    pub kind: AnnotationKind,
    pub applies_to: Applicability,
    pub min_args: usize,
}

impl AnnotationDef {
    pub fn is_validator(&self) -> bool {
        self.kind == AnnotationKind::Validator
    }

    /// Word used when reporting a problem with this annotation.
    pub fn label(&self) -> &'static str {
        match self.kind {
            AnnotationKind::Validator => "Validator",
            AnnotationKind::Modifier => "Annotation",
        }
    }
}

const STRING: Applicability = Applicability::Only(&["String"]);
const NUMBER: Applicability = Applicability::Only(&["Number"]);
const ARRAY: Applicability = Applicability::Only(&["Array"]);

const fn model(name: &'static str) -> AnnotationDef {
    AnnotationDef {
        name,
        target: AnnotationTarget::Model,
        kind: AnnotationKind::Modifier,
        applies_to: Applicability::Any,
        min_args: 0,
    }
}

const fn modifier(name: &'static str, min_args: usize) -> AnnotationDef {
    AnnotationDef {
        name,
        target: AnnotationTarget::Field,
        kind: AnnotationKind::Modifier,
        applies_to: Applicability::Any,
        min_args,
    }
}

const fn validator(name: &'static str, applies_to: Applicability, min_args: usize) -> AnnotationDef {
    AnnotationDef {
        name,
        target: AnnotationTarget::Field,
        kind: AnnotationKind::Validator,
        applies_to,
        min_args,
    }
}

pub static MODEL_ANNOTATIONS: &[AnnotationDef] = &[
    model("Data"),
    model("CreateConstructor"),
    model("Mapper"),
];

pub static FIELD_ANNOTATIONS: &[AnnotationDef] = &[
    modifier("Optional", 0),
    modifier("Private", 0),
    modifier("Getter", 0),
    modifier("Setter", 0),
    modifier("Mapping", 1),
    // Type checks, message only
    validator("IsInt", Applicability::Any, 1),
    validator("IsFloat", Applicability::Any, 1),
    validator("IsBoolean", Applicability::Any, 1),
    validator("IsString", Applicability::Any, 1),
    validator("IsArray", Applicability::Any, 1),
    // String formats, message only
    validator("IsEmail", STRING, 1),
    validator("IsNotEmpty", STRING, 1),
    validator("IsPhoneNumber", STRING, 1),
    validator("IsDateString", STRING, 1),
    validator("IsUUID", STRING, 1),
    validator("IsUrl", STRING, 1),
    // Bounds, value then message
    validator("Max", NUMBER, 2),
    validator("Min", NUMBER, 2),
    validator("MinLength", STRING, 2),
    validator("MaxLength", STRING, 2),
    validator("Length", STRING, 2),
    validator("ArrayMinSize", ARRAY, 2),
    validator("ArrayMaxSize", ARRAY, 2),
    validator("ArrayLength", ARRAY, 2),
];

pub fn model_annotation(name: &str) -> Option<&'static AnnotationDef> {
    MODEL_ANNOTATIONS.iter().find(|def| def.name == name)
}

pub fn field_annotation(name: &str) -> Option<&'static AnnotationDef> {
    FIELD_ANNOTATIONS.iter().find(|def| def.name == name)
}
