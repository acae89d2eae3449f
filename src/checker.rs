use crate::annotations::{self, AnnotationDef};
use crate::ast::{Annotation, ModelField, ModelStatement, Program, TypeDeclaration, TypeVar};
use crate::error::ContractError;
use log::trace;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Index of a scope inside a checker's arena.
pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Primitive,
    Defined,
    TypeVar,
}

/// The node that introduced a symbol. Primitives have none.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Model(&'a ModelStatement),
    TypeVar(&'a TypeVar),
}

#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub kind: SymbolKind,
    pub name: String,
    pub declaration: Option<Declaration<'a>>,
    /// Uses of this symbol must carry exactly one type argument.
    pub has_generic: bool,
}

impl<'a> Symbol<'a> {
    fn primitive(name: &str, has_generic: bool) -> Self {
        Symbol {
            kind: SymbolKind::Primitive,
            name: name.to_string(),
            declaration: None,
            has_generic,
        }
    }

    fn model(model: &'a ModelStatement) -> Self {
        Symbol {
            kind: SymbolKind::Defined,
            name: model.name.clone(),
            declaration: Some(Declaration::Model(model)),
            has_generic: false,
        }
    }

    fn type_var(var: &'a TypeVar) -> Self {
        Symbol {
            kind: SymbolKind::TypeVar,
            name: var.name.clone(),
            declaration: Some(Declaration::TypeVar(var)),
            has_generic: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope<'a> {
    symbols: HashMap<String, Symbol<'a>>,
    parent: Option<ScopeId>,
}

impl<'a> Scope<'a> {
    pub fn get(&self, name: &str) -> Option<&Symbol<'a>> {
        self.symbols.get(name)
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

static GLOBAL_SCOPE: LazyLock<Scope<'static>> = LazyLock::new(|| {
    let mut scope = Scope::default();
    for (name, has_generic) in [
        ("Number", false),
        ("Bool", false),
        ("Unknown", false),
        ("String", false),
        ("Object", false),
        ("Array", true),
    ] {
        scope
            .symbols
            .insert(name.to_string(), Symbol::primitive(name, has_generic));
    }
    scope
});

/// The read-only primitive scope every checker falls back to.
pub fn global_scope() -> &'static Scope<'static> {
    &GLOBAL_SCOPE
}

/// Resolves type names, enforces generic arity and validates annotations.
///
/// Scopes live in an arena owned by the checker. Scope [`TypeChecker::ROOT`]
/// holds the models of the file being checked and chains to the
/// [`global_scope`]; each model gets a child scope for its type variable that
/// is dropped once the model has been checked.
#[derive(Debug)]
pub struct TypeChecker<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> Default for TypeChecker<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TypeChecker<'a> {
    pub const ROOT: ScopeId = 0;

    pub fn new() -> Self {
        TypeChecker {
            scopes: vec![Scope::default()],
        }
    }

    /// Checks every model in declaration order, stopping at the first error.
    pub fn check(&mut self, program: &'a Program) -> Result<(), ContractError> {
        for model in program.models() {
            self.check_model(Self::ROOT, model)?;
        }
        Ok(())
    }

    pub fn check_model(
        &mut self,
        scope: ScopeId,
        model: &'a ModelStatement,
    ) -> Result<(), ContractError> {
        if self.lookup(scope, &model.name, true).is_some() {
            return Err(ContractError::type_error(
                format!("Re-declare symbol {} in scope", model.name),
                model.span.clone(),
            ));
        }
        self.bind(scope, Symbol::model(model));

        let child = self.open_scope(scope);
        let result = self.check_model_body(scope, child, model);
        self.close_scope(child);
        result
    }

    fn check_model_body(
        &mut self,
        scope: ScopeId,
        child: ScopeId,
        model: &'a ModelStatement,
    ) -> Result<(), ContractError> {
        if let Some(var) = &model.type_var {
            if self.lookup(scope, &var.name, true).is_some() {
                return Err(ContractError::type_error(
                    format!("Cannot use symbol {} as type var in scope", var.name),
                    var.span.clone(),
                ));
            }
            self.bind(child, Symbol::type_var(var));
            if let Some(symbol) = self.scopes[scope].symbols.get_mut(&model.name) {
                symbol.has_generic = true;
            }
        }

        for field in &model.fields {
            self.check_type(child, &field.type_decl)?;
            self.check_field_annotations(field)?;
        }

        self.check_model_annotations(model)
    }

    pub fn check_type(&self, scope: ScopeId, t: &TypeDeclaration) -> Result<(), ContractError> {
        let symbol = self.lookup(scope, &t.name, true).ok_or_else(|| {
            ContractError::type_error(
                format!("Cannot find symbol {} in scope", t.name),
                t.span.clone(),
            )
        })?;

        match (&t.generic, symbol.has_generic) {
            (Some(_), false) => Err(ContractError::type_error(
                format!("Symbol {} is not a generic type", t.name),
                t.span.clone(),
            )),
            (None, true) => Err(ContractError::type_error(
                format!("Symbol {} requires a generic type argument", t.name),
                t.span.clone(),
            )),
            (Some(inner), true) => self.check_type(scope, inner),
            (None, false) => Ok(()),
        }
    }

    fn check_field_annotations(&self, field: &ModelField) -> Result<(), ContractError> {
        let Some(chain) = &field.annotations else {
            return Ok(());
        };

        for annotation in &chain.annotations {
            let def = annotations::field_annotation(&annotation.name).ok_or_else(|| {
                ContractError::type_error(
                    format!(
                        "Unsupported annotation {} on field {}",
                        annotation.name, field.name
                    ),
                    annotation.span.clone(),
                )
            })?;

            // Only the outer type name is compared: Array<String> is an Array.
            let type_name = &field.type_decl.name;
            if !def.applies_to.allows(type_name) {
                return Err(ContractError::type_error(
                    format!(
                        "{} {} cannot be applied to type {}",
                        def.label(),
                        def.name,
                        type_name
                    ),
                    annotation.span.clone(),
                ));
            }
            check_arity(def, annotation)?;
        }
        Ok(())
    }

    fn check_model_annotations(&self, model: &ModelStatement) -> Result<(), ContractError> {
        let Some(chain) = &model.annotations else {
            return Ok(());
        };

        for annotation in &chain.annotations {
            let def = annotations::model_annotation(&annotation.name).ok_or_else(|| {
                ContractError::type_error(
                    format!(
                        "Unsupported annotation {} on model {}",
                        annotation.name, model.name
                    ),
                    annotation.span.clone(),
                )
            })?;

            if !def.applies_to.allows(&model.name) {
                return Err(ContractError::type_error(
                    format!("Annotation {} cannot be applied to model {}", def.name, model.name),
                    annotation.span.clone(),
                ));
            }
            check_arity(def, annotation)?;
        }
        Ok(())
    }

    /// Finds `name` starting at `scope`. A non-recursive lookup only looks at
    /// `scope` itself; a recursive one walks the parents and finally the
    /// global scope.
    pub fn lookup(&self, scope: ScopeId, name: &str, recursive: bool) -> Option<&Symbol<'a>> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.scopes.get(id)?;
            if let Some(symbol) = frame.get(name) {
                return Some(symbol);
            }
            if !recursive {
                return None;
            }
            current = frame.parent;
        }
        global_scope().get(name)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope<'a>> {
        self.scopes.get(id)
    }

    fn bind(&mut self, scope: ScopeId, symbol: Symbol<'a>) {
        trace!("bind {} ({:?}) in scope {}", symbol.name, symbol.kind, scope);
        self.scopes[scope].symbols.insert(symbol.name.clone(), symbol);
    }

    fn open_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = self.scopes.len();
        trace!("open scope {} (parent {})", id, parent);
        self.scopes.push(Scope {
            symbols: HashMap::new(),
            parent: Some(parent),
        });
        id
    }

    /// Drops `id` and every scope opened after it.
    fn close_scope(&mut self, id: ScopeId) {
        trace!("close scope {}", id);
        self.scopes.truncate(id);
    }
}

fn check_arity(def: &AnnotationDef, annotation: &Annotation) -> Result<(), ContractError> {
    if annotation.args.len() >= def.min_args {
        return Ok(());
    }
    Err(ContractError::type_error(
        format!("{} {} requires {} arguments", def.label(), def.name, def.min_args),
        annotation.span.clone(),
    ))
}
