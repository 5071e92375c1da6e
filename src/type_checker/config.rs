//! Checker configuration and predeclaration.
//!
//! A `Configuration` is how a caller extends the checker with a standard
//! library: every predeclared value and type is bound in the global frame
//! before the program is traversed. Configurations are plain immutable
//! values and can be shared between concurrent checking runs.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{
    ast::ast::Access,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::RESERVED_LOOKUP,
    Position, Span,
};

use super::{
    declarations::{Declaration, DeclarationKind},
    diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
    scope::Scope,
    types::{Type, PRIMITIVE_TYPE_NAMES},
};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Optional checks that are off unless a configuration enables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrictFlag {
    /// Warn about local variables and parameters that are never read
    UnusedVariables,
    /// Warn about statements that follow a `return`, `break`, `continue` or a
    /// call that never returns
    UnreachableCode,
    /// Report every warning as an error
    WarningsAsErrors,
}

/// A value made available to every program, e.g. a standard library function.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub ty: Type,
}

impl ValueDeclaration {
    pub fn new(name: impl Into<String>, kind: DeclarationKind, ty: Type) -> Self {
        ValueDeclaration {
            name: name.into(),
            kind,
            ty,
        }
    }

    pub fn function(name: impl Into<String>, parameters: Vec<Type>, return_type: Type) -> Self {
        Self::new(
            name,
            DeclarationKind::Function,
            Type::function(parameters, return_type),
        )
    }

    pub fn constant(name: impl Into<String>, ty: Type) -> Self {
        Self::new(name, DeclarationKind::Constant, ty)
    }
}

/// A type made available to every program. The name is the key it is stored
/// under in `Configuration::predeclared_types`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub kind: DeclarationKind,
    pub ty: Type,
}

impl TypeDeclaration {
    pub fn new(ty: Type) -> Self {
        TypeDeclaration {
            kind: DeclarationKind::Type,
            ty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    /// Registered in order
    pub predeclared_values: Vec<Arc<ValueDeclaration>>,
    /// Registered in key order
    pub predeclared_types: BTreeMap<String, TypeDeclaration>,
    pub strict_flags: BTreeSet<StrictFlag>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: Arc<ValueDeclaration>) -> Self {
        self.predeclared_values.push(value);
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = Arc<ValueDeclaration>>) -> Self {
        self.predeclared_values.extend(values);
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, declaration: TypeDeclaration) -> Self {
        self.predeclared_types.insert(name.into(), declaration);
        self
    }

    pub fn with_strict_flag(mut self, flag: StrictFlag) -> Self {
        self.strict_flags.insert(flag);
        self
    }

    pub fn has_flag(&self, flag: StrictFlag) -> bool {
        self.strict_flags.contains(&flag)
    }

    /// Rejects entries that could never have been written in source.
    pub fn validate(&self) -> Result<(), Error> {
        for value in &self.predeclared_values {
            validate_name(&value.name)?;
            if !value.kind.is_global_value() {
                return Err(invalid_configuration(format!(
                    "value `{}` is declared with kind `{}`",
                    value.name, value.kind
                )));
            }
        }

        for (name, declaration) in &self.predeclared_types {
            validate_name(name)?;
            if !declaration.kind.is_type() {
                return Err(invalid_configuration(format!(
                    "type `{}` is declared with kind `{}`",
                    name, declaration.kind
                )));
            }
        }

        Ok(())
    }
}

fn invalid_configuration(reason: String) -> Error {
    Error::new(ErrorImpl::InvalidConfiguration { reason }, Position::predeclared())
}

fn validate_name(name: &str) -> Result<(), Error> {
    if !IDENTIFIER.is_match(name) || RESERVED_LOOKUP.contains_key(name) {
        return Err(invalid_configuration(format!(
            "`{}` is not a valid identifier",
            name
        )));
    }
    Ok(())
}

/// Seeds the global frame of `scope`.
///
/// The built in primitive type names are bound first, then every predeclared
/// value in sequence order, then every predeclared type in key order. A name
/// that is already bound is reported as a `DuplicateDeclaration` and keeps its
/// first binding.
pub fn predeclare(
    scope: &mut Scope,
    configuration: &Configuration,
    diagnostics: &mut Diagnostics,
) -> Result<(), Error> {
    configuration.validate()?;

    for name in PRIMITIVE_TYPE_NAMES {
        if let Some(ty) = Type::primitive(name) {
            bind(scope, diagnostics, Declaration::new(name, DeclarationKind::Type, ty, Span::predeclared()));
        }
    }

    for value in &configuration.predeclared_values {
        bind(
            scope,
            diagnostics,
            Declaration::new(&value.name, value.kind, value.ty.clone(), Span::predeclared())
                .with_access(Access::Public),
        );
    }

    for (name, declaration) in &configuration.predeclared_types {
        bind(
            scope,
            diagnostics,
            Declaration::new(name, declaration.kind, declaration.ty.clone(), Span::predeclared())
                .with_access(Access::Public),
        );
    }

    debug!(
        "predeclared {} values and {} types",
        configuration.predeclared_values.len(),
        configuration.predeclared_types.len()
    );

    Ok(())
}

fn bind(scope: &mut Scope, diagnostics: &mut Diagnostics, declaration: Declaration) {
    if let Err(redeclaration) = scope.declare(declaration) {
        diagnostics.record(Diagnostic::new(
            DiagnosticKind::DuplicateDeclaration,
            format!("predeclared {}", redeclaration),
            Span::predeclared(),
        ));
    }
}
