use std::fmt::Display;

use crate::{ast::ast::Access, Span};

use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// An immutable value that is neither a constant nor a function, e.g. a
    /// predeclared global
    Value,
    Constant,
    Variable,
    Parameter,
    Function,
    /// A name for an existing type, e.g. `Int` or a predeclared `Any`
    Type,
    Structure,
    Field,
}

impl DeclarationKind {
    /// Whether the declaration names a type rather than a value.
    pub fn is_type(&self) -> bool {
        matches!(self, DeclarationKind::Type | DeclarationKind::Structure)
    }

    /// Whether a value declared with this kind may be reassigned.
    pub fn is_assignable(&self) -> bool {
        matches!(self, DeclarationKind::Variable | DeclarationKind::Field)
    }

    /// Kinds that make sense at the top of the global frame.
    pub fn is_global_value(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Value
                | DeclarationKind::Constant
                | DeclarationKind::Variable
                | DeclarationKind::Function
        )
    }
}

impl Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeclarationKind::Value => "value",
            DeclarationKind::Constant => "constant",
            DeclarationKind::Variable => "variable",
            DeclarationKind::Parameter => "parameter",
            DeclarationKind::Function => "function",
            DeclarationKind::Type => "type",
            DeclarationKind::Structure => "struct",
            DeclarationKind::Field => "field",
        };
        write!(f, "{}", name)
    }
}

/// Any named entity the checker knows about.
///
/// For type kinds `ty` is the type the name denotes, for everything else it
/// is the type of the value. Declarations are never changed once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub ty: Type,
    pub location: Span,
    pub access: Access,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclarationKind, ty: Type, location: Span) -> Self {
        Declaration {
            name: name.into(),
            kind,
            ty,
            location,
            access: Access::Private,
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn is_type(&self) -> bool {
        self.kind.is_type()
    }
}
