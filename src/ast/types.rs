//! Type annotations as written in source.
//!
//! Annotations are purely syntactic. The checker resolves each of them
//! against the scope table into a `type_checker::types::Type`.

use std::fmt::Display;

use crate::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotationKind {
    /// A named type, e.g. `Int` or `Point`
    Symbol(String),
    /// `T?`
    Optional(Box<TypeAnnotation>),
    /// `[T]`
    Array(Box<TypeAnnotation>),
    /// `fn(A, B) -> R`
    Function {
        parameters: Vec<TypeAnnotation>,
        return_type: Option<Box<TypeAnnotation>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeAnnotationKind,
    pub span: Span,
}

impl TypeAnnotation {
    pub fn symbol(name: impl Into<String>, span: Span) -> Self {
        TypeAnnotation {
            kind: TypeAnnotationKind::Symbol(name.into()),
            span,
        }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypeAnnotationKind::Symbol(name) => write!(f, "{}", name),
            TypeAnnotationKind::Optional(inner) => write!(f, "{}?", inner),
            TypeAnnotationKind::Array(inner) => write!(f, "[{}]", inner),
            TypeAnnotationKind::Function {
                parameters,
                return_type,
            } => {
                write!(f, "fn(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ")")?;
                if let Some(return_type) = return_type {
                    write!(f, " -> {}", return_type)?;
                }
                Ok(())
            }
        }
    }
}
