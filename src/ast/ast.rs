use std::fmt::Display;

use crate::Span;

use super::statements::Stmt;

/// Identifies an expression or declaration node.
///
/// The parser hands out ids that are unique within one program; the checker
/// keys its type annotations by them.
pub type NodeId = u32;

/// Root of a parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A name as written in source, together with where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Identifier {
            name: name.into(),
            span,
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Visibility of a declaration.
///
/// Everything is private unless marked with `pub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Private,
    Public,
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Private => write!(f, "private"),
            Access::Public => write!(f, "pub"),
        }
    }
}
