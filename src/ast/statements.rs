use crate::Span;

use super::{
    ast::{Access, Identifier, NodeId},
    expressions::Expr,
    types::TypeAnnotation,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(ExpressionStmt),
    Block(BlockStmt),
    VarDecl(VarDeclStmt),
    FnDecl(FnDeclStmt),
    StructDecl(StructDeclStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Expression(stmt) => &stmt.span,
            Stmt::Block(stmt) => &stmt.span,
            Stmt::VarDecl(stmt) => &stmt.span,
            Stmt::FnDecl(stmt) => &stmt.span,
            Stmt::StructDecl(stmt) => &stmt.span,
            Stmt::If(stmt) => &stmt.span,
            Stmt::While(stmt) => &stmt.span,
            Stmt::Return(stmt) => &stmt.span,
            Stmt::Break(span) | Stmt::Continue(span) => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub id: NodeId,
    pub identifier: Identifier,
    pub is_constant: bool,
    pub access: Access,
    pub explicit_type: Option<TypeAnnotation>,
    pub assigned_value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: NodeId,
    pub identifier: Identifier,
    pub type_annotation: TypeAnnotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclStmt {
    pub id: NodeId,
    pub identifier: Identifier,
    pub access: Access,
    pub parameters: Vec<Parameter>,
    /// `None` means the function returns `Void`
    pub return_type: Option<TypeAnnotation>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub id: NodeId,
    pub identifier: Identifier,
    pub access: Access,
    pub type_annotation: TypeAnnotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclStmt {
    pub id: NodeId,
    pub identifier: Identifier,
    pub access: Access,
    /// Declared supertype: `struct Child : Parent { ... }`
    pub parent: Option<Identifier>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IfCondition {
    Expr(Expr),
    /// `if let name = optional_value`
    Let {
        id: NodeId,
        identifier: Identifier,
        value: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: IfCondition,
    pub then_body: Box<Stmt>,
    pub else_body: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}
