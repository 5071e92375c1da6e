//! Structural checks on the syntax tree that run before anything else.
//!
//! The checker assumes node ids are unique and every name is non empty. A
//! tree that breaks either assumption cannot have come from the parser and
//! aborts the run.

use std::collections::HashSet;

use crate::{
    ast::{
        ast::{Identifier, NodeId, Program},
        expressions::{Expr, ExprKind},
        statements::{IfCondition, Stmt},
        types::{TypeAnnotation, TypeAnnotationKind},
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

struct Validator {
    seen: HashSet<NodeId>,
}

pub fn validate_program(program: &Program) -> Result<(), Error> {
    let mut validator = Validator {
        seen: HashSet::new(),
    };

    for stmt in &program.body {
        validator.stmt(stmt)?;
    }

    Ok(())
}

fn malformed(reason: String, span: &Span) -> Error {
    Error::new(ErrorImpl::MalformedAst { reason }, span.start.clone())
}

impl Validator {
    fn id(&mut self, id: NodeId, span: &Span) -> Result<(), Error> {
        if !self.seen.insert(id) {
            return Err(malformed(format!("node id {} is used more than once", id), span));
        }
        Ok(())
    }

    fn name(&self, name: &str, span: &Span) -> Result<(), Error> {
        if name.is_empty() {
            return Err(malformed(String::from("empty identifier"), span));
        }
        Ok(())
    }

    fn identifier(&self, identifier: &Identifier) -> Result<(), Error> {
        self.name(&identifier.name, &identifier.span)
    }

    fn annotation(&self, annotation: &TypeAnnotation) -> Result<(), Error> {
        match &annotation.kind {
            TypeAnnotationKind::Symbol(name) => self.name(name, &annotation.span),
            TypeAnnotationKind::Optional(inner) | TypeAnnotationKind::Array(inner) => {
                self.annotation(inner)
            }
            TypeAnnotationKind::Function {
                parameters,
                return_type,
            } => {
                for parameter in parameters {
                    self.annotation(parameter)?;
                }
                match return_type {
                    Some(return_type) => self.annotation(return_type),
                    None => Ok(()),
                }
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::Expression(stmt) => self.expr(&stmt.expression),
            Stmt::Block(block) => block.body.iter().try_for_each(|stmt| self.stmt(stmt)),
            Stmt::VarDecl(decl) => {
                self.id(decl.id, &decl.span)?;
                self.identifier(&decl.identifier)?;
                if let Some(explicit_type) = &decl.explicit_type {
                    self.annotation(explicit_type)?;
                }
                match &decl.assigned_value {
                    Some(value) => self.expr(value),
                    None => Ok(()),
                }
            }
            Stmt::FnDecl(decl) => {
                self.id(decl.id, &decl.span)?;
                self.identifier(&decl.identifier)?;
                for parameter in &decl.parameters {
                    self.id(parameter.id, &parameter.identifier.span)?;
                    self.identifier(&parameter.identifier)?;
                    self.annotation(&parameter.type_annotation)?;
                }
                if let Some(return_type) = &decl.return_type {
                    self.annotation(return_type)?;
                }
                decl.body.body.iter().try_for_each(|stmt| self.stmt(stmt))
            }
            Stmt::StructDecl(decl) => {
                self.id(decl.id, &decl.span)?;
                self.identifier(&decl.identifier)?;
                if let Some(parent) = &decl.parent {
                    self.identifier(parent)?;
                }
                for field in &decl.fields {
                    self.id(field.id, &field.identifier.span)?;
                    self.identifier(&field.identifier)?;
                    self.annotation(&field.type_annotation)?;
                }
                Ok(())
            }
            Stmt::If(stmt) => {
                match &stmt.condition {
                    IfCondition::Expr(condition) => self.expr(condition)?,
                    IfCondition::Let {
                        id,
                        identifier,
                        value,
                    } => {
                        self.id(*id, &identifier.span)?;
                        self.identifier(identifier)?;
                        self.expr(value)?;
                    }
                }
                self.stmt(&stmt.then_body)?;
                match &stmt.else_body {
                    Some(else_body) => self.stmt(else_body),
                    None => Ok(()),
                }
            }
            Stmt::While(stmt) => {
                self.expr(&stmt.condition)?;
                self.stmt(&stmt.body)
            }
            Stmt::Return(stmt) => match &stmt.value {
                Some(value) => self.expr(value),
                None => Ok(()),
            },
            Stmt::Break(_) | Stmt::Continue(_) => Ok(()),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), Error> {
        self.id(expr.id, &expr.span)?;

        match &expr.kind {
            ExprKind::Integer(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Nil => Ok(()),
            ExprKind::Symbol(name) => self.name(name, &expr.span),
            ExprKind::Array(elements) => elements.iter().try_for_each(|element| self.expr(element)),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            ExprKind::Prefix { right, .. } => self.expr(right),
            ExprKind::Assignment {
                assignee, value, ..
            } => {
                self.expr(assignee)?;
                self.expr(value)
            }
            ExprKind::Call { callee, arguments } => {
                self.expr(callee)?;
                arguments.iter().try_for_each(|argument| self.expr(argument))
            }
            ExprKind::Member { object, member } => {
                self.expr(object)?;
                self.identifier(member)
            }
            ExprKind::Index { object, index } => {
                self.expr(object)?;
                self.expr(index)
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(condition)?;
                self.expr(then_expr)?;
                self.expr(else_expr)
            }
            ExprKind::StructInit { name, fields } => {
                self.identifier(name)?;
                for (field, value) in fields {
                    self.identifier(field)?;
                    self.expr(value)?;
                }
                Ok(())
            }
        }
    }
}
