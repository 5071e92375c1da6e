use crate::{
    ast::statements::{FnDeclStmt, IfCondition, IfStmt, ReturnStmt, Stmt, VarDeclStmt},
    errors::errors::Error,
};

use super::{
    config::StrictFlag,
    declarations::{Declaration, DeclarationKind},
    diagnostics::DiagnosticKind,
    scope::FrameKind,
    type_checker::Checker,
    types::Type,
};

impl<'a> Checker<'a> {
    /// Checks a sequence of statements in the current frame.
    pub(super) fn check_statements(&mut self, stmts: &[Stmt]) -> Result<(), Error> {
        let mut diverged = false;
        let mut reported = false;

        for stmt in stmts {
            if diverged && !reported && self.strict(StrictFlag::UnreachableCode) {
                self.report(
                    DiagnosticKind::UnreachableCode,
                    "statement is never executed",
                    stmt.get_span(),
                );
                reported = true;
            }

            self.check_stmt(stmt)?;

            if !diverged {
                diverged = self.terminates(stmt, true);
            }
        }

        Ok(())
    }

    pub(super) fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::Expression(stmt) => {
                self.check_expr(&stmt.expression, None)?;
                Ok(())
            }
            Stmt::Block(block) => {
                self.with_frame(FrameKind::Block, |checker| checker.check_statements(&block.body))
            }
            Stmt::VarDecl(decl) => self.check_var_decl(decl),
            Stmt::FnDecl(decl) => self.check_fn_decl(decl),
            Stmt::StructDecl(decl) => {
                // Top level structs were declared by the pre-pass
                if !self.declared_ahead.contains(&decl.id) {
                    self.declare_structs(&[decl]);
                }
                Ok(())
            }
            Stmt::If(stmt) => self.check_if(stmt),
            Stmt::While(stmt) => {
                let condition_ty = self.check_expr(&stmt.condition, Some(&Type::Bool))?;
                self.expect_type(&condition_ty, &Type::Bool, &stmt.condition.span);

                self.with_frame(FrameKind::Loop, |checker| checker.check_stmt(&stmt.body))
            }
            Stmt::Return(stmt) => self.check_return(stmt),
            Stmt::Break(span) => {
                if !self.scope.in_loop() {
                    self.report(DiagnosticKind::ControlOutsideLoop, "`break` outside of a loop", span);
                }
                Ok(())
            }
            Stmt::Continue(span) => {
                if !self.scope.in_loop() {
                    self.report(DiagnosticKind::ControlOutsideLoop, "`continue` outside of a loop", span);
                }
                Ok(())
            }
        }
    }

    fn check_var_decl(&mut self, decl: &VarDeclStmt) -> Result<(), Error> {
        let explicit_type = decl
            .explicit_type
            .as_ref()
            .map(|annotation| self.resolve_annotation(annotation));

        // The initializer is checked before the name is bound, so `let x = x;`
        // refers to an outer `x`
        let ty = match (&decl.assigned_value, explicit_type) {
            (Some(value), Some(explicit_type)) => {
                let value_ty = self.check_expr(value, Some(&explicit_type))?;
                self.expect_type(&value_ty, &explicit_type, &value.span);
                explicit_type
            }
            (Some(value), None) => self.check_expr(value, None)?,
            (None, Some(explicit_type)) => explicit_type,
            (None, None) => Type::Any,
        };

        self.annotate(decl.id, ty.clone());

        let kind = if decl.is_constant {
            DeclarationKind::Constant
        } else {
            DeclarationKind::Variable
        };
        self.declare(
            Declaration::new(&decl.identifier.name, kind, ty, decl.identifier.span.clone())
                .with_access(decl.access),
        );

        Ok(())
    }

    fn check_fn_decl(&mut self, decl: &FnDeclStmt) -> Result<(), Error> {
        // Local functions are declared here, before their body, so they can recurse
        let signature = match self.signatures.get(&decl.id) {
            Some(signature) if self.declared_ahead.contains(&decl.id) => signature.clone(),
            _ => self.declare_function(decl),
        };

        let Type::Function {
            parameters,
            return_type,
        } = signature
        else {
            return Ok(());
        };
        let return_type = *return_type;

        let frame = FrameKind::Function {
            return_type: return_type.clone(),
        };

        // Parameters share the frame with the body's top level statements
        self.with_frame(frame, |checker| {
            for (parameter, ty) in decl.parameters.iter().zip(parameters) {
                checker.annotate(parameter.id, ty.clone());
                checker.declare(Declaration::new(
                    &parameter.identifier.name,
                    DeclarationKind::Parameter,
                    ty,
                    parameter.identifier.span.clone(),
                ));
            }

            checker.check_statements(&decl.body.body)?;

            let must_return = return_type != Type::Void && return_type != Type::Any;
            if must_return && !decl.body.body.iter().any(|stmt| checker.terminates(stmt, false)) {
                checker.report(
                    DiagnosticKind::MissingReturn,
                    format!(
                        "function `{}` does not return a value of type `{}` on every path",
                        decl.identifier.name, return_type
                    ),
                    &decl.identifier.span,
                );
            }

            Ok(())
        })
    }

    fn check_if(&mut self, stmt: &IfStmt) -> Result<(), Error> {
        match &stmt.condition {
            IfCondition::Expr(condition) => {
                let condition_ty = self.check_expr(condition, Some(&Type::Bool))?;
                self.expect_type(&condition_ty, &Type::Bool, &condition.span);
                self.check_stmt(&stmt.then_body)?;
            }
            IfCondition::Let {
                id,
                identifier,
                value,
            } => {
                let value_ty = self.check_expr(value, None)?;
                let bound = match value_ty {
                    Type::Optional(inner) => *inner,
                    Type::Any => Type::Any,
                    other => {
                        self.report(
                            DiagnosticKind::TypeMismatch,
                            format!("`if let` needs an optional value, found `{}`", other),
                            &value.span,
                        );
                        Type::Any
                    }
                };
                self.annotate(*id, bound.clone());

                self.with_frame(FrameKind::Binding, |checker| {
                    checker.declare(Declaration::new(
                        &identifier.name,
                        DeclarationKind::Constant,
                        bound,
                        identifier.span.clone(),
                    ));
                    checker.check_stmt(&stmt.then_body)
                })?;
            }
        }

        match &stmt.else_body {
            Some(else_body) => self.check_stmt(else_body),
            None => Ok(()),
        }
    }

    fn check_return(&mut self, stmt: &ReturnStmt) -> Result<(), Error> {
        let Some(return_type) = self.scope.function_return_type().cloned() else {
            self.report(
                DiagnosticKind::ReturnOutsideFunction,
                "`return` outside of a function",
                &stmt.span,
            );
            if let Some(value) = &stmt.value {
                self.check_expr(value, None)?;
            }
            return Ok(());
        };

        match &stmt.value {
            Some(value) => {
                let ty = self.check_expr(value, Some(&return_type))?;
                self.expect_type(&ty, &return_type, &value.span);
            }
            None if return_type != Type::Void && return_type != Type::Any => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    format!("expected a return value of type `{}`", return_type),
                    &stmt.span,
                );
            }
            None => {}
        }

        Ok(())
    }

    /// Whether control never continues past `stmt`.
    ///
    /// With `loop_exits` false only returns and calls that never return
    /// count, which is what a function body needs to end in.
    fn terminates(&self, stmt: &Stmt, loop_exits: bool) -> bool {
        match stmt {
            Stmt::Return(_) => true,
            Stmt::Break(_) | Stmt::Continue(_) => loop_exits,
            Stmt::Expression(stmt) => self.annotations.get(&stmt.expression.id) == Some(&Type::Never),
            Stmt::Block(block) => block.body.iter().any(|stmt| self.terminates(stmt, loop_exits)),
            Stmt::If(stmt) => match &stmt.else_body {
                Some(else_body) => {
                    self.terminates(&stmt.then_body, loop_exits) && self.terminates(else_body, loop_exits)
                }
                None => false,
            },
            _ => false,
        }
    }
}
