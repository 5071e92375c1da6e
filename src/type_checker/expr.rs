use std::collections::HashSet;

use crate::{
    ast::{
        ast::Identifier,
        expressions::{AssignmentOperator, BinaryOperator, Expr, ExprKind, PrefixOperator},
    },
    errors::errors::Error,
    Span,
};

use super::{
    diagnostics::DiagnosticKind,
    type_checker::Checker,
    types::{is_assignable, is_subtype, join, Type},
};

/// What a member access resolved to.
enum Member {
    Field(Type),
    Builtin(Type),
    /// Member of an `Any` value, nothing can be known about it
    Dynamic,
    Missing,
}

/// Result type of a binary operator, or `None` if the operands don't fit.
fn operator_result(operator: BinaryOperator, left: &Type, right: &Type) -> Option<Type> {
    if *left == Type::Any || *right == Type::Any {
        return Some(if operator.is_arithmetic() { Type::Any } else { Type::Bool });
    }

    if operator.is_logical() {
        return (is_subtype(left, &Type::Bool) && is_subtype(right, &Type::Bool))
            .then_some(Type::Bool);
    }

    let unified = if is_subtype(left, right) {
        right.clone()
    } else if is_subtype(right, left) {
        left.clone()
    } else {
        return None;
    };

    if operator.is_equality() {
        Some(Type::Bool)
    } else if operator.is_ordering() {
        (unified.is_numeric() || unified == Type::String).then_some(Type::Bool)
    } else if unified.is_numeric() || (operator == BinaryOperator::Add && unified == Type::String) {
        Some(unified)
    } else {
        None
    }
}

fn array_element_hint(expected: Option<&Type>) -> Option<Type> {
    match expected? {
        Type::Array(element) => Some((**element).clone()),
        Type::Optional(inner) => array_element_hint(Some(inner)),
        _ => None,
    }
}

impl<'a> Checker<'a> {
    /// Types `expr`, records the type in the annotation table and returns it.
    ///
    /// `expected` is a hint from the context; literals adopt it where they
    /// can. The hint is never enforced here, callers check the result.
    pub(super) fn check_expr(&mut self, expr: &Expr, expected: Option<&Type>) -> Result<Type, Error> {
        let ty = self.infer_expr(expr, expected)?;
        self.annotate(expr.id, ty.clone());
        Ok(ty)
    }

    /// Reports a `TypeMismatch` unless `actual` is accepted where `expected`
    /// is required.
    pub(super) fn expect_type(&mut self, actual: &Type, expected: &Type, location: &Span) -> bool {
        if is_assignable(actual, expected) {
            return true;
        }

        self.report(
            DiagnosticKind::TypeMismatch,
            format!("expected `{}`, found `{}`", expected, actual),
            location,
        );
        false
    }

    fn infer_expr(&mut self, expr: &Expr, expected: Option<&Type>) -> Result<Type, Error> {
        match &expr.kind {
            ExprKind::Integer(value) => Ok(self.check_integer_literal(*value as i128, expected, &expr.span)),
            ExprKind::Float(_) => Ok(Type::Float),
            ExprKind::String(_) => Ok(Type::String),
            ExprKind::Bool(_) => Ok(Type::Bool),
            ExprKind::Nil => Ok(match expected {
                Some(optional @ Type::Optional(_)) => optional.clone(),
                _ => Type::optional(Type::Never),
            }),
            ExprKind::Array(elements) => self.check_array(elements, expected),
            ExprKind::Symbol(name) => Ok(self.check_symbol(name, &expr.span)),
            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.check_binary(expr, left, *operator, right, expected),
            ExprKind::Prefix { operator, right } => self.check_prefix(expr, *operator, right, expected),
            ExprKind::Assignment {
                assignee,
                operator,
                value,
            } => self.check_assignment(expr, assignee, *operator, value),
            ExprKind::Call { callee, arguments } => self.check_call(expr, callee, arguments),
            ExprKind::Member { object, member } => {
                let object_ty = self.check_expr(object, None)?;
                Ok(match self.lookup_member(&object_ty, member) {
                    Member::Field(ty) | Member::Builtin(ty) => ty,
                    Member::Dynamic | Member::Missing => Type::Any,
                })
            }
            ExprKind::Index { object, index } => self.check_index(object, index),
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition_ty = self.check_expr(condition, Some(&Type::Bool))?;
                self.expect_type(&condition_ty, &Type::Bool, &condition.span);

                let then_ty = self.check_expr(then_expr, expected)?;
                let else_ty = self.check_expr(else_expr, expected.or(Some(&then_ty)))?;

                Ok(join(&then_ty, &else_ty))
            }
            ExprKind::StructInit { name, fields } => self.check_struct_init(name, fields),
        }
    }

    fn check_integer_literal(&mut self, value: i128, expected: Option<&Type>, location: &Span) -> Type {
        match expected.and_then(|ty| ty.integer_hint()) {
            Some(ty) => {
                if !ty.fits_integer(value) {
                    self.report(
                        DiagnosticKind::IntegerLiteralOutOfRange,
                        format!("integer literal `{}` does not fit in `{}`", value, ty),
                        location,
                    );
                }
                ty
            }
            None => Type::Int,
        }
    }

    fn check_symbol(&mut self, name: &str, location: &Span) -> Type {
        match self.scope.resolve(name) {
            Some(declaration) if declaration.is_type() => {
                self.report(
                    DiagnosticKind::NotAValue,
                    format!("`{}` is a type, not a value", name),
                    location,
                );
                Type::Any
            }
            Some(declaration) => declaration.ty,
            None => {
                self.report(
                    DiagnosticKind::NotDeclared,
                    format!("`{}` is not declared", name),
                    location,
                );
                Type::Any
            }
        }
    }

    fn check_array(&mut self, elements: &[Expr], expected: Option<&Type>) -> Result<Type, Error> {
        if let Some(element_ty) = array_element_hint(expected) {
            for element in elements {
                let ty = self.check_expr(element, Some(&element_ty))?;
                self.expect_type(&ty, &element_ty, &element.span);
            }
            return Ok(Type::array(element_ty));
        }

        let mut joined: Option<Type> = None;
        for element in elements {
            let ty = self.check_expr(element, joined.as_ref())?;
            joined = Some(match joined {
                Some(joined) => join(&joined, &ty),
                None => ty,
            });
        }

        Ok(Type::array(joined.unwrap_or(Type::Any)))
    }

    fn check_binary(
        &mut self,
        expr: &Expr,
        left: &Expr,
        operator: BinaryOperator,
        right: &Expr,
        expected: Option<&Type>,
    ) -> Result<Type, Error> {
        let operand_hint = if operator.is_arithmetic() {
            expected.filter(|ty| ty.is_numeric())
        } else {
            None
        };

        // A literal operand takes its type from the other side
        let (left_ty, right_ty) = if left.is_literal() && !right.is_literal() {
            let right_ty = self.check_expr(right, operand_hint)?;
            let left_ty = self.check_expr(left, Some(&right_ty))?;
            (left_ty, right_ty)
        } else {
            let left_ty = self.check_expr(left, operand_hint)?;
            let right_ty = self.check_expr(right, Some(&left_ty))?;
            (left_ty, right_ty)
        };

        match operator_result(operator, &left_ty, &right_ty) {
            Some(ty) => Ok(ty),
            None => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "operator `{}` cannot be applied to `{}` and `{}`",
                        operator, left_ty, right_ty
                    ),
                    &expr.span,
                );
                Ok(Type::Any)
            }
        }
    }

    fn check_prefix(
        &mut self,
        expr: &Expr,
        operator: PrefixOperator,
        right: &Expr,
        expected: Option<&Type>,
    ) -> Result<Type, Error> {
        match operator {
            PrefixOperator::Negate => {
                // `-128` is one literal as far as the range check is concerned
                if let ExprKind::Integer(value) = right.kind {
                    let ty = self.check_integer_literal(-(value as i128), expected, &expr.span);
                    self.annotate(right.id, ty.clone());
                    return Ok(ty);
                }

                let ty = self.check_expr(right, expected.filter(|ty| ty.is_numeric()))?;
                if ty == Type::Any || (ty.is_numeric() && !ty.is_unsigned()) {
                    return Ok(ty);
                }

                self.report(
                    DiagnosticKind::TypeMismatch,
                    format!("cannot negate a value of type `{}`", ty),
                    &expr.span,
                );
                Ok(Type::Any)
            }
            PrefixOperator::Not => {
                let ty = self.check_expr(right, Some(&Type::Bool))?;
                if is_assignable(&ty, &Type::Bool) {
                    return Ok(Type::Bool);
                }

                self.report(
                    DiagnosticKind::TypeMismatch,
                    format!("operator `!` cannot be applied to `{}`", ty),
                    &expr.span,
                );
                Ok(Type::Any)
            }
        }
    }

    fn check_assignment(
        &mut self,
        expr: &Expr,
        assignee: &Expr,
        operator: AssignmentOperator,
        value: &Expr,
    ) -> Result<Type, Error> {
        let target = self.check_assignment_target(assignee)?;
        let value_ty = self.check_expr(value, target.as_ref())?;

        let Some(target_ty) = target else {
            return Ok(Type::Any);
        };

        let matched = match operator.binary_operator() {
            None => self.expect_type(&value_ty, &target_ty, &value.span),
            Some(binary) => match operator_result(binary, &target_ty, &value_ty) {
                Some(result) => self.expect_type(&result, &target_ty, &expr.span),
                None => {
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "operator `{}=` cannot be applied to `{}` and `{}`",
                            binary, target_ty, value_ty
                        ),
                        &expr.span,
                    );
                    false
                }
            },
        };

        Ok(if matched { target_ty } else { Type::Any })
    }

    /// Types the left hand side of an assignment. Returns `None` when it is
    /// not something that can be assigned to; that has been reported already.
    fn check_assignment_target(&mut self, assignee: &Expr) -> Result<Option<Type>, Error> {
        let target = match &assignee.kind {
            ExprKind::Symbol(name) => {
                // Writing to a variable does not count as using it
                let found = self.scope.lookup(name).cloned();
                match found {
                    Some(declaration) if declaration.kind.is_assignable() => Some(declaration.ty),
                    Some(declaration) => {
                        self.report(
                            DiagnosticKind::AssignmentToConstant,
                            format!("cannot assign to {} `{}`", declaration.kind, name),
                            &assignee.span,
                        );
                        None
                    }
                    None => {
                        self.report(
                            DiagnosticKind::NotDeclared,
                            format!("`{}` is not declared", name),
                            &assignee.span,
                        );
                        None
                    }
                }
            }
            ExprKind::Member { object, member } => {
                let object_ty = self.check_expr(object, None)?;
                match self.lookup_member(&object_ty, member) {
                    Member::Field(ty) => Some(ty),
                    Member::Dynamic => Some(Type::Any),
                    Member::Builtin(_) => {
                        self.report(
                            DiagnosticKind::InvalidAssignmentTarget,
                            format!("cannot assign to built in member `{}`", member.name),
                            &assignee.span,
                        );
                        None
                    }
                    Member::Missing => None,
                }
            }
            ExprKind::Index { object, index } => {
                let ty = self.check_index(object, index)?;
                if self.annotations.get(&object.id) == Some(&Type::String) {
                    self.report(
                        DiagnosticKind::InvalidAssignmentTarget,
                        "strings cannot be modified by index",
                        &assignee.span,
                    );
                    None
                } else {
                    Some(ty)
                }
            }
            _ => {
                self.check_expr(assignee, None)?;
                self.report(
                    DiagnosticKind::InvalidAssignmentTarget,
                    "cannot assign to this expression",
                    &assignee.span,
                );
                return Ok(None);
            }
        };

        self.annotate(assignee.id, target.clone().unwrap_or(Type::Any));
        Ok(target)
    }

    fn check_call(&mut self, expr: &Expr, callee: &Expr, arguments: &[Expr]) -> Result<Type, Error> {
        let callee_ty = self.check_expr(callee, None)?;

        let (parameters, return_type) = match callee_ty {
            Type::Function {
                parameters,
                return_type,
            } => (parameters, *return_type),
            Type::Any | Type::Never => {
                for argument in arguments {
                    self.check_expr(argument, None)?;
                }
                return Ok(callee_ty);
            }
            other => {
                self.report(
                    DiagnosticKind::NotCallable,
                    format!("a value of type `{}` is not callable", other),
                    &callee.span,
                );
                for argument in arguments {
                    self.check_expr(argument, None)?;
                }
                return Ok(Type::Any);
            }
        };

        if parameters.len() != arguments.len() {
            self.report(
                DiagnosticKind::ArgumentCountMismatch,
                format!(
                    "expected {} argument{}, found {}",
                    parameters.len(),
                    if parameters.len() == 1 { "" } else { "s" },
                    arguments.len()
                ),
                &expr.span,
            );
            for (i, argument) in arguments.iter().enumerate() {
                self.check_expr(argument, parameters.get(i))?;
            }
            return Ok(Type::Any);
        }

        let mut matched = true;
        for (argument, parameter) in arguments.iter().zip(&parameters) {
            let ty = self.check_expr(argument, Some(parameter))?;
            matched &= self.expect_type(&ty, parameter, &argument.span);
        }

        Ok(if matched { return_type } else { Type::Any })
    }

    fn lookup_member(&mut self, object_ty: &Type, member: &Identifier) -> Member {
        let found = match object_ty {
            Type::Any => return Member::Dynamic,
            Type::Composite { .. } => self
                .members
                .get(object_ty)
                .and_then(|frame| frame.get(&member.name))
                .map(|field| Member::Field(field.ty.clone())),
            Type::Optional(_) => {
                self.report(
                    DiagnosticKind::UnknownMember,
                    format!(
                        "`{}` is optional, unwrap it with `if let` before accessing `{}`",
                        object_ty, member.name
                    ),
                    &member.span,
                );
                return Member::Missing;
            }
            other => other.builtin_member(&member.name).map(Member::Builtin),
        };

        match found {
            Some(resolved) => resolved,
            None => {
                self.report(
                    DiagnosticKind::UnknownMember,
                    format!("`{}` has no member `{}`", object_ty, member.name),
                    &member.span,
                );
                Member::Missing
            }
        }
    }

    fn check_index(&mut self, object: &Expr, index: &Expr) -> Result<Type, Error> {
        let object_ty = self.check_expr(object, None)?;
        let index_ty = self.check_expr(index, Some(&Type::Int))?;

        if !(index_ty.is_integer() || index_ty == Type::Any || index_ty == Type::Never) {
            self.report(
                DiagnosticKind::TypeMismatch,
                format!("index must be an integer, found `{}`", index_ty),
                &index.span,
            );
        }

        match object_ty {
            Type::Array(element) => Ok(*element),
            Type::String => Ok(Type::String),
            Type::Any => Ok(Type::Any),
            other => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    format!("cannot index into a value of type `{}`", other),
                    &object.span,
                );
                Ok(Type::Any)
            }
        }
    }

    fn check_struct_init(&mut self, name: &Identifier, fields: &[(Identifier, Expr)]) -> Result<Type, Error> {
        let composite = match self.scope.resolve(&name.name) {
            Some(declaration) if declaration.is_type() && matches!(declaration.ty, Type::Composite { .. }) => {
                Some(declaration.ty)
            }
            Some(declaration) => {
                self.report(
                    DiagnosticKind::InvalidTypeAnnotation,
                    format!("`{}` is a {}, not a struct", name.name, declaration.kind),
                    &name.span,
                );
                None
            }
            None => {
                self.report(
                    DiagnosticKind::NotDeclared,
                    format!("`{}` is not declared", name.name),
                    &name.span,
                );
                None
            }
        };

        let Some(ty) = composite else {
            for (_, value) in fields {
                self.check_expr(value, None)?;
            }
            return Ok(Type::Any);
        };

        let declared: Vec<(String, Type)> = self
            .members
            .get(&ty)
            .map(|frame| {
                frame
                    .declarations()
                    .map(|field| (field.name.clone(), field.ty.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut initialized: HashSet<&str> = HashSet::new();
        for (field, value) in fields {
            let field_ty = declared
                .iter()
                .find(|(declared_name, _)| *declared_name == field.name)
                .map(|(_, field_ty)| field_ty.clone());
            let value_ty = self.check_expr(value, field_ty.as_ref())?;

            if !initialized.insert(field.name.as_str()) {
                self.report(
                    DiagnosticKind::DuplicateDeclaration,
                    format!("field `{}` is initialized more than once", field.name),
                    &field.span,
                );
                continue;
            }

            match field_ty {
                Some(field_ty) => {
                    self.expect_type(&value_ty, &field_ty, &value.span);
                }
                None => self.report(
                    DiagnosticKind::UnknownMember,
                    format!("`{}` has no field `{}`", ty, field.name),
                    &field.span,
                ),
            }
        }

        for (declared_name, _) in &declared {
            if !initialized.contains(declared_name.as_str()) {
                self.report(
                    DiagnosticKind::MissingField,
                    format!("missing field `{}` in initializer of `{}`", declared_name, ty),
                    &name.span,
                );
            }
        }

        Ok(ty)
    }
}
