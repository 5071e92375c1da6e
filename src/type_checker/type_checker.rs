use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, trace};

use crate::{
    ast::{
        ast::{NodeId, Program},
        statements::{FnDeclStmt, Stmt, StructDeclStmt},
        types::{TypeAnnotation, TypeAnnotationKind},
    },
    errors::errors::Error,
    Span,
};

use super::{
    config::{predeclare, Configuration, StrictFlag},
    declarations::{Declaration, DeclarationKind},
    diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
    scope::{Frame, FrameKind, Scope},
    types::{StructRef, Type},
    validate::validate_program,
};

/// Resolved type of every expression and declaration node, by node id.
pub type Annotations = BTreeMap<NodeId, Type>;

#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Ordered by source position. Empty means the program is well typed.
    pub diagnostics: Vec<Diagnostic>,
    pub annotations: Annotations,
}

impl CheckResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diagnostic| diagnostic.is_error())
    }

    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.annotations.get(&id)
    }
}

/// Checks one program against one configuration.
///
/// `check` runs once; afterwards the diagnostics, the annotations and the
/// global frame can be inspected.
pub struct Checker<'a> {
    program: &'a Program,
    configuration: &'a Configuration,
    pub(super) scope: Scope,
    pub(super) diagnostics: Diagnostics,
    pub(super) annotations: Annotations,
    /// Fields of every struct declared so far, inherited ones first. Each
    /// declaration is its own type, so shadowed structs keep their fields.
    pub(super) members: HashMap<Type, Frame>,
    /// Function types resolved by the pre-pass
    pub(super) signatures: HashMap<NodeId, Type>,
    pub(super) declared_ahead: HashSet<NodeId>,
    checked: bool,
}

impl<'a> Checker<'a> {
    pub fn new(program: &'a Program, configuration: &'a Configuration) -> Self {
        let diagnostics = if configuration.has_flag(StrictFlag::WarningsAsErrors) {
            Diagnostics::new().promote_warnings()
        } else {
            Diagnostics::new()
        };

        Checker {
            program,
            configuration,
            scope: Scope::new(),
            diagnostics,
            annotations: BTreeMap::new(),
            members: HashMap::new(),
            signatures: HashMap::new(),
            declared_ahead: HashSet::new(),
            checked: false,
        }
    }

    /// Runs the check. Only fatal errors are returned as `Err`; everything
    /// else is recorded as a diagnostic.
    pub fn check(&mut self) -> Result<(), Error> {
        if self.checked {
            debug!("program was already checked, keeping the previous result");
            return Ok(());
        }
        self.checked = true;

        validate_program(self.program)?;
        predeclare(&mut self.scope, self.configuration, &mut self.diagnostics)?;

        let program = self.program;
        self.declare_ahead(&program.body);
        self.check_statements(&program.body)?;

        debug!(
            "checked {} top level statements: {} diagnostics, {} annotated nodes",
            program.body.len(),
            self.diagnostics.len(),
            self.annotations.len()
        );

        Ok(())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.result()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn global_frame(&self) -> &Frame {
        self.scope.global()
    }

    pub fn into_result(self) -> CheckResult {
        CheckResult {
            diagnostics: self.diagnostics.result(),
            annotations: self.annotations,
        }
    }

    pub(super) fn strict(&self, flag: StrictFlag) -> bool {
        self.configuration.has_flag(flag)
    }

    pub(super) fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: &Span) {
        let diagnostic = Diagnostic::new(kind, message, location.clone());
        trace!("{}", diagnostic);
        self.diagnostics.record(diagnostic);
    }

    pub(super) fn annotate(&mut self, id: NodeId, ty: Type) {
        self.annotations.insert(id, ty);
    }

    /// Binds a declaration in the innermost frame, reporting a clash.
    /// Returns whether the name was bound.
    pub(super) fn declare(&mut self, declaration: Declaration) -> bool {
        let location = declaration.location.clone();
        match self.scope.declare(declaration) {
            Ok(()) => true,
            Err(redeclaration) => {
                self.report(DiagnosticKind::DuplicateDeclaration, redeclaration.to_string(), &location);
                false
            }
        }
    }

    /// Runs `body` inside a new frame of the given kind.
    ///
    /// The frame is popped on every path out of `body`, including fatal
    /// errors propagated with `?`.
    pub fn with_frame<T>(
        &mut self,
        kind: FrameKind,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.scope.push_frame(kind);
        trace!("pushed frame, depth {}", self.scope.depth());

        let result = body(self);

        if let Some(frame) = self.scope.pop_frame() {
            trace!("popped {:?} frame with {} bindings", frame.kind, frame.len());
            self.report_unused(&frame);
        }

        result
    }

    fn report_unused(&mut self, frame: &Frame) {
        if !self.strict(StrictFlag::UnusedVariables) {
            return;
        }

        let unused: Vec<Declaration> = frame
            .unused()
            .filter(|declaration| {
                matches!(
                    declaration.kind,
                    DeclarationKind::Variable | DeclarationKind::Constant | DeclarationKind::Parameter
                ) && !declaration.name.starts_with('_')
            })
            .cloned()
            .collect();

        for declaration in unused {
            self.report(
                DiagnosticKind::UnusedVariable,
                format!("{} `{}` is never used", declaration.kind, declaration.name),
                &declaration.location,
            );
        }
    }

    /// Resolves a written type. Anything that does not name a type is
    /// reported and becomes `Any`.
    pub(super) fn resolve_annotation(&mut self, annotation: &TypeAnnotation) -> Type {
        match &annotation.kind {
            TypeAnnotationKind::Symbol(name) => {
                let found = self
                    .scope
                    .resolve(name)
                    .map(|declaration| (declaration.kind, declaration.ty));

                match found {
                    Some((kind, ty)) if kind.is_type() => ty,
                    Some((kind, _)) => {
                        self.report(
                            DiagnosticKind::InvalidTypeAnnotation,
                            format!("`{}` is a {}, not a type", name, kind),
                            &annotation.span,
                        );
                        Type::Any
                    }
                    None => {
                        self.report(
                            DiagnosticKind::InvalidTypeAnnotation,
                            format!("unknown type `{}`", name),
                            &annotation.span,
                        );
                        Type::Any
                    }
                }
            }
            TypeAnnotationKind::Optional(inner) => Type::optional(self.resolve_annotation(inner)),
            TypeAnnotationKind::Array(element) => Type::array(self.resolve_annotation(element)),
            TypeAnnotationKind::Function {
                parameters,
                return_type,
            } => {
                let mut parameter_types = vec![];
                for parameter in parameters {
                    parameter_types.push(self.resolve_annotation(parameter));
                }
                let return_type = match return_type {
                    Some(return_type) => self.resolve_annotation(return_type),
                    None => Type::Void,
                };
                Type::function(parameter_types, return_type)
            }
        }
    }

    /// Declares the structs and function signatures of `stmts` before any of
    /// them is checked, so they can refer to each other in any order.
    pub(super) fn declare_ahead(&mut self, stmts: &[Stmt]) {
        let structs: Vec<&StructDeclStmt> = stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::StructDecl(decl) => Some(decl),
                _ => None,
            })
            .collect();

        self.declare_structs(&structs);
        self.declared_ahead.extend(structs.iter().map(|decl| decl.id));

        let mut functions = 0;
        for stmt in stmts {
            if let Stmt::FnDecl(decl) = stmt {
                self.declare_function(decl);
                self.declared_ahead.insert(decl.id);
                functions += 1;
            }
        }

        debug!(
            "declared {} structs and {} functions ahead of time",
            structs.len(),
            functions
        );
    }

    /// Declares a function's signature and returns its type.
    pub(super) fn declare_function(&mut self, decl: &FnDeclStmt) -> Type {
        let mut parameters = vec![];
        for parameter in &decl.parameters {
            parameters.push(self.resolve_annotation(&parameter.type_annotation));
        }

        let return_type = match &decl.return_type {
            Some(return_type) => self.resolve_annotation(return_type),
            None => Type::Void,
        };

        let ty = Type::function(parameters, return_type);
        self.signatures.insert(decl.id, ty.clone());
        self.annotate(decl.id, ty.clone());
        self.declare(
            Declaration::new(
                &decl.identifier.name,
                DeclarationKind::Function,
                ty.clone(),
                decl.identifier.span.clone(),
            )
            .with_access(decl.access),
        );

        ty
    }

    /// Declares a group of structs that may refer to each other.
    ///
    /// Names and inheritance chains come first, then fields are resolved
    /// parents before children so inherited fields are already known.
    pub(super) fn declare_structs(&mut self, structs: &[&StructDeclStmt]) {
        let mut batch: HashMap<&str, &StructDeclStmt> = HashMap::new();
        for decl in structs {
            batch.entry(decl.identifier.name.as_str()).or_insert(*decl);
        }

        let mut composites: Vec<(&StructDeclStmt, Option<Type>)> = vec![];
        for decl in structs {
            let ancestors = self.ancestors_of(decl, &batch);
            let ty = Type::declared_composite(&decl.identifier.name, decl.id, ancestors);
            self.annotate(decl.id, ty.clone());

            let declared = self.declare(
                Declaration::new(
                    &decl.identifier.name,
                    DeclarationKind::Structure,
                    ty.clone(),
                    decl.identifier.span.clone(),
                )
                .with_access(decl.access),
            );

            composites.push((*decl, if declared { Some(ty) } else { None }));
        }

        // A parent's chain is always shorter than its children's
        let mut order: Vec<usize> = (0..composites.len()).collect();
        order.sort_by_key(|&index| match &composites[index].1 {
            Some(Type::Composite { ancestors, .. }) => ancestors.len(),
            _ => 0,
        });

        for index in order {
            let (decl, ty) = &composites[index];
            let mut frame = Frame::new(FrameKind::Members);

            if let Some(parent) = ty.as_ref().and_then(Type::parent) {
                if let Some(inherited) = self.members.get(&parent) {
                    for field in inherited.declarations() {
                        let _ = frame.declare(field.clone());
                    }
                }
            }

            for field in &decl.fields {
                let field_ty = self.resolve_annotation(&field.type_annotation);
                self.annotate(field.id, field_ty.clone());

                let declaration = Declaration::new(
                    &field.identifier.name,
                    DeclarationKind::Field,
                    field_ty,
                    field.identifier.span.clone(),
                )
                .with_access(field.access);

                if let Err(redeclaration) = frame.declare(declaration) {
                    self.report(
                        DiagnosticKind::DuplicateDeclaration,
                        format!("field {}", redeclaration),
                        &field.identifier.span,
                    );
                }
            }

            if let Some(ty) = ty {
                self.members.insert(ty.clone(), frame);
            }
        }

        for (_, ty) in &composites {
            let Some(ty) = ty else { continue };
            let Some(frame) = self.members.get(ty) else { continue };

            let recursive: Vec<(String, Span)> = frame
                .declarations()
                .filter(|field| self.contains_composite(&field.ty, ty, &mut HashSet::new()))
                .map(|field| (field.name.clone(), field.location.clone()))
                .collect();

            for (name, location) in recursive {
                self.report(
                    DiagnosticKind::InvalidTypeAnnotation,
                    format!("field `{}` makes `{}` contain itself", name, ty),
                    &location,
                );
            }
        }
    }

    /// Declared ancestors of a struct, nearest first.
    ///
    /// Parents are looked up in `batch` first and then in scope. A struct that
    /// inherits from itself is reported and gets no ancestors.
    fn ancestors_of(
        &mut self,
        decl: &StructDeclStmt,
        batch: &HashMap<&str, &StructDeclStmt>,
    ) -> Vec<StructRef> {
        let mut visited: Vec<(&str, NodeId)> = vec![(decl.identifier.name.as_str(), decl.id)];
        let mut parent = decl.parent.as_ref();

        while let Some(parent_identifier) = parent {
            let name = parent_identifier.name.as_str();
            let is_direct_parent = visited.len() == 1;

            if let Some(index) = visited.iter().position(|(visited_name, _)| *visited_name == name) {
                if index == 0 {
                    self.report(
                        DiagnosticKind::CyclicInheritance,
                        format!("`{}` inherits from itself", decl.identifier.name),
                        &parent_identifier.span,
                    );
                }
                // Stop right where the chain enters the cycle
                visited.truncate(index + 1);
                break;
            }

            if let Some(parent_decl) = batch.get(name) {
                visited.push((name, parent_decl.id));
                parent = parent_decl.parent.as_ref();
                continue;
            }

            let found = self
                .scope
                .lookup(name)
                .map(|declaration| (declaration.kind, declaration.ty.clone()));

            match found {
                Some((
                    kind,
                    Type::Composite {
                        name,
                        declaration,
                        ancestors,
                    },
                )) if kind.is_type() => {
                    let mut chain = Self::chain_of(&visited[1..]);
                    chain.push(StructRef { name, declaration });
                    chain.extend(ancestors);
                    return chain;
                }
                Some((kind, ty)) if is_direct_parent => {
                    let message = if kind.is_type() {
                        format!("cannot inherit from `{}`, it is not a struct", ty)
                    } else {
                        format!("`{}` is a {}, not a type", name, kind)
                    };
                    self.report(DiagnosticKind::InvalidTypeAnnotation, message, &parent_identifier.span);
                }
                None if is_direct_parent => {
                    self.report(
                        DiagnosticKind::InvalidTypeAnnotation,
                        format!("unknown type `{}`", name),
                        &parent_identifier.span,
                    );
                }
                _ => {}
            }
            break;
        }

        Self::chain_of(&visited[1..])
    }

    fn chain_of(structs: &[(&str, NodeId)]) -> Vec<StructRef> {
        structs
            .iter()
            .map(|(name, id)| StructRef::declared(*name, *id))
            .collect()
    }

    /// Whether a value of type `ty` holds a `target` without an optional or
    /// array in between.
    fn contains_composite(&self, ty: &Type, target: &Type, visited: &mut HashSet<Type>) -> bool {
        if !matches!(ty, Type::Composite { .. }) {
            return false;
        }
        if ty == target {
            return true;
        }
        if !visited.insert(ty.clone()) {
            return false;
        }

        match self.members.get(ty) {
            Some(frame) => frame
                .declarations()
                .any(|field| self.contains_composite(&field.ty, target, visited)),
            None => false,
        }
    }
}

/// Checks `program` against `configuration`.
///
/// Returns `Err` only for fatal errors: an invalid configuration or a
/// malformed syntax tree.
pub fn check(program: &Program, configuration: &Configuration) -> Result<CheckResult, Error> {
    let mut checker = Checker::new(program, configuration);
    checker.check()?;
    Ok(checker.into_result())
}
