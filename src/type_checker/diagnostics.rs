//! Non fatal findings of a checking run.
//!
//! Diagnostics are appended while the checker walks the program and are
//! handed out ordered by source position. Nothing is deduplicated: every
//! site that is affected by a problem is reported.

use std::fmt::Display;

use crate::{get_line_at_position, Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DuplicateDeclaration,
    NotDeclared,
    TypeMismatch,
    InvalidTypeAnnotation,
    NotAValue,
    NotCallable,
    ArgumentCountMismatch,
    UnknownMember,
    MissingField,
    AssignmentToConstant,
    InvalidAssignmentTarget,
    MissingReturn,
    ReturnOutsideFunction,
    ControlOutsideLoop,
    CyclicInheritance,
    IntegerLiteralOutOfRange,
    UnusedVariable,
    UnreachableCode,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticKind::UnusedVariable | DiagnosticKind::UnreachableCode => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn get_name(&self) -> &str {
        match self {
            DiagnosticKind::DuplicateDeclaration => "DuplicateDeclaration",
            DiagnosticKind::NotDeclared => "NotDeclared",
            DiagnosticKind::TypeMismatch => "TypeMismatch",
            DiagnosticKind::InvalidTypeAnnotation => "InvalidTypeAnnotation",
            DiagnosticKind::NotAValue => "NotAValue",
            DiagnosticKind::NotCallable => "NotCallable",
            DiagnosticKind::ArgumentCountMismatch => "ArgumentCountMismatch",
            DiagnosticKind::UnknownMember => "UnknownMember",
            DiagnosticKind::MissingField => "MissingField",
            DiagnosticKind::AssignmentToConstant => "AssignmentToConstant",
            DiagnosticKind::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            DiagnosticKind::MissingReturn => "MissingReturn",
            DiagnosticKind::ReturnOutsideFunction => "ReturnOutsideFunction",
            DiagnosticKind::ControlOutsideLoop => "ControlOutsideLoop",
            DiagnosticKind::CyclicInheritance => "CyclicInheritance",
            DiagnosticKind::IntegerLiteralOutOfRange => "IntegerLiteralOutOfRange",
            DiagnosticKind::UnusedVariable => "UnusedVariable",
            DiagnosticKind::UnreachableCode => "UnreachableCode",
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Span,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Span) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location,
            severity: kind.default_severity(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn get_position(&self) -> &Position {
        &self.location.start
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}: {} ({}:{})",
            self.severity,
            self.kind,
            self.message,
            self.location.start.1,
            self.location.start.0
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    recorded: Vec<Diagnostic>,
    warnings_as_errors: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every warning recorded from now on is stored with error severity.
    pub fn promote_warnings(mut self) -> Self {
        self.warnings_as_errors = true;
        self
    }

    pub fn record(&mut self, mut diagnostic: Diagnostic) {
        if self.warnings_as_errors {
            diagnostic.severity = Severity::Error;
        }
        self.recorded.push(diagnostic);
    }

    /// All diagnostics ordered by source position.
    ///
    /// The sort is stable, so diagnostics at the same position keep the order
    /// they were recorded in.
    pub fn result(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.recorded.clone();
        diagnostics.sort_by_key(|diagnostic| diagnostic.location.start.0);
        diagnostics
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

/// Formats a diagnostic against the source it was found in.
///
/// ```text
/// Error: TypeMismatch (expected `Int`, found `String`)
/// -> main.lang
///   |
/// 1 | let x: Int = "a";
///   | -------------^
/// ```
pub fn render(diagnostic: &Diagnostic, source: &str) -> String {
    let position = diagnostic.get_position();
    let mut output = format!(
        "{}: {} ({})\n-> {}\n",
        diagnostic.severity, diagnostic.kind, diagnostic.message, position.1
    );

    // Predeclared entries have no source text to point into
    if *position == Position::predeclared() {
        return output;
    }

    let (line, line_text, line_pos) = get_line_at_position(source, position.0);

    let line_str = line.to_string();
    let padding = line_str.len() + 2;

    let removed_whitespace = line_text.len() - line_text.trim_start_matches(' ').len();
    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    output.push_str(&format!("{:>padding$}\n", "|"));
    output.push_str(&format!("{} | {}\n", line_str, line_text.trim()));
    output.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    output
}
