#![allow(clippy::module_inception)]

use std::sync::Arc;

use crate::{
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{
        config::Configuration,
        type_checker::{check, CheckResult},
    },
};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod stdlib;
pub mod type_checker;

extern crate regex;

/// Byte offset into a named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Arc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Arc::new(String::from("<null>")))
    }

    /// Location given to declarations injected through a `Configuration`.
    pub fn predeclared() -> Self {
        Position(0, Arc::new(String::from("<predeclared>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    pub fn predeclared() -> Self {
        Span {
            start: Position::predeclared(),
            end: Position::predeclared(),
        }
    }

    /// Span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// Returns the 1-based line number, the text of that line and the column of
/// `position` inside it.
pub fn get_line_at_position(source: &str, position: u32) -> (usize, String, usize) {
    let pos = (position as usize).min(source.len());

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return (line_number, line.to_string(), pos - start);
        }

        start = end;
        line_number += 1;
    }

    // Offset at the very end of the source (e.g. EOF)
    if source.is_empty() || source.ends_with('\n') {
        return (line_number, String::new(), 0);
    }

    let last = source.rsplit('\n').next().unwrap_or("");
    (line_number - 1, last.to_string(), last.len())
}

/// Tokenizes, parses and checks `source` against `configuration`.
///
/// Lexer and parser errors are fatal and returned as `Err`, as are fatal
/// checker errors. Semantic findings are inside the returned `CheckResult`.
pub fn parse_and_check(
    source: &str,
    file: &str,
    configuration: &Configuration,
) -> Result<CheckResult, Error> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    let (_, program) = parse(tokens, Arc::new(file.to_string()));
    check(&program?, configuration)
}
