//! Semantic analysis.
//!
//! This module resolves every name in a parsed program against a lexically
//! scoped symbol table and checks that the program is well typed. It:
//!
//! - Seeds the global scope from a `Configuration` (the standard library)
//! - Declares top level structs and functions ahead of time
//! - Infers and checks the type of every expression and declaration
//! - Records problems as diagnostics instead of stopping at the first one
//!
//! Only a malformed syntax tree or an invalid configuration aborts a run.

pub mod config;
pub mod declarations;
pub mod diagnostics;
mod expr;
pub mod scope;
mod stmt;
pub mod type_checker;
pub mod types;
mod validate;

#[cfg(test)]
mod tests;
