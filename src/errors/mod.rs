//! Fatal error types.
//!
//! This module defines the errors that abort a run instead of being
//! accumulated as diagnostics:
//!
//! - Lexer and parser errors with source position information
//! - Malformed syntax trees handed to the checker
//! - Invalid checker configurations
//! - Error names and suggestions for display

pub mod errors;
