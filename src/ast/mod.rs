/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Program root, node ids, identifiers and access modifiers
/// - expressions: Definitions for the expression kinds and operators
/// - statements: Definitions for the statement kinds
/// - types: Type annotations as written in source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
