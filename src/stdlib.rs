//! The standard library surface the checker can be configured with.
//!
//! Only signatures live here. The canonical declarations are shared
//! instances, so every configuration built from them points at the same
//! values.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::type_checker::{
    config::{Configuration, TypeDeclaration, ValueDeclaration},
    types::Type,
};

lazy_static! {
    /// `fn panic(message: String) -> Never`
    pub static ref PANIC_FUNCTION: Arc<ValueDeclaration> = Arc::new(ValueDeclaration::function(
        "panic",
        vec![Type::String],
        Type::Never
    ));

    /// `fn print(value: Any)`
    pub static ref PRINT_FUNCTION: Arc<ValueDeclaration> = Arc::new(ValueDeclaration::function(
        "print",
        vec![Type::Any],
        Type::Void
    ));

    /// The universal top type, registered under the name `Any`
    pub static ref ANY_TYPE: TypeDeclaration = TypeDeclaration::new(Type::Any);
}

/// An ordered selection of standard library functions.
#[derive(Debug, Clone, Default)]
pub struct StandardLibraryFunctions {
    functions: Vec<Arc<ValueDeclaration>>,
}

impl StandardLibraryFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every function this module provides.
    pub fn all() -> Self {
        Self::new()
            .with(Arc::clone(&PANIC_FUNCTION))
            .with(Arc::clone(&PRINT_FUNCTION))
    }

    pub fn with(mut self, function: Arc<ValueDeclaration>) -> Self {
        self.functions.push(function);
        self
    }

    pub fn to_value_declarations(&self) -> Vec<Arc<ValueDeclaration>> {
        self.functions.iter().map(Arc::clone).collect()
    }
}

/// All standard library functions plus the `Any` type.
pub fn standard_configuration() -> Configuration {
    Configuration::new()
        .with_values(StandardLibraryFunctions::all().to_value_declarations())
        .with_type("Any", ANY_TYPE.clone())
}
