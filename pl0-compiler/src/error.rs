//! Error types for the PL/0 compiler.

use crate::symbol_table::Scope;
use thiserror::Error;

/// Errors that abort code generation. The first one encountered is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// Name reused across incompatible kinds in the same scope.
    #[error("'{name}' is already declared with a different kind in {scope}")]
    Redeclaration { name: String, scope: Scope },

    /// Identifier used without any applicable declaration.
    #[error("Undeclared identifier '{name}'")]
    Undeclared { name: String },

    /// Assignment or read into a constant.
    #[error("Cannot assign to constant '{name}'")]
    ConstantAssignment { name: String },

    /// Procedure used where a value is needed.
    #[error("'{name}' is a procedure and has no value")]
    NotAFunction { name: String },

    /// Call with the wrong number of arguments.
    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    /// `return` in a procedure or the main program.
    #[error("'return' is only allowed inside a function")]
    ReturnOutsideFunction,

    /// Two subprograms with the same name.
    #[error("Subprogram '{name}' is declared twice")]
    DuplicateSubprogram { name: String },

    /// No word address or frame offset left for a declaration.
    #[error("No address left to allocate '{name}'")]
    AddressSpaceExhausted { name: String },
}

impl CompileError {
    /// Create a redeclaration error.
    pub fn redeclaration(name: impl Into<String>, scope: Scope) -> Self {
        Self::Redeclaration {
            name: name.into(),
            scope,
        }
    }

    /// Create an undeclared identifier error.
    pub fn undeclared(name: impl Into<String>) -> Self {
        Self::Undeclared { name: name.into() }
    }

    /// Create an out-of-addresses error.
    pub fn address_space_exhausted(name: impl Into<String>) -> Self {
        Self::AddressSpaceExhausted { name: name.into() }
    }
}

/// Result type alias for code generation.
pub type Result<T> = std::result::Result<T, CompileError>;
