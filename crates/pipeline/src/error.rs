//! Error types for the pipeline crate.
//!
//! - `ParseError`: a predicate could not be compiled. The filter record is
//!   rejected at load time.
//! - `EvalError`: a compiled predicate failed against one context. The
//!   engine treats this as "does not match" and moves on.
//! - `RegistryError`: a filter source could not be read at all.

use thiserror::Error;

/// A predicate that failed to compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at column {position}: {message}")]
pub struct ParseError {
    /// Byte offset into the predicate text
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// A runtime failure while evaluating a predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("function '{0}' is not defined")]
    UnknownFunction(String),

    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("{function}() expects {expected}, got {found}")]
    BadArgument {
        function: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

/// Hard failures while reading a filter source.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to open filter source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Convenience type alias for registry loading results
pub type Result<T> = std::result::Result<T, RegistryError>;
