//! Shared types for the Zen interpreter.
//!
//! This crate defines the AST node types, source spans and the error type
//! used across every stage of the pipeline (lexer, parser, evaluator).

mod error;
mod span;
pub mod ast;

pub use error::{ErrorKind, ZenError};
pub use span::{SourceFile, Span};

/// Result type used throughout the Zen interpreter.
pub type Result<T> = std::result::Result<T, ZenError>;
