//! Shared types for the Weft template compiler.
//!
//! This crate defines the AST node types, source spans, the error type and
//! the error formatter used across all compiler stages.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, TemplateError};
pub use span::{SourceFile, Span, SNIPPET_RADIUS};

/// Result type used throughout the Weft compiler.
pub type Result<T> = std::result::Result<T, TemplateError>;
