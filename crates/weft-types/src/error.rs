use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lex,
    Syntax,
    Binding,
    Property,
    Type,
    Host,
}

/// Numeric error code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lex errors (E100–E199) ──
    pub const INVALID_TOKEN: Self = Self(100);

    // ── Syntax errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const UNTERMINATED: Self = Self(201);
    pub const EXPECTED_EXPRESSION: Self = Self(202);
    pub const TEMPLATE_OUTSIDE_STRING: Self = Self(203);

    // ── Binding errors (E300–E309) ──
    pub const UNBOUND_REFERENCE: Self = Self(300);

    // ── Property errors (E310–E399) ──
    pub const MISSING_PROPERTY: Self = Self(310);

    // ── Type errors (E400–E499) ──
    pub const PIPE_TYPE: Self = Self(400);
    pub const NOT_CALLABLE: Self = Self(401);
    pub const OPERAND_TYPE: Self = Self(402);

    // ── Host errors (E500–E599) ──
    pub const HOST_FAILURE: Self = Self(500);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lex,
            200..=299 => ErrorCategory::Syntax,
            300..=309 => ErrorCategory::Binding,
            310..=399 => ErrorCategory::Property,
            400..=499 => ErrorCategory::Type,
            _ => ErrorCategory::Host,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lex"),
            Self::Syntax => write!(f, "syntax"),
            Self::Binding => write!(f, "binding"),
            Self::Property => write!(f, "property"),
            Self::Type => write!(f, "type"),
            Self::Host => write!(f, "host"),
        }
    }
}

/// A structured Weft error.
///
/// Raised synchronously by the lexer and parser, and delivered on a stream's
/// error channel once evaluation is underway. `snippet` is the formatted
/// source window from [`SourceFile::snippet`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("At {offset}; {message}\n{snippet}")]
pub struct TemplateError {
    /// Error code (e.g., E300).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Byte offset into the template source.
    pub offset: usize,
    /// Source window with a caret under `offset`.
    pub snippet: String,
}

impl TemplateError {
    /// Create a new error pointing at `span.start` in `source`.
    pub fn new(source: &SourceFile, code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            offset: span.start,
            snippet: source.snippet(span.start),
        }
    }

    pub fn is_lex(&self) -> bool {
        self.category == ErrorCategory::Lex
    }

    pub fn is_syntax(&self) -> bool {
        self.category == ErrorCategory::Syntax
    }
}
