//! AST node types for Weft templates.
//!
//! Every node carries a [`Span`] for error reporting. The tree is built once
//! by the parser and shared read-only by every evaluation of a compiled
//! template.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete template: literal text interleaved with `{{ expr }}` regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<StringPart>,
    pub span: Span,
}

impl Template {
    /// The lone expression of a template that is exactly one `{{ expr }}`
    /// region with no surrounding text.
    pub fn single_expression(&self) -> Option<&Expr> {
        single_expression(&self.parts)
    }
}

/// Returns the expression when `parts` is exactly one embedded expression.
pub fn single_expression(parts: &[StringPart]) -> Option<&Expr> {
    match parts {
        [StringPart::Expr(expr)] => Some(expr),
        _ => None,
    }
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`, `-1`, `3.14`
    NumberLit(f64),
    /// `null`
    NullLit,
    /// `undefined`
    UndefinedLit,
    /// `"text {{ expr }} text"`: an empty list is the empty string
    StringParts(Vec<StringPart>),
    /// `[expr, ...]`
    ArrayLit(Vec<Expr>),
    /// `{ name: expr, [expr]: expr, ... }`
    ObjectLit(Vec<Property>),

    // ── Access ──
    /// `name`
    Reference(String),
    /// `expr.name`
    Member { base: Box<Expr>, property: Ident },
    /// `expr[expr]`
    Index { base: Box<Expr>, key: Box<Expr> },
    /// `expr(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    // ── Operators ──
    /// `a | b | c`: always at least two stages
    Pipe(Vec<Expr>),
    /// `a + b`, `a ^ b`, ...
    Arithmetic {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// A part of a string literal or of the template root.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    /// Literal text segment, escapes already resolved.
    Literal(String),
    /// An embedded `{{ expr }}` region.
    Expr(Expr),
}

/// An entry in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
}

/// The key of an object literal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// `name: expr`
    Const(Ident),
    /// `[expr]: expr`
    Dynamic(Expr),
}

// ── Arithmetic Operators ──────────────────────────────────────────────────────

/// Arithmetic operators. None of them bind tighter than another: the right
/// operand always extends to the end of the enclosing expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl ArithOp {
    /// Apply the operator with ordinary floating point semantics.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Add => left + right,
            Self::Sub => left - right,
            Self::Mul => left * right,
            Self::Div => left / right,
            Self::Pow => left.powf(right),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Pow => write!(f, "^"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arith_apply() {
        assert_eq!(ArithOp::Add.apply(2.0, 3.0), 5.0);
        assert_eq!(ArithOp::Sub.apply(2.0, 3.0), -1.0);
        assert_eq!(ArithOp::Mul.apply(2.0, 3.0), 6.0);
        assert_eq!(ArithOp::Div.apply(3.0, 2.0), 1.5);
        assert_eq!(ArithOp::Pow.apply(2.0, 10.0), 1024.0);
        assert!(ArithOp::Div.apply(1.0, 0.0).is_infinite());
    }

    #[test]
    fn test_single_expression() {
        let expr = Expr::new(ExprKind::NumberLit(1.0), Span::new(3, 4));
        let single = Template {
            parts: vec![StringPart::Expr(expr.clone())],
            span: Span::new(0, 7),
        };
        assert_eq!(single.single_expression(), Some(&expr));

        let mixed = Template {
            parts: vec![StringPart::Literal("a".into()), StringPart::Expr(expr)],
            span: Span::new(0, 8),
        };
        assert_eq!(mixed.single_expression(), None);

        let text = Template {
            parts: vec![StringPart::Literal("a".into())],
            span: Span::new(0, 1),
        };
        assert_eq!(text.single_expression(), None);
    }
}
