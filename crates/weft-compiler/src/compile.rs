//! The reactive compiler: template AST to stream-producing nodes.
//!
//! Compilation happens once per template. Each AST node becomes a [`Node`],
//! a closure that, given a [`Context`], wires up a fresh graph of cold
//! streams. Nothing runs until the returned stream is subscribed.
//!
//! Two combinators carry the whole design:
//! - `combine_latest` joins the streams of a node's children, so the node
//!   recomputes whenever any child emits;
//! - `switch_map` flattens a result that is itself live, so values produced
//!   by functions or property reads may be streams too.

use std::collections::BTreeMap;
use std::rc::Rc;

use weft_stream::Stream;
use weft_types::ast::{self, ArithOp, Expr, ExprKind, PropertyKey, StringPart};
use weft_types::{ErrorCode, SourceFile, Span, TemplateError};

use crate::context::Context;
use crate::function::HostError;
use crate::options::{CompileOptions, MissingProperty};
use crate::value::{Value, ValueStream};

/// A compiled expression: instantiates a stream graph against a context.
pub type Node = Rc<dyn Fn(&Context) -> ValueStream>;

/// Where a runtime error is reported.
#[derive(Clone)]
pub(crate) struct Site {
    source: Rc<SourceFile>,
    span: Span,
}

impl Site {
    pub(crate) fn new(source: Rc<SourceFile>, span: Span) -> Self {
        Self { source, span }
    }

    pub(crate) fn error(&self, code: ErrorCode, message: impl Into<String>) -> TemplateError {
        TemplateError::new(&self.source, code, message, self.span)
    }

    pub(crate) fn host_error(&self, error: &HostError) -> TemplateError {
        self.error(
            ErrorCode::HOST_FAILURE,
            format!("Host function failed: {error}"),
        )
    }

    pub(crate) fn offset(&self) -> usize {
        self.span.start
    }
}

/// Compiles AST nodes of one source file.
pub struct Compiler {
    source: Rc<SourceFile>,
    pub(crate) options: CompileOptions,
}

impl Compiler {
    pub fn new(source: Rc<SourceFile>) -> Self {
        Self::with_options(source, CompileOptions::default())
    }

    pub fn with_options(source: Rc<SourceFile>, options: CompileOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub(crate) fn site(&self, span: Span) -> Site {
        Site::new(self.source.clone(), span)
    }

    /// Compile a whole template. A template that is one region with no
    /// surrounding text yields that expression's stream unchanged.
    pub fn compile_template(&self, template: &ast::Template) -> Node {
        self.compile_parts(&template.parts)
    }

    /// Compile one expression. Dispatch is exhaustive over [`ExprKind`].
    pub fn compile_expr(&self, expr: &Expr) -> Node {
        match &expr.kind {
            ExprKind::NumberLit(n) => constant(Value::Number(*n)),
            ExprKind::NullLit => constant(Value::Null),
            ExprKind::UndefinedLit => constant(Value::Undefined),
            ExprKind::StringParts(parts) => self.compile_parts(parts),
            ExprKind::ArrayLit(items) => self.compile_array(items),
            ExprKind::ObjectLit(properties) => self.compile_object(properties),
            ExprKind::Reference(name) => self.compile_reference(name, expr.span),
            ExprKind::Member { base, property } => self.compile_member(base, property),
            ExprKind::Index { base, key } => self.compile_index(base, key),
            ExprKind::Call { callee, args } => self.compile_call(callee, args, expr.span),
            ExprKind::Pipe(stages) => self.compile_pipe(stages, expr.span),
            ExprKind::Arithmetic { op, left, right } => {
                self.compile_arithmetic(*op, left, right, expr.span)
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Literals
    // ══════════════════════════════════════════════════════════════════════════

    fn compile_parts(&self, parts: &[StringPart]) -> Node {
        if let Some(expr) = ast::single_expression(parts) {
            return self.compile_expr(expr);
        }
        if parts.iter().all(|p| matches!(p, StringPart::Literal(_))) {
            let text: String = parts
                .iter()
                .filter_map(|p| match p {
                    StringPart::Literal(s) => Some(s.as_str()),
                    StringPart::Expr(_) => None,
                })
                .collect();
            return constant(Value::String(text));
        }

        let nodes: Vec<Node> = parts
            .iter()
            .map(|part| match part {
                StringPart::Literal(text) => constant(Value::String(text.clone())),
                StringPart::Expr(expr) => self.compile_expr(expr),
            })
            .collect();
        Rc::new(move |ctx: &Context| {
            combine(&nodes, ctx).map(|values| {
                Value::String(values.iter().map(Value::to_text).collect())
            })
        })
    }

    fn compile_array(&self, items: &[Expr]) -> Node {
        if items.is_empty() {
            return constant(Value::Array(Vec::new()));
        }
        let nodes: Vec<Node> = items.iter().map(|e| self.compile_expr(e)).collect();
        Rc::new(move |ctx: &Context| combine(&nodes, ctx).map(Value::Array))
    }

    /// Keys and values are combined pairwise in declaration order; a later
    /// key overwrites an earlier one.
    fn compile_object(&self, properties: &[ast::Property]) -> Node {
        if properties.is_empty() {
            return constant(Value::Object(BTreeMap::new()));
        }
        let nodes: Vec<Node> = properties
            .iter()
            .flat_map(|property| {
                let key = match &property.key {
                    PropertyKey::Const(ident) => constant(Value::String(ident.name.clone())),
                    PropertyKey::Dynamic(expr) => self.compile_expr(expr),
                };
                [key, self.compile_expr(&property.value)]
            })
            .collect();
        Rc::new(move |ctx: &Context| {
            combine(&nodes, ctx).map(|values| {
                let mut object = BTreeMap::new();
                for pair in values.chunks(2) {
                    if let [key, value] = pair {
                        object.insert(key.to_text(), value.clone());
                    }
                }
                Value::Object(object)
            })
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Access
    // ══════════════════════════════════════════════════════════════════════════

    fn compile_reference(&self, name: &str, span: Span) -> Node {
        let name = name.to_string();
        let site = self.site(span);
        Rc::new(move |ctx: &Context| match ctx.get(&name) {
            Some(value) => value.clone().lift(),
            None => Stream::error(unbound(&site, &name)),
        })
    }

    fn compile_member(&self, base: &Expr, property: &ast::Ident) -> Node {
        let base = self.compile_expr(base);
        let key = Value::String(property.name.clone());
        let site = self.site(property.span);
        let policy = self.options.missing_property;
        Rc::new(move |ctx: &Context| {
            let key = key.clone();
            let site = site.clone();
            base(ctx).switch_map(move |object| read(&object, &key, policy, &site))
        })
    }

    fn compile_index(&self, base: &Expr, key: &Expr) -> Node {
        let nodes = vec![self.compile_expr(base), self.compile_expr(key)];
        let site = self.site(key.span);
        let policy = self.options.missing_property;
        Rc::new(move |ctx: &Context| {
            let site = site.clone();
            combine(&nodes, ctx).switch_map(move |values| match values.as_slice() {
                [object, key] => read(object, key, policy, &site),
                _ => Stream::of(Value::Undefined),
            })
        })
    }

    /// The callee and every argument are combined, so the call re-runs when
    /// any of them changes. A call without arguments still waits for the
    /// callee's first value.
    fn compile_call(&self, callee: &Expr, args: &[Expr], span: Span) -> Node {
        let nodes: Vec<Node> = std::iter::once(callee)
            .chain(args)
            .map(|e| self.compile_expr(e))
            .collect();
        let site = self.site(span);
        Rc::new(move |ctx: &Context| {
            let site = site.clone();
            combine(&nodes, ctx).switch_map(move |values| match values.split_first() {
                Some((Value::Function(f), args)) => match f.call(args) {
                    Ok(result) => result.lift(),
                    Err(e) => Stream::error(site.host_error(&e)),
                },
                Some((other, _)) => Stream::error(site.error(
                    ErrorCode::NOT_CALLABLE,
                    format!("Cannot call {}: not a function", other.type_name()),
                )),
                None => Stream::of(Value::Undefined),
            })
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arithmetic
    // ══════════════════════════════════════════════════════════════════════════

    fn compile_arithmetic(&self, op: ArithOp, left: &Expr, right: &Expr, span: Span) -> Node {
        let nodes = vec![self.compile_expr(left), self.compile_expr(right)];
        let site = self.site(span);
        Rc::new(move |ctx: &Context| {
            let site = site.clone();
            combine(&nodes, ctx).try_map(move |values| match values.as_slice() {
                [left, right] => arithmetic(op, left, right, &site),
                _ => Ok(Value::Undefined),
            })
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// A node emitting one fixed value.
pub(crate) fn constant(value: Value) -> Node {
    Rc::new(move |_: &Context| Stream::of(value.clone()))
}

/// Instantiate every node and combine their streams.
pub(crate) fn combine(nodes: &[Node], ctx: &Context) -> Stream<Vec<Value>, TemplateError> {
    Stream::combine_latest(nodes.iter().map(|node| node(ctx)).collect())
}

pub(crate) fn unbound(site: &Site, name: &str) -> TemplateError {
    site.error(
        ErrorCode::UNBOUND_REFERENCE,
        format!("Unbound reference '{name}'"),
    )
}

/// `object[key]` under the missing-property policy, lifted.
fn read(object: &Value, key: &Value, policy: MissingProperty, site: &Site) -> ValueStream {
    match (object.property(key), policy) {
        (Some(value), _) => value.lift(),
        (None, MissingProperty::Undefined) => Stream::of(Value::Undefined),
        (None, MissingProperty::Error) => Stream::error(site.error(
            ErrorCode::MISSING_PROPERTY,
            format!(
                "Property '{}' does not exist on {}",
                key.to_text(),
                object.type_name()
            ),
        )),
    }
}

/// Numbers use floating point semantics. `+` with a string operand joins
/// the text forms.
fn arithmetic(op: ArithOp, left: &Value, right: &Value, site: &Site) -> Result<Value, TemplateError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op.apply(*a, *b))),
        (Value::String(_), _) | (_, Value::String(_)) if op == ArithOp::Add => {
            Ok(Value::String(format!("{}{}", left.to_text(), right.to_text())))
        }
        _ => Err(site.error(
            ErrorCode::OPERAND_TYPE,
            format!(
                "Cannot apply '{op}' to {} and {}",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

/// Every name referenced anywhere in `parts`, in source order.
pub(crate) fn references(parts: &[StringPart]) -> Vec<(String, Span)> {
    let mut out = Vec::new();
    for part in parts {
        if let StringPart::Expr(expr) = part {
            collect_references(expr, &mut out);
        }
    }
    out
}

fn collect_references(expr: &Expr, out: &mut Vec<(String, Span)>) {
    match &expr.kind {
        ExprKind::NumberLit(_) | ExprKind::NullLit | ExprKind::UndefinedLit => {}
        ExprKind::Reference(name) => out.push((name.clone(), expr.span)),
        ExprKind::StringParts(parts) => out.extend(references(parts)),
        ExprKind::ArrayLit(items) => items.iter().for_each(|e| collect_references(e, out)),
        ExprKind::ObjectLit(properties) => {
            for property in properties {
                if let PropertyKey::Dynamic(key) = &property.key {
                    collect_references(key, out);
                }
                collect_references(&property.value, out);
            }
        }
        ExprKind::Member { base, .. } => collect_references(base, out),
        ExprKind::Index { base, key } => {
            collect_references(base, out);
            collect_references(key, out);
        }
        ExprKind::Call { callee, args } => {
            collect_references(callee, out);
            args.iter().for_each(|e| collect_references(e, out));
        }
        ExprKind::Pipe(stages) => stages.iter().for_each(|e| collect_references(e, out)),
        ExprKind::Arithmetic { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
    }
}
