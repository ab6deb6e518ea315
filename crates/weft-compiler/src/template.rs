//! Compiled templates and one-shot resolution.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use weft_parser::parse_template;
use weft_types::ast;
use weft_types::{SourceFile, Span, TemplateError};

use crate::compile::{references, unbound, Compiler, Node, Site};
use crate::context::Context;
use crate::options::CompileOptions;
use crate::value::{Value, ValueStream};

/// A template compiled once and evaluated against any number of contexts.
pub struct Template {
    source: Rc<SourceFile>,
    ast: ast::Template,
    references: Vec<(String, Span)>,
    root: Node,
}

impl Template {
    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source.source
    }

    pub fn ast(&self) -> &ast::Template {
        &self.ast
    }

    /// `true` when the template is exactly one `{{ expr }}` region, in which
    /// case its values keep their native type instead of becoming text.
    pub fn is_single_expression(&self) -> bool {
        self.ast.single_expression().is_some()
    }

    /// Names the template reads from its context, in source order, each
    /// listed once.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.references {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Instantiate a fresh stream graph against `ctx`.
    ///
    /// Fails immediately with `E300` when a referenced name is not bound.
    /// Later failures arrive on the stream's error channel.
    pub fn evaluate(&self, ctx: &Context) -> Result<ValueStream, TemplateError> {
        if let Some((name, span)) = self.references.iter().find(|(name, _)| !ctx.contains(name)) {
            let site = Site::new(self.source.clone(), *span);
            return Err(unbound(&site, name));
        }
        debug!(
            references = self.references.len(),
            bindings = ctx.len(),
            "template evaluator instantiated"
        );
        Ok((self.root)(ctx))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source.source)
            .field("parts", &self.ast.parts.len())
            .finish()
    }
}

/// Compile with default options.
pub fn compile_template(source: &str) -> Result<Template, TemplateError> {
    compile_template_with(source, CompileOptions::default())
}

/// Lex, parse and compile `source`. Lex and parse errors abort here.
pub fn compile_template_with(
    source: &str,
    options: CompileOptions,
) -> Result<Template, TemplateError> {
    let source = Rc::new(SourceFile::new(source));
    let ast = parse_template(&source)?;
    let compiler = Compiler::with_options(source.clone(), options);
    let root = compiler.compile_template(&ast);
    let references = references(&ast.parts);
    debug!(
        len = source.len(),
        parts = ast.parts.len(),
        references = references.len(),
        "template compiled"
    );
    Ok(Template {
        source,
        ast,
        references,
        root,
    })
}

/// `true` when `text` contains a template region opener.
pub fn is_template(text: &str) -> bool {
    text.contains("{{")
}

/// Resolve the first value of `source` against `ctx`.
///
/// Text without `{{` passes through unchanged. `Ok(None)` means the template
/// depends on a live source that has not produced a value yet.
pub fn resolve_template(source: &str, ctx: &Context) -> Result<Option<Value>, TemplateError> {
    if !is_template(source) {
        return Ok(Some(Value::String(source.to_string())));
    }
    compile_template(source)?.evaluate(ctx)?.first_now().transpose()
}
