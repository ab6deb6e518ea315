//! Structured templates: JSON documents whose string leaves may be templates.
//!
//! Every string containing `{{` is compiled into its own [`Template`]; all
//! other values are kept as constants. Evaluation combines the leaf streams
//! and rebuilds the document whenever any leaf emits.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use weft_stream::Stream;
use weft_types::TemplateError;

use crate::context::Context;
use crate::options::CompileOptions;
use crate::template::{compile_template_with, is_template, Template};
use crate::value::{Value, ValueStream};

#[derive(Debug)]
enum Shape {
    Constant(Value),
    /// Index into [`StructureTemplate::leaves`].
    Leaf(usize),
    Array(Vec<Shape>),
    Object(Vec<(String, Shape)>),
}

impl Shape {
    fn build(&self, leaves: &[Value]) -> Value {
        match self {
            Shape::Constant(value) => value.clone(),
            Shape::Leaf(index) => leaves.get(*index).cloned().unwrap_or_default(),
            Shape::Array(items) => Value::Array(items.iter().map(|s| s.build(leaves)).collect()),
            Shape::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, shape)| (key.clone(), shape.build(leaves)))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }
}

/// A compiled JSON document with template leaves.
#[derive(Debug)]
pub struct StructureTemplate {
    shape: Rc<Shape>,
    leaves: Vec<Template>,
}

impl StructureTemplate {
    /// Number of string leaves that are templates.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Instantiate every leaf against `ctx` and combine them into a stream
    /// of documents. A document without template leaves emits once.
    pub fn evaluate(&self, ctx: &Context) -> Result<ValueStream, TemplateError> {
        let shape = self.shape.clone();
        if self.leaves.is_empty() {
            return Ok(Stream::of(shape.build(&[])));
        }
        let streams = self
            .leaves
            .iter()
            .map(|leaf| leaf.evaluate(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stream::combine_latest(streams).map(move |values| shape.build(&values)))
    }
}

/// Compile a JSON document with default options.
pub fn compile_structure(json: &serde_json::Value) -> Result<StructureTemplate, TemplateError> {
    compile_structure_with(json, CompileOptions::default())
}

/// Compile a JSON document. The first leaf that fails to compile aborts.
pub fn compile_structure_with(
    json: &serde_json::Value,
    options: CompileOptions,
) -> Result<StructureTemplate, TemplateError> {
    let mut leaves = Vec::new();
    let shape = compile_shape(json, options, &mut leaves)?;
    debug!(leaves = leaves.len(), "structure compiled");
    Ok(StructureTemplate {
        shape: Rc::new(shape),
        leaves,
    })
}

fn compile_shape(
    json: &serde_json::Value,
    options: CompileOptions,
    leaves: &mut Vec<Template>,
) -> Result<Shape, TemplateError> {
    Ok(match json {
        serde_json::Value::String(text) if is_template(text) => {
            leaves.push(compile_template_with(text, options)?);
            Shape::Leaf(leaves.len() - 1)
        }
        serde_json::Value::Array(items) => Shape::Array(
            items
                .iter()
                .map(|item| compile_shape(item, options, leaves))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(map) => Shape::Object(
            map.iter()
                .map(|(key, value)| {
                    compile_shape(value, options, leaves).map(|shape| (key.clone(), shape))
                })
                .collect::<Result<_, _>>()?,
        ),
        other => Shape::Constant(Value::from(other.clone())),
    })
}

/// Resolve the first document `json` produces against `ctx`.
pub fn resolve_structure(
    json: &serde_json::Value,
    ctx: &Context,
) -> Result<Option<Value>, TemplateError> {
    compile_structure(json)?.evaluate(ctx)?.first_now().transpose()
}
