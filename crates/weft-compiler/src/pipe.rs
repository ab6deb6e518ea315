//! The pipe fold.
//!
//! `a | f | g` compiles every stage, combines the stage streams, and folds
//! each combined tuple left to right:
//!
//! 1. the first stage's value seeds the fold;
//! 2. a function followed by a function composes without calling anything;
//! 3. any other value is passed to the next stage, which must be a function;
//! 4. a result that is a stream suspends the fold: the pipe switches into
//!    that stream and resumes at the following stage for each of its values.
//!
//! A new tuple restarts the fold and, through `switch_map`, cancels whatever
//! the previous fold had suspended into. Under `DegradeToNull` an error ends
//! only the current fold, never the pipe.

use std::rc::Rc;

use tracing::warn;

use weft_stream::Stream;
use weft_types::ast::Expr;
use weft_types::{ErrorCode, Span, TemplateError};

use crate::compile::{combine, Compiler, Node, Site};
use crate::context::Context;
use crate::options::PipeErrorPolicy;
use crate::value::{Value, ValueStream};

impl Compiler {
    pub(crate) fn compile_pipe(&self, stages: &[Expr], span: Span) -> Node {
        let nodes: Vec<Node> = stages.iter().map(|e| self.compile_expr(e)).collect();
        let site = self.site(span);
        let policy = self.options.pipe_errors;

        Rc::new(move |ctx: &Context| {
            let site = site.clone();
            combine(&nodes, ctx).switch_map(move |tuple| {
                let stages: Rc<[Value]> = tuple.into();
                let seed = stages.first().cloned().unwrap_or_default();
                let folded = fold(stages, seed, 1, site.clone());
                match policy {
                    PipeErrorPolicy::Propagate => folded,
                    PipeErrorPolicy::DegradeToNull => degrade_to_null(&folded, site.offset()),
                }
            })
        })
    }
}

/// Replace an error of one fold with `null`. The stage streams stay
/// subscribed, so the next tuple folds again.
fn degrade_to_null(folded: &ValueStream, offset: usize) -> ValueStream {
    folded.catch_error(move |error: TemplateError| {
        warn!(offset, code = %error.code, message = %error.message, "pipe error degraded to null");
        Stream::of(Value::Null)
    })
}

/// Fold `current` through `stages[next..]`.
fn fold(stages: Rc<[Value]>, current: Value, next: usize, site: Site) -> ValueStream {
    if let Value::Stream(inner) = current {
        return inner.switch_map(move |value| fold(stages.clone(), value, next, site.clone()));
    }
    let Some(stage) = stages.get(next) else {
        return Stream::of(current);
    };
    match apply(&current, stage, &site) {
        Ok(value) => fold(stages.clone(), value, next + 1, site),
        Err(error) => Stream::error(error),
    }
}

/// One fold step.
fn apply(current: &Value, stage: &Value, site: &Site) -> Result<Value, TemplateError> {
    match (current, stage) {
        (Value::Function(first), Value::Function(second)) => {
            Ok(Value::Function(first.then(second)))
        }
        (_, Value::Function(f)) => f
            .call(std::slice::from_ref(current))
            .map_err(|e| site.host_error(&e)),
        (_, other) => Err(site.error(
            ErrorCode::PIPE_TYPE,
            format!(
                "Cannot pipe {} into {}: not a function",
                current.type_name(),
                other.type_name()
            ),
        )),
    }
}
