//! Weft compiler: turns `{{ expr }}` templates into live value streams.
//!
//! ```text
//! source ─ tokenize ─▶ tokens ─ parse ─▶ AST ─ compile ─▶ Node
//! Node(context) ─▶ Stream<Value, TemplateError>
//! ```
//!
//! Any value in a context may be a [`Stream`]. Streams are lifted
//! transparently: an expression over a live value emits again whenever the
//! value changes, and a function result that is a stream is switched into.
//!
//! Entry points:
//! - [`compile_template`] and [`Template::evaluate`] for repeated evaluation;
//! - [`resolve_template`] for the first value of a one-off template;
//! - [`compile_structure`] and [`resolve_structure`] for JSON documents
//!   with template leaves.

mod compile;
mod context;
mod function;
mod options;
mod pipe;
mod structure;
mod template;
mod value;

pub use compile::{Compiler, Node};
pub use context::Context;
pub use function::{Function, HostError};
pub use options::{CompileOptions, MissingProperty, PipeErrorPolicy};
pub use structure::{compile_structure, compile_structure_with, resolve_structure, StructureTemplate};
pub use template::{
    compile_template, compile_template_with, is_template, resolve_template, Template,
};
pub use value::{Value, ValueStream};

pub use weft_lexer::tokenize;
pub use weft_parser::parse_template;
pub use weft_stream::{Event, Stream, Subject, Subscription, VirtualClock};
pub use weft_types::{ErrorCategory, ErrorCode, SourceFile, Span, TemplateError};
