//! Weft parser: converts a token sequence into a template AST.

mod parse_expr;
mod parse_template;
mod parser;

pub use parser::Parser;

use weft_types::ast::Template;
use weft_types::{SourceFile, TemplateError};

/// Lex and parse a source file in one call.
pub fn parse_template(source_file: &SourceFile) -> Result<Template, TemplateError> {
    let tokens = weft_lexer::tokenize(source_file)?;
    Parser::new(tokens, source_file).parse()
}
