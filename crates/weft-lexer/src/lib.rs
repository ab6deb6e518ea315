//! Weft lexer: converts template text into a token sequence.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{unescape, Token, TokenKind};

use weft_types::{SourceFile, TemplateError};

/// Lex a source file in one call.
pub fn tokenize(source_file: &SourceFile) -> Result<Vec<Token>, TemplateError> {
    Lexer::new(source_file).lex()
}
