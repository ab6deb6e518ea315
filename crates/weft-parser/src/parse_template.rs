//! Template roots, `{{ expr }}` regions and quoted strings.
//!
//! The root and quoted strings share one shape: a run of literal text pieces
//! interleaved with embedded regions. Adjacent literal tokens are merged into
//! a single [`StringPart::Literal`] and escape sequences are resolved.

use weft_lexer::token::{unescape, Token, TokenKind};
use weft_types::ast::{Expr, ExprKind, StringPart, Template};
use weft_types::{ErrorCode, Span, TemplateError};

use crate::parser::Parser;

/// Accumulates literal text between embedded regions.
#[derive(Default)]
struct PartsBuilder {
    parts: Vec<StringPart>,
    text: String,
}

impl PartsBuilder {
    fn push_token(&mut self, token: &Token) {
        let resolved = match token.kind {
            TokenKind::Escape => unescape(&token.text),
            _ => None,
        };
        match resolved {
            Some(literal) => self.text.push_str(literal),
            None => self.text.push_str(&token.text),
        }
    }

    fn push_expr(&mut self, expr: Expr) {
        self.flush();
        self.parts.push(StringPart::Expr(expr));
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.parts
                .push(StringPart::Literal(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Vec<StringPart> {
        self.flush();
        self.parts
    }
}

impl<'src> Parser<'src> {
    /// Parse the whole token sequence as a template root. Every token outside
    /// a `{{ }}` region is literal text.
    pub(crate) fn parse_root(&mut self) -> Result<Template, TemplateError> {
        let mut builder = PartsBuilder::default();
        let end = self.source_len();

        while let Some(kind) = self.peek_kind() {
            if kind == TokenKind::OpenTemplate {
                let expr = self.parse_region()?;
                builder.push_expr(expr);
            } else if let Some(token) = self.advance() {
                builder.push_token(&token);
            }
        }

        Ok(Template {
            parts: builder.finish(),
            span: Span::new(0, end),
        })
    }

    /// `{{ expr }}`
    pub(crate) fn parse_region(&mut self) -> Result<Expr, TemplateError> {
        const UNCLOSED: &str = "Template not closed";
        let open = self.expect(TokenKind::OpenTemplate)?;
        let expr = self
            .parse_expression()
            .map_err(|e| self.unclosed(e, &open, UNCLOSED))?;
        self.skip_whitespace();
        self.expect(TokenKind::CloseTemplate)
            .map_err(|e| self.unclosed(e, &open, UNCLOSED))?;
        Ok(expr)
    }

    /// `"text {{ expr }} text"` or the single-quoted equivalent. Any token
    /// other than the matching quote or `{{` is literal text, so `}}` and the
    /// other quote character may appear unescaped.
    pub(crate) fn parse_quoted(&mut self) -> Result<Expr, TemplateError> {
        const UNCLOSED: &str = "String not closed";
        let Some(open) = self.advance() else {
            return Err(self.error_at_current(ErrorCode::UNTERMINATED, UNCLOSED));
        };
        let mut builder = PartsBuilder::default();

        loop {
            match self.peek_kind() {
                None => {
                    return Err(self.error_at(ErrorCode::UNTERMINATED, UNCLOSED, open.span));
                }
                Some(kind) if kind == open.kind => {
                    self.advance();
                    break;
                }
                Some(TokenKind::OpenTemplate) => {
                    let expr = self.parse_region()?;
                    builder.push_expr(expr);
                }
                Some(_) => {
                    if let Some(token) = self.advance() {
                        builder.push_token(&token);
                    }
                }
            }
        }

        let span = open.span.merge(self.previous_span());
        Ok(Expr::new(ExprKind::StringParts(builder.finish()), span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_adjacent_text() {
        let mut b = PartsBuilder::default();
        b.push_token(&Token::new(TokenKind::Text, Span::new(0, 2), "ab"));
        b.push_token(&Token::new(TokenKind::Escape, Span::new(2, 4), "\\\""));
        b.push_token(&Token::new(TokenKind::Identifier, Span::new(4, 5), "c"));
        assert_eq!(b.finish(), vec![StringPart::Literal("ab\"c".into())]);
    }

    #[test]
    fn test_builder_empty() {
        assert!(PartsBuilder::default().finish().is_empty());
    }
}
