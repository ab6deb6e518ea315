//! Expression parsing.
//!
//! There is no precedence table. An expression is read as a loop over a
//! single "previous operand" slot: primaries fill the slot, postfix forms
//! (`.name`, `[key]`, `(args)`) wrap it, and binary operators (`|`, `+`,
//! `-`, `*`, `/`, `^`) take it as their left operand and parse the entire
//! remainder of the expression as their right operand. The loop returns the
//! slot at the first terminator (`}}`, `)`, `]`, `}`, `,`).
//!
//! ```text
//! 2 * 3 + 4      =>  mul(2, add(3, 4))
//! a | f | g      =>  pipe[a, f, g]
//! a.b[0](x)      =>  call(index(member(a, b), 0), [x])
//! ```

use weft_lexer::token::{Token, TokenKind};
use weft_types::ast::*;
use weft_types::{ErrorCode, Span, TemplateError};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse one expression, stopping before its terminator.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, TemplateError> {
        let mut prev: Option<Expr> = None;
        loop {
            self.skip_whitespace();
            let Some(kind) = self.peek_kind() else {
                return Err(
                    self.error_at_current(ErrorCode::UNTERMINATED, "Expression not terminated")
                );
            };

            if kind.is_terminator() {
                return prev.ok_or_else(|| {
                    self.error_at_current(
                        ErrorCode::EXPECTED_EXPRESSION,
                        format!("Expected expression but got {kind}"),
                    )
                });
            }

            prev = Some(match (kind, prev) {
                (TokenKind::OpenTemplate, _) => {
                    return Err(self.error_at_current(
                        ErrorCode::TEMPLATE_OUTSIDE_STRING,
                        "Can only open templates inside strings",
                    ));
                }

                // ── Binary operators ──
                (TokenKind::Pipe, Some(left)) => self.parse_pipe(left)?,
                (k, Some(left)) if k.is_arithmetic() => self.parse_arithmetic(left)?,

                // ── Postfix forms ──
                (TokenKind::Dot, Some(base)) => self.parse_member(base)?,
                (TokenKind::LBracket, Some(base)) => self.parse_index(base)?,
                (TokenKind::LParen, Some(callee)) => self.parse_call(callee)?,

                (_, Some(_)) => {
                    return Err(self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Unexpected {kind} after a complete operand"),
                    ));
                }

                // ── Primaries ──
                (TokenKind::Identifier, None) => self.parse_reference()?,
                (TokenKind::Number, None) => self.parse_number()?,
                (TokenKind::Null, None) => self.parse_keyword(ExprKind::NullLit),
                (TokenKind::Undefined, None) => self.parse_keyword(ExprKind::UndefinedLit),
                (TokenKind::DoubleQuote | TokenKind::SingleQuote, None) => self.parse_quoted()?,
                (TokenKind::LParen, None) => self.parse_group()?,
                (TokenKind::LBracket, None) => self.parse_array()?,
                (TokenKind::LBrace, None) => self.parse_object()?,

                (TokenKind::Pipe | TokenKind::Dot, None) => {
                    return Err(self.error_at_current(
                        ErrorCode::EXPECTED_EXPRESSION,
                        format!("Expected expression before {kind}"),
                    ));
                }
                (k, None) if k.is_arithmetic() => {
                    return Err(self.error_at_current(
                        ErrorCode::EXPECTED_EXPRESSION,
                        format!("Expected expression before {kind}"),
                    ));
                }
                (_, None) => {
                    return Err(self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Unexpected {kind}"),
                    ));
                }
            });
        }
    }

    /// Parse an expression that must be followed by `close`, attributing an
    /// end-of-input failure to `open`.
    fn parse_enclosed(
        &mut self,
        open: &Token,
        close: TokenKind,
        unclosed: &str,
    ) -> Result<Expr, TemplateError> {
        let inner = self
            .parse_expression()
            .map_err(|e| self.unclosed(e, open, unclosed))?;
        self.skip_whitespace();
        self.expect(close)
            .map_err(|e| self.unclosed(e, open, unclosed))?;
        Ok(inner)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Binary Operators
    // ══════════════════════════════════════════════════════════════════════════

    /// `left | rest`: consecutive stages flatten into one pipe.
    fn parse_pipe(&mut self, left: Expr) -> Result<Expr, TemplateError> {
        self.advance();
        let right = self.parse_expression()?;
        let span = left.span.merge(right.span);
        let stages = match right.kind {
            ExprKind::Pipe(rest) => std::iter::once(left).chain(rest).collect(),
            _ => vec![left, right],
        };
        Ok(Expr::new(ExprKind::Pipe(stages), span))
    }

    /// `left op rest`: the right operand is the rest of the expression.
    fn parse_arithmetic(&mut self, left: Expr) -> Result<Expr, TemplateError> {
        let Some(token) = self.advance() else {
            return Err(self.error_at_current(ErrorCode::UNTERMINATED, "Expression not terminated"));
        };
        let op = match token.kind {
            TokenKind::Plus => ArithOp::Add,
            TokenKind::Minus => ArithOp::Sub,
            TokenKind::Star => ArithOp::Mul,
            TokenKind::Slash => ArithOp::Div,
            TokenKind::Pow => ArithOp::Pow,
            other => {
                return Err(self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("Expected arithmetic operator but got {other}"),
                    token.span,
                ));
            }
        };
        let right = self.parse_expression()?;
        let span = left.span.merge(right.span);
        Ok(Expr::new(
            ExprKind::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Postfix Forms
    // ══════════════════════════════════════════════════════════════════════════

    /// `base.name`: keywords are accepted as property names.
    fn parse_member(&mut self, base: Expr) -> Result<Expr, TemplateError> {
        self.advance();
        self.skip_whitespace();
        let token = match self.peek() {
            Some(t)
                if matches!(
                    t.kind,
                    TokenKind::Identifier | TokenKind::Null | TokenKind::Undefined
                ) =>
            {
                t.clone()
            }
            Some(t) => {
                return Err(self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("Expected property name after '.' but got {}", t.kind),
                    t.span,
                ));
            }
            None => {
                return Err(self.error_at_current(
                    ErrorCode::UNTERMINATED,
                    "Expected property name after '.' but reached end of input",
                ));
            }
        };
        self.advance();
        let span = base.span.merge(token.span);
        Ok(Expr::new(
            ExprKind::Member {
                base: Box::new(base),
                property: Ident::new(token.text, token.span),
            },
            span,
        ))
    }

    /// `base[key]`
    fn parse_index(&mut self, base: Expr) -> Result<Expr, TemplateError> {
        let Some(open) = self.advance() else {
            return Err(self.error_at_current(ErrorCode::UNTERMINATED, "Expression not terminated"));
        };
        let key = self.parse_enclosed(&open, TokenKind::RBracket, "Index not closed")?;
        let span = base.span.merge(self.previous_span());
        Ok(Expr::new(
            ExprKind::Index {
                base: Box::new(base),
                key: Box::new(key),
            },
            span,
        ))
    }

    /// `callee(arg, ...)`
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, TemplateError> {
        let Some(open) = self.advance() else {
            return Err(self.error_at_current(ErrorCode::UNTERMINATED, "Expression not terminated"));
        };
        let args = self.parse_list(&open, TokenKind::RParen, "Argument list not closed")?;
        let span = callee.span.merge(self.previous_span());
        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// Comma-separated expressions up to `close`. A trailing comma is allowed.
    fn parse_list(
        &mut self,
        open: &Token,
        close: TokenKind,
        unclosed: &str,
    ) -> Result<Vec<Expr>, TemplateError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(self.error_at(ErrorCode::UNTERMINATED, unclosed, open.span));
            }
            if self.eat(close) {
                return Ok(items);
            }

            let item = self
                .parse_expression()
                .map_err(|e| self.unclosed(e, open, unclosed))?;
            items.push(item);

            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(self.error_at(ErrorCode::UNTERMINATED, unclosed, open.span));
                }
                Some(t) if t.kind == TokenKind::Comma => {
                    self.advance();
                }
                Some(t) if t.kind == close => {}
                Some(t) => {
                    return Err(self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Expected ',' or {close} but got {}", t.kind),
                        t.span,
                    ));
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primaries
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_reference(&mut self) -> Result<Expr, TemplateError> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(Expr::new(ExprKind::Reference(token.text), token.span))
    }

    fn parse_number(&mut self) -> Result<Expr, TemplateError> {
        let token = self.expect(TokenKind::Number)?;
        let value: f64 = token.text.parse().map_err(|_| {
            self.error_at(
                ErrorCode::INVALID_TOKEN,
                format!("Invalid number '{}'", token.text),
                token.span,
            )
        })?;
        Ok(Expr::new(ExprKind::NumberLit(value), token.span))
    }

    fn parse_keyword(&mut self, kind: ExprKind) -> Expr {
        let span = self
            .advance()
            .map_or(Span::point(self.current_offset()), |t| t.span);
        Expr::new(kind, span)
    }

    /// `( expr )`: a group yields its inner expression unchanged.
    fn parse_group(&mut self) -> Result<Expr, TemplateError> {
        let open = self.expect(TokenKind::LParen)?;
        self.parse_enclosed(&open, TokenKind::RParen, "Group not closed")
    }

    /// `[ expr, ... ]`
    fn parse_array(&mut self) -> Result<Expr, TemplateError> {
        let open = self.expect(TokenKind::LBracket)?;
        let items = self.parse_list(&open, TokenKind::RBracket, "Array not terminated")?;
        let span = open.span.merge(self.previous_span());
        Ok(Expr::new(ExprKind::ArrayLit(items), span))
    }

    /// `{ name: expr, [expr]: expr, ... }`
    fn parse_object(&mut self) -> Result<Expr, TemplateError> {
        const UNCLOSED: &str = "Object not closed";
        let open = self.expect(TokenKind::LBrace)?;
        let mut properties = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(token) = self.peek().cloned() else {
                return Err(self.error_at(ErrorCode::UNTERMINATED, UNCLOSED, open.span));
            };

            let key = match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Identifier => {
                    self.advance();
                    PropertyKey::Const(Ident::new(token.text, token.span))
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_enclosed(&token, TokenKind::RBracket, "Key not closed")?;
                    PropertyKey::Dynamic(key)
                }
                other => {
                    return Err(self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Expected property name or '[' but got {other}"),
                        token.span,
                    ));
                }
            };

            self.skip_whitespace();
            self.expect(TokenKind::Colon)
                .map_err(|e| self.unclosed(e, &open, UNCLOSED))?;
            let value = self
                .parse_expression()
                .map_err(|e| self.unclosed(e, &open, UNCLOSED))?;
            properties.push(Property { key, value });

            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(self.error_at(ErrorCode::UNTERMINATED, UNCLOSED, open.span));
                }
                Some(t) if t.kind == TokenKind::Comma => {
                    self.advance();
                }
                Some(t) if t.kind == TokenKind::RBrace => {}
                Some(t) => {
                    return Err(self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Expected ',' or }} but got {}", t.kind),
                        t.span,
                    ));
                }
            }
        }

        let span = open.span.merge(self.previous_span());
        Ok(Expr::new(ExprKind::ObjectLit(properties), span))
    }
}
