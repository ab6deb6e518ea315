//! Core parser infrastructure: token cursor, error reporting, helpers.

use weft_lexer::token::{Token, TokenKind};
use weft_types::ast::Template;
use weft_types::{ErrorCode, SourceFile, Span, TemplateError};

/// The Weft parser.
///
/// Consumes the token sequence produced by the lexer exactly once, left to
/// right, through a single cursor. There is no backtracking and no error
/// recovery: the first problem aborts the parse.
pub struct Parser<'src> {
    /// The token sequence.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token sequence and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Returns `true` once every token has been consumed.
    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token, or the source length at the end.
    pub(crate) fn current_offset(&self) -> usize {
        self.peek().map_or(self.source_file.len(), |t| t.span.start)
    }

    /// Length of the source in bytes.
    pub(crate) fn source_len(&self) -> usize {
        self.source_file.len()
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::point(0), |t| t.span)
    }

    /// Skip whitespace tokens.
    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek_kind() == Some(TokenKind::Whitespace) {
            self.pos += 1;
        }
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind and consume it.
    pub(crate) fn expect(&mut self, expected: TokenKind) -> Result<Token, TemplateError> {
        match self.tokens.get(self.pos).cloned() {
            Some(token) if token.kind == expected => {
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Expected {expected} but got {}", token.kind),
                token.span,
            )),
            None => Err(self.error_at_current(
                ErrorCode::UNTERMINATED,
                format!("Expected {expected} but reached end of input"),
            )),
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Build an error at the current token position.
    pub(crate) fn error_at_current(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> TemplateError {
        self.error_at(code, message, Span::point(self.current_offset()))
    }

    /// Build an error at a specific span.
    pub(crate) fn error_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> TemplateError {
        TemplateError::new(self.source_file, code, message, span)
    }

    /// Attribute a bare end-of-input failure to the construct opened by
    /// `open`, so the error points at the innermost unclosed opener.
    pub(crate) fn unclosed(
        &self,
        err: TemplateError,
        open: &Token,
        message: &str,
    ) -> TemplateError {
        if err.code == ErrorCode::UNTERMINATED && err.offset == self.source_file.len() {
            self.error_at(ErrorCode::UNTERMINATED, message, open.span)
        } else {
            err
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token sequence into a [`Template`].
    pub fn parse(mut self) -> Result<Template, TemplateError> {
        self.parse_root()
    }
}
