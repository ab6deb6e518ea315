//! Token types for the Weft lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the template language and
//! [`Token`], which pairs a kind with its source [`Span`] and text.

use weft_types::Span;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Weft lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
    /// The exact source text of the token.
    pub text: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// Byte offset of the first character.
    pub fn offset(&self) -> usize {
        self.span.start
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Run of whitespace characters.
    Whitespace,
    /// `{{`
    OpenTemplate,
    /// `}}`
    CloseTemplate,
    /// `|`
    Pipe,
    /// `,`
    Comma,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `name`, `first_name`, `item2`
    Identifier,
    /// `42`, `-1`, `3.14`
    Number,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `"`
    DoubleQuote,
    /// `'`
    SingleQuote,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `^` or `**`
    Pow,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `.`
    Dot,
    /// Raw text that no other rule claims, up to the next quote, backslash
    /// or `{{`.
    Text,
    /// `\\`, `\"`, `\'` or `\{{`
    Escape,
}

impl TokenKind {
    /// Tokens that end an expression without being part of it.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::RBrace | Self::RParen | Self::RBracket | Self::Comma | Self::CloseTemplate
        )
    }

    /// Arithmetic operator tokens.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Pow | Self::Star | Self::Slash | Self::Plus | Self::Minus
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace => write!(f, "whitespace"),
            Self::OpenTemplate => write!(f, "{{{{"),
            Self::CloseTemplate => write!(f, "}}}}"),
            Self::Pipe => write!(f, "|"),
            Self::Comma => write!(f, ","),
            Self::Null => write!(f, "null"),
            Self::Undefined => write!(f, "undefined"),
            Self::Identifier => write!(f, "identifier"),
            Self::Number => write!(f, "number"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::DoubleQuote => write!(f, "\""),
            Self::SingleQuote => write!(f, "'"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::Colon => write!(f, ":"),
            Self::Pow => write!(f, "^"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Dot => write!(f, "."),
            Self::Text => write!(f, "text"),
            Self::Escape => write!(f, "escape sequence"),
        }
    }
}

/// Resolve an escape token's text to the literal it stands for.
pub fn unescape(text: &str) -> Option<&'static str> {
    match text {
        "\\\\" => Some("\\"),
        "\\\"" => Some("\""),
        "\\'" => Some("'"),
        "\\{{" => Some("{{"),
        _ => None,
    }
}
