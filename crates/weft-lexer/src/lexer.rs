//! Core Weft lexer: converts template text to a token sequence.
//!
//! The lexer is a table of rules tried in a fixed priority order. At every
//! position the first rule that matches wins, even if a later rule would
//! match more text. The matched text becomes one token and scanning resumes
//! after it. When no rule matches the lexer fails with E100.

use weft_types::{ErrorCode, SourceFile, Span, TemplateError};

use crate::token::{Token, TokenKind};

/// How a rule recognises its lexeme at the start of the remaining input.
#[derive(Clone, Copy)]
enum Rule {
    /// An exact string.
    Literal(&'static str),
    /// One of several exact strings, tried in order.
    AnyOf(&'static [&'static str]),
    /// A reserved word that must not continue into an identifier.
    Keyword(&'static str),
    /// A scanning function returning the matched byte length.
    Scan(fn(&str) -> Option<usize>),
}

impl Rule {
    fn match_len(self, rest: &str) -> Option<usize> {
        match self {
            Self::Literal(lit) => rest.starts_with(lit).then_some(lit.len()),
            Self::AnyOf(lits) => lits
                .iter()
                .find(|lit| rest.starts_with(**lit))
                .map(|lit| lit.len()),
            Self::Keyword(word) => {
                let tail = rest.strip_prefix(word)?;
                tail.chars()
                    .next()
                    .is_none_or(|c| !is_ident_continue(c))
                    .then_some(word.len())
            }
            Self::Scan(scan) => scan(rest).filter(|&n| n > 0),
        }
    }
}

/// The rule table, in priority order.
///
/// Keywords precede the identifier rule so that `null` and `undefined` are
/// reachable; the keyword rules check a word boundary so `nullable` still
/// lexes as an identifier. `**` is tried before `*`, and the number rule
/// precedes `-` so that `-1` is a single number token.
const RULES: &[(TokenKind, Rule)] = &[
    (TokenKind::Whitespace, Rule::Scan(scan_whitespace)),
    (TokenKind::OpenTemplate, Rule::Literal("{{")),
    (TokenKind::CloseTemplate, Rule::Literal("}}")),
    (TokenKind::Pipe, Rule::Literal("|")),
    (TokenKind::Comma, Rule::Literal(",")),
    (TokenKind::Null, Rule::Keyword("null")),
    (TokenKind::Undefined, Rule::Keyword("undefined")),
    (TokenKind::Identifier, Rule::Scan(scan_identifier)),
    (TokenKind::Number, Rule::Scan(scan_number)),
    (TokenKind::LParen, Rule::Literal("(")),
    (TokenKind::RParen, Rule::Literal(")")),
    (TokenKind::DoubleQuote, Rule::Literal("\"")),
    (TokenKind::SingleQuote, Rule::Literal("'")),
    (TokenKind::LBracket, Rule::Literal("[")),
    (TokenKind::RBracket, Rule::Literal("]")),
    (TokenKind::LBrace, Rule::Literal("{")),
    (TokenKind::RBrace, Rule::Literal("}")),
    (TokenKind::Colon, Rule::Literal(":")),
    (TokenKind::Pow, Rule::AnyOf(&["^", "**"])),
    (TokenKind::Star, Rule::Literal("*")),
    (TokenKind::Slash, Rule::Literal("/")),
    (TokenKind::Plus, Rule::Literal("+")),
    (TokenKind::Minus, Rule::Literal("-")),
    (TokenKind::Dot, Rule::Literal(".")),
    (TokenKind::Text, Rule::Scan(scan_text)),
    (
        TokenKind::Escape,
        Rule::AnyOf(&["\\\\", "\\\"", "\\'", "\\{{"]),
    ),
];

/// The Weft lexer.
///
/// Converts template text into a vector of [`Token`]s, stopping at the
/// first position no rule matches.
pub struct Lexer<'src> {
    /// Source file for text and error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into the source.
    pos: usize,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source_file,
            pos: 0,
        }
    }

    /// Lex the entire source into a token sequence.
    pub fn lex(mut self) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        while self.pos < self.source_file.source.len() {
            tokens.push(self.next_token()?);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, TemplateError> {
        let rest = &self.source_file.source[self.pos..];
        let (kind, len) = RULES
            .iter()
            .find_map(|(kind, rule)| rule.match_len(rest).map(|len| (*kind, len)))
            .ok_or_else(|| {
                TemplateError::new(
                    self.source_file,
                    ErrorCode::INVALID_TOKEN,
                    "Invalid token",
                    Span::point(self.pos),
                )
            })?;
        let span = Span::new(self.pos, self.pos + len);
        let token = Token::new(kind, span, &rest[..len]);
        self.pos += len;
        Ok(token)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Scanners
// ─────────────────────────────────────────────────────────────────────

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn scan_whitespace(rest: &str) -> Option<usize> {
    let len = rest
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(rest.len(), |(i, _)| i);
    Some(len)
}

fn scan_identifier(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return None,
    }
    let len = chars
        .find(|(_, c)| !is_ident_continue(*c))
        .map_or(rest.len(), |(i, _)| i);
    Some(len)
}

/// `-?[0-9]+(\.[0-9]+)?`
fn scan_number(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut len = usize::from(bytes.first() == Some(&b'-'));
    let whole = digits_from(len);
    if whole == 0 {
        return None;
    }
    len += whole;

    if bytes.get(len) == Some(&b'.') {
        let fraction = digits_from(len + 1);
        if fraction > 0 {
            len += 1 + fraction;
        }
    }
    Some(len)
}

/// Raw text: at least one character, never a backslash, ending right before
/// the next `{{`, quote or backslash, or at end of input.
fn scan_text(rest: &str) -> Option<usize> {
    if rest.starts_with('\\') {
        return None;
    }
    let len = rest
        .char_indices()
        .skip(1)
        .find(|(i, _)| {
            let tail = &rest[*i..];
            tail.starts_with("{{")
                || tail.starts_with('"')
                || tail.starts_with('\'')
                || tail.starts_with('\\')
        })
        .map_or(rest.len(), |(i, _)| i);
    Some(len)
}
