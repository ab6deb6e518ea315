use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters shown on each side of an offset in a snippet.
pub const SNIPPET_RADIUS: usize = 38;

/// Source location span.
///
/// Offsets are byte offsets into the template source, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a single offset.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Holds the template text for error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub source: String,
}

impl SourceFile {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Format the window around `offset` with a caret under it.
    ///
    /// ```text
    /// `{{ a | }}`
    ///         ^
    /// ```
    ///
    /// The window spans [`SNIPPET_RADIUS`] characters on each side and every
    /// whitespace character is flattened to a space so the caret lines up.
    pub fn snippet(&self, offset: usize) -> String {
        let offset = clamp_to_boundary(&self.source, offset);
        let before: Vec<char> = self.source[..offset].chars().collect();
        let lead = before.len().min(SNIPPET_RADIUS);
        let window: String = before[before.len() - lead..]
            .iter()
            .copied()
            .chain(self.source[offset..].chars().take(SNIPPET_RADIUS))
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();
        // +1 for the opening backtick.
        let caret = format!("{}^", " ".repeat(lead + 1));
        format!("`{window}`\n{caret}")
    }
}

/// Largest char boundary at or below `offset`, clamped to the source length.
fn clamp_to_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
