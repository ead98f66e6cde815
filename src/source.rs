//! Source code handed to the tokenizer and parser.
//!
//! The parser never owns the text it parses: it borrows a [`SourceBuffer`]
//! for the whole lifetime of a (possibly nested) parse. Every [`Span`]
//! produced anywhere — including inside a recursively parsed command or
//! process substitution — is a byte range into that same top-level buffer,
//! so spans compose without any translation step.

use std::fmt;
use std::rc::Rc;

pub mod pretty;

/// Half-open byte range `[start, end)` into a [`SourceBuffer`].
///
/// `Span`s nest: a child node's span always lies within its parent's. This
/// is the `Span` named throughout the data model; it replaces the original
/// implementation's `(start, end)` tuple positions with a named type.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    /// A zero-length span at `pos`, used for imaginary EOF positions.
    #[must_use]
    pub fn empty_at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the smallest span that contains both `self` and `other`.
    #[must_use]
    pub fn join(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `self` lies entirely within `other` (span-nesting invariant).
    #[must_use]
    pub fn is_nested_in(&self, other: Span) -> bool {
        other.start <= self.start && self.end <= other.end
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span::new(start, end)
    }
}

/// Origin of a stretch of source code.
///
/// Unlike a full shell implementation, this crate never substitutes
/// environment-dependent text (aliases, `eval`, …) back into the buffer, so
/// this enum only needs to record *why a nested parser ran*, for use in
/// diagnostics that cross a command/process substitution boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// The top-level input passed to [`crate::parse`].
    Main,
    /// Interior of a `$(...)` or `` `...` `` command substitution.
    CommandSubstitution { opening: Span },
    /// Interior of a `<(...)` or `>(...)` process substitution.
    ProcessSubstitution { opening: Span },
}

/// A position (or range) in the source, tagged with why that stretch of
/// source exists. Distinct from a [`Span`] in that it is what diagnostics
/// point at, while `Span` is what AST nodes carry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    pub span: Span,
    pub source: Rc<Source>,
}

impl Location {
    #[must_use]
    pub fn new(span: Span, source: Rc<Source>) -> Self {
        Location { span, source }
    }
}

/// Immutable source text plus byte-indexed slicing and line/column lookup.
///
/// This is component A ("Source Buffer") of the parser: everything else
/// borrows from it. Newlines are always LF; CR is not treated specially
/// (matching `spec.md` §4.A).
#[derive(Clone, Copy, Debug)]
pub struct SourceBuffer<'a> {
    text: &'a str,
}

impl<'a> SourceBuffer<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        SourceBuffer { text }
    }

    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Slices the buffer at a byte span.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds or splits a UTF-8 code point.
    /// The tokenizer only ever constructs spans on `char` boundaries, so
    /// this should never panic on output produced by this crate.
    #[must_use]
    pub fn slice(&self, span: Span) -> &'a str {
        &self.text[span.start..span.end]
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair.
    ///
    /// Column is counted in `char`s, not bytes, so it is meaningful for
    /// multi-byte UTF-8 source. Used only when `convert_pos` is requested.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (u64, u64) {
        let mut line: u64 = 1;
        let mut col: u64 = 1;
        for ch in self.text[..offset.min(self.text.len())].chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
