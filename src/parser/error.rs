//! The error model (component I).
//!
//! A single [`Error`] struct wraps a [`ParseErrorKind`] and a [`Location`],
//! matching `spec.md` §7's "single error kind with (message, full-input,
//! byte-position)". Grounded on `yash-syntax`'s `SyntaxError` enum, whose
//! `message()`/`label()`/`related_location()` trio this crate keeps, and on
//! its [`MessageBase`](crate::source::pretty::MessageBase) impl for
//! turning an error into a diagnostic [`Message`](crate::source::pretty::Message).

use crate::lexer::matched_pair::Unmatched;
use crate::source::pretty::{Annotation, AnnotationType, MessageBase};
use crate::source::Location;
use std::borrow::Cow;
use thiserror::Error;

/// Taxonomy of things that can go wrong while parsing (`spec.md` §7).
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{}", self.message())]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// An unclosed `'`, `"`, `` ` ``, `$(`, `${`, `$[`, or `(`.
    UnmatchedDelimiter { expected: char, opened_at: usize },
    /// A token appeared where the grammar allows none.
    UnexpectedToken { found: Box<str> },
    /// Input ended where the grammar required another token.
    UnexpectedEof,
    /// A heredoc's delimiter line was never found.
    HeredocEof { delimiter: Box<str> },
    /// A recognized but unimplemented construct (`spec.md` §7.4): `case`,
    /// `select`, arithmetic commands/expansions, `coproc`, `time`.
    Unsupported { construct: &'static str },
}

impl ParseErrorKind {
    /// A one-line, human-readable message, matching the exact wording
    /// `spec.md` §4.I specifies at each construction site.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ParseErrorKind::UnmatchedDelimiter { expected, opened_at } => {
                format!("EOF when looking for matching {expected} (position {opened_at})")
            }
            ParseErrorKind::UnexpectedToken { found } => {
                format!("unexpected token '{found}'")
            }
            ParseErrorKind::UnexpectedEof => "unexpected EOF".to_string(),
            ParseErrorKind::HeredocEof { delimiter } => {
                format!("delimited by end-of-file (wanted '{delimiter}')")
            }
            ParseErrorKind::Unsupported { construct } => {
                format!("NotSupported: {construct}")
            }
        }
    }

    /// A short label for annotating the error location in a pretty-printed
    /// diagnostic.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::UnmatchedDelimiter { .. } => "unterminated here",
            ParseErrorKind::UnexpectedToken { .. } => "not valid here",
            ParseErrorKind::UnexpectedEof => "input ends here",
            ParseErrorKind::HeredocEof { .. } => "heredoc body never found its delimiter",
            ParseErrorKind::Unsupported { .. } => "not implemented by this parser",
        }
    }
}

impl From<Unmatched> for ParseErrorKind {
    fn from(u: Unmatched) -> Self {
        ParseErrorKind::UnmatchedDelimiter {
            expected: u.expected,
            opened_at: u.opened_at,
        }
    }
}

/// A parse failure: a [`ParseErrorKind`] plus where it happened.
///
/// Failures inside a nested command/process substitution surface through
/// this same type with `location` already expressed in the outer buffer's
/// coordinates, since every nested parse borrows a sub-slice of the same
/// top-level text (`spec.md` §5).
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    pub cause: ParseErrorKind,
    pub location: Location,
}

impl Error {
    #[must_use]
    pub fn new(cause: ParseErrorKind, location: Location) -> Self {
        Error { cause, location }
    }
}

impl MessageBase for Error {
    fn message_title(&self) -> Cow<'_, str> {
        Cow::Owned(self.cause.message())
    }

    fn main_annotation(&self) -> Annotation<'_> {
        Annotation::new(AnnotationType::Error, self.cause.label().into(), &self.location)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
