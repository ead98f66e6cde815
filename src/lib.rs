//! A non-executing parser for the POSIX/Bash shell command language.
//!
//! This crate turns shell source text into a fully-positioned abstract
//! syntax tree: it tokenizes, recognizes the grammar (simple commands,
//! pipelines, AND-OR lists, compound commands, function definitions), and
//! expands each raw word into its quoted/parameter/tilde/substitution
//! parts. It never executes anything — no forks, no file descriptors, no
//! environment lookups. See [`parse`] for the entry point and
//! [`ParseOptions`] for what's configurable.
//!
//! Command and process substitutions (`$(...)`, `` `...` ``, `<(...)`,
//! `>(...)`) are parsed recursively: their interior becomes its own
//! sub-AST, reentering the same tokenizer and grammar driver rather than
//! being treated as opaque text. Arithmetic expansion/commands
//! (`$((...))`, `$[...]`, bare `((...))`) and a handful of recognized-but-
//! unimplemented compound forms (`case`, `select`, `coproc`, `time`,
//! conditional commands) are reported as [`parser::error::ParseErrorKind::Unsupported`]
//! rather than silently misparsed.

pub mod ast;
pub mod char_class;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
pub mod word_expand;

pub use ast::{Node, NodeKind, RedirectTarget};
pub use parser::error::{Error, ParseErrorKind, Result};
pub use parser::{parse, split, ParseOptions};
