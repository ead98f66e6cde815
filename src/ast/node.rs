//! The AST data model (component H).
//!
//! `spec.md` §9 calls for replacing the original implementation's dynamic
//! node record (a `kind` string plus an open attribute bag) with a closed
//! tagged union: one variant per `kind`, a shared [`Span`], and an optional
//! `s` holding the exact source slice. Pattern matching replaces attribute
//! lookups; [`super::visitor`] replaces the generic per-kind dispatch table.

use crate::source::Span;

/// Where a [`NodeKind::Redirect`] sends its output, or reads its input fd
/// from, when the operand is itself a file descriptor rather than a word.
#[derive(Clone, Debug, PartialEq)]
pub enum RedirectTarget {
    Word(Box<Node>),
    Fd(i32),
}

/// One AST node. Closed union over every shape `spec.md` §3's node table
/// names; `kind`-specific data lives in [`NodeKind`], with `span` and `s`
/// factored out since every kind carries them.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Exact source slice `input[span]`, when one was preserved.
    ///
    /// Synthetic nodes (e.g. an expansion-limited command substitution
    /// placeholder) may omit it; `spec.md` §8's round-trip invariant only
    /// applies where `s` is present.
    pub s: Option<Box<str>>,
    /// 1-based `((line, col), (line, col))` rendering of `span`, filled in
    /// by a post-walk when the caller asked for `convertpos` (`spec.md`
    /// §6); `None` otherwise. Kept alongside `span` rather than replacing
    /// it, since every other invariant (`is_nested_in`, slicing) is stated
    /// in byte offsets.
    pub line_col: Option<((u64, u64), (u64, u64))>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, span: Span, s: Option<Box<str>>) -> Self {
        Node {
            kind,
            span,
            s,
            line_col: None,
        }
    }

    /// All direct children in source order, including the ones
    /// [`NodeKind::children`] omits because they live in named fields
    /// (`Compound::list`/`redirects`, `Function::body`,
    /// `Redirect::output`/`heredoc`) rather than a generic `parts` list.
    ///
    /// Used by the heredoc gatherer, which must visit every node in the
    /// tree regardless of shape.
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.kind {
            NodeKind::Word { parts, .. } | NodeKind::Assignment { parts, .. } => {
                parts.iter_mut().collect()
            }
            NodeKind::Command { parts }
            | NodeKind::Pipeline { parts }
            | NodeKind::List { parts }
            | NodeKind::If { parts }
            | NodeKind::For { parts }
            | NodeKind::While { parts }
            | NodeKind::Until { parts }
            | NodeKind::Case { parts }
            | NodeKind::Select { parts } => parts.iter_mut().collect(),
            NodeKind::Function { parts, body, .. } => {
                let mut v: Vec<&mut Node> = parts.iter_mut().collect();
                v.push(body.as_mut());
                v
            }
            NodeKind::CommandSubstitution { command } | NodeKind::ProcessSubstitution { command } => {
                command.iter_mut().collect()
            }
            NodeKind::Compound { list, redirects } => {
                let mut v = vec![list.as_mut()];
                v.extend(redirects.iter_mut());
                v
            }
            NodeKind::Redirect { output, heredoc, .. } => {
                let mut v = Vec::new();
                if let RedirectTarget::Word(word) = output {
                    v.push(word.as_mut());
                }
                if let Some(heredoc) = heredoc {
                    v.push(heredoc.as_mut());
                }
                v
            }
            NodeKind::Operator { .. }
            | NodeKind::ReservedWord { .. }
            | NodeKind::Pipe
            | NodeKind::Parameter { .. }
            | NodeKind::Variable { .. }
            | NodeKind::Tilde { .. }
            | NodeKind::Heredoc { .. } => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Operator {
        op: Box<str>,
    },
    ReservedWord {
        word: Box<str>,
    },
    Pipe,
    Word {
        /// Expansion-normalized text (quotes stripped, parts concatenated).
        word: Box<str>,
        parts: Vec<Node>,
    },
    /// Same shape as `Word`; distinguished only by `kind` so that callers
    /// can tell a plain word from the left-hand side of `NAME=value`.
    Assignment {
        word: Box<str>,
        parts: Vec<Node>,
    },
    /// Everything beginning with `$` (see `spec.md` §9's adopted
    /// convention); `value` excludes the leading `$`.
    Parameter {
        value: Box<str>,
    },
    /// Retained for documentation parity with the older `parameter`/
    /// `variable` split this crate's convention supersedes; never
    /// constructed (see `DESIGN.md`).
    Variable {
        value: Box<str>,
    },
    Tilde {
        value: Box<str>,
    },
    Heredoc {
        /// Raw, unexpanded body text.
        value: Box<str>,
    },
    Redirect {
        input: Option<i32>,
        /// Operator text, e.g. `">"`, `"<<"`, `"&>>"`.
        r#type: Box<str>,
        output: RedirectTarget,
        heredoc: Option<Box<Node>>,
    },
    Command {
        parts: Vec<Node>,
    },
    /// Alternating executable/`Pipe` parts, optionally prefixed by a single
    /// `!` `ReservedWord`.
    Pipeline {
        parts: Vec<Node>,
    },
    /// Alternating executable/`Operator` parts, starting with an
    /// executable.
    List {
        parts: Vec<Node>,
    },
    Compound {
        list: Box<Node>,
        redirects: Vec<Node>,
    },
    If {
        parts: Vec<Node>,
    },
    For {
        parts: Vec<Node>,
    },
    While {
        parts: Vec<Node>,
    },
    Until {
        parts: Vec<Node>,
    },
    Function {
        parts: Vec<Node>,
        name: Box<str>,
        body: Box<Node>,
    },
    Case {
        parts: Vec<Node>,
    },
    Select {
        parts: Vec<Node>,
    },
    CommandSubstitution {
        /// Top-level trees of the recursively parsed interior.
        command: Vec<Node>,
    },
    ProcessSubstitution {
        command: Vec<Node>,
    },
}

impl NodeKind {
    /// Lowercase kind name, matching `spec.md`'s table (e.g. for dumps and
    /// diagnostics).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Operator { .. } => "operator",
            NodeKind::ReservedWord { .. } => "reservedword",
            NodeKind::Pipe => "pipe",
            NodeKind::Word { .. } => "word",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Variable { .. } => "variable",
            NodeKind::Tilde { .. } => "tilde",
            NodeKind::Heredoc { .. } => "heredoc",
            NodeKind::Redirect { .. } => "redirect",
            NodeKind::Command { .. } => "command",
            NodeKind::Pipeline { .. } => "pipeline",
            NodeKind::List { .. } => "list",
            NodeKind::Compound { .. } => "compound",
            NodeKind::If { .. } => "if",
            NodeKind::For { .. } => "for",
            NodeKind::While { .. } => "while",
            NodeKind::Until { .. } => "until",
            NodeKind::Function { .. } => "function",
            NodeKind::Case { .. } => "case",
            NodeKind::Select { .. } => "select",
            NodeKind::CommandSubstitution { .. } => "commandsubstitution",
            NodeKind::ProcessSubstitution { .. } => "processsubstitution",
        }
    }

    /// Direct child nodes, in source order, for generic traversal.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            NodeKind::Word { parts, .. } | NodeKind::Assignment { parts, .. } => parts,
            NodeKind::Command { parts }
            | NodeKind::Pipeline { parts }
            | NodeKind::List { parts }
            | NodeKind::If { parts }
            | NodeKind::For { parts }
            | NodeKind::While { parts }
            | NodeKind::Until { parts }
            | NodeKind::Function { parts, .. }
            | NodeKind::Case { parts }
            | NodeKind::Select { parts } => parts,
            NodeKind::CommandSubstitution { command } | NodeKind::ProcessSubstitution { command } => {
                command
            }
            NodeKind::Operator { .. }
            | NodeKind::ReservedWord { .. }
            | NodeKind::Pipe
            | NodeKind::Parameter { .. }
            | NodeKind::Variable { .. }
            | NodeKind::Tilde { .. }
            | NodeKind::Heredoc { .. }
            | NodeKind::Redirect { .. }
            | NodeKind::Compound { .. } => &[],
        }
    }
}
