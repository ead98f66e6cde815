//! The grammar driver (component F) and the crate's top-level parse entry
//! points.
//!
//! `spec.md` §9 asks for the original LALR(1) table-driven recognizer to
//! become "a pure function of (tables, token stream, ctx)" with mutable
//! state confined to the ctx rather than smuggled into the driver itself.
//! There are no generated tables here: the productions in `spec.md` §4.F
//! are implemented directly as mutually recursive descent, which is an
//! equivalent (and, for this grammar, simpler) realization of the same
//! idea — the two LALR action-cell patches the original needed become
//! ordinary rule-ordering choices instead (see `DESIGN.md`).

mod command;
mod compound;
pub mod error;

use crate::ast::{Node, NodeKind};
use crate::lexer::{Lexer, LexicalError};
use crate::source::{Location, Source, Span};
use crate::token::{Token, TokenKind};
use error::{Error, ParseErrorKind, Result};
use std::rc::Rc;

/// Options accepted by [`crate::parse`] (`spec.md` §6).
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// When `false`, missing heredoc bodies degrade to partial ASTs
    /// instead of errors.
    pub strict: bool,
    /// When `true`, the caller wants byte spans converted to
    /// `((line, col), (line, col))` after parsing.
    pub convertpos: bool,
    /// Recursive parser instantiation depth limit for command/process
    /// substitutions. `None` is unbounded.
    pub expansion_limit: Option<u32>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: true,
            convertpos: false,
            expansion_limit: None,
        }
    }
}

/// The grammar driver. Holds everything that must mutate during one
/// (possibly nested) parse; the token production rules themselves only
/// ever read from `self.text`.
///
/// Reentrancy (`spec.md` §5) comes from never sharing a `Parser` between
/// concurrent parses: every nested command/process substitution builds an
/// entirely new instance via [`Parser::nested`], rather than resetting
/// shared mutable fields on one.
pub struct Parser<'a> {
    text: &'a str,
    lexer: Lexer<'a>,
    options: ParseOptions,
    source: Rc<Source>,
    lookahead: Option<(Token, bool)>,
    /// Signed remaining expansion depth. Unlike `options.expansion_limit`
    /// (the non-negative value the caller supplied), this is allowed to go
    /// negative: a parser instance is always created for an encountered
    /// substitution (so `spec.md` §8 scenario 8's instance count includes
    /// it), but one whose `effective_limit` is already negative has its
    /// `parse_program` call skipped — see `word_expand`.
    effective_limit: Option<i64>,
    /// Number of nested `Parser` instances created so far for command and
    /// process substitutions reachable from this parse, shared with every
    /// descendant so `spec.md` §8 scenario 8's count is accurate no matter
    /// how deep the recursion goes.
    parser_instances: Rc<std::cell::Cell<u32>>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the whole of `text`.
    #[must_use]
    pub fn new(text: &'a str, options: ParseOptions) -> Self {
        let effective_limit = options.expansion_limit.map(i64::from);
        Parser {
            text,
            lexer: Lexer::new(text),
            options,
            source: Rc::new(Source::Main),
            lookahead: None,
            effective_limit,
            parser_instances: Rc::new(std::cell::Cell::new(1)),
        }
    }

    /// Creates a parser over the interior `text[start..end]` of a command
    /// or process substitution found at `opening` (the substitution's own
    /// span), decrementing `effective_limit` for its own descendants.
    ///
    /// `text` is still the FULL top-level buffer (`spec.md` §5): only the
    /// lexer's bounds differ, so every span this sub-parser produces is
    /// already in top-level coordinates. Always counts as a new instance,
    /// even if the caller goes on to discard its output because
    /// `effective_limit` has gone negative.
    #[must_use]
    fn nested(&self, start: usize, end: usize, opening: Span, is_process_sub: bool) -> Self {
        self.parser_instances.set(self.parser_instances.get() + 1);
        let source = if is_process_sub {
            Source::ProcessSubstitution { opening }
        } else {
            Source::CommandSubstitution { opening }
        };
        Parser {
            text: self.text,
            lexer: Lexer::bounded(self.text, start, end),
            options: ParseOptions {
                strict: self.options.strict,
                convertpos: false,
                expansion_limit: self.options.expansion_limit,
            },
            source: Rc::new(source),
            lookahead: None,
            effective_limit: self.effective_limit.map(|n| n - 1),
            parser_instances: Rc::clone(&self.parser_instances),
        }
    }

    #[must_use]
    pub fn parser_instance_count(&self) -> u32 {
        self.parser_instances.get()
    }

    fn location(&self, span: Span) -> Location {
        Location::new(span, Rc::clone(&self.source))
    }

    fn err(&self, kind: ParseErrorKind, span: Span) -> Error {
        Error::new(kind, self.location(span))
    }

    /// Builds an [`Error`] anchored at `span` in this parser's coordinate
    /// space, for use by [`crate::word_expand`].
    #[must_use]
    pub(crate) fn error(&self, kind: ParseErrorKind, span: Span) -> Error {
        self.err(kind, span)
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.text[span.start..span.end]
    }

    /// Peeks the next token, lexing it under `command_start` context.
    /// Re-lexes from scratch if a prior peek used a different context
    /// (reserved-word and assignment-word recognition both depend on it).
    fn peek(&mut self, command_start: bool) -> Result<Token> {
        match &self.lookahead {
            Some((tok, cs)) if *cs == command_start => return Ok(tok.clone()),
            Some((tok, _)) => {
                self.lexer.rewind(tok.span.start);
                self.lookahead = None;
            }
            None => {}
        }
        let tok = self
            .lexer
            .next_token(command_start)
            .map_err(|LexicalError(u)| self.err(u.into(), Span::empty_at(u.opened_at)))?;
        self.lookahead = Some((tok.clone(), command_start));
        Ok(tok)
    }

    fn bump(&mut self, command_start: bool) -> Result<Token> {
        let tok = self.peek(command_start)?;
        self.lookahead = None;
        Ok(tok)
    }

    fn expect(&mut self, kind: TokenKind, command_start: bool) -> Result<Token> {
        let tok = self.peek(command_start)?;
        if tok.kind == kind {
            self.lookahead = None;
            Ok(tok)
        } else {
            Err(self.unexpected(&tok))
        }
    }

    fn unexpected(&self, tok: &Token) -> Error {
        if tok.kind == TokenKind::Eof {
            self.err(ParseErrorKind::UnexpectedEof, tok.span)
        } else {
            self.err(
                ParseErrorKind::UnexpectedToken {
                    found: tok.text().into(),
                },
                tok.span,
            )
        }
    }

    /// Snapshots the current read position (before or after a pending
    /// lookahead) so a tentative parse can be undone with [`Self::reset_to`].
    /// Used to disambiguate a leading `NAME (` as a function header versus
    /// an ordinary simple command, and `((` as an arithmetic command versus
    /// a subshell around a subshell.
    fn mark(&self) -> usize {
        match &self.lookahead {
            Some((tok, _)) => tok.span.start,
            None => self.lexer.position(),
        }
    }

    fn reset_to(&mut self, mark: usize) {
        self.lexer.rewind(mark);
        self.lookahead = None;
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.peek(true)?.kind == TokenKind::Newline {
            self.bump(true)?;
        }
        Ok(())
    }

    /// Parses every top-level `simple_list` in the buffer (`spec.md` §6's
    /// `parse`), gathering pending heredocs at each terminating newline.
    pub fn parse_program(&mut self) -> Result<Vec<Node>> {
        let mut trees = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.peek(true)?.kind == TokenKind::Eof {
                break;
            }
            let mut list = self.parse_list()?;
            let terminator = self.peek(true)?;
            if terminator.kind == TokenKind::Newline {
                self.bump(true)?;
                let pos = self.lexer.position();
                let end = self.gather_heredocs(&mut list, pos)?;
                self.lexer.set_position(end);
            }
            trees.push(list);
        }
        Ok(trees)
    }

    fn gather_heredocs(&mut self, list: &mut Node, pos: usize) -> Result<usize> {
        crate::lexer::heredoc::gather_in_tree(self.text, pos, list, self.options.strict).map_err(|e| {
            self.err(
                ParseErrorKind::HeredocEof {
                    delimiter: e.delimiter,
                },
                Span::empty_at(pos),
            )
        })
    }

    /// `simple_list1 → pipeline_command | simple_list1 op newline_list simple_list1`
    /// plus `simple_list`'s optional trailing `&`/`;` (`spec.md` §4.F).
    fn parse_list(&mut self) -> Result<Node> {
        self.parse_list_until(&|_| false)
    }

    /// Same production as [`Self::parse_list`], but also stops (without
    /// consuming) once a command is missing and the next token satisfies
    /// `stop` — the shape every compound-command body needs, since none of
    /// them terminate on EOF (`spec.md` §4.F: `if_cmd`, `WHILE ... DO`,
    /// `subshell`, `group`, ...).
    fn parse_list_until(&mut self, stop: &dyn Fn(TokenKind) -> bool) -> Result<Node> {
        let first = self.parse_pipeline_command()?;
        let mut parts = vec![first];
        loop {
            let tok = self.peek(false)?;
            if !matches!(
                tok.kind,
                TokenKind::AndAnd | TokenKind::OrOr | TokenKind::Ampersand | TokenKind::Semicolon
            ) {
                break;
            }
            let op_tok = self.bump(false)?;
            parts.push(Node::new(
                NodeKind::Operator {
                    op: op_tok.text().into(),
                },
                op_tok.span,
                Some(op_tok.text().into()),
            ));
            self.skip_newlines()?;
            let next = self.peek(true)?;
            if matches!(next.kind, TokenKind::Newline | TokenKind::Eof) || stop(next.kind) {
                break;
            }
            parts.push(self.parse_pipeline_command()?);
        }
        if parts.len() == 1 {
            return Ok(parts.pop().expect("checked len == 1"));
        }
        let span = parts[0].span.join(parts[parts.len() - 1].span);
        Ok(Node::new(NodeKind::List { parts }, span, Some(self.slice(span).into())))
    }

    /// `compound_list → newline_list term_list newline_list` (`spec.md`
    /// §4.F), gathering heredocs at each terminating newline exactly as
    /// [`Self::parse_program`] does at the top level. Stops, without
    /// consuming, once `stop` matches the next token — the closing
    /// keyword or bracket the caller is about to `expect`.
    fn parse_compound_list(&mut self, stop: &dyn Fn(TokenKind) -> bool) -> Result<Node> {
        self.skip_newlines()?;
        let mut trees = Vec::new();
        loop {
            if stop(self.peek(true)?.kind) {
                break;
            }
            let mut list = self.parse_list_until(stop)?;
            let terminator = self.peek(true)?;
            if terminator.kind == TokenKind::Newline {
                self.bump(true)?;
                let pos = self.lexer.position();
                let end = self.gather_heredocs(&mut list, pos)?;
                self.lexer.set_position(end);
            }
            trees.push(list);
            self.skip_newlines()?;
            if stop(self.peek(true)?.kind) {
                break;
            }
        }
        if trees.is_empty() {
            let tok = self.peek(true)?;
            return Err(self.unexpected(&tok));
        }
        if trees.len() == 1 {
            return Ok(trees.pop().expect("checked len == 1"));
        }
        let span = trees[0].span.join(trees[trees.len() - 1].span);
        Ok(Node::new(NodeKind::List { parts: trees }, span, Some(self.slice(span).into())))
    }

    /// `pipeline_command → pipeline | '!' pipeline_command | timespec pipeline_command`.
    fn parse_pipeline_command(&mut self) -> Result<Node> {
        let tok = self.peek(true)?;
        if tok.kind == TokenKind::Bang {
            self.bump(true)?;
            let inner = self.parse_pipeline_command()?;
            return self.wrap_pipeline_with_bang(tok, inner);
        }
        if matches!(tok.kind, TokenKind::Time) {
            return Err(self.err(
                ParseErrorKind::Unsupported {
                    construct: "time",
                },
                tok.span,
            ));
        }
        if tok.kind == TokenKind::Coproc {
            return Err(self.err(
                ParseErrorKind::Unsupported {
                    construct: "coproc",
                },
                tok.span,
            ));
        }
        self.parse_pipeline()
    }

    fn wrap_pipeline_with_bang(&mut self, bang: Token, inner: Node) -> Result<Node> {
        let bang_node = Node::new(
            NodeKind::ReservedWord { word: "!".into() },
            bang.span,
            Some("!".into()),
        );
        let span = bang.span.join(inner.span);
        let parts = match inner.kind {
            NodeKind::Pipeline { parts } => {
                let mut all = vec![bang_node];
                all.extend(parts);
                all
            }
            _ => vec![bang_node, inner],
        };
        Ok(Node::new(NodeKind::Pipeline { parts }, span, Some(self.slice(span).into())))
    }

    /// `pipeline → command | pipeline ('|'|'|&') newline_list pipeline`.
    fn parse_pipeline(&mut self) -> Result<Node> {
        let first = command::parse_command(self)?;
        let mut parts = vec![first];
        loop {
            let tok = self.peek(false)?;
            if !matches!(tok.kind, TokenKind::Bar | TokenKind::BarAnd) {
                break;
            }
            let pipe_tok = self.bump(false)?;
            parts.push(Node::new(NodeKind::Pipe, pipe_tok.span, Some(pipe_tok.text().into())));
            self.skip_newlines()?;
            parts.push(command::parse_command(self)?);
        }
        if parts.len() == 1 {
            return Ok(parts.pop().unwrap());
        }
        let span = parts[0].span.join(parts[parts.len() - 1].span);
        Ok(Node::new(NodeKind::Pipeline { parts }, span, Some(self.slice(span).into())))
    }

    /// Entry point used by the word-expansion analyzer (component G) to
    /// recursively parse the interior of `$(...)`/`` `...` ``/`<(...)`/
    /// `>(...)`.
    ///
    /// Always instantiates a child parser (`spec.md` §8 scenario 8 counts
    /// it), but only actually parses its interior when the child's
    /// `effective_limit` has not already run out; otherwise returns `None`
    /// and the caller falls back to representing the construct as a plain
    /// unexpanded word (`spec.md` §4.G: "do NOT recurse — emit a word
    /// child whose parts is empty").
    pub(crate) fn parse_substitution(
        &self,
        start: usize,
        end: usize,
        opening: Span,
        is_process_sub: bool,
    ) -> Result<Option<Vec<Node>>> {
        let mut child = self.nested(start, end, opening, is_process_sub);
        if matches!(child.effective_limit, Some(n) if n < 0) {
            return Ok(None);
        }
        child.parse_program().map(Some)
    }

    #[must_use]
    pub(crate) fn options(&self) -> &ParseOptions {
        &self.options
    }

    #[must_use]
    pub(crate) fn text(&self) -> &'a str {
        self.text
    }
}

/// Parses `source` into its top-level AST trees, one per newline-separated
/// `simple_list` (`spec.md` §6).
pub fn parse(source: &str, options: ParseOptions) -> Result<Vec<Node>> {
    let mut parser = Parser::new(source, options.clone());
    let mut trees = parser.parse_program()?;
    if options.convertpos {
        let buffer = crate::source::SourceBuffer::new(source);
        for tree in &mut trees {
            convert_positions(tree, &buffer);
        }
    }
    Ok(trees)
}

/// Shallow-tokenizes `source` into its `WORD` source strings (`spec.md`
/// §6's `split` convenience function).
pub fn split(source: &str) -> Vec<String> {
    let mut lexer = Lexer::new(source);
    let mut command_start = true;
    let mut words = Vec::new();
    loop {
        let Ok(tok) = lexer.next_token(command_start) else {
            break;
        };
        match tok.kind {
            TokenKind::Eof => break,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Ampersand => command_start = true,
            TokenKind::Word | TokenKind::AssignmentWord => {
                words.push(tok.text().to_string());
                command_start = false;
            }
            _ => command_start = false,
        }
    }
    words
}

/// Post-walks `node`, filling in `line_col` from `span` for every node in
/// the tree (`spec.md` §6's `convertpos`).
fn convert_positions(node: &mut Node, buffer: &crate::source::SourceBuffer) {
    node.line_col = Some((buffer.line_col(node.span.start), buffer.line_col(node.span.end)));
    for child in node.children_mut() {
        convert_positions(child, buffer);
    }
}
