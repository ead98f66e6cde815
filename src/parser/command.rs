//! `command` and `simple_command` productions (`spec.md` §4.F), plus the
//! redirect parsing (`spec.md` §4.E/§3's `redirect` node) shared by simple
//! and compound commands alike.

use super::error::{ParseErrorKind, Result};
use super::{compound, Parser};
use crate::ast::{Node, NodeKind, RedirectTarget};
use crate::token::{Token, TokenKind};
use crate::word_expand;

/// `command → simple_command | compound_command | function_definition`.
pub(super) fn parse_command(parser: &mut Parser) -> Result<Node> {
    let tok = parser.peek(true)?;
    match tok.kind {
        TokenKind::LeftCurly => compound::parse_group(parser),
        TokenKind::If => compound::parse_if(parser),
        TokenKind::While => compound::parse_while(parser, false),
        TokenKind::Until => compound::parse_while(parser, true),
        TokenKind::For => compound::parse_for(parser),
        TokenKind::Function => compound::parse_function(parser),
        TokenKind::Case => Err(parser.err(ParseErrorKind::Unsupported { construct: "case" }, tok.span)),
        TokenKind::Select => Err(parser.err(ParseErrorKind::Unsupported { construct: "select" }, tok.span)),
        TokenKind::CondStart => Err(parser.err(
            ParseErrorKind::Unsupported {
                construct: "conditional command",
            },
            tok.span,
        )),
        TokenKind::LeftParen => {
            if arith_command_follows(parser)? {
                Err(parser.err(
                    ParseErrorKind::Unsupported {
                        construct: "arithmetic command",
                    },
                    tok.span,
                ))
            } else {
                compound::parse_subshell(parser)
            }
        }
        TokenKind::Word => {
            if function_header_follows(parser)? {
                compound::parse_function_no_keyword(parser)
            } else {
                parse_simple_command(parser)
            }
        }
        _ => parse_simple_command(parser),
    }
}

/// Tentatively looks past a `(` for an immediately adjacent second `(`
/// (no blank in between), the only shape `((...))` as a bare command can
/// take. Leaves the lexer positioned exactly where it found it.
fn arith_command_follows(parser: &mut Parser) -> Result<bool> {
    let mark = parser.mark();
    let first = parser.bump(true)?;
    let next = parser.peek(false)?;
    let result = next.kind == TokenKind::LeftParen && next.span.start == first.span.end;
    parser.reset_to(mark);
    Ok(result)
}

/// Tentatively looks past a bare `NAME` for `( )` with nothing between the
/// parens, the function-definition shorthand that skips the `function`
/// keyword.
fn function_header_follows(parser: &mut Parser) -> Result<bool> {
    let mark = parser.mark();
    parser.bump(true)?;
    let open = parser.peek(false)?;
    let result = if open.kind == TokenKind::LeftParen {
        parser.bump(false)?;
        parser.peek(false)?.kind == TokenKind::RightParen
    } else {
        false
    };
    parser.reset_to(mark);
    Ok(result)
}

/// `simple_command → (redirect | assignment_word)* word (redirect | word)*`
/// with at least one `word` or `assignment_word` (`spec.md` §3's `command`
/// node).
fn parse_simple_command(parser: &mut Parser) -> Result<Node> {
    let mut parts = Vec::new();
    let mut command_start = true;
    loop {
        if let Some(redirect) = try_parse_redirect(parser)? {
            parts.push(redirect);
            continue;
        }
        let tok = parser.peek(command_start)?;
        match tok.kind {
            TokenKind::Word | TokenKind::AssignmentWord => {
                parser.bump(command_start)?;
                parts.push(word_expand::expand(parser, &tok)?);
                command_start = false;
            }
            _ => break,
        }
    }
    if parts.is_empty() {
        let tok = parser.peek(command_start)?;
        return Err(parser.unexpected(&tok));
    }
    let span = parts[0].span.join(parts[parts.len() - 1].span);
    let slice = parser.slice(span);
    Ok(Node::new(NodeKind::Command { parts }, span, Some(slice.into())))
}

/// Collects zero or more redirects, e.g. the ones trailing a compound
/// command's terminator (`spec.md` §3: `Compound.redirects`).
pub(super) fn parse_trailing_redirects(parser: &mut Parser) -> Result<Vec<Node>> {
    let mut redirects = Vec::new();
    while let Some(redirect) = try_parse_redirect(parser)? {
        redirects.push(redirect);
    }
    Ok(redirects)
}

fn is_redirect_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessLess
            | TokenKind::LessLessMinus
            | TokenKind::LessLessLess
            | TokenKind::GreaterGreater
            | TokenKind::GreaterBar
            | TokenKind::LessAnd
            | TokenKind::GreaterAnd
            | TokenKind::LessGreater
            | TokenKind::AndGreater
            | TokenKind::AndGreaterGreater
    )
}

fn is_fd_duplication_operator(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::LessAnd | TokenKind::GreaterAnd)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Tries to consume one redirect at the current position: an optional
/// adjacent IO-number word (`2>file`, never a separate `NUMBER` token —
/// the lexer has no reason to distinguish a digit word from any other
/// until a redirect operator immediately follows it), a redirect operator,
/// and its operand.
fn try_parse_redirect(parser: &mut Parser) -> Result<Option<Node>> {
    let tok = parser.peek(false)?;
    if is_redirect_operator(tok.kind) {
        return Ok(Some(parse_redirect_from(parser, None)?));
    }
    if tok.kind == TokenKind::Word && is_all_digits(tok.text()) {
        let mark = parser.mark();
        parser.bump(false)?;
        let op = parser.peek(false)?;
        if is_redirect_operator(op.kind) && op.span.start == tok.span.end {
            return Ok(Some(parse_redirect_from(parser, Some(tok))?));
        }
        parser.reset_to(mark);
    }
    Ok(None)
}

fn parse_redirect_from(parser: &mut Parser, fd_word: Option<Token>) -> Result<Node> {
    let op_tok = parser.bump(false)?;
    let operand = parser.peek(false)?;
    let (output, operand_span) = match operand.kind {
        TokenKind::Dash => {
            parser.bump(false)?;
            (RedirectTarget::Fd(-1), operand.span)
        }
        TokenKind::Word if is_all_digits(operand.text()) && is_fd_duplication_operator(op_tok.kind) => {
            parser.bump(false)?;
            let fd: i32 = operand
                .text()
                .parse()
                .map_err(|_| parser.unexpected(&operand))?;
            (RedirectTarget::Fd(fd), operand.span)
        }
        TokenKind::Word => {
            parser.bump(false)?;
            let word_node = word_expand::expand(parser, &operand)?;
            (RedirectTarget::Word(Box::new(word_node)), operand.span)
        }
        _ => return Err(parser.unexpected(&operand)),
    };
    let input = fd_word
        .as_ref()
        .map(|t| t.text().parse::<i32>().map_err(|_| parser.unexpected(t)))
        .transpose()?;
    let start = fd_word.as_ref().map_or(op_tok.span.start, |t| t.span.start);
    let span = crate::source::Span::new(start, operand_span.end);
    let slice = parser.slice(span);
    Ok(Node::new(
        NodeKind::Redirect {
            input,
            r#type: op_tok.text().into(),
            output,
            heredoc: None,
        },
        span,
        Some(slice.into()),
    ))
}
