//! Compound commands and function definitions (`spec.md` §4.F's
//! `shell_command`/`function_def` productions). `case`, `select`, the
//! arithmetic forms, and coprocesses are recognized just far enough to be
//! reported `Unsupported` by [`super::command::parse_command`] — this
//! module only builds the forms this crate actually implements: subshells,
//! groups, `if`, `while`/`until`, `for`, and function definitions.

use super::command::parse_trailing_redirects;
use super::error::Result;
use super::Parser;
use crate::ast::{Node, NodeKind};
use crate::token::TokenKind;
use crate::word_expand;

fn reserved(text: &'static str, span: crate::source::Span) -> Node {
    Node::new(NodeKind::ReservedWord { word: text.into() }, span, Some(text.into()))
}

fn wrap_compound(parser: &mut Parser, list: Node, start: usize) -> Result<Node> {
    let redirects = parse_trailing_redirects(parser)?;
    let end = redirects.last().map_or(list.span.end, |r| r.span.end);
    let span = crate::source::Span::new(start, end);
    let slice = parser.slice(span);
    Ok(Node::new(
        NodeKind::Compound {
            list: Box::new(list),
            redirects,
        },
        span,
        Some(slice.into()),
    ))
}

/// `subshell → '(' compound_list ')'`.
pub(super) fn parse_subshell(parser: &mut Parser) -> Result<Node> {
    let open = parser.bump(true)?;
    let body = parser.parse_compound_list(&|k| k == TokenKind::RightParen)?;
    parser.expect(TokenKind::RightParen, false)?;
    wrap_compound(parser, body, open.span.start)
}

/// `group → '{' compound_list '}'`.
pub(super) fn parse_group(parser: &mut Parser) -> Result<Node> {
    let open = parser.bump(true)?;
    let body = parser.parse_compound_list(&|k| k == TokenKind::RightCurly)?;
    parser.expect(TokenKind::RightCurly, true)?;
    wrap_compound(parser, body, open.span.start)
}

/// `if_cmd → IF compound_list THEN compound_list [elif_clause | ELSE compound_list] FI`.
pub(super) fn parse_if(parser: &mut Parser) -> Result<Node> {
    let if_tok = parser.bump(true)?;
    let mut parts = vec![reserved("if", if_tok.span)];

    let cond = parser.parse_compound_list(&|k| k == TokenKind::Then)?;
    let then_tok = parser.expect(TokenKind::Then, true)?;
    let body = parser.parse_compound_list(&|k| matches!(k, TokenKind::Elif | TokenKind::Else | TokenKind::Fi))?;
    parts.push(cond);
    parts.push(reserved("then", then_tok.span));
    parts.push(body);

    loop {
        let tok = parser.peek(true)?;
        if tok.kind != TokenKind::Elif {
            break;
        }
        parser.bump(true)?;
        parts.push(reserved("elif", tok.span));
        let cond = parser.parse_compound_list(&|k| k == TokenKind::Then)?;
        let then_tok = parser.expect(TokenKind::Then, true)?;
        let body =
            parser.parse_compound_list(&|k| matches!(k, TokenKind::Elif | TokenKind::Else | TokenKind::Fi))?;
        parts.push(cond);
        parts.push(reserved("then", then_tok.span));
        parts.push(body);
    }

    let tok = parser.peek(true)?;
    if tok.kind == TokenKind::Else {
        parser.bump(true)?;
        parts.push(reserved("else", tok.span));
        let body = parser.parse_compound_list(&|k| k == TokenKind::Fi)?;
        parts.push(body);
    }

    let fi_tok = parser.expect(TokenKind::Fi, true)?;
    parts.push(reserved("fi", fi_tok.span));

    let span = parts[0].span.join(parts[parts.len() - 1].span);
    let node = Node::new(NodeKind::If { parts }, span, Some(parser.slice(span).into()));
    wrap_compound(parser, node, if_tok.span.start)
}

/// `WHILE compound_list DO compound_list DONE` / the `UNTIL` variant.
pub(super) fn parse_while(parser: &mut Parser, is_until: bool) -> Result<Node> {
    let head_tok = parser.bump(true)?;
    let keyword = if is_until { "until" } else { "while" };
    let mut parts = vec![reserved(keyword, head_tok.span)];

    let cond = parser.parse_compound_list(&|k| k == TokenKind::Do)?;
    let do_tok = parser.expect(TokenKind::Do, true)?;
    let body = parser.parse_compound_list(&|k| k == TokenKind::Done)?;
    let done_tok = parser.expect(TokenKind::Done, true)?;

    parts.push(cond);
    parts.push(reserved("do", do_tok.span));
    parts.push(body);
    parts.push(reserved("done", done_tok.span));

    let span = parts[0].span.join(parts[parts.len() - 1].span);
    let kind = if is_until {
        NodeKind::Until { parts }
    } else {
        NodeKind::While { parts }
    };
    let node = Node::new(kind, span, Some(parser.slice(span).into()));
    wrap_compound(parser, node, head_tok.span.start)
}

/// `for_cmd → FOR WORD [';'|NL] [IN word_list list_terminator] newline_list
/// (DO compound_list DONE | '{' compound_list '}')`.
pub(super) fn parse_for(parser: &mut Parser) -> Result<Node> {
    let for_tok = parser.bump(true)?;
    let mut parts = vec![reserved("for", for_tok.span)];

    let name_tok = parser.expect(TokenKind::Word, true)?;
    parts.push(word_expand::expand(parser, &name_tok)?);

    if parser.peek(false)?.kind == TokenKind::Semicolon {
        parser.bump(false)?;
    }
    parser.skip_newlines()?;

    if parser.peek(true)?.kind == TokenKind::In {
        let in_tok = parser.bump(true)?;
        parts.push(reserved("in", in_tok.span));
        loop {
            let tok = parser.peek(false)?;
            if !matches!(tok.kind, TokenKind::Word | TokenKind::AssignmentWord) {
                break;
            }
            parser.bump(false)?;
            parts.push(word_expand::expand(parser, &tok)?);
        }
        let term = parser.peek(true)?;
        if term.kind == TokenKind::Semicolon {
            parser.bump(true)?;
        }
        parser.skip_newlines()?;
    }

    let body = if parser.peek(true)?.kind == TokenKind::LeftCurly {
        let open = parser.bump(true)?;
        let body = parser.parse_compound_list(&|k| k == TokenKind::RightCurly)?;
        let close = parser.expect(TokenKind::RightCurly, true)?;
        let span = open.span.join(close.span);
        Node::new(
            NodeKind::Compound {
                list: Box::new(body),
                redirects: Vec::new(),
            },
            span,
            Some(parser.slice(span).into()),
        )
    } else {
        let do_tok = parser.expect(TokenKind::Do, true)?;
        let body = parser.parse_compound_list(&|k| k == TokenKind::Done)?;
        let done_tok = parser.expect(TokenKind::Done, true)?;
        parts.push(reserved("do", do_tok.span));
        parts.push(body);
        parts.push(reserved("done", done_tok.span));
        let span = parts[0].span.join(parts[parts.len() - 1].span);
        return wrap_compound(
            parser,
            Node::new(NodeKind::For { parts }, span, Some(parser.slice(span).into())),
            for_tok.span.start,
        );
    };
    parts.push(body);

    let span = parts[0].span.join(parts[parts.len() - 1].span);
    let node = Node::new(NodeKind::For { parts }, span, Some(parser.slice(span).into()));
    wrap_compound(parser, node, for_tok.span.start)
}

/// `FUNCTION WORD ['(' ')'] newline_list function_body`.
pub(super) fn parse_function(parser: &mut Parser) -> Result<Node> {
    let kw_tok = parser.bump(true)?;
    let name_tok = parser.expect(TokenKind::Word, true)?;
    if parser.peek(false)?.kind == TokenKind::LeftParen {
        parser.bump(false)?;
        parser.expect(TokenKind::RightParen, false)?;
    }
    parser.skip_newlines()?;
    let body = super::command::parse_command(parser)?;
    let span = kw_tok.span.join(body.span);
    Ok(Node::new(
        NodeKind::Function {
            parts: vec![reserved("function", kw_tok.span)],
            name: name_tok.text().into(),
            body: Box::new(body),
        },
        span,
        Some(parser.slice(span).into()),
    ))
}

/// `WORD '(' ')' newline_list function_body` (keyword-less shorthand).
pub(super) fn parse_function_no_keyword(parser: &mut Parser) -> Result<Node> {
    let name_tok = parser.bump(true)?;
    parser.expect(TokenKind::LeftParen, false)?;
    parser.expect(TokenKind::RightParen, false)?;
    parser.skip_newlines()?;
    let body = super::command::parse_command(parser)?;
    let span = name_tok.span.join(body.span);
    Ok(Node::new(
        NodeKind::Function {
            parts: vec![],
            name: name_tok.text().into(),
            body: Box::new(body),
        },
        span,
        Some(parser.slice(span).into()),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::{parse, ParseOptions};
    use crate::ast::NodeKind;

    #[test]
    fn subshell_wraps_its_body_in_compound() {
        let trees = parse("(echo hi)\n", ParseOptions::default()).unwrap();
        match &trees[0].kind {
            NodeKind::Compound { list, redirects } => {
                assert!(redirects.is_empty());
                assert!(matches!(list.kind, NodeKind::Command { .. }));
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn if_elif_else_builds_the_flat_parts_sequence() {
        let trees = parse("if foo; then bar; elif baz; then barbaz; else foobar; fi\n", ParseOptions::default()).unwrap();
        match &trees[0].kind {
            NodeKind::Compound { list, .. } => match &list.kind {
                NodeKind::If { parts } => assert_eq!(parts.len(), 11),
                other => panic!("expected if, got {other:?}"),
            },
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn while_loop_round_trips_its_source_slice() {
        let src = "while true; do echo hi; done\n";
        let trees = parse(src, ParseOptions::default()).unwrap();
        assert_eq!(trees[0].s.as_deref(), Some(src.trim_end_matches('\n')));
    }

    #[test]
    fn for_in_collects_the_word_list() {
        let trees = parse("for x in a b c; do echo $x; done\n", ParseOptions::default()).unwrap();
        match &trees[0].kind {
            NodeKind::Compound { list, .. } => match &list.kind {
                NodeKind::For { parts } => {
                    assert!(matches!(parts[2].kind, NodeKind::ReservedWord { .. }));
                    assert_eq!(parts.len(), 9);
                }
                other => panic!("expected for, got {other:?}"),
            },
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn function_definition_without_keyword() {
        let trees = parse("greet() { echo hi; }\n", ParseOptions::default()).unwrap();
        match &trees[0].kind {
            NodeKind::Function { name, .. } => assert_eq!(&**name, "greet"),
            other => panic!("expected function, got {other:?}"),
        }
    }
}
