//! The word expansion analyzer (component G).
//!
//! Re-scans a raw `WORD`/`ASSIGNMENT_WORD` token's exact source text and
//! rebuilds it as a [`Node`] whose `word` field is the expansion-normalized
//! text (quotes stripped, parts concatenated) and whose `parts` names every
//! recognizable construct inside, each with its own precise span
//! (`spec.md` §4.G). Command and process substitutions recurse into the
//! grammar driver via [`crate::parser::Parser::parse_substitution`].

use crate::ast::{Node, NodeKind};
use crate::char_class::{is_identifier_continue, is_identifier_start, is_special_parameter};
use crate::lexer::matched_pair::{self, Unmatched};
use crate::parser::error::{Error, ParseErrorKind, Result};
use crate::parser::Parser;
use crate::source::Span;
use crate::token::{Token, TokenKind};

/// Whether the scanner is inside an unquoted stretch or the interior of a
/// `"..."`. Only these two contexts recurse through this module; `'...'`
/// and `$'...'` are copied as opaque literal runs by the caller instead.
#[derive(Clone, Copy, Eq, PartialEq)]
enum Ctx {
    Unquoted,
    Double,
}

/// Builds the `word`/`assignment` node for `token` (`spec.md` §4.G).
pub fn expand(parser: &Parser, token: &Token) -> Result<Node> {
    let text = parser.text();
    let span = token.span;
    let mut normalized = String::new();
    let mut parts = Vec::new();
    scan(parser, text, span.start, span.end, Ctx::Unquoted, true, &mut normalized, &mut parts)?;

    let kind = match token.kind {
        TokenKind::AssignmentWord => NodeKind::Assignment {
            word: normalized.into_boxed_str(),
            parts,
        },
        _ => NodeKind::Word {
            word: normalized.into_boxed_str(),
            parts,
        },
    };
    Ok(Node::new(kind, span, Some(text[span.start..span.end].into())))
}

fn unmatched(parser: &Parser, u: Unmatched) -> Error {
    parser.error(ParseErrorKind::from(u), Span::empty_at(u.opened_at))
}

/// Scans `text[pos..limit]`, appending literal bytes to `normalized` and
/// recognized constructs to `parts`, and returns the position just past
/// `limit` (scanning never stops early: every construct it recognizes is
/// fully contained within `limit`, since the caller only ever hands it a
/// region a matched-pair scan already delimited).
fn scan(
    parser: &Parser,
    text: &str,
    mut pos: usize,
    limit: usize,
    ctx: Ctx,
    mut word_start: bool,
    normalized: &mut String,
    parts: &mut Vec<Node>,
) -> Result<usize> {
    while pos < limit {
        let c = text[pos..].chars().next().expect("pos < limit implies a char remains");
        match c {
            '\\' if ctx == Ctx::Unquoted => {
                let next = next_boundary(text, pos + 1, limit);
                normalized.push_str(&text[pos + 1..next]);
                pos = next;
                word_start = false;
            }
            '\\' if ctx == Ctx::Double => {
                let escaped = text[pos + 1..].chars().next();
                match escaped {
                    Some(e @ ('$' | '`' | '"' | '\\' | '\n')) => {
                        let next = next_boundary(text, pos + 1, limit);
                        if e != '\n' {
                            normalized.push(e);
                        }
                        pos = next;
                    }
                    _ => {
                        normalized.push('\\');
                        pos += 1;
                    }
                }
                word_start = false;
            }
            '\'' if ctx == Ctx::Unquoted => {
                let close = matched_pair::scan_single_quote(text, pos + 1, pos).map_err(|u| unmatched(parser, u))?;
                normalized.push_str(&text[pos + 1..close]);
                pos = close + 1;
                word_start = false;
            }
            '"' => {
                let (close, _) = matched_pair::scan_double_quote(text, pos + 1, pos).map_err(|u| unmatched(parser, u))?;
                scan(parser, text, pos + 1, close, Ctx::Double, false, normalized, parts)?;
                pos = close + 1;
                word_start = false;
            }
            '`' => {
                let close = matched_pair::scan_backtick(text, pos + 1, pos).map_err(|u| unmatched(parser, u))?;
                let node = substitution_node(parser, text, Span::new(pos, close + 1), pos + 1, close, false)?;
                normalized.push_str(&text[pos..=close]);
                parts.push(node);
                pos = close + 1;
                word_start = false;
            }
            '$' => {
                pos = scan_dollar(parser, text, pos, limit, ctx, normalized, parts)?;
                word_start = false;
            }
            '~' if word_start && ctx == Ctx::Unquoted => {
                let mut tp = pos + 1;
                while tp < limit {
                    let c2 = text[tp..].chars().next().unwrap();
                    if c2 == '/' || c2 == ':' {
                        break;
                    }
                    tp += c2.len_utf8();
                }
                let value = &text[pos..tp];
                parts.push(Node::new(
                    NodeKind::Tilde { value: value.into() },
                    Span::new(pos, tp),
                    Some(value.into()),
                ));
                normalized.push_str(value);
                pos = tp;
                word_start = false;
            }
            '<' | '>' if ctx == Ctx::Unquoted && text[pos + 1..limit.min(text.len())].starts_with('(') => {
                let inner_start = pos + 2;
                let close = matched_pair::scan_dollar_paren(text, inner_start, pos + 1).map_err(|u| unmatched(parser, u))?;
                let node = substitution_node(parser, text, Span::new(pos, close + 1), inner_start, close, true)?;
                normalized.push_str(&text[pos..=close]);
                parts.push(node);
                pos = close + 1;
                word_start = false;
            }
            _ => {
                normalized.push(c);
                pos += c.len_utf8();
                word_start = ctx == Ctx::Unquoted && (c == '=' || c == ':');
            }
        }
    }
    Ok(pos)
}

fn next_boundary(text: &str, from: usize, limit: usize) -> usize {
    if from >= limit {
        return limit;
    }
    match text[from..limit.min(text.len())].chars().next() {
        Some(c) => from + c.len_utf8(),
        None => limit,
    }
}

/// Handles everything that can follow an unquoted `$`: `$(`, `$((`, `${`,
/// `$[`, `$'`, `$"`, a special/positional parameter, a named parameter, or
/// a bare `$` with nothing recognizable after it.
fn scan_dollar(
    parser: &Parser,
    text: &str,
    dollar_pos: usize,
    limit: usize,
    ctx: Ctx,
    normalized: &mut String,
    parts: &mut Vec<Node>,
) -> Result<usize> {
    let after = dollar_pos + 1;
    let next_char = text[after..limit.min(text.len())].chars().next();

    match next_char {
        Some('(') => {
            if text[after + 1..limit.min(text.len())].starts_with('(') {
                let inner_start = after + 2;
                let close = matched_pair::scan_double_paren(text, inner_start, after + 1).map_err(|u| unmatched(parser, u))?;
                let mut end = close + 1;
                if text[end..].starts_with(')') {
                    end += 1;
                }
                Err(parser.error(
                    ParseErrorKind::Unsupported {
                        construct: "arithmetic expansion",
                    },
                    Span::new(dollar_pos, end),
                ))
            } else {
                let inner_start = after + 1;
                let close = matched_pair::scan_dollar_paren(text, inner_start, after).map_err(|u| unmatched(parser, u))?;
                let node = substitution_node(parser, text, Span::new(dollar_pos, close + 1), inner_start, close, false)?;
                normalized.push_str(&text[dollar_pos..=close]);
                parts.push(node);
                Ok(close + 1)
            }
        }
        Some('{') => {
            let inner_start = after + 1;
            let close = matched_pair::scan_brace(text, inner_start, after).map_err(|u| unmatched(parser, u))?;
            let span = Span::new(dollar_pos, close + 1);
            let value = &text[inner_start..close];
            normalized.push_str(&text[span.start..span.end]);
            parts.push(Node::new(
                NodeKind::Parameter { value: value.into() },
                span,
                Some(text[span.start..span.end].into()),
            ));
            Ok(close + 1)
        }
        Some('[') => {
            let inner_start = after + 1;
            let close = matched_pair::scan_bracket(text, inner_start, after).map_err(|u| unmatched(parser, u))?;
            Err(parser.error(
                ParseErrorKind::Unsupported {
                    construct: "arithmetic expansion",
                },
                Span::new(dollar_pos, close + 1),
            ))
        }
        Some('\'') => {
            let inner_start = after + 1;
            let close = matched_pair::scan_dollar_single_quote(text, inner_start, after).map_err(|u| unmatched(parser, u))?;
            normalized.push_str(&text[inner_start..close]);
            Ok(close + 1)
        }
        Some('"') if ctx == Ctx::Unquoted => {
            let inner_start = after + 1;
            let (close, _) = matched_pair::scan_double_quote(text, inner_start, after).map_err(|u| unmatched(parser, u))?;
            scan(parser, text, inner_start, close, Ctx::Double, false, normalized, parts)?;
            Ok(close + 1)
        }
        Some(c) if is_special_parameter(c) => {
            let span = Span::new(dollar_pos, after + c.len_utf8());
            let value = &text[after..span.end];
            normalized.push_str(&text[span.start..span.end]);
            parts.push(Node::new(
                NodeKind::Parameter { value: value.into() },
                span,
                Some(text[span.start..span.end].into()),
            ));
            Ok(span.end)
        }
        Some(c) if c.is_ascii_digit() => {
            let span = Span::new(dollar_pos, after + c.len_utf8());
            let value = &text[after..span.end];
            normalized.push_str(&text[span.start..span.end]);
            parts.push(Node::new(
                NodeKind::Parameter { value: value.into() },
                span,
                Some(text[span.start..span.end].into()),
            ));
            Ok(span.end)
        }
        Some(c) if is_identifier_start(c) => {
            let mut end = after;
            while end < limit {
                match text[end..].chars().next() {
                    Some(c2) if is_identifier_continue(c2) => end += c2.len_utf8(),
                    _ => break,
                }
            }
            let span = Span::new(dollar_pos, end);
            let value = &text[after..end];
            normalized.push_str(&text[span.start..span.end]);
            parts.push(Node::new(
                NodeKind::Parameter { value: value.into() },
                span,
                Some(text[span.start..span.end].into()),
            ));
            Ok(end)
        }
        _ => {
            normalized.push('$');
            Ok(after)
        }
    }
}

/// Builds the `commandsubstitution`/`processsubstitution` node for a
/// construct whose full text spans `outer`, recursively parsing
/// `text[inner_start..inner_end]`. When the recursion's `effective_limit`
/// has already run out, the construct degrades to a plain `word` with
/// empty `parts` instead (`spec.md` §4.G, §8 scenario 8).
fn substitution_node(
    parser: &Parser,
    text: &str,
    outer: Span,
    inner_start: usize,
    inner_end: usize,
    is_process_sub: bool,
) -> Result<Node> {
    let raw = &text[outer.start..outer.end];
    match parser.parse_substitution(inner_start, inner_end, outer, is_process_sub)? {
        Some(command) => {
            let kind = if is_process_sub {
                NodeKind::ProcessSubstitution { command }
            } else {
                NodeKind::CommandSubstitution { command }
            };
            Ok(Node::new(kind, outer, Some(raw.into())))
        }
        None => Ok(Node::new(
            NodeKind::Word {
                word: raw.into(),
                parts: vec![],
            },
            outer,
            Some(raw.into()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use crate::token::{TokenFlags, TokenValue};

    fn word_token(text: &str, kind: TokenKind) -> Token {
        Token {
            kind,
            value: TokenValue::Text(text.into()),
            span: Span::new(0, text.len()),
            flags: TokenFlags::empty(),
        }
    }

    #[test]
    fn plain_word_has_no_parts() {
        let parser = Parser::new("abc", ParseOptions::default());
        let node = expand(&parser, &word_token("abc", TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { word, parts } => {
                assert_eq!(&*word, "abc");
                assert!(parts.is_empty());
            }
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn single_quotes_strip_but_do_not_recurse() {
        let src = "'$a'";
        let parser = Parser::new(src, ParseOptions::default());
        let node = expand(&parser, &word_token(src, TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { word, parts } => {
                assert_eq!(&*word, "$a");
                assert!(parts.is_empty());
            }
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn dollar_name_becomes_a_parameter_part() {
        let src = "$foo";
        let parser = Parser::new(src, ParseOptions::default());
        let node = expand(&parser, &word_token(src, TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { word, parts } => {
                assert_eq!(&*word, "$foo");
                assert_eq!(parts.len(), 1);
                match &parts[0].kind {
                    NodeKind::Parameter { value } => assert_eq!(&**value, "foo"),
                    other => panic!("expected parameter, got {other:?}"),
                }
            }
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn command_substitution_recurses_into_the_parser() {
        let src = "$(a b)";
        let parser = Parser::new(src, ParseOptions::default());
        let node = expand(&parser, &word_token(src, TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { parts, .. } => {
                assert_eq!(parts.len(), 1);
                match &parts[0].kind {
                    NodeKind::CommandSubstitution { command } => {
                        assert_eq!(command.len(), 1);
                    }
                    other => panic!("expected commandsubstitution, got {other:?}"),
                }
            }
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn expansion_limit_zero_yields_an_empty_word_placeholder() {
        let src = "$(a)";
        let options = ParseOptions {
            expansion_limit: Some(0),
            ..ParseOptions::default()
        };
        let parser = Parser::new(src, options);
        let node = expand(&parser, &word_token(src, TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { parts, .. } => match &parts[0].kind {
                NodeKind::Word { parts, .. } => assert!(parts.is_empty()),
                other => panic!("expected placeholder word, got {other:?}"),
            },
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn tilde_at_word_start_is_its_own_part() {
        let src = "~user/bin";
        let parser = Parser::new(src, ParseOptions::default());
        let node = expand(&parser, &word_token(src, TokenKind::Word)).unwrap();
        match node.kind {
            NodeKind::Word { word, parts } => {
                assert_eq!(&*word, "~user/bin");
                assert_eq!(parts.len(), 1);
                assert!(matches!(&parts[0].kind, NodeKind::Tilde { value } if &**value == "~user"));
            }
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_expansion_is_unsupported() {
        let src = "$((2+2))";
        let parser = Parser::new(src, ParseOptions::default());
        let err = expand(&parser, &word_token(src, TokenKind::Word)).unwrap_err();
        assert!(matches!(err.cause, ParseErrorKind::Unsupported { construct: "arithmetic expansion" }));
    }
}
