//! Heredoc gathering (component E).
//!
//! Bodies are attached lazily: the grammar driver builds a `Redirect` node
//! for `<<`/`<<-` with `heredoc: None` and records `(strip_tabs)` against
//! it; the actual text is read by [`gather_in_tree`] once the driver
//! reaches the newline that terminates the current list (`spec.md` §4.E).
//! Rather than the original implementation's separate redirect stack
//! indexing back into the node graph, this walks the already-built tree
//! (a plain owned value, not a shared/interior-mutable one) to find the
//! pending redirects in left-to-right source order and fills them in.

use crate::ast::{Node, NodeKind, RedirectTarget};
use crate::source::Span;

/// The input ended before a heredoc's delimiter line was found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeredocEof {
    pub delimiter: Box<str>,
}

/// Reads the body of one heredoc from `text` starting at byte offset
/// `start` (the first byte after the newline that introduced the body).
///
/// Returns `(heredoc node, offset just past the delimiter line)`. In lax
/// mode (`strict = false`), reaching EOF before the delimiter yields
/// whatever was read instead of failing.
pub fn gather_one(
    text: &str,
    start: usize,
    delimiter: &str,
    strip_tabs: bool,
    strict: bool,
) -> Result<(Node, usize), HeredocEof> {
    let mut pos = start;
    let mut body_end = start;
    loop {
        let line_start = pos;
        let rest = &text[pos..];
        let newline_offset = rest.find('\n');
        let line_end_rel = newline_offset.map_or(rest.len(), |i| i + 1);
        let raw_line = &rest[..line_end_rel];
        let terminated = newline_offset.is_some();

        // A delimiter is only recognized on a properly newline-terminated
        // line; an unterminated remainder at EOF is just more body text,
        // even if its bytes happen to spell the delimiter (spec.md §8
        // scenario 6).
        if terminated {
            let stripped = if strip_tabs {
                raw_line.trim_start_matches('\t')
            } else {
                raw_line
            };
            let content = stripped.strip_suffix('\n').expect("terminated line ends with '\\n'");

            if content == delimiter {
                let body = text[start..body_end].to_string();
                let span = Span::new(start, line_start + line_end_rel);
                let node = Node::new(
                    NodeKind::Heredoc {
                        value: body.into_boxed_str(),
                    },
                    span,
                    Some(text[start..body_end].to_string().into_boxed_str()),
                );
                return Ok((node, line_start + line_end_rel));
            }
        }

        pos += line_end_rel;
        body_end = pos;

        if !terminated {
            // Reached EOF. Only an empty remainder means the delimiter was
            // never found at all; a non-empty unterminated remainder is
            // absorbed into the body instead of erroring.
            if raw_line.is_empty() && strict {
                return Err(HeredocEof {
                    delimiter: delimiter.into(),
                });
            }
            let span = Span::new(start, pos);
            let node = Node::new(
                NodeKind::Heredoc {
                    value: text[start..pos].to_string().into_boxed_str(),
                },
                span,
                Some(text[start..pos].to_string().into_boxed_str()),
            );
            return Ok((node, pos));
        }
    }
}

/// Walks `node` depth-first (in source order) looking for `Redirect` nodes
/// whose `type` is `<<` or `<<-` and whose `heredoc` slot is still empty,
/// gathering each one's body from `text` starting at `pos` and advancing
/// `pos` past it.
///
/// Called at each list-terminating newline with `node` set to the just-
/// completed top-level `list` (`spec.md` §4.E). A here-string (`<<<`) has
/// no separate body to gather — its word IS the input — so it is left
/// alone here.
pub fn gather_in_tree(text: &str, mut pos: usize, node: &mut Node, strict: bool) -> Result<usize, HeredocEof> {
    if let NodeKind::Redirect {
        r#type,
        output,
        heredoc,
        ..
    } = &mut node.kind
    {
        if heredoc.is_none() && (&**r#type == "<<" || &**r#type == "<<-") {
            let delimiter = match output {
                RedirectTarget::Word(word) => match &word.kind {
                    NodeKind::Word { word, .. } => word.clone(),
                    _ => unreachable!("heredoc delimiter is always a word node"),
                },
                RedirectTarget::Fd(_) => unreachable!("heredoc redirect always targets a word"),
            };
            let strip_tabs = &**r#type == "<<-";
            let (gathered, next_pos) = gather_one(text, pos, &delimiter, strip_tabs, strict)?;
            let gathered_span = gathered.span;
            *heredoc = Some(Box::new(gathered));
            node.span = node.span.join(gathered_span);
            pos = next_pos;
        }
    }
    for child in node.children_mut() {
        pos = gather_in_tree(text, pos, child, strict)?;
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_body_up_to_delimiter() {
        let text = "foo\nbar\nEOF\nnext";
        let (node, end) = gather_one(text, 0, "EOF", false, true).unwrap();
        match &node.kind {
            NodeKind::Heredoc { value } => assert_eq!(&**value, "foo\nbar\n"),
            _ => panic!("expected heredoc node"),
        }
        assert_eq!(&text[end..], "next");
    }

    #[test]
    fn strip_tabs_removes_leading_tabs_per_line() {
        let text = "\t\tfoo\n\tEOF\nrest";
        let (node, _) = gather_one(text, 0, "EOF", true, true).unwrap();
        match &node.kind {
            NodeKind::Heredoc { value } => assert_eq!(&**value, "foo\n"),
            _ => panic!("expected heredoc node"),
        }
    }

    #[test]
    fn eof_before_delimiter_is_fatal_in_strict_mode() {
        let text = "foo\nbar\n";
        let err = gather_one(text, 0, "EOF", false, true).unwrap_err();
        assert_eq!(&*err.delimiter, "EOF");
    }

    #[test]
    fn eof_before_delimiter_is_lax_in_non_strict_mode() {
        let text = "foo\nbar\n";
        let (node, end) = gather_one(text, 0, "EOF", false, false).unwrap();
        match &node.kind {
            NodeKind::Heredoc { value } => assert_eq!(&**value, "foo\nbar\n"),
            _ => panic!("expected heredoc node"),
        }
        assert_eq!(end, text.len());
    }

    #[test]
    fn gather_in_tree_fills_in_nested_redirect() {
        use crate::source::Span;

        let text = "a <<EOF\nfoo\nbar\nEOF\n";
        let word = |s: &str, span: Span| {
            Node::new(
                NodeKind::Word {
                    word: s.into(),
                    parts: vec![],
                },
                span,
                Some(s.into()),
            )
        };
        let redirect = Node::new(
            NodeKind::Redirect {
                input: None,
                r#type: "<<".into(),
                output: RedirectTarget::Word(Box::new(word("EOF", Span::new(4, 7)))),
                heredoc: None,
            },
            Span::new(2, 7),
            None,
        );
        let mut command = Node::new(
            NodeKind::Command {
                parts: vec![word("a", Span::new(0, 1)), redirect],
            },
            Span::new(0, 7),
            None,
        );
        let end = gather_in_tree(text, 8, &mut command, true).unwrap();
        assert_eq!(end, text.len());
        let NodeKind::Command { parts } = &command.kind else {
            unreachable!()
        };
        let NodeKind::Redirect { heredoc, .. } = &parts[1].kind else {
            unreachable!()
        };
        let heredoc = heredoc.as_ref().unwrap();
        match &heredoc.kind {
            NodeKind::Heredoc { value } => assert_eq!(&**value, "foo\nbar\n"),
            _ => panic!("expected heredoc node"),
        }
    }
}
