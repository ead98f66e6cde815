//! Depth-first visitor over an AST (component H's second half).
//!
//! One callback per kind, matching `spec.md` §4.H ("the visitor invokes one
//! callback per kind"). Returning `false` from a callback prunes descent
//! into that node's children; the default implementation always descends.

use super::node::{Node, NodeKind};

/// Per-kind callbacks over a [`Node`] tree.
///
/// Every method defaults to `true` (keep descending). Override only the
/// kinds you care about; [`walk`] handles recursion into `children()` for
/// you.
pub trait Visitor {
    fn visit_operator(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_reservedword(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_pipe(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_word(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_assignment(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_parameter(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_variable(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_tilde(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_heredoc(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_redirect(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_command(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_pipeline(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_list(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_compound(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_if(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_for(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_while(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_until(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_function(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_case(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_select(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_commandsubstitution(&mut self, _node: &Node) -> bool {
        true
    }
    fn visit_processsubstitution(&mut self, _node: &Node) -> bool {
        true
    }

    fn dispatch(&mut self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Operator { .. } => self.visit_operator(node),
            NodeKind::ReservedWord { .. } => self.visit_reservedword(node),
            NodeKind::Pipe => self.visit_pipe(node),
            NodeKind::Word { .. } => self.visit_word(node),
            NodeKind::Assignment { .. } => self.visit_assignment(node),
            NodeKind::Parameter { .. } => self.visit_parameter(node),
            NodeKind::Variable { .. } => self.visit_variable(node),
            NodeKind::Tilde { .. } => self.visit_tilde(node),
            NodeKind::Heredoc { .. } => self.visit_heredoc(node),
            NodeKind::Redirect { .. } => self.visit_redirect(node),
            NodeKind::Command { .. } => self.visit_command(node),
            NodeKind::Pipeline { .. } => self.visit_pipeline(node),
            NodeKind::List { .. } => self.visit_list(node),
            NodeKind::Compound { .. } => self.visit_compound(node),
            NodeKind::If { .. } => self.visit_if(node),
            NodeKind::For { .. } => self.visit_for(node),
            NodeKind::While { .. } => self.visit_while(node),
            NodeKind::Until { .. } => self.visit_until(node),
            NodeKind::Function { .. } => self.visit_function(node),
            NodeKind::Case { .. } => self.visit_case(node),
            NodeKind::Select { .. } => self.visit_select(node),
            NodeKind::CommandSubstitution { .. } => self.visit_commandsubstitution(node),
            NodeKind::ProcessSubstitution { .. } => self.visit_processsubstitution(node),
        }
    }
}

/// Walks `node` depth-first, calling `visitor`'s per-kind callback at each
/// node and descending into its children unless the callback returns
/// `false`.
///
/// A `Compound` node's `list` and `redirects` are not exposed through
/// `NodeKind::children` (they're named fields, not a `parts` list), so
/// `walk` descends into them explicitly.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) {
    if !visitor.dispatch(node) {
        return;
    }
    if let NodeKind::Compound { list, redirects } = &node.kind {
        walk(visitor, list);
        for redirect in redirects {
            walk(visitor, redirect);
        }
        return;
    }
    if let NodeKind::Redirect { output, heredoc, .. } = &node.kind {
        if let super::node::RedirectTarget::Word(word) = output {
            walk(visitor, word);
        }
        if let Some(heredoc) = heredoc {
            walk(visitor, heredoc);
        }
        return;
    }
    for child in node.kind.children() {
        walk(visitor, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{Node, NodeKind};
    use crate::source::Span;

    struct CountWords(usize);
    impl Visitor for CountWords {
        fn visit_word(&mut self, _node: &Node) -> bool {
            self.0 += 1;
            true
        }
    }

    #[test]
    fn walk_visits_nested_words() {
        let word = |s: &str| Node::new(NodeKind::Word { word: s.into(), parts: vec![] }, Span::new(0, 1), None);
        let list = Node::new(
            NodeKind::List {
                parts: vec![
                    Node::new(
                        NodeKind::Command {
                            parts: vec![word("a"), word("b")],
                        },
                        Span::new(0, 3),
                        None,
                    ),
                    Node::new(NodeKind::Operator { op: ";".into() }, Span::new(3, 4), None),
                    Node::new(
                        NodeKind::Command {
                            parts: vec![word("c")],
                        },
                        Span::new(5, 6),
                        None,
                    ),
                ],
            },
            Span::new(0, 6),
            None,
        );
        let mut counter = CountWords(0);
        walk(&mut counter, &list);
        assert_eq!(counter.0, 3);
    }

    struct StopAtCommand;
    impl Visitor for StopAtCommand {
        fn visit_command(&mut self, _node: &Node) -> bool {
            false
        }
    }

    #[test]
    fn returning_false_prunes_descent() {
        let word = Node::new(NodeKind::Word { word: "a".into(), parts: vec![] }, Span::new(0, 1), None);
        let command = Node::new(
            NodeKind::Command {
                parts: vec![word],
            },
            Span::new(0, 1),
            None,
        );
        let mut counter = CountWords(0);
        walk(&mut StopAtCommand, &command);
        walk(&mut counter, &command);
        assert_eq!(counter.0, 1);
    }
}
