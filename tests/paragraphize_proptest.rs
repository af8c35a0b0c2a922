//! Property-based tests for paragraphize
//!
//! Raw trees are generated the way the parsers emit them: sibling Blobs of inline nodes and
//! ParBreaks mixed with block nodes, in problems, subproblems and solutions.

use panprob::postprocessors::paragraphize;
use panprob::{Node, NodeKind};
use proptest::prelude::*;

fn inline_strategy() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => ("[a-z \t\n]{0,12}", any::<bool>(), any::<bool>())
            .prop_map(|(text, bold, italic)| Node::styled_text(text, bold, italic)),
        2 => Just(Node::par_break()),
        1 => "[a-z]{1,4}".prop_map(Node::inline_math),
        1 => "[a-z]{1,4}".prop_map(|code| Node::inline_code("text", code)),
    ]
}

fn blob_strategy() -> impl Strategy<Value = Node> {
    prop::collection::vec(inline_strategy(), 0..8).prop_map(|inlines| Node::blob(inlines).unwrap())
}

fn body_strategy() -> impl Strategy<Value = Vec<Node>> {
    let block = prop_oneof![
        4 => blob_strategy(),
        1 => "[a-z]{1,4}".prop_map(Node::display_math),
        1 => Just(Node::image_file("a.png")),
    ];
    prop::collection::vec(block, 0..6)
}

fn problem_strategy() -> impl Strategy<Value = Node> {
    let child = prop_oneof![
        4 => body_strategy(),
        1 => body_strategy().prop_map(|body| vec![Node::solution(body).unwrap()]),
        1 => body_strategy().prop_map(|body| vec![Node::subproblem(body).unwrap()]),
    ];
    prop::collection::vec(child, 0..4)
        .prop_map(|parts| Node::problem(parts.into_iter().flatten()).unwrap())
}

fn paragraphs(tree: &Node) -> Vec<&Node> {
    tree.descendants()
        .filter(|node| node.kind() == NodeKind::Paragraph)
        .collect()
}

proptest! {
    #[test]
    fn leaves_no_blobs_or_breaks(tree in problem_strategy()) {
        let result = paragraphize(tree).unwrap();
        prop_assert!(!result.contains_kind(NodeKind::Blob));
        prop_assert!(!result.contains_kind(NodeKind::ParBreak));
        prop_assert!(result.validate().is_ok());
    }

    #[test]
    fn is_idempotent(tree in problem_strategy()) {
        let once = paragraphize(tree).unwrap();
        let twice = paragraphize(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn paragraphs_are_normalized(tree in problem_strategy()) {
        let result = paragraphize(tree).unwrap();
        for paragraph in paragraphs(&result) {
            let children = paragraph.children();
            prop_assert!(!children.is_empty());
            for child in children {
                if let Node::Text { text, .. } = child {
                    prop_assert!(!text.is_empty());
                    prop_assert!(!text.contains("  "));
                    prop_assert!(!text.contains(['\n', '\t']));
                }
            }
            if let Some(Node::Text { text, .. }) = children.first() {
                prop_assert!(!text.starts_with(' '));
            }
            if let Some(Node::Text { text, .. }) = children.last() {
                prop_assert!(!text.ends_with(' '));
            }
        }
    }

    #[test]
    fn keeps_every_non_text_inline(tree in problem_strategy()) {
        let count = |tree: &Node| {
            tree.descendants()
                .filter(|node| matches!(node.kind(), NodeKind::InlineMath | NodeKind::InlineCode))
                .count()
        };
        let before = count(&tree);
        let result = paragraphize(tree).unwrap();
        prop_assert_eq!(count(&result), before);
    }
}
