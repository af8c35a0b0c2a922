//! Indented text dump of a tree
//!
//! One line per node, two spaces per depth level. Strings are printed with `{:?}` so embedded
//! newlines stay on one line.

use super::node::Node;
use std::fmt::Write;

const INDENT: &str = "  ";

impl Node {
    pub fn prettify(&self) -> String {
        let mut out = String::new();
        append_node(&mut out, self, 0);
        out
    }
}

fn append_node(out: &mut String, node: &Node, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(&label(node));
    out.push('\n');
    for child in node.children() {
        append_node(out, child, depth + 1);
    }
}

fn label(node: &Node) -> String {
    let mut label = node.kind().name().to_string();
    match node {
        Node::Choice { correct, .. } => {
            let _ = write!(label, " correct={correct}");
        }
        Node::Text { text, bold, italic } => {
            let _ = write!(label, " {text:?}");
            if *bold {
                label.push_str(" bold");
            }
            if *italic {
                label.push_str(" italic");
            }
        }
        Node::DisplayMath { latex } | Node::InlineMath { latex } => {
            let _ = write!(label, " latex={latex:?}");
        }
        Node::Code { language, code } | Node::InlineCode { language, code } => {
            let _ = write!(label, " language={language:?} code={code:?}");
        }
        Node::CodeFile {
            language,
            relative_path,
        } => {
            let _ = write!(label, " language={language:?} path={relative_path:?}");
        }
        Node::ImageFile { relative_path } => {
            let _ = write!(label, " path={relative_path:?}");
        }
        Node::TrueFalse { solution } => {
            let _ = write!(label, " solution={solution}");
        }
        Node::InlineResponseBox { answer } => {
            let _ = write!(label, " answer={answer:?}");
        }
        _ => {}
    }
    label
}
