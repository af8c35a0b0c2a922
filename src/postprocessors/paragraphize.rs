//! Blob elimination
//!
//! Each maximal run of sibling `Blob`s is flattened into one inline sequence, split at `ParBreak`
//! markers and turned into a sequence of `Paragraph`s spliced in place of the run.
//!
//! Inside the new paragraphs, runs of ASCII whitespace in `Text` nodes collapse to a single
//! space, the paragraph is trimmed at both ends, and `Text` nodes left empty are dropped. Groups
//! with nothing left are discarded. Math, code and response boxes are never touched, and
//! paragraphs that already exist are left alone, so running the pass twice changes nothing.

use crate::ast::{Node, NodeKind};
use crate::error::{PanprobError, Result};

pub fn paragraphize(tree: Node) -> Result<Node> {
    if tree.kind() == NodeKind::Blob {
        return Err(PanprobError::Postprocess(
            "a Blob cannot be the root of a tree".to_string(),
        ));
    }
    rewrite(tree)
}

fn rewrite(mut node: Node) -> Result<Node> {
    if !node.is_internal() || node.kind() == NodeKind::Paragraph {
        return Ok(node);
    }

    let children = node.take_children();
    let mut run: Option<Vec<Node>> = None;
    for child in children {
        if child.kind() == NodeKind::Blob {
            run.get_or_insert_with(Vec::new).extend(child.into_children());
            continue;
        }
        if let Some(inlines) = run.take() {
            flush(&mut node, inlines)?;
        }
        node.add_child(rewrite(child)?)?;
    }
    if let Some(inlines) = run.take() {
        flush(&mut node, inlines)?;
    }
    Ok(node)
}

fn flush(parent: &mut Node, inlines: Vec<Node>) -> Result<()> {
    if !parent.kind().allows(NodeKind::Paragraph) {
        return Err(PanprobError::Postprocess(format!(
            "a Blob inside {} cannot become a Paragraph",
            parent.kind()
        )));
    }
    for group in split_at_breaks(inlines) {
        let group = normalize(group);
        if !group.is_empty() {
            parent.add_child(Node::paragraph(group)?)?;
        }
    }
    Ok(())
}

fn split_at_breaks(inlines: Vec<Node>) -> Vec<Vec<Node>> {
    let mut groups = vec![Vec::new()];
    for node in inlines {
        match node {
            Node::ParBreak => groups.push(Vec::new()),
            other => {
                if let Some(current) = groups.last_mut() {
                    current.push(other);
                }
            }
        }
    }
    groups
}

fn normalize(group: Vec<Node>) -> Vec<Node> {
    let mut nodes: Vec<Node> = group
        .into_iter()
        .map(|node| match node {
            Node::Text { text, bold, italic } => Node::Text {
                text: collapse_whitespace(&text),
                bold,
                italic,
            },
            other => other,
        })
        .collect();

    while let Some(Node::Text { text, .. }) = nodes.first_mut() {
        let trimmed = text.trim_start_matches(' ');
        if trimmed.is_empty() {
            nodes.remove(0);
        } else {
            *text = trimmed.to_string();
            break;
        }
    }
    while let Some(Node::Text { text, .. }) = nodes.last_mut() {
        let trimmed = text.trim_end_matches(' ');
        if trimmed.is_empty() {
            nodes.pop();
        } else {
            *text = trimmed.to_string();
            break;
        }
    }

    nodes.retain(|node| !matches!(node, Node::Text { text, .. } if text.is_empty()));
    nodes
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
