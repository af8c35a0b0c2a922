//! The problem tree
//!
//! [`Node`] is a closed sum type. Internal variants own a [`Children`] list that can only grow
//! through [`Node::add_child`], which checks the parent's allowed-child table, so a tree that was
//! built without error is structurally valid.
//!
//! Each list is tagged with the variant that owns it, so a list taken from one kind of node
//! cannot be moved into another kind.

use super::kind::NodeKind;
use crate::error::{PanprobError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

/// Tags tying a [`Children`] list to the variant that owns it
pub mod owner {
    macro_rules! owners {
        ($($name:ident),* $(,)?) => {
            $(
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub struct $name;
            )*
        };
    }

    owners!(
        Problem,
        Subproblem,
        Solution,
        Paragraph,
        Blob,
        MultipleChoice,
        MultipleSelect,
        Choice,
    );
}

/// Ordered children of an internal node
///
/// There is no public way to build or mutate this list; go through [`Node::add_child`].
pub struct Children<K> {
    nodes: Vec<Node>,
    owner: PhantomData<K>,
}

impl<K> Children<K> {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            owner: PhantomData,
        }
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }
}

impl<K> Clone for Children<K> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            owner: PhantomData,
        }
    }
}

impl<K> fmt::Debug for Children<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.nodes).finish()
    }
}

impl<K> PartialEq for Children<K> {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl<K> Eq for Children<K> {}

impl<K> Serialize for Children<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.nodes.serialize(serializer)
    }
}

impl<K> Deref for Children<K> {
    type Target = [Node];

    fn deref(&self) -> &[Node] {
        &self.nodes
    }
}

impl<'a, K> IntoIterator for &'a Children<K> {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    Problem {
        children: Children<owner::Problem>,
    },
    Subproblem {
        children: Children<owner::Subproblem>,
    },
    Solution {
        children: Children<owner::Solution>,
    },
    Paragraph {
        children: Children<owner::Paragraph>,
    },
    /// Unnormalized inline run produced by parsers; removed by paragraphize
    Blob {
        children: Children<owner::Blob>,
    },
    MultipleChoice {
        children: Children<owner::MultipleChoice>,
    },
    MultipleSelect {
        children: Children<owner::MultipleSelect>,
    },
    Choice {
        correct: bool,
        children: Children<owner::Choice>,
    },
    Text {
        text: String,
        bold: bool,
        italic: bool,
    },
    ParBreak,
    DisplayMath {
        latex: String,
    },
    InlineMath {
        latex: String,
    },
    Code {
        language: String,
        code: String,
    },
    InlineCode {
        language: String,
        code: String,
    },
    CodeFile {
        language: String,
        relative_path: String,
    },
    ImageFile {
        relative_path: String,
    },
    TrueFalse {
        solution: bool,
    },
    InlineResponseBox {
        answer: String,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Problem { .. } => NodeKind::Problem,
            Node::Subproblem { .. } => NodeKind::Subproblem,
            Node::Solution { .. } => NodeKind::Solution,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Blob { .. } => NodeKind::Blob,
            Node::MultipleChoice { .. } => NodeKind::MultipleChoice,
            Node::MultipleSelect { .. } => NodeKind::MultipleSelect,
            Node::Choice { .. } => NodeKind::Choice,
            Node::Text { .. } => NodeKind::Text,
            Node::ParBreak => NodeKind::ParBreak,
            Node::DisplayMath { .. } => NodeKind::DisplayMath,
            Node::InlineMath { .. } => NodeKind::InlineMath,
            Node::Code { .. } => NodeKind::Code,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::CodeFile { .. } => NodeKind::CodeFile,
            Node::ImageFile { .. } => NodeKind::ImageFile,
            Node::TrueFalse { .. } => NodeKind::TrueFalse,
            Node::InlineResponseBox { .. } => NodeKind::InlineResponseBox,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind().is_internal()
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Problem { children } => Some(&mut children.nodes),
            Node::Subproblem { children } => Some(&mut children.nodes),
            Node::Solution { children } => Some(&mut children.nodes),
            Node::Paragraph { children } => Some(&mut children.nodes),
            Node::Blob { children } => Some(&mut children.nodes),
            Node::MultipleChoice { children } => Some(&mut children.nodes),
            Node::MultipleSelect { children } => Some(&mut children.nodes),
            Node::Choice { children, .. } => Some(&mut children.nodes),
            _ => None,
        }
    }

    /// Children in order; empty for leaves
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Problem { children } => children.as_slice(),
            Node::Subproblem { children } => children.as_slice(),
            Node::Solution { children } => children.as_slice(),
            Node::Paragraph { children } => children.as_slice(),
            Node::Blob { children } => children.as_slice(),
            Node::MultipleChoice { children } => children.as_slice(),
            Node::MultipleSelect { children } => children.as_slice(),
            Node::Choice { children, .. } => children.as_slice(),
            _ => &[],
        }
    }

    /// Append `child`, rejecting kinds the parent does not allow
    ///
    /// On failure the node is left unchanged.
    pub fn add_child(&mut self, child: Node) -> Result<()> {
        let parent = self.kind();
        let child_kind = child.kind();
        if !parent.allows(child_kind) {
            return Err(PanprobError::IllegalChild {
                parent,
                child: child_kind,
            });
        }
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(PanprobError::IllegalChild {
                parent,
                child: child_kind,
            }),
        }
    }

    pub fn add_children<I: IntoIterator<Item = Node>>(&mut self, children: I) -> Result<()> {
        for child in children {
            self.add_child(child)?;
        }
        Ok(())
    }

    /// Move the children out, leaving the node empty
    ///
    /// Callers re-insert through `add_child`, which keeps the tables enforced.
    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        match self.children_mut() {
            Some(children) => std::mem::take(children),
            None => Vec::new(),
        }
    }

    pub fn into_children(mut self) -> Vec<Node> {
        self.take_children()
    }

    /// Pre-order walk over this node and everything below it
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn contains_kind(&self, kind: NodeKind) -> bool {
        self.descendants().any(|node| node.kind() == kind)
    }

    /// Re-check the allowed-child tables for the whole tree
    pub fn validate(&self) -> Result<()> {
        for node in self.descendants() {
            let parent = node.kind();
            for child in node.children() {
                if !parent.allows(child.kind()) {
                    return Err(PanprobError::IllegalChild {
                        parent,
                        child: child.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Same node with each child replaced by `f(child)`
    pub(crate) fn try_map_children<F>(mut self, mut f: F) -> Result<Node>
    where
        F: FnMut(Node) -> Result<Node>,
    {
        let children = self.take_children();
        for child in children {
            let mapped = f(child)?;
            self.add_child(mapped)?;
        }
        Ok(self)
    }

    fn with_children<I>(mut self, children: I) -> Result<Node>
    where
        I: IntoIterator<Item = Node>,
    {
        self.add_children(children)?;
        Ok(self)
    }

    pub fn problem<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::Problem {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn subproblem<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::Subproblem {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn solution<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::Solution {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn paragraph<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::Paragraph {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn blob<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::Blob {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn multiple_choice<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::MultipleChoice {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn multiple_select<I: IntoIterator<Item = Node>>(children: I) -> Result<Node> {
        Node::MultipleSelect {
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn choice<I: IntoIterator<Item = Node>>(correct: bool, children: I) -> Result<Node> {
        Node::Choice {
            correct,
            children: Children::empty(),
        }
        .with_children(children)
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::styled_text(text, false, false)
    }

    pub fn bold(text: impl Into<String>) -> Node {
        Node::styled_text(text, true, false)
    }

    pub fn italic(text: impl Into<String>) -> Node {
        Node::styled_text(text, false, true)
    }

    pub fn styled_text(text: impl Into<String>, bold: bool, italic: bool) -> Node {
        Node::Text {
            text: text.into(),
            bold,
            italic,
        }
    }

    pub fn par_break() -> Node {
        Node::ParBreak
    }

    pub fn display_math(latex: impl Into<String>) -> Node {
        Node::DisplayMath {
            latex: latex.into(),
        }
    }

    pub fn inline_math(latex: impl Into<String>) -> Node {
        Node::InlineMath {
            latex: latex.into(),
        }
    }

    pub fn code(language: impl Into<String>, code: impl Into<String>) -> Node {
        Node::Code {
            language: language.into(),
            code: code.into(),
        }
    }

    pub fn inline_code(language: impl Into<String>, code: impl Into<String>) -> Node {
        Node::InlineCode {
            language: language.into(),
            code: code.into(),
        }
    }

    pub fn code_file(language: impl Into<String>, relative_path: impl Into<String>) -> Node {
        Node::CodeFile {
            language: language.into(),
            relative_path: relative_path.into(),
        }
    }

    pub fn image_file(relative_path: impl Into<String>) -> Node {
        Node::ImageFile {
            relative_path: relative_path.into(),
        }
    }

    pub fn true_false(solution: bool) -> Node {
        Node::TrueFalse { solution }
    }

    pub fn inline_response_box(answer: impl Into<String>) -> Node {
        Node::InlineResponseBox {
            answer: answer.into(),
        }
    }
}

/// Iterator returned by [`Node::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::any::TypeId;

    fn sample(kind: NodeKind) -> Node {
        match kind {
            NodeKind::Problem => Node::problem([]).unwrap(),
            NodeKind::Subproblem => Node::subproblem([]).unwrap(),
            NodeKind::Solution => Node::solution([]).unwrap(),
            NodeKind::Paragraph => Node::paragraph([]).unwrap(),
            NodeKind::Blob => Node::blob([]).unwrap(),
            NodeKind::MultipleChoice => Node::multiple_choice([]).unwrap(),
            NodeKind::MultipleSelect => Node::multiple_select([]).unwrap(),
            NodeKind::Choice => Node::choice(false, []).unwrap(),
            NodeKind::Text => Node::text("t"),
            NodeKind::ParBreak => Node::par_break(),
            NodeKind::DisplayMath => Node::display_math("x"),
            NodeKind::InlineMath => Node::inline_math("x"),
            NodeKind::Code => Node::code("python", "x"),
            NodeKind::InlineCode => Node::inline_code("python", "x"),
            NodeKind::CodeFile => Node::code_file("python", "a.py"),
            NodeKind::ImageFile => Node::image_file("a.png"),
            NodeKind::TrueFalse => Node::true_false(true),
            NodeKind::InlineResponseBox => Node::inline_response_box("42"),
        }
    }

    #[test]
    fn add_child_follows_the_tables_for_every_pair() {
        for parent_kind in NodeKind::ALL {
            for child_kind in NodeKind::ALL {
                let mut parent = sample(parent_kind);
                let before = parent.clone();
                let result = parent.add_child(sample(child_kind));
                if parent_kind.allows(child_kind) {
                    assert!(result.is_ok(), "{parent_kind} should accept {child_kind}");
                    assert_eq!(parent.children().len(), 1);
                    assert_eq!(parent.children()[0].kind(), child_kind);
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(PanprobError::IllegalChild { parent, child })
                                if parent == parent_kind && child == child_kind
                        ),
                        "{parent_kind} should reject {child_kind}"
                    );
                    assert_eq!(parent, before);
                }
            }
        }
    }

    fn owner_of<K: 'static>(_: &Children<K>) -> TypeId {
        TypeId::of::<K>()
    }

    #[test]
    fn children_lists_are_tied_to_their_owner() {
        let paragraph = Node::paragraph([Node::text("a")]).unwrap();
        let problem = Node::problem([]).unwrap();
        let Node::Paragraph { children: inline } = paragraph else {
            unreachable!()
        };
        let Node::Problem { children: blocks } = problem else {
            unreachable!()
        };
        // `Node::Problem { children: inline }` does not type-check
        assert_ne!(owner_of(&inline), owner_of(&blocks));
        assert_eq!(owner_of(&inline), TypeId::of::<owner::Paragraph>());

        // lists only move between nodes of the same kind, which stays valid
        let rebuilt = Node::Paragraph { children: inline };
        assert!(rebuilt.validate().is_ok());
        assert_eq!(rebuilt, Node::paragraph([Node::text("a")]).unwrap());
    }

    #[test]
    fn add_child_accepts_allowed_kinds() {
        let mut problem = Node::problem([]).unwrap();
        problem
            .add_child(Node::paragraph([Node::text("hi")]).unwrap())
            .unwrap();
        problem.add_child(Node::code("python", "x = 1")).unwrap();
        assert_eq!(problem.children().len(), 2);
        assert_eq!(problem.children()[1].kind(), NodeKind::Code);
    }

    #[test]
    fn add_child_rejects_and_leaves_parent_unchanged() {
        let mut paragraph = Node::paragraph([Node::text("a")]).unwrap();
        let before = paragraph.clone();
        let err = paragraph.add_child(Node::problem([]).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(err.to_string(), "cannot add child of type Problem to Paragraph");
        assert_eq!(paragraph, before);
    }

    #[test]
    fn leaves_reject_every_child() {
        let mut text = Node::text("x");
        assert!(text.add_child(Node::text("y")).is_err());
        let mut tf = Node::true_false(true);
        assert!(tf.add_child(Node::ParBreak).is_err());
    }

    #[test]
    fn constructors_enforce_tables() {
        assert!(Node::problem([Node::text("bare")]).is_err());
        assert!(Node::multiple_choice([Node::paragraph([]).unwrap()]).is_err());
        assert!(Node::subproblem([Node::subproblem([]).unwrap()]).is_err());
        assert!(Node::choice(true, [Node::paragraph([]).unwrap()]).is_ok());
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = Node::problem([
            Node::paragraph([Node::text("a"), Node::inline_math("x")]).unwrap(),
            Node::code("c", "y"),
        ])
        .unwrap();
        let kinds: Vec<NodeKind> = tree.descendants().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Problem,
                NodeKind::Paragraph,
                NodeKind::Text,
                NodeKind::InlineMath,
                NodeKind::Code
            ]
        );
        assert!(tree.contains_kind(NodeKind::InlineMath));
        assert!(!tree.contains_kind(NodeKind::Blob));
    }

    #[test]
    fn equality_is_structural() {
        let a = Node::problem([Node::paragraph([Node::bold("x")]).unwrap()]).unwrap();
        let b = Node::problem([Node::paragraph([Node::bold("x")]).unwrap()]).unwrap();
        let c = Node::problem([Node::paragraph([Node::italic("x")]).unwrap()]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn serializes_with_type_tag() {
        let tree = Node::problem([Node::paragraph([Node::text("hi")]).unwrap()]).unwrap();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "Problem");
        assert_eq!(json["children"][0]["type"], "Paragraph");
        assert_eq!(json["children"][0]["children"][0]["text"], "hi");
    }
}
