//! AST to Gradescope Markdown
//!
//! Blocks are separated by blank lines. Gradescope has no notion of subproblems or external code
//! files, so those fail to render. Display math and true/false questions have no dedicated syntax
//! and come out as `$$...$$` paragraphs and two-choice lists.

use crate::ast::{Node, NodeKind};
use crate::error::{PanprobError, Result};
use crate::formats::render::{Overrides, Render};

pub fn serialize(tree: &Node) -> Result<String> {
    serialize_with(tree, &Overrides::default())
}

/// Render with caller-supplied renderers replacing the built-in ones for some node kinds
pub fn serialize_with(tree: &Node, overrides: &Overrides) -> Result<String> {
    if tree.kind() != NodeKind::Problem {
        return Err(PanprobError::render(
            tree.kind(),
            "the root of a problem tree must be a Problem",
        ));
    }
    let mut renderer = GsmdRenderer {
        overrides,
        markers: MULTIPLE_CHOICE,
    };
    let body = renderer.render(tree)?;
    if body.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{body}\n"))
    }
}

/// Unmarked and marked line prefixes of a choice list
type Markers = (&'static str, &'static str);

const MULTIPLE_CHOICE: Markers = ("( )", "(x)");
const MULTIPLE_SELECT: Markers = ("[ ]", "[x]");

struct GsmdRenderer<'o> {
    overrides: &'o Overrides,
    /// Markers of the choice list being rendered
    markers: Markers,
}

impl Render for GsmdRenderer<'_> {
    fn render(&mut self, node: &Node) -> Result<String> {
        let overrides = self.overrides;
        match overrides.get(node.kind()) {
            Some(renderer) => renderer(node, self),
            None => self.builtin(node),
        }
    }
}

impl GsmdRenderer<'_> {
    fn blocks(&mut self, children: &[Node]) -> Result<String> {
        let mut blocks = Vec::new();
        for child in children {
            if child.kind().is_inline() || child.kind() == NodeKind::Choice {
                return Err(PanprobError::render(child.kind(), "not allowed at block level"));
            }
            blocks.push(self.render(child)?);
        }
        Ok(blocks.join("\n\n"))
    }

    fn builtin(&mut self, node: &Node) -> Result<String> {
        match node {
            Node::Problem { children } => self.blocks(children),
            Node::Paragraph { children } => self.inlines(children),
            Node::DisplayMath { latex } => Ok(format!("$${latex}$$")),
            Node::Code { language, code } => Ok(format!("```{language}\n{code}\n```")),
            Node::ImageFile { relative_path } => Ok(format!("![]({relative_path})")),
            Node::TrueFalse { solution } => Ok(if *solution {
                "(x) True\n( ) False".to_string()
            } else {
                "( ) True\n(x) False".to_string()
            }),
            Node::MultipleChoice { children } => self.choices(children, MULTIPLE_CHOICE),
            Node::MultipleSelect { children } => self.choices(children, MULTIPLE_SELECT),
            Node::Choice { correct, children } => {
                let (unmarked, marked) = self.markers;
                let marker = if *correct { marked } else { unmarked };
                let content = self.blocks(children)?;
                if content.contains('\n') {
                    return Err(PanprobError::render(
                        NodeKind::Choice,
                        "a choice must fit on a single line",
                    ));
                }
                if content.is_empty() {
                    Ok(marker.to_string())
                } else {
                    Ok(format!("{marker} {content}"))
                }
            }
            Node::Solution { children } => {
                let body = self.blocks(children)?;
                Ok(body
                    .trim()
                    .lines()
                    .map(|line| format!("[[{line}]]"))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Node::Text { text, bold, italic } => {
                let delimiter = match (*bold, *italic) {
                    (true, true) => "***",
                    (true, false) => "**",
                    (false, true) => "*",
                    (false, false) => "",
                };
                Ok(format!("{delimiter}{}{delimiter}", escape(text)))
            }
            Node::InlineMath { latex } => Ok(format!("$${latex}$$")),
            Node::InlineCode { code, .. } => Ok(format!("`{code}`")),
            Node::InlineResponseBox { answer } => Ok(format!("[____]({answer})")),
            Node::Subproblem { .. } => Err(PanprobError::render(
                NodeKind::Subproblem,
                "Gradescope Markdown has no subproblems",
            )),
            Node::CodeFile { .. } => Err(PanprobError::render(
                NodeKind::CodeFile,
                "inline the file with subsume_code first",
            )),
            Node::Blob { .. } | Node::ParBreak => Err(PanprobError::render(
                node.kind(),
                "run paragraphize before rendering",
            )),
        }
    }

    fn choices(&mut self, choices: &[Node], markers: Markers) -> Result<String> {
        self.markers = markers;
        let mut lines = Vec::new();
        for choice in choices {
            if choice.kind() != NodeKind::Choice {
                return Err(PanprobError::render(
                    choice.kind(),
                    "choice lists may only hold choices",
                ));
            }
            lines.push(self.render(choice)?);
        }
        Ok(lines.join("\n"))
    }

    fn inlines(&mut self, children: &[Node]) -> Result<String> {
        let mut out = String::new();
        for child in children {
            if !child.kind().is_inline() {
                return Err(PanprobError::render(
                    child.kind(),
                    "not allowed inside a paragraph",
                ));
            }
            out.push_str(&self.render(child)?);
        }
        Ok(out)
    }
}

/// Backslash-escape the punctuation Markdown would read as inline markup
///
/// Block markers at the start of a line (`-`, `1.`, `>`, `( )`) are left as they are.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '$' | '[' | ']' | '<' | '&' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
