//! AST to DSCTeX
//!
//! Blocks are separated by blank lines and indented four spaces inside their environment. Runs of
//! consecutive subproblems are wrapped in a single `subprobset`.

use crate::ast::{Node, NodeKind};
use crate::error::{PanprobError, Result};
use crate::formats::render::{Overrides, Render};
use crate::text::indent;

const INDENT: &str = "    ";

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
    let mut renderer = DsctexRenderer { overrides };
    Ok(format!("{}\n", renderer.render(tree)?))
}

/// `\begin{name}options`, the indented body, `\end{name}`
fn environment(name: &str, options: &str, body: &str) -> String {
    if body.is_empty() {
        format!("\\begin{{{name}}}{options}\n\\end{{{name}}}")
    } else {
        format!(
            "\\begin{{{name}}}{options}\n{}\n\\end{{{name}}}",
            indent(body, INDENT)
        )
    }
}

struct DsctexRenderer<'o> {
    overrides: &'o Overrides,
}

impl Render for DsctexRenderer<'_> {
    fn render(&mut self, node: &Node) -> Result<String> {
        let overrides = self.overrides;
        match overrides.get(node.kind()) {
            Some(renderer) => renderer(node, self),
            None => self.builtin(node),
        }
    }
}

impl DsctexRenderer<'_> {
    fn blocks(&mut self, children: &[Node]) -> Result<String> {
        let mut blocks = Vec::new();
        let mut subproblems = Vec::new();
        for child in children {
            if child.kind() == NodeKind::Subproblem {
                subproblems.push(self.render(child)?);
                continue;
            }
            if !subproblems.is_empty() {
                blocks.push(environment("subprobset", "", &subproblems.join("\n\n")));
                subproblems.clear();
            }
            if child.kind().is_inline() || child.kind() == NodeKind::Choice {
                return Err(PanprobError::render(child.kind(), "not allowed at block level"));
            }
            blocks.push(self.render(child)?);
        }
        if !subproblems.is_empty() {
            blocks.push(environment("subprobset", "", &subproblems.join("\n\n")));
        }
        Ok(blocks.join("\n\n"))
    }

    fn builtin(&mut self, node: &Node) -> Result<String> {
        match node {
            Node::Problem { children } => Ok(environment("prob", "", &self.blocks(children)?)),
            Node::Subproblem { children } => {
                Ok(environment("subprob", "", &self.blocks(children)?))
            }
            Node::Solution { children } => Ok(environment("soln", "", &self.blocks(children)?)),
            Node::Paragraph { children } => self.inlines(children),
            Node::DisplayMath { latex } => Ok(format!("\\[\n{}\n\\]", indent(latex, INDENT))),
            Node::Code { language, code } => Ok(format!(
                "\\begin{{minted}}{{{language}}}\n{code}\n\\end{{minted}}"
            )),
            Node::CodeFile {
                language,
                relative_path,
            } => Ok(format!("\\inputminted{{{language}}}{{{relative_path}}}")),
            Node::ImageFile { relative_path } => {
                Ok(format!("\\includegraphics{{{relative_path}}}"))
            }
            Node::TrueFalse { solution: true } => Ok("\\Tf{}".to_string()),
            Node::TrueFalse { solution: false } => Ok("\\tF{}".to_string()),
            Node::MultipleChoice { children } => self.choices(children, ""),
            Node::MultipleSelect { children } => self.choices(children, "[rectangle]"),
            Node::Choice { correct, children } => {
                let command = if *correct { "\\correctchoice" } else { "\\choice" };
                let body = self.blocks(children)?;
                if body.is_empty() {
                    Ok(format!("{command} {{}}"))
                } else {
                    Ok(format!("{command} {{\n{}\n}}", indent(&body, INDENT)))
                }
            }
            Node::Text { text, bold, italic } => {
                let text = escape(text);
                Ok(match (*bold, *italic) {
                    (true, true) => format!("\\textbf{{\\textit{{{text}}}}}"),
                    (true, false) => format!("\\textbf{{{text}}}"),
                    (false, true) => format!("\\textit{{{text}}}"),
                    (false, false) => text,
                })
            }
            Node::InlineMath { latex } => Ok(format!("${latex}$")),
            Node::InlineCode { language, code } => {
                Ok(format!("\\mintinline{{{language}}}{{{code}}}"))
            }
            Node::InlineResponseBox { answer } => Ok(format!("\\inlineresponsebox{{{answer}}}")),
            Node::Blob { .. } | Node::ParBreak => Err(blob_error(node.kind())),
        }
    }

    fn choices(&mut self, choices: &[Node], options: &str) -> Result<String> {
        let mut rendered = Vec::new();
        for choice in choices {
            if choice.kind() != NodeKind::Choice {
                return Err(PanprobError::render(
                    choice.kind(),
                    "choice lists may only hold choices",
                ));
            }
            rendered.push(self.render(choice)?);
        }
        Ok(environment("choices", options, &rendered.join("\n")))
    }

    fn inlines(&mut self, children: &[Node]) -> Result<String> {
        let mut out = String::new();
        for child in children {
            match child.kind() {
                NodeKind::ParBreak => return Err(blob_error(NodeKind::ParBreak)),
                kind if !kind.is_inline() => {
                    return Err(PanprobError::render(kind, "not allowed inside a paragraph"))
                }
                _ => out.push_str(&self.render(child)?),
            }
        }
        Ok(out)
    }
}

/// Backslash-escape the characters the parser reads as markup
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '%' | '$' | '&' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn blob_error(kind: NodeKind) -> PanprobError {
    PanprobError::render(kind, "run paragraphize before rendering")
}
