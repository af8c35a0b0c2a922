//! AST to HTML
//!
//! Produces an HTML fragment meant to be embedded in a page with MathJax loaded. Text is written
//! as-is without escaping. Response boxes get ids from a per-render counter so output is stable.

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
    let mut renderer = HtmlRenderer {
        overrides,
        parts: 0,
        response_boxes: 0,
        input_type: "radio",
    };
    Ok(format!("{}\n", renderer.render(tree)?))
}

struct HtmlRenderer<'o> {
    overrides: &'o Overrides,
    /// Subproblems numbered so far
    parts: usize,
    response_boxes: usize,
    /// Input type of the choice list being rendered
    input_type: &'static str,
}

impl Render for HtmlRenderer<'_> {
    fn render(&mut self, node: &Node) -> Result<String> {
        let overrides = self.overrides;
        match overrides.get(node.kind()) {
            Some(renderer) => renderer(node, self),
            None => self.builtin(node),
        }
    }
}

impl HtmlRenderer<'_> {
    fn blocks(&mut self, children: &[Node]) -> Result<String> {
        let mut parts = Vec::new();
        for child in children {
            if child.kind().is_inline() || child.kind() == NodeKind::Choice {
                return Err(PanprobError::render(child.kind(), "not allowed at block level"));
            }
            parts.push(self.render(child)?);
        }
        Ok(parts.join("\n"))
    }

    fn builtin(&mut self, node: &Node) -> Result<String> {
        match node {
            Node::Problem { children } => Ok(format!(
                "<div class=\"problem\">\n{INDENT}<div class=\"problem-body\">\n{}\n{INDENT}</div>\n</div>",
                self.blocks(children)?
            )),
            Node::Subproblem { children } => {
                self.parts += 1;
                let heading = format!("<h3 class=\"subproblem-id\">Part {})</h3>", self.parts);
                let body = self.blocks(children)?;
                let inner = if body.is_empty() {
                    heading
                } else {
                    format!("{heading}\n{body}")
                };
                Ok(format!(
                    "<div class=\"subproblem\">\n{}\n</div>",
                    indent(&inner, INDENT)
                ))
            }
            Node::Paragraph { children } => Ok(format!("<p>{}</p>", self.inlines(children)?)),
            Node::DisplayMath { latex } => Ok(format!("<div class=\"math\">\\[{latex}\\]</div>")),
            Node::Code { language, code } => Ok(format!(
                "<pre class=\"code\" data-language=\"{language}\"><code>{code}</code></pre>"
            )),
            Node::ImageFile { relative_path } => Ok(format!(
                "<div class=\"image\"><img src=\"{relative_path}\" /></div>"
            )),
            Node::TrueFalse { solution } => Ok(true_false(*solution)),
            Node::Solution { children } => {
                let body = self.blocks(children)?;
                Ok(format!(
                    "<details>\n{INDENT}<summary>Solution</summary>\n{}\n</details>",
                    indent(&body, INDENT)
                ))
            }
            Node::MultipleChoice { children } => {
                let choices = self.choices(children, "radio")?;
                Ok(format!(
                    "<div class=\"multiple-choices\"><form>\n{choices}\n</form></div>"
                ))
            }
            Node::MultipleSelect { children } => {
                let choices = self.choices(children, "checkbox")?;
                Ok(format!("<div class=\"multiple-select\">\n{choices}\n</div>"))
            }
            Node::Choice { correct, children } => {
                let input_type = self.input_type;
                let checked = if *correct { " data-correct=\"true\"" } else { "" };
                Ok(format!(
                    "<div class=\"choice\"><label><input name=\"choice\" class=\"choice\" type=\"{input_type}\"{checked} />{}</label></div>",
                    self.blocks(children)?
                ))
            }
            Node::Text { text, bold, italic } => {
                let mut styled = text.clone();
                if *bold {
                    styled = format!("<b>{styled}</b>");
                }
                if *italic {
                    styled = format!("<i>{styled}</i>");
                }
                Ok(styled)
            }
            Node::InlineMath { latex } => {
                Ok(format!("<span class=\"math\">\\({latex}\\)</span>"))
            }
            Node::InlineCode { code, .. } => Ok(format!(
                "<span class=\"inline-code\"><code>{code}</code></span>"
            )),
            Node::InlineResponseBox { answer } => {
                self.response_boxes += 1;
                Ok(response_box(self.response_boxes, answer))
            }
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

    fn choices(&mut self, choices: &[Node], input_type: &'static str) -> Result<String> {
        self.input_type = input_type;
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
        Ok(rendered.join("\n"))
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

fn true_false(solution: bool) -> String {
    let (t, f) = if solution {
        (" data-correct=\"true\"", "")
    } else {
        ("", " data-correct=\"true\"")
    };
    format!(
        "<div class=\"true-false\">\n\
         {INDENT}<label><input type=\"radio\" name=\"true-false\" value=\"true\"{t} /> True</label>\n\
         {INDENT}<label><input type=\"radio\" name=\"true-false\" value=\"false\"{f} /> False</label>\n\
         </div>"
    )
}

fn response_box(id: usize, answer: &str) -> String {
    format!(
        "<span class=\"inline-response-box\">\
         <span id=\"answer-{id}\" style=\"display: none\">{answer}</span>\
         <button type=\"button\" id=\"button-{id}\" onclick=\"\
         document.getElementById('answer-{id}').style.display = 'inline-block'; \
         this.style.display = 'none'\">Show Answer</button>\
         </span>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(children: Vec<Node>) -> Node {
        Node::paragraph(children).unwrap()
    }

    #[test]
    fn wraps_problem_body() {
        let tree = Node::problem([paragraph(vec![Node::bold("Hi")])]).unwrap();
        let expected = "\
<div class=\"problem\">
    <div class=\"problem-body\">
<p><b>Hi</b></p>
    </div>
</div>
";
        assert_eq!(serialize(&tree).unwrap(), expected);
    }

    #[test]
    fn numbers_subproblems() {
        let tree = Node::problem([
            Node::subproblem([paragraph(vec![Node::text("a")])]).unwrap(),
            Node::subproblem([Node::true_false(true)]).unwrap(),
        ])
        .unwrap();
        let html = serialize(&tree).unwrap();
        assert!(html.contains("<h3 class=\"subproblem-id\">Part 1)</h3>\n    <p>a</p>"));
        assert!(html.contains("Part 2)"));
    }

    #[test]
    fn styles_nest_bold_inside_italic() {
        let tree =
            Node::problem([paragraph(vec![Node::styled_text("x", true, true)])]).unwrap();
        assert!(serialize(&tree).unwrap().contains("<p><i><b>x</b></i></p>"));
    }

    #[test]
    fn math_code_and_images() {
        let tree = Node::problem([
            paragraph(vec![Node::inline_math("x"), Node::inline_code("python", "f()")]),
            Node::display_math("y"),
            Node::code("python", "x = 1"),
            Node::image_file("a.png"),
        ])
        .unwrap();
        let html = serialize(&tree).unwrap();
        assert!(html.contains("<span class=\"math\">\\(x\\)</span>"));
        assert!(html.contains("<span class=\"inline-code\"><code>f()</code></span>"));
        assert!(html.contains("<div class=\"math\">\\[y\\]</div>"));
        assert!(html.contains("<pre class=\"code\" data-language=\"python\"><code>x = 1</code></pre>"));
        assert!(html.contains("<img src=\"a.png\" />"));
    }

    #[test]
    fn choices_and_solutions() {
        let tree = Node::problem([
            Node::multiple_select([
                Node::choice(true, [paragraph(vec![Node::text("a")])]).unwrap(),
            ])
            .unwrap(),
            Node::solution([paragraph(vec![Node::text("because")])]).unwrap(),
        ])
        .unwrap();
        let html = serialize(&tree).unwrap();
        assert!(html.contains("<div class=\"multiple-select\">"));
        assert!(html.contains("type=\"checkbox\" data-correct=\"true\" /><p>a</p>"));
        assert!(html.contains("<details>\n    <summary>Solution</summary>\n    <p>because</p>\n</details>"));
    }

    #[test]
    fn response_box_ids_are_deterministic() {
        let tree = Node::problem([paragraph(vec![
            Node::inline_response_box("1"),
            Node::inline_response_box("2"),
        ])])
        .unwrap();
        let first = serialize(&tree).unwrap();
        assert_eq!(first, serialize(&tree).unwrap());
        assert!(first.contains("id=\"answer-1\""));
        assert!(first.contains("id=\"answer-2\""));
    }

    #[test]
    fn code_files_and_blobs_fail() {
        let tree = Node::problem([Node::code_file("python", "a.py")]).unwrap();
        assert!(serialize(&tree).is_err());
        let tree = Node::problem([Node::blob([Node::text("x")]).unwrap()]).unwrap();
        assert!(serialize(&tree).is_err());
    }

    #[test]
    fn overrides_replace_one_node_kind() {
        let overrides = Overrides::new().with(NodeKind::InlineMath, |node, _| match node {
            Node::InlineMath { latex } => Ok(format!("<math>{latex}</math>")),
            _ => unreachable!("registered for inline math only"),
        });
        let tree = Node::problem([paragraph(vec![
            Node::text("Solve "),
            Node::inline_math("x"),
        ])])
        .unwrap();
        let html = serialize_with(&tree, &overrides).unwrap();
        assert!(html.contains("<p>Solve <math>x</math></p>"), "{html}");
    }

    #[test]
    fn overrides_can_wrap_the_built_in_output() {
        let overrides = Overrides::new().with(NodeKind::Subproblem, |node, r| {
            Ok(format!("<section>{}</section>", r.render_all(node.children())?))
        });
        let tree = Node::problem([
            Node::subproblem([paragraph(vec![Node::text("a")])]).unwrap(),
        ])
        .unwrap();
        let html = serialize_with(&tree, &overrides).unwrap();
        assert!(html.contains("<section><p>a</p></section>"), "{html}");
        assert!(!html.contains("Part 1)"));
    }
}
