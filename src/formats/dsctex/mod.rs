//! DSCTeX format
//!
//! Problems written with the DSCTeX LaTeX macros: one `prob` environment holding text, math,
//! `minted` code, `choices`, `soln` and `subprob` environments.
//!
//! Parsing has two stages. [`latex`] turns source text into a generic markup tree of commands,
//! environments and text. The [`converters`] then map each command and environment, by name, to
//! problem-tree nodes. Callers that use their own macros pass extra converters to
//! [`parse_with`].

pub mod converters;
pub mod latex;
mod serializer;

pub use converters::{Context, Converters, Signature};
pub use serializer::{serialize as render, serialize_with as render_with};

use crate::ast::{Node, NodeKind};
use crate::error::{PanprobError, Result};
use crate::format::Format;
use latex::LatexNode;

/// Parse a DSCTeX problem with the built-in converters
///
/// The returned tree still holds `Blob`s; run paragraphize before rendering it.
pub fn parse(source: &str) -> Result<Node> {
    parse_with(source, &Converters::default())
}

pub fn parse_with(source: &str, converters: &Converters) -> Result<Node> {
    let nodes = latex::parse(source)?;

    let mut problem = None;
    for node in &nodes {
        match node {
            LatexNode::Environment(env) if env.name == "prob" && problem.is_none() => {
                problem = Some(env);
            }
            node if node.is_whitespace() => {}
            _ => {
                return Err(PanprobError::parse(
                    "the source must contain exactly one prob environment and nothing else",
                ))
            }
        }
    }
    let problem = problem.ok_or_else(|| PanprobError::parse("no prob environment found"))?;

    let ctx = Context::new(converters, source);
    let mut converted = ctx.convert_environment(problem)?;
    match (converted.pop(), converted.is_empty()) {
        (Some(tree), true) if tree.kind() == NodeKind::Problem => Ok(tree),
        _ => Err(PanprobError::parse(
            "the prob environment must convert to a single Problem",
        )),
    }
}

#[derive(Default)]
pub struct DsctexFormat;

impl Format for DsctexFormat {
    fn name(&self) -> &str {
        "dsctex"
    }

    fn description(&self) -> &str {
        "LaTeX problems using the DSCTeX macros"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tex"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Node> {
        parse(source)
    }

    fn serialize(&self, tree: &Node) -> Result<String> {
        render(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::postprocessors::paragraphize;

    fn parse_clean(source: &str) -> Node {
        paragraphize(parse(source).unwrap()).unwrap()
    }

    #[test]
    fn parses_bold_paragraph() {
        let tree = parse_clean(r"\begin{prob}\textbf{Hi}\end{prob}");
        let expected =
            Node::problem([Node::paragraph([Node::bold("Hi")]).unwrap()]).unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn parses_full_problem() {
        let source = r"
% a comment before the problem
\begin{prob}
    What is $x$ when
    \[
        x = 2 + 2
    \]

    \begin{choices}
        \choice {3}
        \correctchoice {4}
    \end{choices}

    \begin{soln}
        It is \textit{four}.
    \end{soln}
\end{prob}
";
        let tree = parse_clean(source);
        let expected = Node::problem([
            Node::paragraph([Node::text("What is "), Node::inline_math("x"), Node::text(" when")])
                .unwrap(),
            Node::display_math("x = 2 + 2"),
            Node::multiple_choice([
                Node::choice(false, [Node::paragraph([Node::text("3")]).unwrap()]).unwrap(),
                Node::choice(true, [Node::paragraph([Node::text("4")]).unwrap()]).unwrap(),
            ])
            .unwrap(),
            Node::solution([Node::paragraph([
                Node::text("It is "),
                Node::italic("four"),
                Node::text("."),
            ])
            .unwrap()])
            .unwrap(),
        ])
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn subprobsets_expand_into_subproblems() {
        let source = r"\begin{prob}
    Intro
    \begin{subprobset}
        \begin{subprob}
            \inputminted{python}{code/a.py}
        \end{subprob}
        \begin{subprob}
            \includegraphics[width=3in]{img/b.png}
            \Tf{}
        \end{subprob}
    \end{subprobset}
\end{prob}";
        let tree = parse_clean(source);
        let expected = Node::problem([
            Node::paragraph([Node::text("Intro")]).unwrap(),
            Node::subproblem([Node::code_file("python", "code/a.py")]).unwrap(),
            Node::subproblem([Node::image_file("img/b.png"), Node::true_false(true)]).unwrap(),
        ])
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn inline_code_and_response_boxes() {
        let tree =
            parse_clean(r"\begin{prob}Call \mintinline{python}{f(x)}: \inlineresponsebox{42}\end{prob}");
        let expected = Node::problem([Node::paragraph([
            Node::text("Call "),
            Node::inline_code("python", "f(x)"),
            Node::text(": "),
            Node::inline_response_box("42"),
        ])
        .unwrap()])
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn root_must_be_a_single_prob() {
        for source in [
            "",
            "text only",
            r"\begin{soln}x\end{soln}",
            r"\begin{prob}\end{prob}\begin{prob}\end{prob}",
            r"before \begin{prob}\end{prob}",
        ] {
            let err = parse(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse, "{source:?}");
        }
    }

    #[test]
    fn groups_a_command_does_not_take_are_kept_as_text() {
        let tree = parse_clean(r"\begin{prob}\textbf{Note} [1 point] and \textbf{a}{b}\end{prob}");
        let expected = Node::problem([Node::paragraph([
            Node::bold("Note"),
            Node::text(" [1 point]"),
            Node::text(" and "),
            Node::bold("a"),
            Node::text("b"),
        ])
        .unwrap()])
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn unknown_command_names_the_identifier() {
        let err = parse(r"\begin{prob}\foo{x}\end{prob}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn custom_converters_extend_the_parser() {
        let converters =
            Converters::default().with_command("answerline", Signature::none(), |_, _| {
                Ok(vec![Node::blob([Node::inline_response_box("")])?])
            });
        let tree = parse_with(r"\begin{prob}Name: \answerline\end{prob}", &converters).unwrap();
        let tree = paragraphize(tree).unwrap();
        let expected = Node::problem([Node::paragraph([
            Node::text("Name: "),
            Node::inline_response_box(""),
        ])
        .unwrap()])
        .unwrap();
        assert_eq!(tree, expected);
    }

    #[test]
    fn format_metadata() {
        let format = DsctexFormat;
        assert_eq!(format.name(), "dsctex");
        assert_eq!(format.file_extensions(), &["tex"]);
        assert!(format.supports_parsing() && format.supports_serialization());
    }
}
