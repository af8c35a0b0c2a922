//! Markup-to-AST converters
//!
//! Second stage of the DSCTeX parser. Commands and environments are looked up by name in two
//! tables of converter functions. Callers extend or override the built-in tables through
//! [`Converters::with_command`] and [`Converters::with_environment`].
//!
//! Every converter is registered with a [`Signature`] naming the argument groups it takes. Stage
//! one collects every `{...}`/`[...]` group that follows a command; groups past the signature
//! are not arguments and are converted as ordinary content right after the command's output.
//!
//! Converters return zero or more nodes. Inline content (text, inline math, inline code,
//! response boxes) comes back wrapped in a `Blob`; paragraphize later merges adjacent Blobs into
//! paragraphs.

use super::latex::{Command, Environment, Group, GroupKind, LatexNode};
use crate::ast::Node;
use crate::error::{PanprobError, Position, Result};
use crate::text::{dedent, is_whitespace_only, trim_blank_lines};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub type CommandConverter =
    Box<dyn Fn(&Command, &Context<'_>) -> Result<Vec<Node>> + Send + Sync>;
pub type EnvironmentConverter =
    Box<dyn Fn(&Environment, &Context<'_>) -> Result<Vec<Node>> + Send + Sync>;

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("blank line pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgSpec {
    Mandatory,
    Optional,
    OptionalBrace,
}

/// The argument groups a command or environment takes, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    args: Vec<ArgSpec>,
}

impl Signature {
    /// No arguments
    pub fn none() -> Self {
        Self::default()
    }

    /// A required `{...}` argument
    pub fn mandatory(mut self) -> Self {
        self.args.push(ArgSpec::Mandatory);
        self
    }

    /// An optional `[...]` argument
    pub fn optional(mut self) -> Self {
        self.args.push(ArgSpec::Optional);
        self
    }

    /// A `{...}` argument that may be left out, like the `{}` in `\Tf{}`
    pub fn optional_brace(mut self) -> Self {
        self.args.push(ArgSpec::OptionalBrace);
        self
    }

    fn mandatory_count(&self) -> usize {
        self.args
            .iter()
            .filter(|spec| **spec == ArgSpec::Mandatory)
            .count()
    }

    /// Split `groups` into the arguments this signature takes and the groups that follow
    ///
    /// Returns `None` when a mandatory argument is missing.
    pub fn bind<'g>(&self, groups: &'g [Group]) -> Option<(&'g [Group], &'g [Group])> {
        let mut taken = 0;
        for spec in &self.args {
            let (kind, required) = match spec {
                ArgSpec::Mandatory => (GroupKind::Brace, true),
                ArgSpec::Optional => (GroupKind::Bracket, false),
                ArgSpec::OptionalBrace => (GroupKind::Brace, false),
            };
            if groups.get(taken).map(|group| group.kind) == Some(kind) {
                taken += 1;
            } else if required {
                return None;
            }
        }
        Some(groups.split_at(taken))
    }
}

/// Name-indexed converter tables
pub struct Converters {
    commands: HashMap<String, (Signature, CommandConverter)>,
    environments: HashMap<String, (Signature, EnvironmentConverter)>,
}

impl Converters {
    /// Tables with no converters at all
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
            environments: HashMap::new(),
        }
    }

    /// Register (or replace) the converter for `\name`
    pub fn with_command<F>(
        mut self,
        name: impl Into<String>,
        signature: Signature,
        converter: F,
    ) -> Self
    where
        F: Fn(&Command, &Context<'_>) -> Result<Vec<Node>> + Send + Sync + 'static,
    {
        self.commands
            .insert(name.into(), (signature, Box::new(converter)));
        self
    }

    /// Register (or replace) the converter for `\begin{name}`
    pub fn with_environment<F>(
        mut self,
        name: impl Into<String>,
        signature: Signature,
        converter: F,
    ) -> Self
    where
        F: Fn(&Environment, &Context<'_>) -> Result<Vec<Node>> + Send + Sync + 'static,
    {
        self.environments
            .insert(name.into(), (signature, Box::new(converter)));
        self
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn has_environment(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }
}

impl Default for Converters {
    fn default() -> Self {
        let none = Signature::none;
        let text_arg = || Signature::none().mandatory();
        let minted_args = || Signature::none().optional().mandatory().mandatory();

        Converters::empty()
            .with_environment("prob", none(), |env, ctx| {
                Ok(vec![Node::problem(ctx.convert_all(&env.contents)?)?])
            })
            .with_environment("subprob", none(), |env, ctx| {
                Ok(vec![Node::subproblem(ctx.convert_all(&env.contents)?)?])
            })
            .with_environment("subprobset", none(), |env, ctx| {
                let mut subproblems = Vec::new();
                for node in env.contents.iter().filter(|node| !node.is_whitespace()) {
                    subproblems.extend(ctx.convert(node)?);
                }
                Ok(subproblems)
            })
            .with_environment("soln", none(), |env, ctx| {
                Ok(vec![Node::solution(ctx.convert_all(&env.contents)?)?])
            })
            .with_environment("choices", none().optional(), convert_choices)
            .with_environment("minted", none().optional().mandatory(), |env, ctx| {
                let language = env
                    .brace_arg(0)
                    .ok_or_else(|| ctx.error(env.offset, "minted expects a language argument"))?;
                let code = trim_blank_lines(&dedent(&env.raw_contents), is_whitespace_only);
                Ok(vec![Node::code(language.raw.trim(), code)])
            })
            .with_environment("$", none(), |env, _| {
                Ok(vec![Node::blob([Node::inline_math(env.raw_contents.clone())])?])
            })
            .with_environment("$$", none(), convert_display_math)
            .with_environment("displaymath", none(), convert_display_math)
            .with_command("textbf", text_arg(), |cmd, ctx| style_argument(cmd, ctx, Style::Bold))
            .with_command("textit", text_arg(), |cmd, ctx| style_argument(cmd, ctx, Style::Italic))
            .with_command("emph", text_arg(), |cmd, ctx| style_argument(cmd, ctx, Style::Italic))
            .with_command("includegraphics", none().optional().mandatory(), |cmd, ctx| {
                let path = required_arg(cmd, ctx, 0)?;
                Ok(vec![Node::image_file(path.raw.trim())])
            })
            .with_command("inputminted", minted_args(), |cmd, ctx| {
                let language = required_arg(cmd, ctx, 0)?;
                let path = required_arg(cmd, ctx, 1)?;
                Ok(vec![Node::code_file(language.raw.trim(), path.raw.trim())])
            })
            .with_command("mintinline", minted_args(), |cmd, ctx| {
                let language = required_arg(cmd, ctx, 0)?;
                let code = required_arg(cmd, ctx, 1)?;
                Ok(vec![Node::blob([Node::inline_code(
                    language.raw.trim(),
                    code.raw.clone(),
                )])?])
            })
            .with_command("Tf", none().optional_brace(), |_, _| {
                Ok(vec![Node::true_false(true)])
            })
            .with_command("tF", none().optional_brace(), |_, _| {
                Ok(vec![Node::true_false(false)])
            })
            .with_command("inlineresponsebox", text_arg(), |cmd, ctx| {
                let answer = required_arg(cmd, ctx, 0)?;
                Ok(vec![Node::blob([Node::inline_response_box(
                    answer.raw.trim(),
                )])?])
            })
    }
}

/// Handle passed to every converter for recursive conversion
pub struct Context<'a> {
    converters: &'a Converters,
    source: &'a str,
}

impl<'a> Context<'a> {
    pub(super) fn new(converters: &'a Converters, source: &'a str) -> Self {
        Self { converters, source }
    }

    pub fn convert(&self, node: &LatexNode) -> Result<Vec<Node>> {
        match node {
            LatexNode::Text(text) => convert_text(text),
            LatexNode::Command(cmd) => self.convert_command(cmd),
            LatexNode::Environment(env) => self.convert_environment(env),
        }
    }

    pub fn convert_all(&self, nodes: &[LatexNode]) -> Result<Vec<Node>> {
        let mut converted = Vec::new();
        for node in nodes {
            converted.extend(self.convert(node)?);
        }
        Ok(converted)
    }

    pub fn convert_command(&self, cmd: &Command) -> Result<Vec<Node>> {
        let Some((signature, converter)) = self.converters.commands.get(&cmd.name) else {
            return Err(self.error(cmd.offset, format!("unknown command '\\{}'", cmd.name)));
        };
        let (bound, rest) = self.bind_command(cmd, signature)?;
        let mut nodes = converter(&bound, self)?;
        for group in rest {
            nodes.extend(self.convert_all(&group.to_content())?);
        }
        Ok(nodes)
    }

    pub fn convert_environment(&self, env: &Environment) -> Result<Vec<Node>> {
        let Some((signature, converter)) = self.converters.environments.get(&env.name) else {
            return Err(self.error(env.offset, format!("unknown environment '{}'", env.name)));
        };
        let (args, rest) = signature.bind(&env.args).ok_or_else(|| {
            self.missing_arguments(&format!("\\begin{{{}}}", env.name), signature, env.offset)
        })?;

        // groups the environment does not take belong to its body
        let mut bound = Environment {
            name: env.name.clone(),
            args: args.to_vec(),
            contents: Vec::new(),
            raw_contents: String::new(),
            offset: env.offset,
        };
        if let (Some(first), Some(last)) = (rest.first(), rest.last()) {
            for group in rest {
                bound.contents.extend(group.to_content());
            }
            bound
                .raw_contents
                .push_str(&self.source[first.span.start..last.span.end]);
        }
        bound.contents.extend(env.contents.iter().cloned());
        bound.raw_contents.push_str(&env.raw_contents);
        converter(&bound, self)
    }

    /// Split a command's groups by `signature`, returning the command with only its arguments
    /// and the groups that follow them
    pub fn bind_command<'c>(
        &self,
        cmd: &'c Command,
        signature: &Signature,
    ) -> Result<(Command, &'c [Group])> {
        let (args, rest) = signature.bind(&cmd.args).ok_or_else(|| {
            self.missing_arguments(&format!("\\{}", cmd.name), signature, cmd.offset)
        })?;
        let bound = Command {
            name: cmd.name.clone(),
            args: args.to_vec(),
            offset: cmd.offset,
        };
        Ok((bound, rest))
    }

    fn missing_arguments(&self, what: &str, signature: &Signature, offset: usize) -> PanprobError {
        let count = signature.mandatory_count();
        self.error(offset, format!("'{what}' expects {count} argument(s)"))
    }

    /// A parse error located at a byte offset of the source being converted
    pub fn error(&self, offset: usize, message: impl Into<String>) -> PanprobError {
        PanprobError::parse_at(message, Position::from_offset(self.source, offset))
    }
}

/// Plain text becomes one Blob, with a ParBreak wherever the text has a blank line
fn convert_text(text: &str) -> Result<Vec<Node>> {
    let mut blob = Node::blob([])?;
    for (i, piece) in BLANK_LINE.split(text).enumerate() {
        if i > 0 {
            blob.add_child(Node::par_break())?;
        }
        if !piece.is_empty() {
            blob.add_child(Node::text(piece))?;
        }
    }
    Ok(vec![blob])
}

fn required_arg<'c>(cmd: &'c Command, ctx: &Context<'_>, index: usize) -> Result<&'c Group> {
    cmd.brace_arg(index).ok_or_else(|| {
        ctx.error(
            cmd.offset,
            format!("'\\{}' expects {} argument(s)", cmd.name, index + 1),
        )
    })
}

fn convert_display_math(env: &Environment, _: &Context<'_>) -> Result<Vec<Node>> {
    let latex = trim_blank_lines(&dedent(&env.raw_contents), is_whitespace_only);
    Ok(vec![Node::display_math(latex)])
}

#[derive(Clone, Copy)]
enum Style {
    Bold,
    Italic,
}

/// Convert the first argument and set the style on every Text inside it
fn style_argument(cmd: &Command, ctx: &Context<'_>, style: Style) -> Result<Vec<Node>> {
    let argument = required_arg(cmd, ctx, 0)?;
    ctx.convert_all(&argument.contents)?
        .into_iter()
        .map(|node| apply_style(node, style))
        .collect()
}

fn apply_style(node: Node, style: Style) -> Result<Node> {
    match node {
        Node::Text { text, bold, italic } => Ok(match style {
            Style::Bold => Node::styled_text(text, true, italic),
            Style::Italic => Node::styled_text(text, bold, true),
        }),
        Node::Blob { .. } => node.try_map_children(|child| apply_style(child, style)),
        other => Ok(other),
    }
}

/// `\begin{choices}` holds `\choice` / `\correctchoice` markers, each followed by its content
///
/// The marker's optional brace argument and everything up to the next marker form the choice.
/// A `[rectangle]` option turns the list into a multiple-select question.
fn convert_choices(env: &Environment, ctx: &Context<'_>) -> Result<Vec<Node>> {
    let mut choices: Vec<Node> = Vec::new();
    for node in &env.contents {
        match node {
            LatexNode::Command(cmd) if cmd.name == "choice" || cmd.name == "correctchoice" => {
                let (marker, rest) = ctx.bind_command(cmd, &Signature::none().optional_brace())?;
                let mut body = match marker.brace_arg(0) {
                    Some(group) => ctx.convert_all(&group.contents)?,
                    None => Vec::new(),
                };
                for group in rest {
                    body.extend(ctx.convert_all(&group.to_content())?);
                }
                choices.push(Node::choice(cmd.name == "correctchoice", body)?);
            }
            other => match choices.last_mut() {
                Some(current) => current.add_children(ctx.convert(other)?)?,
                None if other.is_whitespace() => {}
                None => {
                    return Err(ctx.error(env.offset, "content before the first \\choice"));
                }
            },
        }
    }

    let select = env
        .bracket_arg(0)
        .map(|option| option.raw.trim() == "rectangle")
        .unwrap_or(false);
    let container = if select {
        Node::multiple_select(choices)?
    } else {
        Node::multiple_choice(choices)?
    };
    Ok(vec![container])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::dsctex::latex;

    fn convert(source: &str) -> Result<Vec<Node>> {
        let converters = Converters::default();
        let ctx = Context::new(&converters, source);
        ctx.convert_all(&latex::parse(source)?)
    }

    #[test]
    fn text_splits_at_blank_lines() {
        let nodes = convert("one\n  \ntwo").unwrap();
        let expected =
            Node::blob([Node::text("one"), Node::par_break(), Node::text("two")]).unwrap();
        assert_eq!(nodes, vec![expected]);
    }

    #[test]
    fn styles_apply_to_nested_text() {
        let nodes = convert(r"\textbf{a \textit{b}}").unwrap();
        let expected = vec![
            Node::blob([Node::bold("a ")]).unwrap(),
            Node::blob([Node::styled_text("b", true, true)]).unwrap(),
        ];
        assert_eq!(nodes, expected);
    }

    #[test]
    fn inline_math_is_wrapped_in_a_blob() {
        let nodes = convert("$x$").unwrap();
        assert_eq!(nodes, vec![Node::blob([Node::inline_math("x")]).unwrap()]);
    }

    #[test]
    fn minted_is_dedented_and_trimmed() {
        let nodes = convert("\\begin{minted}{python}\n    def f():\n        pass\n    \\end{minted}").unwrap();
        assert_eq!(nodes, vec![Node::code("python", "def f():\n    pass")]);
    }

    #[test]
    fn choices_with_rectangle_become_multiple_select() {
        let source = "\\begin{choices}[rectangle]\n  \\choice {a}\n  \\correctchoice b\n\\end{choices}";
        let nodes = convert(source).unwrap();
        let [Node::MultipleSelect { children }] = nodes.as_slice() else {
            panic!("expected a multiple select, got {nodes:?}");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), crate::ast::NodeKind::Choice);
        assert!(matches!(children[1], Node::Choice { correct: true, .. }));
    }

    #[test]
    fn content_before_first_choice_is_an_error() {
        let err = convert("\\begin{choices}oops\\choice{a}\\end{choices}").unwrap_err();
        assert!(err.to_string().contains("before the first"), "{err}");
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = convert("\n  \\foo{x}").unwrap_err();
        assert_eq!(err.to_string(), "parse error at line 2, column 3: unknown command '\\foo'");
        let err = convert(r"\begin{tabular}\end{tabular}").unwrap_err();
        assert!(err.to_string().contains("unknown environment 'tabular'"));
    }

    #[test]
    fn caller_converters_override_built_ins() {
        let converters = Converters::default()
            .with_command("textbf", Signature::none().mandatory(), |_, _| {
                Ok(vec![Node::true_false(true)])
            })
            .with_command("hint", Signature::none().mandatory(), |cmd, ctx| {
                ctx.convert_all(&cmd.args[0].contents)
            });
        let source = r"\textbf{x}\hint{y}";
        let ctx = Context::new(&converters, source);
        let nodes = ctx.convert_all(&latex::parse(source).unwrap()).unwrap();
        assert_eq!(
            nodes,
            vec![Node::true_false(true), Node::blob([Node::text("y")]).unwrap()]
        );
        assert!(converters.has_command("emph"));
    }

    #[test]
    fn signature_binds_only_declared_groups() {
        let groups = match &latex::parse(r"\x[a]{b}{c}").unwrap()[0] {
            LatexNode::Command(cmd) => cmd.args.clone(),
            other => panic!("expected a command, got {other:?}"),
        };
        let (args, rest) = Signature::none().optional().mandatory().bind(&groups).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].raw, "c");

        let (args, rest) = Signature::none().optional_brace().bind(&groups).unwrap();
        assert!(args.is_empty());
        assert_eq!(rest.len(), 3);

        assert_eq!(Signature::none().optional().mandatory().mandatory().bind(&groups[..2]), None);
    }

    #[test]
    fn groups_after_a_command_stay_content() {
        let nodes = convert(r"\textbf{a}{b} [c]").unwrap();
        let expected = vec![
            Node::blob([Node::bold("a")]).unwrap(),
            Node::blob([Node::text("b")]).unwrap(),
            Node::blob([Node::text(" [c]")]).unwrap(),
        ];
        assert_eq!(nodes, expected);
    }

    #[test]
    fn missing_mandatory_argument_is_reported() {
        let err = convert(r"\inputminted[x]{python}").unwrap_err();
        assert!(err.to_string().contains("'\\inputminted' expects 2 argument(s)"), "{err}");
    }

    #[test]
    fn groups_after_begin_join_the_body() {
        let source = "\\begin{minted}{python} {x}\n    y\n\\end{minted}";
        let nodes = convert(source).unwrap();
        assert_eq!(nodes, vec![Node::code("python", "{x}\n    y")]);
    }
}
