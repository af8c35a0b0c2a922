//! LaTeX markup tree
//!
//! First stage of the DSCTeX parser. Source text is tokenized with logos and assembled by a small
//! recursive-descent parser into a tree of [`LatexNode`]s. Nothing here knows which commands or
//! environments exist; that is decided by the converters in the second stage.
//!
//! Math delimiters are turned into environments so converters can treat them uniformly:
//!
//!     $...$    -> environment "$"
//!     \(...\)  -> environment "$"
//!     $$...$$  -> environment "$$"
//!     \[...\]  -> environment "displaymath"

use crate::error::{PanprobError, Position, Result};
use logos::Logos;
use std::ops::Range;

/// Environments whose body is kept as raw text and never tokenized
const VERBATIM_ENVIRONMENTS: &[&str] = &["minted", "verbatim"];

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
enum Token {
    #[regex(r"\\[a-zA-Z@]+\*?")]
    ControlWord,

    #[regex(r"\\[^a-zA-Z@]")]
    ControlSymbol,

    #[token("$$")]
    DoubleDollar,

    #[token("$")]
    Dollar,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    // a comment swallows its newline
    #[regex(r"%[^\n]*\n?")]
    Comment,

    #[regex(r"[^\\{}\[\]$%]+")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatexNode {
    Text(String),
    Command(Command),
    Environment(Environment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// `{...}`, a required argument
    Brace,
    /// `[...]`, an optional argument
    Bracket,
}

/// An argument group following a command or `\begin{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub kind: GroupKind,
    pub contents: Vec<LatexNode>,
    /// Source text between the delimiters
    pub raw: String,
    /// Spaces or tabs skipped between the command and the opening delimiter
    pub leading: String,
    /// Byte range from the leading whitespace through the closing delimiter
    pub span: Range<usize>,
}

impl Group {
    /// The group as plain content again, for arguments a command does not take
    ///
    /// A brace group contributes its contents; a bracket group keeps its brackets as text.
    pub fn to_content(&self) -> Vec<LatexNode> {
        let mut nodes = Vec::new();
        push_text(&mut nodes, &self.leading);
        if self.kind == GroupKind::Bracket {
            push_text(&mut nodes, "[");
        }
        for node in &self.contents {
            push_node(&mut nodes, node.clone());
        }
        if self.kind == GroupKind::Bracket {
            push_text(&mut nodes, "]");
        }
        nodes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Group>,
    /// Byte offset of the backslash in the source
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub args: Vec<Group>,
    /// Parsed body; empty for verbatim environments
    pub contents: Vec<LatexNode>,
    pub raw_contents: String,
    pub offset: usize,
}

fn nth_group(args: &[Group], kind: GroupKind, index: usize) -> Option<&Group> {
    args.iter().filter(|group| group.kind == kind).nth(index)
}

impl Command {
    /// The `index`-th required (brace) argument
    pub fn brace_arg(&self, index: usize) -> Option<&Group> {
        nth_group(&self.args, GroupKind::Brace, index)
    }

    pub fn bracket_arg(&self, index: usize) -> Option<&Group> {
        nth_group(&self.args, GroupKind::Bracket, index)
    }
}

impl Environment {
    pub fn brace_arg(&self, index: usize) -> Option<&Group> {
        nth_group(&self.args, GroupKind::Brace, index)
    }

    pub fn bracket_arg(&self, index: usize) -> Option<&Group> {
        nth_group(&self.args, GroupKind::Bracket, index)
    }
}

impl LatexNode {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, LatexNode::Text(text) if text.trim().is_empty())
    }
}

/// What ends the sequence currently being parsed
#[derive(Debug, Clone, PartialEq, Eq)]
enum Closer {
    EndOfInput,
    Brace,
    Bracket,
    /// `$` or `$$`
    Math(Token),
    /// `\)` or `\]`
    Symbol(&'static str),
    End(String),
}

impl Closer {
    fn describe(&self) -> String {
        match self {
            Closer::EndOfInput => "input".to_string(),
            Closer::Brace => "'{' group".to_string(),
            Closer::Bracket => "'[' group".to_string(),
            Closer::Math(Token::DoubleDollar) => "'$$' math".to_string(),
            Closer::Math(_) => "'$' math".to_string(),
            Closer::Symbol(")") => "'\\(' math".to_string(),
            Closer::Symbol(_) => "'\\[' math".to_string(),
            Closer::End(name) => format!("environment '{name}'"),
        }
    }
}

type Lexeme = (std::result::Result<Token, ()>, Range<usize>);

fn tokenize(source: &str, from: usize) -> Vec<Lexeme> {
    let mut lexer = Token::lexer(&source[from..]);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        let span = lexer.span();
        tokens.push((token, span.start + from..span.end + from));
    }
    tokens
}

/// Parse LaTeX source into a sequence of markup nodes
pub fn parse(source: &str) -> Result<Vec<LatexNode>> {
    let mut parser = Parser {
        source,
        tokens: tokenize(source, 0),
        pos: 0,
    };
    let (nodes, _) = parser.parse_sequence(&Closer::EndOfInput, 0)?;
    Ok(nodes)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn error(&self, offset: usize, message: impl Into<String>) -> PanprobError {
        PanprobError::parse_at(message, Position::from_offset(self.source, offset))
    }

    /// Offset of the next unconsumed token
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn slice(&self, span: &Range<usize>) -> &'s str {
        &self.source[span.clone()]
    }

    /// Drop the remaining tokens and lex again from `offset`
    fn seek(&mut self, offset: usize) {
        self.tokens.truncate(self.pos);
        self.tokens.extend(tokenize(self.source, offset));
    }

    /// Parse nodes until `closer` is consumed, returning them and the offset where the closer began
    fn parse_sequence(
        &mut self,
        closer: &Closer,
        opened_at: usize,
    ) -> Result<(Vec<LatexNode>, usize)> {
        let mut nodes = Vec::new();
        loop {
            let Some((token, span)) = self.tokens.get(self.pos).cloned() else {
                if *closer == Closer::EndOfInput {
                    return Ok((nodes, self.source.len()));
                }
                return Err(self.error(opened_at, format!("unclosed {}", closer.describe())));
            };
            self.pos += 1;

            let token = token.map_err(|_| self.error(span.start, "unexpected character"))?;
            match token {
                Token::Text => push_text(&mut nodes, self.slice(&span)),
                Token::Comment => {}
                Token::OpenBrace => {
                    // a bare group contributes its contents in place
                    let group = self.parse_group(GroupKind::Brace, span.start)?;
                    for node in group.contents {
                        push_node(&mut nodes, node);
                    }
                }
                Token::CloseBrace => {
                    if *closer == Closer::Brace {
                        return Ok((nodes, span.start));
                    }
                    return Err(self.error(span.start, "unexpected '}'"));
                }
                Token::OpenBracket => push_text(&mut nodes, "["),
                Token::CloseBracket => {
                    if *closer == Closer::Bracket {
                        return Ok((nodes, span.start));
                    }
                    push_text(&mut nodes, "]");
                }
                Token::Dollar | Token::DoubleDollar => {
                    if *closer == Closer::Math(token) {
                        return Ok((nodes, span.start));
                    }
                    let name = if token == Token::Dollar { "$" } else { "$$" };
                    let math = self.parse_math(name, Closer::Math(token), span)?;
                    nodes.push(math);
                }
                Token::ControlSymbol => {
                    let symbol = &self.slice(&span)[1..];
                    match symbol {
                        "%" | "$" | "&" | "#" | "_" | "{" | "}" => push_text(&mut nodes, symbol),
                        "(" => nodes.push(self.parse_math("$", Closer::Symbol(")"), span)?),
                        "[" => {
                            let math = self.parse_math("displaymath", Closer::Symbol("]"), span)?;
                            nodes.push(math);
                        }
                        ")" | "]" => {
                            if *closer == Closer::Symbol(if symbol == ")" { ")" } else { "]" }) {
                                return Ok((nodes, span.start));
                            }
                            return Err(self.error(span.start, format!("unexpected '\\{symbol}'")));
                        }
                        _ => {
                            let args = self.parse_args()?;
                            nodes.push(LatexNode::Command(Command {
                                name: symbol.to_string(),
                                args,
                                offset: span.start,
                            }));
                        }
                    }
                }
                Token::ControlWord => {
                    let name = &self.slice(&span)[1..];
                    match name {
                        "begin" => nodes.push(self.parse_environment(span.start)?),
                        "end" => {
                            let ended = self.parse_name(span.start, "\\end")?;
                            if *closer == Closer::End(ended.clone()) {
                                return Ok((nodes, span.start));
                            }
                            let message = match closer {
                                Closer::End(open) => {
                                    format!("'\\end{{{ended}}}' does not match '\\begin{{{open}}}'")
                                }
                                _ => format!("unexpected '\\end{{{ended}}}'"),
                            };
                            return Err(self.error(span.start, message));
                        }
                        _ => {
                            if let Some(symbol) = text_symbol(name) {
                                self.skip_empty_group();
                                push_text(&mut nodes, symbol);
                                continue;
                            }
                            let args = self.parse_args()?;
                            nodes.push(LatexNode::Command(Command {
                                name: name.to_string(),
                                args,
                                offset: span.start,
                            }));
                        }
                    }
                }
            }
        }
    }

    fn parse_group(&mut self, kind: GroupKind, opened_at: usize) -> Result<Group> {
        let closer = match kind {
            GroupKind::Brace => Closer::Brace,
            GroupKind::Bracket => Closer::Bracket,
        };
        let body_start = opened_at + 1;
        let (contents, body_end) = self.parse_sequence(&closer, opened_at)?;
        Ok(Group {
            kind,
            contents,
            raw: self.source[body_start..body_end].to_string(),
            leading: String::new(),
            span: opened_at..body_end + 1,
        })
    }

    /// Consume one argument group if the next tokens open one
    ///
    /// Spaces and tabs may separate a command from its arguments.
    fn parse_arg(&mut self) -> Result<Option<Group>> {
        let mut look = self.pos;
        let mut leading = "";
        if let Some((Ok(Token::Text), span)) = self.tokens.get(look) {
            if self.slice(span).chars().all(|c| c == ' ' || c == '\t') {
                leading = self.slice(span);
                look += 1;
            }
        }
        let (kind, opened_at) = match self.tokens.get(look) {
            Some((Ok(Token::OpenBrace), span)) => (GroupKind::Brace, span.start),
            Some((Ok(Token::OpenBracket), span)) => (GroupKind::Bracket, span.start),
            _ => return Ok(None),
        };
        self.pos = look + 1;
        let mut group = self.parse_group(kind, opened_at)?;
        group.span.start = opened_at - leading.len();
        group.leading = leading.to_string();
        Ok(Some(group))
    }

    /// Consume a `{}` directly after a command, as in `\textbackslash{}`
    fn skip_empty_group(&mut self) {
        if let (Some((Ok(Token::OpenBrace), _)), Some((Ok(Token::CloseBrace), _))) =
            (self.tokens.get(self.pos), self.tokens.get(self.pos + 1))
        {
            self.pos += 2;
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Group>> {
        let mut args = Vec::new();
        while let Some(group) = self.parse_arg()? {
            args.push(group);
        }
        Ok(args)
    }

    /// The `{name}` after `\begin` or `\end`
    fn parse_name(&mut self, offset: usize, command: &str) -> Result<String> {
        match self.parse_arg()? {
            Some(group) if group.kind == GroupKind::Brace => Ok(group.raw.trim().to_string()),
            _ => Err(self.error(offset, format!("expected '{{name}}' after '{command}'"))),
        }
    }

    fn parse_environment(&mut self, offset: usize) -> Result<LatexNode> {
        let name = self.parse_name(offset, "\\begin")?;
        let args = self.parse_args()?;
        let body_start = self.offset();

        if VERBATIM_ENVIRONMENTS.contains(&name.as_str()) {
            let end_marker = format!("\\end{{{name}}}");
            let body_end = self.source[body_start..]
                .find(&end_marker)
                .map(|found| body_start + found)
                .ok_or_else(|| self.error(offset, format!("unclosed environment '{name}'")))?;
            self.seek(body_end + end_marker.len());
            return Ok(LatexNode::Environment(Environment {
                name,
                args,
                contents: Vec::new(),
                raw_contents: self.source[body_start..body_end].to_string(),
                offset,
            }));
        }

        let (contents, body_end) = self.parse_sequence(&Closer::End(name.clone()), offset)?;
        Ok(LatexNode::Environment(Environment {
            name,
            args,
            contents,
            raw_contents: self.source[body_start..body_end].to_string(),
            offset,
        }))
    }

    fn parse_math(&mut self, name: &str, closer: Closer, opener: Range<usize>) -> Result<LatexNode> {
        let (contents, body_end) = self.parse_sequence(&closer, opener.start)?;
        Ok(LatexNode::Environment(Environment {
            name: name.to_string(),
            args: Vec::new(),
            contents,
            raw_contents: self.source[opener.end..body_end].to_string(),
            offset: opener.start,
        }))
    }
}

/// Text-mode symbol commands, read as the character they print
fn text_symbol(name: &str) -> Option<&'static str> {
    match name {
        "textbackslash" => Some("\\"),
        "textasciitilde" => Some("~"),
        "textasciicircum" => Some("^"),
        _ => None,
    }
}

fn push_text(nodes: &mut Vec<LatexNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(LatexNode::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(LatexNode::Text(text.to_string()));
    }
}

fn push_node(nodes: &mut Vec<LatexNode>, node: LatexNode) {
    match node {
        LatexNode::Text(text) => push_text(nodes, &text),
        other => nodes.push(other),
    }
}
