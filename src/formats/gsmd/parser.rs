//! Gradescope Markdown parsing
//!
//! Gradescope adds line-oriented blocks on top of Markdown: multiple choice lines `( )`/`(x)`,
//! multiple select lines `[ ]`/`[x]`, and solution lines `[[...]]`. A line scanner picks those out
//! (skipping fenced code), and everything in between is handed to comrak.
//!
//! Pipeline: source lines → blocks → comrak AST (per Markdown chunk) → problem tree

use crate::ast::Node;
use crate::error::{PanprobError, Result};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;

static SOLUTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\[(.*)\]\]\s*$").expect("solution pattern is valid"));

// comrak only accepts spaces in a link destination inside <...>
static RESPONSE_BOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(_+)\]\(([^)<][^)]*)\)").expect("response box pattern is valid")
});

/// A run of source lines recognised by the scanner
#[derive(Debug, PartialEq)]
enum Block {
    Markdown(String),
    Choices { select: bool, items: Vec<(bool, String)> },
    Solution(String),
    Blank,
}

/// Parse Gradescope Markdown into a raw problem tree
pub fn parse_gsmd(source: &str) -> Result<Node> {
    Node::problem(parse_body(source)?)
}

/// Parse a sequence of blocks, as found at the top level or inside a solution
fn parse_body(source: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for block in scan(source) {
        match block {
            Block::Blank => nodes.push(Node::blob([Node::par_break()])?),
            Block::Markdown(chunk) => nodes.extend(convert_markdown(&chunk)?),
            Block::Solution(body) => nodes.push(Node::solution(parse_body(&body)?)?),
            Block::Choices { select, items } => {
                let mut choices = Vec::new();
                for (correct, content) in items {
                    choices.push(Node::choice(correct, convert_markdown(&content)?)?);
                }
                nodes.push(if select {
                    Node::multiple_select(choices)?
                } else {
                    Node::multiple_choice(choices)?
                });
            }
        }
    }
    Ok(nodes)
}

fn choice_marker(line: &str) -> Option<(bool, bool, &str)> {
    let (select, correct) = match line.get(..3)? {
        "( )" => (false, false),
        "(x)" => (false, true),
        "[ ]" => (true, false),
        "[x]" => (true, true),
        _ => return None,
    };
    Some((select, correct, line[3..].trim()))
}

/// Opening or closing code fence marker, e.g. "```" or "~~~~"
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.len() - trimmed.trim_start_matches(fence_char).len();
    (run >= 3).then(|| &trimmed[..run])
}

fn scan(source: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;

    fn flush(chunk: &mut Vec<&str>, blocks: &mut Vec<Block>) {
        if !chunk.is_empty() {
            blocks.push(Block::Markdown(chunk.join("\n")));
            chunk.clear();
        }
    }

    for line in source.lines() {
        if let Some(open) = fence {
            chunk.push(line);
            let closes = fence_marker(line).is_some_and(|marker| {
                marker.starts_with(open) && line.trim().len() == marker.len()
            });
            if closes {
                fence = None;
            }
            continue;
        }

        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            chunk.push(line);
        } else if line.trim().is_empty() {
            flush(&mut chunk, &mut blocks);
            blocks.push(Block::Blank);
        } else if let Some((select, correct, content)) = choice_marker(line) {
            flush(&mut chunk, &mut blocks);
            match blocks.last_mut() {
                Some(Block::Choices { select: s, items }) if *s == select => {
                    items.push((correct, content.to_string()));
                }
                _ => blocks.push(Block::Choices {
                    select,
                    items: vec![(correct, content.to_string())],
                }),
            }
        } else if let Some(captures) = SOLUTION_LINE.captures(line) {
            flush(&mut chunk, &mut blocks);
            let inner = captures.get(1).map_or("", |m| m.as_str());
            match blocks.last_mut() {
                Some(Block::Solution(body)) => {
                    body.push('\n');
                    body.push_str(inner);
                }
                _ => blocks.push(Block::Solution(inner.to_string())),
            }
        } else {
            chunk.push(line);
        }
    }
    flush(&mut chunk, &mut blocks);
    blocks
}

fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.math_dollars = true;
    options
}

/// Parse a Markdown chunk with comrak and map its blocks to tree nodes
fn convert_markdown(markdown: &str) -> Result<Vec<Node>> {
    let markdown = RESPONSE_BOX.replace_all(markdown, "[$1](<$2>)");
    let arena = Arena::new();
    let root = parse_document(&arena, &markdown, &comrak_options());

    let mut nodes = Vec::new();
    for (i, block) in root.children().enumerate() {
        if i > 0 {
            nodes.push(Node::blob([Node::par_break()])?);
        }
        nodes.push(convert_block(block)?);
    }
    Ok(nodes)
}

fn convert_block<'a>(node: &'a AstNode<'a>) -> Result<Node> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::Paragraph => {
            if let Some(path) = lone_image(node) {
                return Ok(Node::image_file(path));
            }
            let mut inlines = Vec::new();
            collect_inlines(node, false, false, &mut inlines)?;
            Node::blob(inlines)
        }
        NodeValue::CodeBlock(code_block) => {
            let language = code_block.info.split_whitespace().next().unwrap_or("text");
            let code = code_block
                .literal
                .strip_suffix('\n')
                .unwrap_or(&code_block.literal);
            Ok(Node::code(language, code))
        }
        other => Err(unsupported(other)),
    }
}

/// The image path when a paragraph holds nothing but one image
fn lone_image<'a>(paragraph: &'a AstNode<'a>) -> Option<String> {
    let mut children = paragraph.children();
    let first = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match &first.data.borrow().value {
        NodeValue::Image(link) => Some(link.url.clone()),
        _ => None,
    }
}

fn collect_inlines<'a>(
    node: &'a AstNode<'a>,
    bold: bool,
    italic: bool,
    out: &mut Vec<Node>,
) -> Result<()> {
    for child in node.children() {
        let data = child.data.borrow();
        match &data.value {
            NodeValue::Text(text) => push_text(out, text, bold, italic),
            NodeValue::SoftBreak | NodeValue::LineBreak => push_text(out, " ", bold, italic),
            NodeValue::Strong => collect_inlines(child, true, italic, out)?,
            NodeValue::Emph => collect_inlines(child, bold, true, out)?,
            NodeValue::Code(code) => out.push(Node::inline_code("text", code.literal.clone())),
            NodeValue::Math(math) => out.push(Node::inline_math(math.literal.clone())),
            NodeValue::Link(link) if is_response_box(child) => {
                out.push(Node::inline_response_box(link.url.clone()))
            }
            NodeValue::Image(_) => {
                return Err(PanprobError::parse("inline images are not supported"))
            }
            other => return Err(unsupported(other)),
        }
    }
    Ok(())
}

/// A link whose text is only underscores, like `[____](answer)`
fn is_response_box<'a>(link: &'a AstNode<'a>) -> bool {
    let mut label = String::new();
    for child in link.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => label.push_str(text),
            _ => return false,
        }
    }
    !label.is_empty() && label.chars().all(|c| c == '_')
}

fn push_text(out: &mut Vec<Node>, text: &str, bold: bool, italic: bool) {
    if let Some(Node::Text {
        text: last,
        bold: last_bold,
        italic: last_italic,
    }) = out.last_mut()
    {
        if *last_bold == bold && *last_italic == italic {
            last.push_str(text);
            return;
        }
    }
    out.push(Node::styled_text(text, bold, italic));
}

fn unsupported(value: &NodeValue) -> PanprobError {
    let construct = match value {
        NodeValue::Heading(_) => "headings",
        NodeValue::List(_) | NodeValue::Item(_) => "lists",
        NodeValue::BlockQuote => "block quotes",
        NodeValue::ThematicBreak => "thematic breaks",
        NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => "raw HTML",
        NodeValue::Link(_) => "links",
        NodeValue::Table(_) => "tables",
        NodeValue::Strikethrough => "strikethrough",
        _ => "this Markdown construct",
    };
    PanprobError::parse(format!("{construct} are not supported"))
}
