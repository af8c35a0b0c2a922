//! Gradescope Markdown format
//!
//! The Markdown dialect of Gradescope online assignments, parsed with comrak plus a line scanner
//! for the Gradescope block syntax.

mod parser;
mod serializer;

pub use parser::parse_gsmd as parse;
pub use serializer::{serialize as render, serialize_with as render_with};

use crate::ast::Node;
use crate::error::Result;
use crate::format::Format;

#[derive(Default)]
pub struct GsmdFormat;

impl Format for GsmdFormat {
    fn name(&self) -> &str {
        "gsmd"
    }

    fn description(&self) -> &str {
        "Gradescope-flavored Markdown"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md"]
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
