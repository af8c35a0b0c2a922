//! Format trait definition
//!
//! Every source or target format implements [`Format`]. The trait gives the registry and the
//! pipeline one way to parse a document into a problem tree and to serialize a tree back out.

use crate::ast::Node;
use crate::error::{PanprobError, Result};

/// A problem format
///
/// Formats can support parsing, serialization, or both. Parsing returns the raw tree straight
/// from the parser, which may still contain `Blob`s; serialization expects a paragraphized tree.
pub trait Format: Send + Sync {
    /// The name of this format (e.g. "dsctex", "gsmd", "html")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// File extensions (without the dot) that map to this format
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a problem tree
    ///
    /// Default implementation returns a NotSupported error.
    fn parse(&self, _source: &str) -> Result<Node> {
        Err(PanprobError::NotSupported(format!(
            "format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a problem tree into text
    ///
    /// Default implementation returns a NotSupported error.
    fn serialize(&self, _tree: &Node) -> Result<String> {
        Err(PanprobError::NotSupported(format!(
            "format '{}' does not support serialization",
            self.name()
        )))
    }
}
