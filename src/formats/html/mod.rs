//! HTML output
//!
//! One-way serialization of a problem into an HTML fragment.

mod serializer;

pub use serializer::{serialize as render, serialize_with as render_with};

use crate::ast::Node;
use crate::error::Result;
use crate::format::Format;

/// HTML format
///
/// Render-only; there is no HTML parser.
#[derive(Default)]
pub struct HtmlFormat;

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "HTML fragment for previewing problems"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, tree: &Node) -> Result<String> {
        render(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_format_capabilities() {
        let format = HtmlFormat;
        assert_eq!(format.name(), "html");
        assert!(!format.supports_parsing());
        assert!(format.supports_serialization());
        assert_eq!(format.file_extensions(), &["html", "htm"]);
    }
}
