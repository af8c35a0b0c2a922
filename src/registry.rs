//! Format registry for format discovery and selection
//!
//! Formats are registered and retrieved by name, or looked up by file extension.

use crate::ast::Node;
use crate::error::{PanprobError, Result};
use crate::format::Format;
use std::collections::HashMap;
use std::path::Path;

/// Registry of problem formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults();
/// let tree = registry.parse(source, "dsctex")?;
/// let html = registry.serialize(&paragraphize(tree)?, "html")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| PanprobError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Find the format claiming `extension` (case-insensitive, without the dot)
    pub fn for_extension(&self, extension: &str) -> Option<&dyn Format> {
        let extension = extension.to_ascii_lowercase();
        let mut matching: Vec<&dyn Format> = self
            .formats
            .values()
            .map(|f| f.as_ref())
            .filter(|f| f.file_extensions().contains(&extension.as_str()))
            .collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        matching.into_iter().next()
    }

    /// Name of the format for a file path, judged by its extension
    pub fn detect(&self, path: &Path) -> Result<&str> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        self.for_extension(extension)
            .map(|f| f.name())
            .ok_or_else(|| {
                PanprobError::NotSupported(format!(
                    "cannot infer a format from '{}'",
                    path.display()
                ))
            })
    }

    /// Parse source text using the named format
    pub fn parse(&self, source: &str, format: &str) -> Result<Node> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(PanprobError::NotSupported(format!(
                "format '{}' does not support parsing",
                format
            )));
        }
        fmt.parse(source)
    }

    /// Serialize a tree using the named format
    pub fn serialize(&self, tree: &Node, format: &str) -> Result<String> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(PanprobError::NotSupported(format!(
                "format '{}' does not support serialization",
                format
            )));
        }
        fmt.serialize(tree)
    }

    /// Create a registry with the built-in formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::formats::DsctexFormat);
        registry.register(crate::formats::GsmdFormat);
        registry.register(crate::formats::HtmlFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct TestFormat;

    impl Format for TestFormat {
        fn name(&self) -> &str {
            "test"
        }

        fn file_extensions(&self) -> &[&str] {
            &["tst"]
        }

        fn supports_parsing(&self) -> bool {
            true
        }

        fn parse(&self, _source: &str) -> Result<Node> {
            Node::problem([])
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);
        assert!(registry.has("test"));
        assert_eq!(registry.get("test").unwrap().name(), "test");
    }

    #[test]
    fn test_registry_get_nonexistent() {
        let registry = FormatRegistry::new();
        let err = registry.get("nope").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_registry_parse_and_serialize_capabilities() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);
        assert_eq!(registry.parse("", "test").unwrap(), Node::problem([]).unwrap());

        let tree = Node::problem([]).unwrap();
        let err = registry.serialize(&tree, "test").unwrap_err();
        assert!(matches!(err, PanprobError::NotSupported(_)));
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(registry.list_formats(), vec!["dsctex", "gsmd", "html"]);
    }

    #[test]
    fn test_html_is_render_only() {
        let registry = FormatRegistry::default();
        let err = registry.parse("<p>x</p>", "html").unwrap_err();
        assert!(matches!(err, PanprobError::NotSupported(_)));
    }

    #[test]
    fn test_for_extension() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(registry.for_extension("tex").unwrap().name(), "dsctex");
        assert_eq!(registry.for_extension("MD").unwrap().name(), "gsmd");
        assert_eq!(registry.for_extension("htm").unwrap().name(), "html");
        assert!(registry.for_extension("docx").is_none());
    }

    #[test]
    fn test_detect_from_path() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(registry.detect(Path::new("a/b/problem.tex")).unwrap(), "dsctex");
        assert!(registry.detect(Path::new("README")).is_err());
    }
}
