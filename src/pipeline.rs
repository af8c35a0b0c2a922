//! End-to-end conversion
//!
//! parse → paragraphize → [subsume_code] → [copy_images] → serialize
//!
//! Paragraphize always runs. The two file-system postprocessors run only when their options are
//! set, since they need to know where the referenced files live.

use crate::ast::{Node, NodeKind};
use crate::config::PanprobConfig;
use crate::error::{PanprobError, Result};
use crate::postprocessors::{
    copy_images, paragraphize, subsume_code_with, BlankLines, OnMissing,
};
use crate::registry::FormatRegistry;
use std::path::PathBuf;

/// Inline `CodeFile`s, resolving paths against `base_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsumeCode {
    pub base_dir: PathBuf,
    pub blank_lines: BlankLines,
}

/// Copy images from `src_dir` to `dest_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyImages {
    pub src_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub on_missing: OnMissing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub subsume_code: Option<SubsumeCode>,
    pub copy_images: Option<CopyImages>,
}

impl ConvertOptions {
    /// Options for converting `input` into `output` as enabled by `config`
    ///
    /// Code files are resolved next to the input; images are copied from the input's directory
    /// to the output's directory.
    pub fn from_config(
        config: &PanprobConfig,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let input_dir = input_dir.into();
        let subsume_code = config.subsume_code.enabled.then(|| SubsumeCode {
            base_dir: input_dir.clone(),
            blank_lines: config.subsume_code.blank_lines,
        });
        let copy_images = config.copy_images.enabled.then(|| CopyImages {
            src_dir: input_dir.clone(),
            dest_dir: output_dir.into(),
            on_missing: config.copy_images.on_missing,
        });
        Self {
            subsume_code,
            copy_images,
        }
    }
}

pub struct Pipeline {
    registry: FormatRegistry,
    options: ConvertOptions,
}

impl Pipeline {
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_registry(FormatRegistry::with_defaults(), options)
    }

    pub fn with_registry(registry: FormatRegistry, options: ConvertOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Parse `source` and run the postprocessors, without rendering
    pub fn load(&self, source: &str, from: &str) -> Result<Node> {
        let tree = self.registry.parse(source, from)?;
        log::debug!("parsed {from} source into {} nodes", tree.descendants().count());

        let mut tree = paragraphize(tree)?;
        log::debug!("paragraphized tree");

        if let Some(subsume) = &self.options.subsume_code {
            tree = subsume_code_with(tree, &subsume.base_dir, subsume.blank_lines)?;
            log::debug!("subsumed code files from {}", subsume.base_dir.display());
        }

        if let Some(copy) = &self.options.copy_images {
            let copied = copy_images(&tree, &copy.src_dir, &copy.dest_dir, copy.on_missing)?;
            log::debug!("copied {copied} image(s) to {}", copy.dest_dir.display());
        }

        Ok(tree)
    }

    pub fn convert(&self, source: &str, from: &str, to: &str) -> Result<String> {
        let tree = self.load(source, from)?;
        if tree.contains_kind(NodeKind::Blob) {
            return Err(PanprobError::Postprocess(
                "a Blob survived paragraphize".to_string(),
            ));
        }
        debug_assert!(tree.validate().is_ok());

        let output = self.registry.serialize(&tree, to)?;
        log::debug!("rendered {} bytes of {to}", output.len());
        Ok(output)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

/// Convert between two formats with default options
pub fn convert(source: &str, from: &str, to: &str) -> Result<String> {
    Pipeline::default().convert(source, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Loader;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn converts_dsctex_to_html() {
        let html = convert(r"\begin{prob}\textbf{Hi}\end{prob}", "dsctex", "html").unwrap();
        assert!(html.contains("<p><b>Hi</b></p>"));
    }

    #[test]
    fn converts_gsmd_to_dsctex() {
        let tex = convert("What is **2+2**?\n\n( ) 3\n(x) 4\n", "gsmd", "dsctex").unwrap();
        assert!(tex.starts_with("\\begin{prob}\n    What is \\textbf{2+2}?"));
        assert!(tex.contains("\\correctchoice {\n            4\n        }"));
    }

    #[test]
    fn unknown_formats_fail() {
        let err = convert("x", "docx", "html").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let html = convert(r"\begin{prob}\end{prob}", "dsctex", "html").unwrap();
        assert!(html.contains("problem-body"));
        let err = convert("x", "html", "dsctex").unwrap_err();
        assert!(matches!(err, PanprobError::NotSupported(_)));
    }

    #[test]
    fn code_files_need_subsume_code_for_html() {
        let source = r"\begin{prob}\inputminted{python}{a.py}\end{prob}";
        let err = convert(source, "dsctex", "html").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "print(1)\n").unwrap();
        let options = ConvertOptions {
            subsume_code: Some(SubsumeCode {
                base_dir: dir.path().to_path_buf(),
                blank_lines: BlankLines::default(),
            }),
            copy_images: None,
        };
        let html = Pipeline::new(options).convert(source, "dsctex", "html").unwrap();
        assert!(html.contains("<code>print(1)</code>"));
    }

    #[test]
    fn copies_images_when_enabled() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("fig.png"), b"png").unwrap();

        let config = Loader::new()
            .set_override("copy_images.enabled", true)
            .unwrap()
            .build()
            .unwrap();
        let options = ConvertOptions::from_config(&config, src.path(), dest.path());
        assert!(options.subsume_code.is_none());

        let source = "\\begin{prob}\n\\includegraphics{fig.png}\n\\end{prob}";
        Pipeline::new(options).convert(source, "dsctex", "gsmd").unwrap();
        assert!(dest.path().join("fig.png").exists());
    }
}
