//! Inline external code files
//!
//! Every `CodeFile` becomes a `Code` node with the same language and the file's contents. Leading
//! and trailing blank lines are dropped; everything else, including trailing whitespace on kept
//! lines, is preserved.

use super::resolve;
use crate::ast::Node;
use crate::error::{PanprobError, Result};
use crate::text::{is_whitespace_only, trim_blank_lines};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which lines count as blank when trimming file contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlankLines {
    /// Lines holding only spaces or tabs are blank too
    #[default]
    WhitespaceOnly,
    /// Only truly empty lines are blank
    EmptyOnly,
}

impl BlankLines {
    pub fn is_blank(self, line: &str) -> bool {
        match self {
            BlankLines::WhitespaceOnly => is_whitespace_only(line),
            BlankLines::EmptyOnly => line.is_empty(),
        }
    }
}

pub fn subsume_code(tree: Node, base: &Path) -> Result<Node> {
    subsume_code_with(tree, base, BlankLines::default())
}

pub fn subsume_code_with(tree: Node, base: &Path, blank_lines: BlankLines) -> Result<Node> {
    match tree {
        Node::CodeFile {
            language,
            relative_path,
        } => {
            let path = resolve(base, &relative_path)?;
            let contents =
                fs::read_to_string(&path).map_err(|err| PanprobError::resource(&path, err))?;
            log::debug!("subsumed code file {}", path.display());
            let code = trim_blank_lines(&contents, |line| blank_lines.is_blank(line));
            Ok(Node::code(language, code))
        }
        node if node.is_internal() => {
            node.try_map_children(|child| subsume_code_with(child, base, blank_lines))
        }
        leaf => Ok(leaf),
    }
}
