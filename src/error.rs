//! Error types shared by every stage of a conversion
//!
//! All failures surface as a single [`PanprobError`]. [`PanprobError::kind`] tells the broad
//! categories apart.

use crate::ast::NodeKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A line/column location in a source document (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset within `source`
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Coarse classification of a [`PanprobError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    Parse,
    Render,
    Resource,
    Format,
    Config,
}

#[derive(Debug, Error)]
pub enum PanprobError {
    /// A child of a disallowed kind was added to an internal node
    #[error("cannot add child of type {child} to {parent}")]
    IllegalChild { parent: NodeKind, child: NodeKind },

    #[error(
        "parse error{}: {message}",
        .location.map(|l| format!(" at {l}")).unwrap_or_default()
    )]
    Parse {
        message: String,
        location: Option<Position>,
    },

    #[error("cannot render {node}: {message}")]
    Render { node: NodeKind, message: String },

    #[error("postprocessing error: {0}")]
    Postprocess(String),

    #[error("cannot access '{}': {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format '{0}' not found")]
    FormatNotFound(String),

    #[error("{0}")]
    NotSupported(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("cannot encode tree as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PanprobError {
    pub fn parse(message: impl Into<String>) -> Self {
        PanprobError::Parse {
            message: message.into(),
            location: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, location: Position) -> Self {
        PanprobError::Parse {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn render(node: NodeKind, message: impl Into<String>) -> Self {
        PanprobError::Render {
            node,
            message: message.into(),
        }
    }

    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PanprobError::Resource {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PanprobError::IllegalChild { .. } | PanprobError::Postprocess(_) => {
                ErrorKind::Structural
            }
            PanprobError::Parse { .. } => ErrorKind::Parse,
            PanprobError::Render { .. } | PanprobError::Json(_) => ErrorKind::Render,
            PanprobError::Resource { .. } => ErrorKind::Resource,
            PanprobError::FormatNotFound(_) | PanprobError::NotSupported(_) => ErrorKind::Format,
            PanprobError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, PanprobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_from_offset_counts_lines_and_columns() {
        let source = "ab\ncde\nf";
        assert_eq!(Position::from_offset(source, 0), Position::new(1, 1));
        assert_eq!(Position::from_offset(source, 4), Position::new(2, 2));
        assert_eq!(Position::from_offset(source, 7), Position::new(3, 1));
        assert_eq!(Position::from_offset(source, 100), Position::new(3, 2));
    }

    #[test]
    fn parse_error_mentions_location_when_known() {
        let err = PanprobError::parse_at("unknown command '\\foo'", Position::new(2, 5));
        assert_eq!(
            err.to_string(),
            "parse error at line 2, column 5: unknown command '\\foo'"
        );

        let err = PanprobError::parse("bad");
        assert_eq!(err.to_string(), "parse error: bad");
    }

    #[test]
    fn illegal_child_names_both_kinds() {
        let err = PanprobError::IllegalChild {
            parent: NodeKind::Paragraph,
            child: NodeKind::Problem,
        };
        assert_eq!(err.to_string(), "cannot add child of type Problem to Paragraph");
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn resource_error_keeps_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = PanprobError::resource("img/a.png", io);
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("img/a.png"));
    }

    #[test]
    fn json_errors_convert_with_question_mark() {
        // JSON object keys must be strings
        fn encode() -> Result<String> {
            let map = std::collections::BTreeMap::from([(vec![1u8], "one")]);
            Ok(serde_json::to_string(&map)?)
        }
        let err = encode().unwrap_err();
        assert!(matches!(err, PanprobError::Json(_)));
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(err.to_string().starts_with("cannot encode tree as JSON: "), "{err}");
    }
}
