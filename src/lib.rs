//! # panprob
//!
//! Converts exam and homework problems between formats.
//!
//! A problem is parsed from a source format into a canonical tree of [`ast::Node`]s, cleaned up
//! by [`postprocessors`], and rendered into a target format:
//!
//!     parse (dsctex | gsmd) → paragraphize → [subsume_code] → [copy_images] → render (dsctex | gsmd | html)
//!
//! The quickest way in is [`convert`]:
//!
//!     let html = panprob::convert(r"\begin{prob}\textbf{Hi}\end{prob}", "dsctex", "html")?;
//!
//! For control over the optional postprocessors use [`pipeline::Pipeline`]. Individual parsers
//! and renderers live in [`formats`], and are also reachable by name through
//! [`registry::FormatRegistry`].

pub mod ast;
pub mod config;
pub mod error;
pub mod format;
pub mod formats;
pub mod pipeline;
pub mod postprocessors;
pub mod registry;
mod text;

pub use ast::{Node, NodeKind};
pub use error::{ErrorKind, PanprobError, Position, Result};
pub use format::Format;
pub use pipeline::{convert, ConvertOptions, Pipeline};
pub use registry::FormatRegistry;
