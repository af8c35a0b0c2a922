//! Format implementations
//!
//! Each submodule converts between the problem tree and one text representation.

pub mod dsctex;
pub mod gsmd;
pub mod html;
pub mod render;

pub use dsctex::DsctexFormat;
pub use gsmd::GsmdFormat;
pub use html::HtmlFormat;
pub use render::{Overrides, Render};
