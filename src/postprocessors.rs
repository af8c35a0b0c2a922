//! Tree rewrites applied between parsing and rendering
//!
//! [`paragraphize`] always runs; it turns the raw `Blob` runs produced by parsers into
//! `Paragraph`s. [`subsume_code`] and [`copy_images`] are opt-in and resolve the relative paths
//! stored in `CodeFile` / `ImageFile` nodes against a caller-supplied directory.

mod copy_images;
mod paragraphize;
mod subsume_code;

pub use copy_images::{copy_images, OnMissing};
pub use paragraphize::paragraphize;
pub use subsume_code::{subsume_code, subsume_code_with, BlankLines};

use crate::error::{PanprobError, Result};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Join a node's relative path onto `base`, refusing paths that leave it
fn resolve(base: &Path, relative_path: &str) -> Result<PathBuf> {
    let relative = Path::new(relative_path);
    let reason = if relative.is_absolute() {
        "expected a path relative to the problem file"
    } else if relative
        .components()
        .any(|component| component == Component::ParentDir)
    {
        "'..' may not appear in a relative path"
    } else {
        return Ok(base.join(relative));
    };
    Err(PanprobError::resource(
        relative,
        io::Error::new(io::ErrorKind::InvalidInput, reason),
    ))
}
