//! Copy image files next to a rendered document
//!
//! The tree itself is left unchanged; only files on disk are touched.

use super::resolve;
use crate::ast::Node;
use crate::error::{PanprobError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when an image's source file does not exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMissing {
    #[default]
    Fail,
    /// Log a warning and leave the destination alone
    Skip,
}

/// Copy `src/rel` to `dest/rel` for every `ImageFile` in `tree`, returning how many were copied
pub fn copy_images(tree: &Node, src: &Path, dest: &Path, on_missing: OnMissing) -> Result<usize> {
    let mut copied = 0;
    for node in tree.descendants() {
        let Node::ImageFile { relative_path } = node else {
            continue;
        };
        let from = resolve(src, relative_path)?;
        let to = resolve(dest, relative_path)?;

        if !from.is_file() && on_missing == OnMissing::Skip {
            log::warn!("skipping missing image {}", from.display());
            continue;
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|err| PanprobError::resource(parent, err))?;
        }
        fs::copy(&from, &to).map_err(|err| PanprobError::resource(&from, err))?;
        log::debug!("copied image {} to {}", from.display(), to.display());
        copied += 1;
    }
    Ok(copied)
}
