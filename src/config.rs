//! Configuration loading
//!
//! `defaults/panprob.default.toml` is embedded into the crate. User files are layered on top of
//! it via [`Loader`] before deserializing into [`PanprobConfig`].

use crate::error::Result;
use crate::postprocessors::{BlankLines, OnMissing};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/panprob.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct PanprobConfig {
    pub subsume_code: SubsumeCodeConfig,
    pub copy_images: CopyImagesConfig,
    pub inspect: InspectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsumeCodeConfig {
    pub enabled: bool,
    pub blank_lines: BlankLines,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CopyImagesConfig {
    pub enabled: bool,
    pub on_missing: OnMissing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub format: InspectFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InspectFormat {
    Tree,
    Json,
}

/// Helper for layering user overrides over the built-in defaults
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a configuration file that may not exist
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from a command-line flag
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<PanprobConfig> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<PanprobConfig> {
    Loader::new().build()
}
