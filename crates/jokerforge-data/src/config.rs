//! Export configuration.
//!
//! Loaded from `jokerforge.ron`, `jokerforge.toml` or `jokerforge.json`;
//! every field has a default, so an empty file (or no file) is valid.

use crate::loader::{DataLoadError, deserialize_file, find_data_file};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Base name looked up by [`find_export_config`].
pub const CONFIG_BASE_NAME: &str = "jokerforge";

/// How archive entries are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

/// Sprite cell size in pixels at 1x scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub px: u32,
    pub py: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { px: 71, py: 95 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub compression: Compression,
    /// Embed the editable project file in the archive.
    pub include_project: bool,
    pub atlas: AtlasConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            include_project: true,
            atlas: AtlasConfig::default(),
        }
    }
}

/// Load an export config, choosing the format from the file extension.
pub fn load_export_config(path: &Path) -> Result<ExportConfig, DataLoadError> {
    let config: ExportConfig = deserialize_file(path)?;
    debug!(path = %path.display(), ?config, "loaded export config");
    Ok(config)
}

/// Load `jokerforge.{ron,toml,json}` from `dir`, or the defaults when none
/// exists. More than one format for the same base name is an error.
pub fn find_export_config(dir: &Path) -> Result<ExportConfig, DataLoadError> {
    match find_data_file(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_export_config(&path),
        None => Ok(ExportConfig::default()),
    }
}
