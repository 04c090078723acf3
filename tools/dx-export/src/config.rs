//! Export configuration (export.toml)
//!
//! The configuration is an explicit value handed to the exporter; nothing is
//! kept in global state between exports.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ExportError;

/// Which objects an export writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Every mesh in the scene, static
    #[default]
    All,
    /// Every selected mesh, static
    Selected,
    /// One selected mesh skinned to one selected armature, with animation
    Animated,
}

impl ExportMode {
    pub fn is_animated(self) -> bool {
        self == ExportMode::Animated
    }
}

/// Lowest accepted animation speed
pub const MIN_TICKS_PER_SECOND: u32 = 1;
/// Highest accepted animation speed
pub const MAX_TICKS_PER_SECOND: u32 = 100;

/// Export options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub mode: ExportMode,
    /// Write a MeshNormals block (default: true)
    #[serde(default = "default_true")]
    pub write_normals: bool,
    /// Write a MeshVertexColors block (default: false)
    #[serde(default)]
    pub write_vertex_colors: bool,
    /// Write a MeshTextureCoords block (default: false)
    #[serde(default)]
    pub write_texcoords: bool,
    /// Write a MeshMaterialList block (default: true)
    #[serde(default = "default_true")]
    pub write_materials: bool,
    /// Convert right-handed Z-up to left-handed Y-up (default: true)
    #[serde(default = "default_true")]
    pub swap_y_z: bool,
    /// Add the world translation of each mesh to its vertices (default: true)
    #[serde(default = "default_true")]
    pub apply_world_translation: bool,
    /// Animation ticks per second (default: 25, range: 1-100)
    #[serde(default = "default_ticks")]
    pub ticks_per_second: u32,
    /// Compressed output. Reserved; enabling it fails the export.
    #[serde(default)]
    pub compressed: bool,
}

fn default_true() -> bool {
    true
}

fn default_ticks() -> u32 {
    25
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::All,
            write_normals: true,
            write_vertex_colors: false,
            write_texcoords: false,
            write_materials: true,
            swap_y_z: true,
            apply_world_translation: true,
            ticks_per_second: default_ticks(),
            compressed: false,
        }
    }
}

impl ExportConfig {
    /// Load options from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: ExportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        Ok(config)
    }

    /// Reject settings the exporter cannot honour.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.compressed {
            return Err(ExportError::CompressionUnsupported);
        }
        if !(MIN_TICKS_PER_SECOND..=MAX_TICKS_PER_SECOND).contains(&self.ticks_per_second) {
            return Err(ExportError::TicksOutOfRange(self.ticks_per_second));
        }
        Ok(())
    }
}
