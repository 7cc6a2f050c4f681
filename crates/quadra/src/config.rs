//! Renderer and window configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take their defaults. Load with [`RendererConfig::from_json_file`]
//! or build one in code and adjust the fields you care about:
//!
//! ```ignore
//! let config = RendererConfig {
//!     max_quads: 16384,
//!     sort_order: Some(SortOrder::ByRenderState),
//!     ..RendererConfig::default()
//! };
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sprite::{BlendMode, IndexFormat, SortOrder};

/// Settings for a [`SpriteRenderer`](crate::sprite::SpriteRenderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Quads the GPU streaming buffers hold before they are orphaned.
    pub max_quads: usize,
    /// Quads the CPU batch reserves up front. It grows on demand.
    pub initial_batch_capacity: usize,
    pub index_format: IndexFormat,
    /// Order to draw each flush in; `None` keeps submission order.
    pub sort_order: Option<SortOrder>,
    pub blend_mode: BlendMode,
    /// RGBA color the frame is cleared to.
    pub clear_color: [f64; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads: 4096,
            initial_batch_capacity: 1024,
            index_format: IndexFormat::U16,
            sort_order: Some(SortOrder::BackToFront),
            blend_mode: BlendMode::Alpha,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded renderer config from {}", path.display());
        Ok(config)
    }

    /// Check the values a [`SpriteEffect`](crate::sprite::SpriteEffect)
    /// cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_quads == 0 {
            return Err(Error::Config("max_quads must be at least 1".into()));
        }
        let vertices = self
            .max_quads
            .checked_mul(4)
            .ok_or_else(|| Error::Config(format!("max_quads {} is too large", self.max_quads)))?;
        if vertices > self.index_format.max_vertices() {
            return Err(Error::Config(format!(
                "max_quads {} needs {vertices} vertices, more than {:?} indices can address ({})",
                self.max_quads,
                self.index_format,
                self.index_format.max_vertices(),
            )));
        }
        Ok(())
    }
}

/// Settings for the window the [`App`](crate::app::App) opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "quadra".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}
