//! Application configuration
//!
//! Viewer colors, camera defaults and grid layout, persisted as RON.

mod manager;

pub use manager::{ConfigError, ConfigManager, SharedConfig, create_shared_config};

use objview_core::scene::helpers::{GRID_CENTER_COLOR, GRID_LINE_COLOR};
use objview_core::{Color, DEFAULT_MESH_COLOR, ElementStyle, HIGHLIGHT_COLOR};
use objview_renderer::CameraSettings;
use serde::{Deserialize, Serialize};

/// Mesh colors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewerConfig {
    pub default_color: Color,
    /// Color of selected meshes
    pub highlight_color: Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_MESH_COLOR,
            highlight_color: HIGHLIGHT_COLOR,
        }
    }
}

impl ViewerConfig {
    pub fn style(&self) -> ElementStyle {
        ElementStyle {
            default_color: self.default_color,
            highlight_color: self.highlight_color,
        }
    }
}

/// Ground grid on the XZ plane
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Side length in world units
    pub size: f32,
    pub divisions: u32,
    pub center_color: Color,
    pub line_color: Color,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 30.0,
            divisions: 30,
            center_color: GRID_CENTER_COLOR,
            line_color: GRID_LINE_COLOR,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub grid: GridConfig,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}
