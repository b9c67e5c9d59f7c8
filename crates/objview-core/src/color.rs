//! Material colors

use serde::{Deserialize, Serialize};

/// Gray applied to freshly loaded meshes
pub const DEFAULT_MESH_COLOR: Color = Color::from_hex(0x777777);

/// Color of selected meshes
pub const HIGHLIGHT_COLOR: Color = Color::from_hex(0xFF0000);

/// 24-bit RGB color stored as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00FF_FFFF)
    }

    pub const fn hex(&self) -> u32 {
        self.0
    }

    /// Linear RGBA in 0.0-1.0 with opaque alpha
    pub fn to_rgba(&self) -> [f32; 4] {
        let r = ((self.0 >> 16) & 0xFF) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xFF) as f32 / 255.0;
        let b = (self.0 & 0xFF) as f32 / 255.0;
        [r, g, b, 1.0]
    }
}

impl Default for Color {
    fn default() -> Self {
        DEFAULT_MESH_COLOR
    }
}
