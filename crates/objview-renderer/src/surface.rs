//! Render surface seam
//!
//! The editor issues every redraw synchronously through a [`RenderSurface`].
//! The desktop app backs it with the wgpu [`crate::Renderer`]; headless
//! callers can use [`NullSurface`].

use objview_core::Scene;

use crate::camera::Camera;

/// Something that can draw the scene as seen by a camera.
pub trait RenderSurface {
    /// Draws the current state. Must be idempotent for unchanged input.
    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Called when the viewport size changes.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Surface that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render(&mut self, _scene: &Scene, _camera: &Camera) {}
}
