//! Offscreen viewport rendered into an egui texture

use std::sync::Arc;

use parking_lot::Mutex;

use objview_core::Scene;
use objview_renderer::{Camera, RenderSurface, Renderer};

/// Render texture for viewport
struct RenderTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    egui_texture_id: egui::TextureId,
    width: u32,
    height: u32,
}

/// GPU state behind the viewport image
pub struct ViewportState {
    pub renderer: Renderer,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    render_texture: Option<RenderTexture>,
}

impl ViewportState {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let renderer = Renderer::new(&device, format, width, height);
        Self {
            renderer,
            device,
            queue,
            render_texture: None,
        }
    }

    /// Ensures the render texture matches the requested size.
    ///
    /// Returns the egui texture id and whether the texture was recreated.
    pub fn ensure_texture(
        &mut self,
        width: u32,
        height: u32,
        egui_renderer: &mut egui_wgpu::Renderer,
    ) -> (egui::TextureId, bool) {
        let width = width.max(1);
        let height = height.max(1);

        if let Some(rt) = &self.render_texture
            && rt.width == width
            && rt.height == height
        {
            return (rt.egui_texture_id, false);
        }

        if let Some(old) = self.render_texture.take() {
            egui_renderer.free_texture(&old.egui_texture_id);
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Render Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.renderer.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let egui_texture_id =
            egui_renderer.register_native_texture(&self.device, &view, wgpu::FilterMode::Linear);

        self.renderer.resize(&self.device, width, height);
        tracing::debug!("Viewport texture resized to {}x{}", width, height);

        self.render_texture = Some(RenderTexture {
            texture,
            view,
            egui_texture_id,
            width,
            height,
        });

        (egui_texture_id, true)
    }

    /// Draws the scene into the texture. Does nothing before the first `ensure_texture`.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) {
        let Some(rt) = &self.render_texture else {
            return;
        };

        self.renderer.prepare(&self.device, &self.queue, scene, camera);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewport Render Encoder"),
            });
        self.renderer.render(&mut encoder, &rt.view);
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

pub type SharedViewportState = Arc<Mutex<ViewportState>>;

/// [`RenderSurface`] that draws into the shared viewport texture and asks
/// egui to repaint.
pub struct ViewportSurface {
    state: SharedViewportState,
    ctx: egui::Context,
}

impl ViewportSurface {
    pub fn new(state: SharedViewportState, ctx: egui::Context) -> Self {
        Self { state, ctx }
    }
}

impl RenderSurface for ViewportSurface {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.state.lock().render(scene, camera);
        self.ctx.request_repaint();
    }
}
