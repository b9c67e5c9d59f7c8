//! wgpu scene renderer
//!
//! `prepare` mirrors the scene into GPU buffers (one entry per mesh node,
//! keyed by [`ObjectId`]); `render` records a single pass that draws the
//! helper lines and then the meshes.

pub mod gpu_resources;

use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use objview_core::{DirectionalLight, NodeKind, Object3D, ObjectId, Scene};

use crate::camera::Camera;
use crate::vertex::{LineVertex, mesh_vertices};

/// Background color of the viewport
const CLEAR_COLOR: wgpu::Color = wgpu::Color::WHITE;

/// Ambient light strength added to the directional light
const AMBIENT_STRENGTH: f32 = 0.35;

/// Per-frame data shared by all pipelines (128 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
}

impl GlobalsUniform {
    pub fn new(camera: &Camera, light: &DirectionalLight) -> Self {
        let camera_uniform = camera.uniform();
        let [r, g, b, _] = light.color.to_rgba();
        Self {
            view_proj: camera_uniform.view_proj,
            eye: camera_uniform.eye,
            light_dir: light.direction().extend(0.0).to_array(),
            light_color: [r, g, b, light.intensity],
            ambient: [1.0, 1.0, 1.0, AMBIENT_STRENGTH],
        }
    }
}

/// Per-mesh data (80 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct LineBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    revision: u64,
}

/// Scene renderer
pub struct Renderer {
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    model_layout: wgpu::BindGroupLayout,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: HashMap<ObjectId, GpuMesh>,
    draw_order: Vec<ObjectId>,
    lines: Option<LineBuffer>,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let globals_layout =
            gpu_resources::create_uniform_bind_group_layout(device, "Globals Bind Group Layout");
        let model_layout =
            gpu_resources::create_uniform_bind_group_layout(device, "Model Bind Group Layout");

        let globals = GlobalsUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 1.0, 1.0],
            light_dir: [0.0, -1.0, 0.0, 0.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            ambient: [1.0, 1.0, 1.0, AMBIENT_STRENGTH],
        };
        let (globals_buffer, globals_bind_group) =
            gpu_resources::create_uniform(device, &globals_layout, "Globals Buffer", &globals);

        let mesh_pipeline =
            gpu_resources::create_mesh_pipeline(device, format, &globals_layout, &model_layout);
        let line_pipeline = gpu_resources::create_line_pipeline(device, format, &globals_layout);

        let (_, depth_view) = gpu_resources::create_depth_texture(device, width, height);

        Self {
            format,
            width: width.max(1),
            height: height.max(1),
            mesh_pipeline,
            line_pipeline,
            model_layout,
            globals_buffer,
            globals_bind_group,
            depth_view,
            meshes: HashMap::new(),
            draw_order: Vec::new(),
            lines: None,
        }
    }

    /// Color format of the render target
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Recreates the depth buffer for a new target size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        let (_, depth_view) = gpu_resources::create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    /// Uploads camera, light, helper lines and meshes for the next frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        camera: &Camera,
    ) {
        let light = scene
            .helpers()
            .iter()
            .find_map(|helper| match &helper.kind {
                NodeKind::Light(light) => Some(*light),
                _ => None,
            })
            .unwrap_or_default();
        let globals = GlobalsUniform::new(camera, &light);
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        self.prepare_lines(device, scene);

        let mut seen = HashSet::new();
        self.draw_order.clear();
        for handle in scene.children() {
            let root = handle.read();
            self.prepare_node(device, queue, &root, Mat4::IDENTITY, &mut seen);
        }

        let before = self.meshes.len();
        self.meshes.retain(|id, _| seen.contains(id));
        if self.meshes.len() != before {
            tracing::debug!("Released {} GPU meshes", before - self.meshes.len());
        }
    }

    fn prepare_lines(&mut self, device: &wgpu::Device, scene: &Scene) {
        if self
            .lines
            .as_ref()
            .is_some_and(|lines| lines.revision == scene.revision())
        {
            return;
        }

        let mut vertices = Vec::new();
        for helper in scene.helpers() {
            collect_lines(helper, Mat4::IDENTITY, &mut vertices);
        }

        self.lines = (!vertices.is_empty()).then(|| LineBuffer {
            buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Helper Line Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            vertex_count: vertices.len() as u32,
            revision: scene.revision(),
        });
    }

    fn prepare_node(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        node: &Object3D,
        parent: Mat4,
        seen: &mut HashSet<ObjectId>,
    ) {
        if !node.visible {
            return;
        }

        let world = parent * node.transform;

        if let NodeKind::Mesh(part) = &node.kind
            && !part.geometry.indices.is_empty()
        {
            let uniform = ModelUniform {
                model: world.to_cols_array_2d(),
                color: part.material.color.to_rgba(),
            };

            match self.meshes.get(&node.id()) {
                Some(mesh) => {
                    queue.write_buffer(&mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
                }
                None => {
                    let mesh = self.upload_mesh(device, node, part, &uniform);
                    self.meshes.insert(node.id(), mesh);
                }
            }

            seen.insert(node.id());
            self.draw_order.push(node.id());
        }

        for child in &node.children {
            self.prepare_node(device, queue, child, world, seen);
        }
    }

    fn upload_mesh(
        &self,
        device: &wgpu::Device,
        node: &Object3D,
        part: &objview_core::MeshPart,
        uniform: &ModelUniform,
    ) -> GpuMesh {
        let geometry = &part.geometry;
        let vertices = mesh_vertices(&geometry.positions, &geometry.normals);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let (uniform_buffer, bind_group) =
            gpu_resources::create_uniform(device, &self.model_layout, "Model Buffer", uniform);

        tracing::debug!(
            "Uploaded mesh '{}' ({} triangles)",
            node.name,
            geometry.triangle_count()
        );

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Records the frame into `encoder`, targeting `view`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(lines) = &self.lines {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
            render_pass.draw(0..lines.vertex_count, 0..1);
        }

        render_pass.set_pipeline(&self.mesh_pipeline);
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
        for id in &self.draw_order {
            let Some(mesh) = self.meshes.get(id) else {
                continue;
            };
            render_pass.set_bind_group(1, &mesh.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

/// Flattens line helpers into a LineList vertex array.
fn collect_lines(node: &Object3D, parent: Mat4, out: &mut Vec<LineVertex>) {
    if !node.visible {
        return;
    }

    let world = parent * node.transform;
    if let NodeKind::Lines(lines) = &node.kind {
        for (pa, ca, pb, cb) in lines.segments() {
            out.push(LineVertex {
                position: world.transform_point3(pa.into()).to_array(),
                color: ca,
            });
            out.push(LineVertex {
                position: world.transform_point3(pb.into()).to_array(),
                color: cb,
            });
        }
    }

    for child in &node.children {
        collect_lines(child, world, out);
    }
}
