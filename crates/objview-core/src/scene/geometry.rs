//! Mesh and line geometry carried by scene nodes.

use glam::Vec3;

use super::BoundingBox;
use crate::color::Color;

/// Indexed triangle geometry.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals (same length as positions)
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Local-space bounds
    pub bounds: BoundingBox,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let bounds = BoundingBox::from_points(&positions);
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates over the triangles as position triples, skipping out-of-range indices.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = self.positions.get(tri[0] as usize)?;
            let b = self.positions.get(tri[1] as usize)?;
            let c = self.positions.get(tri[2] as usize)?;
            Some([Vec3::from(*a), Vec3::from(*b), Vec3::from(*c)])
        })
    }
}

/// Surface material. Only a flat tint is supported.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub color: Color,
}

impl Material {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

/// One drawable mesh primitive.
#[derive(Debug, Clone, Default)]
pub struct MeshPart {
    pub geometry: Geometry,
    pub material: Material,
}

/// How line vertices are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTopology {
    /// Consecutive pairs form segments
    List,
    /// Each vertex connects to the next
    Strip,
}

/// Colored line geometry for helpers (grid, reference line).
#[derive(Debug, Clone)]
pub struct LineSet {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex RGB colors
    pub colors: Vec<[f32; 3]>,
    pub topology: LineTopology,
}

impl LineSet {
    /// Expands a strip into an explicit segment list.
    pub fn segments(&self) -> Vec<([f32; 3], [f32; 3], [f32; 3], [f32; 3])> {
        let vertex = |i: usize| (self.positions[i], self.colors[i]);
        let count = self.positions.len().min(self.colors.len());

        let pairs: Vec<(usize, usize)> = match self.topology {
            LineTopology::List => (0..count / 2).map(|i| (2 * i, 2 * i + 1)).collect(),
            LineTopology::Strip => (1..count).map(|i| (i - 1, i)).collect(),
        };

        pairs
            .into_iter()
            .map(|(a, b)| {
                let (pa, ca) = vertex(a);
                let (pb, cb) = vertex(b);
                (pa, ca, pb, cb)
            })
            .collect()
    }
}

/// Directional light pointing from its position toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Normalized direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or(Vec3::NEG_Y)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0xFFFFFF),
            intensity: 1.0,
            position: Vec3::Y,
        }
    }
}

/// Computes smooth per-vertex normals by accumulating face normals.
pub fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }

        let p0 = Vec3::from(positions[a]);
        let p1 = Vec3::from(positions[b]);
        let p2 = Vec3::from(positions[c]);
        // Unnormalized so larger faces weigh more
        let face = (p1 - p0).cross(p2 - p0);

        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    accumulated
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}
