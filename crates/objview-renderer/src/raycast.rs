//! Ray casting against the scene graph

use glam::{Mat4, Vec3};
use uuid::Uuid;

use objview_core::{ElementId, NodeKind, Object3D, ObjectId, Scene};

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray; the direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Z),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Identity of one node on the path from a hit back to its root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRef {
    pub id: ObjectId,
    pub uuid: Uuid,
    /// Element id stored on the node, if any
    pub element: Option<ElementId>,
}

impl NodeRef {
    fn of(node: &Object3D) -> Self {
        Self {
            id: node.id(),
            uuid: node.uuid(),
            element: node.user_data,
        }
    }
}

/// One ray/triangle hit
#[derive(Debug, Clone)]
pub struct Intersection {
    /// Distance from the ray origin
    pub distance: f32,
    pub point: Vec3,
    /// Mesh node that was hit
    pub object: ObjectId,
    /// Index of the triangle within the mesh
    pub face_index: usize,
    /// The hit node first, then each parent up to the scene root
    pub ancestors: Vec<NodeRef>,
}

/// Intersects every attached mesh in the scene, nearest hit first.
///
/// Helper nodes and invisible subtrees are skipped.
pub fn intersect_scene(ray: &Ray, scene: &Scene) -> Vec<Intersection> {
    let mut hits = Vec::new();

    for handle in scene.children() {
        let root = handle.read();
        intersect_object(ray, &root, Mat4::IDENTITY, &mut Vec::new(), &mut hits);
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Intersects a subtree, appending hits to `out`.
pub fn intersect_object(
    ray: &Ray,
    node: &Object3D,
    parent_transform: Mat4,
    path: &mut Vec<NodeRef>,
    out: &mut Vec<Intersection>,
) {
    if !node.visible {
        return;
    }

    let world = parent_transform * node.transform;
    path.push(NodeRef::of(node));

    if let NodeKind::Mesh(part) = &node.kind {
        let bounds = part.geometry.bounds.transform(&world);
        if !bounds.is_empty() && ray_aabb_intersection(ray, bounds.min, bounds.max).is_some() {
            for (face_index, [a, b, c]) in part.geometry.triangles().enumerate() {
                let v0 = world.transform_point3(a);
                let v1 = world.transform_point3(b);
                let v2 = world.transform_point3(c);

                if let Some(t) = ray_triangle_intersection(ray, v0, v1, v2) {
                    out.push(Intersection {
                        distance: t,
                        point: ray.at(t),
                        object: node.id(),
                        face_index,
                        ancestors: path.iter().rev().copied().collect(),
                    });
                }
            }
        }
    }

    for child in &node.children {
        intersect_object(ray, child, world, path, out);
    }

    path.pop();
}

/// Ray-AABB (Axis-Aligned Bounding Box) intersection test
/// Returns the distance to intersection if hit, None otherwise
pub fn ray_aabb_intersection(ray: &Ray, bbox_min: Vec3, bbox_max: Vec3) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (bbox_min - ray.origin) * inv_dir;
    let t2 = (bbox_max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Ray-triangle intersection using Möller–Trumbore algorithm.
/// Both faces are hit.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-6;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None; // Ray is parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON { Some(t) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use objview_core::{Geometry, Material, MeshPart, helpers, renderable};

    fn quad(z: f32) -> MeshPart {
        MeshPart {
            geometry: Geometry::new(
                vec![[-1.0, -1.0, z], [1.0, -1.0, z], [1.0, 1.0, z], [-1.0, 1.0, z]],
                Vec::new(),
                vec![0, 1, 2, 0, 2, 3],
            ),
            material: Material::default(),
        }
    }

    fn down_z() -> Ray {
        Ray::new(Vec3::new(0.2, 0.1, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let ray = down_z();
        let v0 = Vec3::new(-1.0, -1.0, 0.0);
        let v1 = Vec3::new(1.0, -1.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let t = ray_triangle_intersection(&ray, v0, v1, v2).unwrap();
        assert!((t - 10.0).abs() < 1e-5);

        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray_triangle_intersection(&away, v0, v1, v2).is_none());
    }

    #[test]
    fn test_hits_sorted_by_distance_with_ancestors() {
        let mut scene = Scene::new();

        let mut far = Object3D::group("far");
        far.add(Object3D::mesh("far-mesh", quad(-5.0)));
        let far_id = far.id();

        let mut near = Object3D::group("near");
        let element = ElementId::new();
        near.user_data = Some(element);
        near.add(Object3D::mesh("near-mesh", quad(2.0)));
        let near_id = near.id();

        scene.add(renderable(far));
        scene.add(renderable(near));

        let hits = intersect_scene(&down_z(), &scene);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance < hits[1].distance);

        assert_eq!(hits[0].ancestors.len(), 2);
        assert_eq!(hits[0].object, hits[0].ancestors[0].id);
        assert_eq!(hits[0].ancestors[1].id, near_id);
        assert_eq!(hits[0].ancestors[1].element, Some(element));
        assert_eq!(hits[0].ancestors[0].element, None);
        assert_eq!(hits[1].ancestors[1].id, far_id);
    }

    #[test]
    fn test_transforms_are_applied() {
        let mut scene = Scene::new();
        let mut root = Object3D::group("moved")
            .with_transform(Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)));
        root.add(Object3D::mesh("mesh", quad(0.0)));
        scene.add(renderable(root));

        assert!(intersect_scene(&down_z(), &scene).is_empty());

        let moved = Ray::new(Vec3::new(100.2, 0.1, 10.0), Vec3::NEG_Z);
        let hits = intersect_scene(&moved, &scene);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].point.x, 100.2, epsilon = 1e-4);
    }

    #[test]
    fn test_helpers_and_hidden_nodes_are_ignored() {
        let mut scene = Scene::new();
        scene.add_helper(helpers::grid_helper(
            30.0,
            30,
            objview_core::Color::from_hex(0x00FF00),
            helpers::GRID_LINE_COLOR,
        ));

        let mut hidden = Object3D::mesh("hidden", quad(0.0));
        hidden.visible = false;
        scene.add(renderable(hidden));

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        assert!(intersect_scene(&ray, &scene).is_empty());
        assert!(intersect_scene(&down_z(), &scene).is_empty());
    }

    #[test]
    fn test_aabb() {
        let ray = down_z();
        assert!(ray_aabb_intersection(&ray, Vec3::splat(-1.0), Vec3::splat(1.0)).is_some());
        assert!(ray_aabb_intersection(&ray, Vec3::splat(2.0), Vec3::splat(3.0)).is_none());
    }
}
