//! Scene graph nodes.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Mat4;
use uuid::Uuid;

use super::{DirectionalLight, LineSet, MeshPart};
use crate::element::ElementId;

static NEXT_OBJECT_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique numeric node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// What a node draws.
#[derive(Debug)]
pub enum NodeKind {
    /// Pure transform node
    Group,
    Mesh(MeshPart),
    Lines(LineSet),
    Light(DirectionalLight),
}

/// A node in the scene hierarchy.
///
/// Children are owned and nodes keep no parent link; the ray caster records
/// the chain from the root while it descends.
#[derive(Debug)]
pub struct Object3D {
    id: ObjectId,
    uuid: Uuid,
    pub name: String,
    /// Transform relative to the parent
    pub transform: Mat4,
    /// Element that owns this node, if any
    pub user_data: Option<ElementId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
    pub kind: NodeKind,
    pub children: Vec<Object3D>,
}

impl Object3D {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: ObjectId::next(),
            uuid: Uuid::new_v4(),
            name: name.into(),
            transform: Mat4::IDENTITY,
            user_data: None,
            cast_shadow: false,
            receive_shadow: false,
            visible: true,
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, part: MeshPart) -> Self {
        Self::new(name, NodeKind::Mesh(part))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Appends a child node.
    pub fn add(&mut self, child: Object3D) {
        self.children.push(child);
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    /// Visits this node and all descendants, parents before children.
    pub fn traverse<'a>(&'a self, f: &mut impl FnMut(&'a Object3D)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    /// Mutable depth-first traversal, parents before children.
    pub fn traverse_mut(&mut self, f: &mut impl FnMut(&mut Object3D)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Visits every mesh part in the subtree.
    pub fn for_each_mesh_part_mut(&mut self, mut f: impl FnMut(&mut MeshPart)) {
        self.traverse_mut(&mut |node| {
            if let NodeKind::Mesh(part) = &mut node.kind {
                f(part);
            }
        });
    }

    /// Number of mesh nodes in the subtree.
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.is_mesh() {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Material};

    fn triangle_part() -> MeshPart {
        MeshPart {
            geometry: Geometry::new(
                vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                Vec::new(),
                vec![0, 1, 2],
            ),
            material: Material::default(),
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Object3D::group("a");
        let b = Object3D::group("b");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.uuid(), b.uuid());
    }

    #[test]
    fn test_traverse_visits_nested_mesh() {
        let mut root = Object3D::group("root");
        let mut inner = Object3D::group("inner");
        inner.add(Object3D::mesh("mesh", triangle_part()));
        root.add(inner);

        let mut names = Vec::new();
        root.traverse(&mut |node| names.push(node.name.as_str()));
        assert_eq!(names, vec!["root", "inner", "mesh"]);
        assert_eq!(root.mesh_count(), 1);
    }
}
