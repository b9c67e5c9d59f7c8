//! Scene graph.
//!
//! The scene holds references to element-owned renderables plus a few helper
//! nodes (grid, reference line, light) that are drawn but never picked.

mod bounds;
mod geometry;
pub mod helpers;
mod object;

pub use bounds::*;
pub use geometry::*;
pub use object::*;

use std::sync::Arc;

use parking_lot::RwLock;

/// Shared handle to an element's root node.
///
/// The element owns the handle; the scene only keeps a clone of it.
pub type RenderableHandle = Arc<RwLock<Object3D>>;

/// Wraps a node into a shareable handle.
pub fn renderable(object: Object3D) -> RenderableHandle {
    Arc::new(RwLock::new(object))
}

/// The scene rendered by the viewer.
pub struct Scene {
    children: Vec<RenderableHandle>,
    helpers: Vec<Object3D>,
    revision: u64,
}

impl Scene {
    /// Creates a scene without helpers.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            helpers: Vec::new(),
            revision: 0,
        }
    }

    /// Adds a helper node. Helpers are rendered but never picked.
    pub fn add_helper(&mut self, helper: Object3D) {
        self.helpers.push(helper);
        self.revision += 1;
    }

    pub fn helpers(&self) -> &[Object3D] {
        &self.helpers
    }

    /// Attaches a renderable. Returns false if it is already attached.
    pub fn add(&mut self, handle: RenderableHandle) -> bool {
        if self.contains(&handle) {
            return false;
        }
        self.children.push(handle);
        self.revision += 1;
        true
    }

    /// Detaches a renderable by its root id.
    pub fn remove(&mut self, id: ObjectId) -> Option<RenderableHandle> {
        let pos = self.children.iter().position(|h| h.read().id() == id)?;
        self.revision += 1;
        Some(self.children.remove(pos))
    }

    pub fn contains(&self, handle: &RenderableHandle) -> bool {
        self.children.iter().any(|h| Arc::ptr_eq(h, handle))
    }

    /// Attached renderables in attachment order.
    pub fn children(&self) -> &[RenderableHandle] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Counter bumped on every structural change.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
