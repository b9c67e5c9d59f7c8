//! Element backed by a Wavefront OBJ file.

use super::{Element, ElementId, ElementStyle};
use crate::color::Color;
use crate::events::{ElementEvent, ElementEvents};
use crate::obj::{LoadError, ObjSource, parse_obj};
use crate::scene::{Geometry, Material, MeshPart, Object3D, RenderableHandle, renderable};

/// Element created from a dropped OBJ file.
///
/// `load` consumes the source bytes once and builds a group with one mesh
/// child per OBJ object.
pub struct ObjElement {
    id: ElementId,
    name: String,
    source: Option<ObjSource>,
    object: Option<RenderableHandle>,
    style: ElementStyle,
    color: Color,
    events: ElementEvents,
}

impl ObjElement {
    pub fn new(source: ObjSource) -> Self {
        Self::with_style(source, ElementStyle::default())
    }

    pub fn with_style(source: ObjSource, style: ElementStyle) -> Self {
        Self {
            id: ElementId::new(),
            name: source.stem().to_string(),
            source: Some(source),
            object: None,
            style,
            color: style.default_color,
            events: ElementEvents::new(),
        }
    }

    /// Parses the source file into a renderable.
    ///
    /// Single-shot: the source is consumed by the first call and any later
    /// call fails with [`LoadError::AlreadyLoaded`]. On failure the element
    /// keeps no renderable and must not be registered.
    pub async fn load(&mut self) -> Result<(), LoadError> {
        let source = self.source.take().ok_or(LoadError::AlreadyLoaded)?;
        tracing::debug!("Loading '{}' ({} bytes)", source.name, source.bytes.len());

        let meshes = match parse_obj(&source) {
            Ok(meshes) => meshes,
            Err(e) => {
                tracing::debug!("Loading '{}' failed", source.name);
                return Err(e);
            }
        };

        let mut root = Object3D::group(self.name.clone());
        root.user_data = Some(self.id);
        root.cast_shadow = true;
        root.receive_shadow = true;

        let total = meshes.len();
        for (i, mesh) in meshes.into_iter().enumerate() {
            let part = MeshPart {
                geometry: Geometry::new(mesh.positions, mesh.normals, mesh.indices),
                material: Material::new(self.style.default_color),
            };
            let mut child = Object3D::mesh(mesh.name, part);
            child.cast_shadow = true;
            child.receive_shadow = true;
            root.add(child);

            tracing::debug!("{:.0}% loaded", (i + 1) as f32 / total as f32 * 100.0);
        }

        self.object = Some(renderable(root));
        self.set_color(self.style.default_color);

        tracing::info!("Loaded '{}' as element {}", source.name, self.id);
        Ok(())
    }

    /// Returns true once `load` succeeded.
    pub fn is_loaded(&self) -> bool {
        self.object.is_some()
    }

    /// Tints every mesh part and notifies listeners.
    ///
    /// Does nothing before the element is loaded.
    pub fn set_color(&mut self, color: Color) {
        let Some(object) = &self.object else {
            return;
        };

        object
            .write()
            .for_each_mesh_part_mut(|part| part.material = Material::new(color));
        self.color = color;

        self.update();
    }

    /// Color currently applied to the mesh parts
    pub fn current_color(&self) -> Color {
        self.color
    }

    pub fn style(&self) -> ElementStyle {
        self.style
    }
}

impl Element for ObjElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn renderable(&self) -> Option<RenderableHandle> {
        self.object.clone()
    }

    fn events(&self) -> &ElementEvents {
        &self.events
    }

    fn dispatch(&mut self, event: ElementEvent) {
        if let ElementEvent::SelectionChanged(selection) = &event {
            if selection.contains(&self.id) {
                self.set_color(self.style.highlight_color);
            } else {
                self.set_color(self.style.default_color);
            }
        }

        self.events.emit(&event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{DEFAULT_MESH_COLOR, HIGHLIGHT_COLOR};
    use crate::events::{EventKind, SelectionSet};
    use crate::scene::NodeKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn part_colors(element: &ObjElement) -> Vec<Color> {
        let mut colors = Vec::new();
        element.renderable().unwrap().read().traverse(&mut |node| {
            if let NodeKind::Mesh(part) = &node.kind {
                colors.push(part.material.color);
            }
        });
        colors
    }

    #[test]
    fn test_load_triangle() {
        let mut element = ObjElement::new(ObjSource::new("tri.obj", TRIANGLE));
        assert!(element.renderable().is_none());

        pollster::block_on(element.load()).unwrap();

        let object = element.renderable().unwrap();
        let root = object.read();
        assert_eq!(root.user_data, Some(element.id()));
        assert!(root.cast_shadow && root.receive_shadow);
        assert_eq!(root.mesh_count(), 1);
        drop(root);

        assert_eq!(part_colors(&element), vec![DEFAULT_MESH_COLOR]);
        assert_eq!(element.name(), "tri");
    }

    #[test]
    fn test_load_failure_leaves_no_renderable() {
        let mut element = ObjElement::new(ObjSource::new("bad.obj", "garbage"));
        assert!(pollster::block_on(element.load()).is_err());
        assert!(element.renderable().is_none());
        assert!(!element.is_loaded());
    }

    #[test]
    fn test_second_load_is_rejected() {
        let mut element = ObjElement::new(ObjSource::new("tri.obj", TRIANGLE));
        pollster::block_on(element.load()).unwrap();

        let err = pollster::block_on(element.load()).unwrap_err();
        assert!(matches!(err, LoadError::AlreadyLoaded));
        assert!(element.is_loaded());
    }

    #[test]
    fn test_selection_recolors_every_part() {
        let source = "o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no b\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n";
        let mut element = ObjElement::new(ObjSource::new("two.obj", source));
        pollster::block_on(element.load()).unwrap();

        let selected: SelectionSet = [element.id()].into_iter().collect();
        element.dispatch(ElementEvent::SelectionChanged(Arc::new(selected)));
        assert_eq!(part_colors(&element), vec![HIGHLIGHT_COLOR; 2]);
        assert_eq!(element.current_color(), HIGHLIGHT_COLOR);

        element.dispatch(ElementEvent::SelectionChanged(Arc::new(SelectionSet::new())));
        assert_eq!(part_colors(&element), vec![DEFAULT_MESH_COLOR; 2]);
    }

    #[test]
    fn test_recolor_emits_update() {
        let mut element = ObjElement::new(ObjSource::new("tri.obj", TRIANGLE));
        pollster::block_on(element.load()).unwrap();

        let updates = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        let u = updates.clone();
        let s = seen.clone();
        element.events().subscribe(EventKind::Update, move |_| {
            u.fetch_add(1, Ordering::SeqCst);
        });
        element.events().subscribe(EventKind::SelectionChanged, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        element.dispatch(ElementEvent::SelectionChanged(Arc::new(SelectionSet::new())));

        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_style() {
        let style = ElementStyle {
            default_color: Color::from_hex(0x00FF00),
            highlight_color: Color::from_hex(0x0000FF),
        };
        let mut element = ObjElement::with_style(ObjSource::new("tri.obj", TRIANGLE), style);
        pollster::block_on(element.load()).unwrap();
        assert_eq!(part_colors(&element), vec![Color::from_hex(0x00FF00)]);
    }
}
