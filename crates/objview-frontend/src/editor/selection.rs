//! Resolving ray hits to registered elements

use objview_core::{ElementId, ElementManager};
use objview_renderer::Intersection;

/// Maps each hit to the element that owns it.
///
/// For every intersection the ancestor chain is walked from the hit node
/// upward; the first node whose element id is registered wins. Hits with
/// no registered owner (stray geometry) are skipped. The result keeps the
/// order of first appearance and holds each element once.
pub fn resolve_selection(hits: &[Intersection], elements: &ElementManager) -> Vec<ElementId> {
    let mut selected: Vec<ElementId> = Vec::new();

    for hit in hits {
        let owner = hit
            .ancestors
            .iter()
            .filter_map(|node| node.element)
            .find(|id| elements.contains(*id));

        if let Some(id) = owner
            && !selected.contains(&id)
        {
            selected.push(id);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use objview_core::{Element, ObjElement, ObjSource, Object3D, Scene};
    use objview_renderer::{NodeRef, Ray, intersect_scene};
    use uuid::Uuid;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    const QUAD: &str = "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3\nf 1 3 4\n";

    fn node(element: Option<ElementId>) -> NodeRef {
        NodeRef {
            id: Object3D::group("n").id(),
            uuid: Uuid::new_v4(),
            element,
        }
    }

    fn hit(distance: f32, ancestors: Vec<NodeRef>) -> Intersection {
        Intersection {
            distance,
            point: Vec3::ZERO,
            object: ancestors[0].id,
            face_index: 0,
            ancestors,
        }
    }

    fn registered(elements: &mut ElementManager, scene: &mut Scene) -> ElementId {
        register(elements, scene, TRIANGLE)
    }

    fn register(elements: &mut ElementManager, scene: &mut Scene, text: &str) -> ElementId {
        let mut element = ObjElement::new(ObjSource::new("mesh.obj", text.to_string()));
        pollster::block_on(element.load()).unwrap();
        let id = element.id();
        assert!(elements.add_mesh(Box::new(element), scene));
        id
    }

    #[test]
    fn test_no_hits_select_nothing() {
        let elements = ElementManager::new();
        assert!(resolve_selection(&[], &elements).is_empty());
    }

    #[test]
    fn test_unregistered_hits_are_ignored() {
        let elements = ElementManager::new();
        let stray = ElementId::new();
        let hits = vec![hit(1.0, vec![node(None), node(Some(stray))])];
        assert!(resolve_selection(&hits, &elements).is_empty());
    }

    #[test]
    fn test_ascends_to_owner_and_dedups() {
        let mut elements = ElementManager::new();
        let mut scene = Scene::new();
        let a = registered(&mut elements, &mut scene);
        let b = registered(&mut elements, &mut scene);

        let hits = vec![
            hit(1.0, vec![node(None), node(Some(b))]),
            hit(2.0, vec![node(None), node(Some(a))]),
            hit(3.0, vec![node(None), node(Some(b))]),
        ];
        assert_eq!(resolve_selection(&hits, &elements), vec![b, a]);
    }

    #[test]
    fn test_hit_on_shared_edge_selects_element_once() {
        let mut elements = ElementManager::new();
        let mut scene = Scene::new();
        let id = register(&mut elements, &mut scene, QUAD);

        // Through the diagonal both triangles of the quad may report a hit.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let hits = intersect_scene(&ray, &scene);
        assert!(!hits.is_empty());

        assert_eq!(resolve_selection(&hits, &elements), vec![id]);
    }
}
