//! Element registry and selection broadcast

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use uuid::Uuid;

use crate::element::{Element, ElementId};
use crate::events::{ElementEvent, EventKind, SelectionSet};
use crate::scene::{Object3D, ObjectId, Scene};

/// Request sent to the scene owner asking for a redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawRequest {
    /// An element changed visually
    ElementUpdated(ElementId),
    /// The registry attached a new element
    ElementAdded(ElementId),
}

/// Registry of all loaded elements.
///
/// Elements are kept in load order. Redraw requests raised by registered
/// elements are queued on a channel that the scene owner drains with
/// [`ElementManager::drain_redraws`].
pub struct ElementManager {
    elements: Vec<Box<dyn Element>>,
    redraw_tx: Sender<RedrawRequest>,
    redraw_rx: Receiver<RedrawRequest>,
}

impl ElementManager {
    pub fn new() -> Self {
        let (redraw_tx, redraw_rx) = mpsc::channel();
        Self {
            elements: Vec::new(),
            redraw_tx,
            redraw_rx,
        }
    }

    /// Registers a loaded element and attaches its renderable to the scene.
    ///
    /// Elements without a renderable are rejected (logged, returns false).
    pub fn add_mesh(&mut self, element: Box<dyn Element>, scene: &mut Scene) -> bool {
        let Some(object) = element.renderable() else {
            tracing::error!(
                "add_mesh called with element {} that has no renderable; ignoring",
                element.id()
            );
            return false;
        };

        let id = element.id();
        if self.contains(id) {
            tracing::error!("Element {} is already registered; ignoring", id);
            return false;
        }

        let tx = self.redraw_tx.clone();
        element.events().subscribe(EventKind::Update, move |_| {
            // Receiver lives as long as the manager; a send error only
            // happens during teardown.
            let _ = tx.send(RedrawRequest::ElementUpdated(id));
        });

        self.elements.push(element);
        scene.add(object);

        tracing::debug!("Registered element {} ({} total)", id, self.elements.len());
        let _ = self.redraw_tx.send(RedrawRequest::ElementAdded(id));
        true
    }

    /// Finds an element by its element id.
    pub fn find_by_element_id(&self, id: ElementId) -> Option<&dyn Element> {
        self.elements
            .iter()
            .find(|e| e.id() == id)
            .map(|e| e.as_ref())
    }

    /// Finds an element by the uuid of its renderable root.
    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<&dyn Element> {
        self.elements
            .iter()
            .find(|e| root_matches(e.as_ref(), |root| root.uuid() == uuid))
            .map(|e| e.as_ref())
    }

    /// Finds an element by the numeric id of its renderable root.
    pub fn find_by_object_id(&self, id: ObjectId) -> Option<&dyn Element> {
        self.elements
            .iter()
            .find(|e| root_matches(e.as_ref(), |root| root.id() == id))
            .map(|e| e.as_ref())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id() == id)
    }

    /// Broadcasts the selection to every registered element.
    ///
    /// Each element decides from the full membership set whether it is
    /// selected.
    pub fn set_selected(&mut self, selected: impl IntoIterator<Item = ElementId>) {
        let selection: Arc<SelectionSet> = Arc::new(selected.into_iter().collect());
        tracing::debug!(
            "Broadcasting selection of {} to {} elements",
            selection.len(),
            self.elements.len()
        );

        for element in &mut self.elements {
            element.dispatch(ElementEvent::SelectionChanged(selection.clone()));
        }
    }

    /// Takes all queued redraw requests.
    pub fn drain_redraws(&self) -> Vec<RedrawRequest> {
        self.redraw_rx.try_iter().collect()
    }

    /// Registered elements in load order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Element> {
        self.elements.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn root_matches(element: &dyn Element, predicate: impl Fn(&Object3D) -> bool) -> bool {
    let Some(object) = element.renderable() else {
        return false;
    };
    let root = object.read();
    predicate(&root)
}

impl Default for ElementManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, DEFAULT_MESH_COLOR, HIGHLIGHT_COLOR};
    use crate::element::ObjElement;
    use crate::events::ElementEvents;
    use crate::obj::ObjSource;
    use crate::scene::{NodeKind, RenderableHandle};
    use std::collections::HashSet;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn loaded(name: &str) -> Box<ObjElement> {
        let mut element = ObjElement::new(ObjSource::new(name, TRIANGLE));
        pollster::block_on(element.load()).unwrap();
        Box::new(element)
    }

    fn color_of(manager: &ElementManager, id: ElementId) -> Color {
        let object = manager.find_by_element_id(id).unwrap().renderable().unwrap();
        let mut color = None;
        object.read().traverse(&mut |node| {
            if let NodeKind::Mesh(part) = &node.kind {
                color = Some(part.material.color);
            }
        });
        color.unwrap()
    }

    /// Element that never loads
    struct Unloaded {
        id: ElementId,
        events: ElementEvents,
    }

    impl Element for Unloaded {
        fn id(&self) -> ElementId {
            self.id
        }

        fn renderable(&self) -> Option<RenderableHandle> {
            None
        }

        fn events(&self) -> &ElementEvents {
            &self.events
        }

        fn name(&self) -> &str {
            "unloaded"
        }
    }

    #[test]
    fn test_registry_grows_with_unique_ids() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();

        for i in 0..5 {
            assert!(manager.add_mesh(loaded(&format!("{i}.obj")), &mut scene));
        }

        assert_eq!(manager.len(), 5);
        assert_eq!(scene.len(), 5);
        let ids: HashSet<ElementId> = manager.iter().map(|e| e.id()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_unloaded_element_is_rejected() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();
        let element = Unloaded {
            id: ElementId::new(),
            events: ElementEvents::new(),
        };

        assert!(!manager.add_mesh(Box::new(element), &mut scene));
        assert!(manager.is_empty());
        assert_eq!(scene.revision(), 0);
        assert!(manager.drain_redraws().is_empty());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();
        let element = loaded("a.obj");
        let object = element.renderable().unwrap();
        let id = element.id();
        manager.add_mesh(element, &mut scene);

        let twin = Unloaded {
            id,
            events: ElementEvents::new(),
        };
        assert!(!manager.add_mesh(Box::new(twin), &mut scene));
        assert_eq!(manager.len(), 1);
        assert!(scene.contains(&object));
    }

    #[test]
    fn test_lookups() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();
        let a = loaded("a.obj");
        let b = loaded("b.obj");
        let (a_id, b_id) = (a.id(), b.id());
        let b_object = b.renderable().unwrap();
        manager.add_mesh(a, &mut scene);
        manager.add_mesh(b, &mut scene);

        assert_eq!(manager.find_by_element_id(a_id).unwrap().id(), a_id);
        assert!(manager.find_by_element_id(ElementId::new()).is_none());

        let uuid = b_object.read().uuid();
        let object_id = b_object.read().id();
        assert_eq!(manager.find_by_uuid(uuid).unwrap().id(), b_id);
        assert_eq!(manager.find_by_object_id(object_id).unwrap().id(), b_id);
        assert!(manager.find_by_uuid(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_selection_highlights_only_members() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();
        let ids: Vec<ElementId> = (0..3)
            .map(|i| {
                let e = loaded(&format!("{i}.obj"));
                let id = e.id();
                manager.add_mesh(e, &mut scene);
                id
            })
            .collect();

        manager.set_selected([ids[1]]);
        assert_eq!(color_of(&manager, ids[0]), DEFAULT_MESH_COLOR);
        assert_eq!(color_of(&manager, ids[1]), HIGHLIGHT_COLOR);
        assert_eq!(color_of(&manager, ids[2]), DEFAULT_MESH_COLOR);

        manager.set_selected(Vec::<ElementId>::new());
        for id in &ids {
            assert_eq!(color_of(&manager, *id), DEFAULT_MESH_COLOR);
        }
    }

    #[test]
    fn test_updates_are_forwarded_as_redraws() {
        let mut manager = ElementManager::new();
        let mut scene = Scene::new();
        let a = loaded("a.obj");
        let b = loaded("b.obj");
        let (a_id, b_id) = (a.id(), b.id());
        manager.add_mesh(a, &mut scene);
        manager.add_mesh(b, &mut scene);

        assert_eq!(
            manager.drain_redraws(),
            vec![
                RedrawRequest::ElementAdded(a_id),
                RedrawRequest::ElementAdded(b_id)
            ]
        );

        // Broadcast reaches every element, each recolors and requests a redraw
        manager.set_selected([a_id]);
        assert_eq!(
            manager.drain_redraws(),
            vec![
                RedrawRequest::ElementUpdated(a_id),
                RedrawRequest::ElementUpdated(b_id)
            ]
        );
        assert!(manager.drain_redraws().is_empty());
    }
}
