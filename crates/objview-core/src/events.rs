//! Typed element events
//!
//! Elements publish two kinds of notifications: `Update` when their visual
//! state changed and `SelectionChanged` when the manager broadcasts a new
//! selection. Listeners are stored behind a lock but invoked outside of it,
//! so a listener may emit or subscribe on the same emitter.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::element::ElementId;

/// Ids of the elements selected by one pick
pub type SelectionSet = HashSet<ElementId>;

/// Event delivered to element listeners
#[derive(Debug, Clone)]
pub enum ElementEvent {
    /// The element changed visually and should be redrawn
    Update,
    /// A new selection was broadcast; carries the full membership set
    SelectionChanged(Arc<SelectionSet>),
}

impl ElementEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ElementEvent::Update => EventKind::Update,
            ElementEvent::SelectionChanged(_) => EventKind::SelectionChanged,
        }
    }
}

/// Discriminant used to subscribe to one event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Update,
    SelectionChanged,
}

/// Identifies one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ElementEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl Registry {
    fn remove(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
    }
}

/// Function returned by [`ElementEvents::on`] that removes its listener.
///
/// Calling it more than once, or after the emitter is dropped, does nothing.
pub struct Unsubscribe {
    registry: Weak<Mutex<Registry>>,
    id: ListenerId,
}

impl Unsubscribe {
    pub fn call(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.id);
        }
    }
}

/// Multi-subscriber emitter for [`ElementEvent`]s
#[derive(Clone, Default)]
pub struct ElementEvents {
    registry: Arc<Mutex<Registry>>,
}

impl ElementEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        listener: impl Fn(&ElementEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut registry = self.registry.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, kind, Arc::new(listener)));
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.registry.lock().remove(id);
    }

    /// Subscribes and returns the matching unsubscribe function.
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&ElementEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        let id = self.subscribe(kind, listener);
        Unsubscribe {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Invokes every listener of the event's kind in subscription order.
    pub fn emit(&self, event: &ElementEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of listeners subscribed to `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

impl std::fmt::Debug for ElementEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementEvents")
            .field("listeners", &self.registry.lock().listeners.len())
            .finish()
    }
}
