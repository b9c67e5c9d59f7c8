//! Elements: identity and behavior wrappers around loaded renderables

mod obj;

pub use obj::ObjElement;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::{Color, DEFAULT_MESH_COLOR, HIGHLIGHT_COLOR};
use crate::events::{ElementEvent, ElementEvents};
use crate::scene::RenderableHandle;

/// Opaque, process-unique element identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Colors an element uses for its normal and selected states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub default_color: Color,
    pub highlight_color: Color,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_MESH_COLOR,
            highlight_color: HIGHLIGHT_COLOR,
        }
    }
}

/// Capability shared by everything the element manager can register.
///
/// An element without a renderable cannot be attached to the scene and
/// is never hit by picking.
pub trait Element: Send + Sync {
    /// Stable identifier assigned at construction
    fn id(&self) -> ElementId;

    /// Root node of the loaded asset, once loaded
    fn renderable(&self) -> Option<RenderableHandle>;

    /// Event emitter for `Update` and `SelectionChanged`
    fn events(&self) -> &ElementEvents;

    /// Delivers an event to the element and then to its listeners.
    fn dispatch(&mut self, event: ElementEvent) {
        self.events().emit(&event);
    }

    /// Notifies listeners that the element changed visually.
    fn update(&self) {
        self.events().emit(&ElementEvent::Update);
    }

    /// Short human-readable label
    fn name(&self) -> &str;
}
