//! objview core data structures
//!
//! This crate contains everything the viewer needs that does not touch the GPU:
//! - Scene: node hierarchy of groups, meshes and helper lines
//! - Element: identity and behavior wrapper around a loaded renderable
//! - ElementManager: registry of loaded elements and selection broadcast
//! - OBJ loading and drag-and-drop intake

pub mod color;
pub mod element;
pub mod events;
pub mod intake;
pub mod manager;
pub mod obj;
pub mod scene;

pub use color::*;
pub use element::*;
pub use events::*;
pub use intake::*;
pub use manager::*;
pub use obj::*;
pub use scene::*;
