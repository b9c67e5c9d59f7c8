//! objview frontend
//!
//! egui application wrapping the [`Editor`] context object.

mod app;
pub mod config;
pub mod editor;
mod viewport_state;
#[cfg(target_arch = "wasm32")]
mod web;

pub use app::ObjViewerApp;
pub use editor::{Editor, EditorError, EditorOptions};
