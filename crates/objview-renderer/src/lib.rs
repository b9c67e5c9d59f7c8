//! objview renderer
//!
//! Camera, orbit controls and ray casting on the CPU side, plus a
//! wgpu renderer that draws an [`objview_core::Scene`].

pub mod camera;
pub mod controls;
pub mod raycast;
pub mod renderer;
pub mod surface;
pub mod vertex;

pub use camera::*;
pub use controls::OrbitControls;
pub use raycast::{Intersection, NodeRef, Ray, intersect_scene};
pub use renderer::Renderer;
pub use surface::{NullSurface, RenderSurface};
