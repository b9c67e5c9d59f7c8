//! Orbit controls for rotating the camera around a target.

use glam::{Quat, Vec3};

use crate::camera::{Camera, Projection};

/// Camera state captured by [`OrbitControls::save_state`]
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedState {
    target: Vec3,
    position: Vec3,
    orientation: Quat,
    zoom: Option<f32>,
}

/// Orbit controls: rotate around, pan and zoom toward a target point.
///
/// Controls do not own the camera; every operation takes it explicitly.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Radians per unit of pointer movement
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    saved: SavedState,
}

/// Keeps the polar angle away from the poles
const POLAR_EPSILON: f32 = 1e-4;

impl OrbitControls {
    /// Binds controls to a camera orbiting `target` and saves the current state.
    pub fn new(camera: &Camera, target: Vec3) -> Self {
        Self {
            target,
            rotate_speed: 0.005,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.1,
            max_distance: 900.0,
            min_zoom: 0.5,
            max_zoom: 5000.0,
            saved: SavedState {
                target,
                position: camera.position,
                orientation: camera.orientation,
                zoom: camera.zoom(),
            },
        }
    }

    /// Stores the camera state that [`OrbitControls::reset`] returns to.
    pub fn save_state(&mut self, camera: &Camera) {
        self.saved = SavedState {
            target: self.target,
            position: camera.position,
            orientation: camera.orientation,
            zoom: camera.zoom(),
        };
    }

    /// Restores the saved camera state.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.target = self.saved.target;
        camera.position = self.saved.position;
        camera.orientation = self.saved.orientation;
        if let Some(zoom) = self.saved.zoom {
            camera.set_zoom(zoom);
        }
    }

    /// Re-aims the camera at the target.
    pub fn update(&self, camera: &mut Camera) {
        camera.look_at(self.target);
    }

    /// Adopts `target` and the camera's current pose as the saved state.
    pub fn sync(&mut self, camera: &Camera, target: Vec3) {
        self.target = target;
        self.save_state(camera);
    }

    /// Rotates the camera around the target by a pointer delta in pixels.
    pub fn rotate(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius < f32::EPSILON {
            return;
        }

        // Spherical coordinates around +Y
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta -= dx * self.rotate_speed;
        phi = (phi - dy * self.rotate_speed).clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );

        camera.position = self.target + new_offset;
        self.update(camera);
    }

    /// Moves camera and target in the view plane by a pointer delta in pixels.
    pub fn pan(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        let units_per_pixel = match camera.projection {
            Projection::Orthographic { zoom } => 1.0 / zoom,
            Projection::Perspective { fov_y_degrees } => {
                let distance = (camera.position - self.target).length();
                2.0 * distance * (fov_y_degrees.to_radians() / 2.0).tan() / camera.viewport().y
            }
        };

        let offset =
            (camera.right() * -dx + camera.up() * dy) * units_per_pixel * self.pan_speed;
        camera.position += offset;
        self.target += offset;
    }

    /// Zooms in for factors above 1 and out for factors below 1.
    ///
    /// Orthographic cameras change their zoom, perspective cameras dolly
    /// toward the target.
    pub fn zoom(&mut self, camera: &mut Camera, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let factor = factor.powf(self.zoom_speed);

        match camera.projection {
            Projection::Orthographic { zoom } => {
                camera.set_zoom((zoom * factor).clamp(self.min_zoom, self.max_zoom));
            }
            Projection::Perspective { .. } => {
                let offset = camera.position - self.target;
                let distance = (offset.length() / factor).clamp(self.min_distance, self.max_distance);
                camera.position = self.target + offset.normalize_or(Vec3::Z) * distance;
            }
        }
    }
}
