//! Orthographic and perspective cameras

use std::fmt;
use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::raycast::Ray;

/// Projection family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Orthographic,
    Perspective,
}

impl CameraMode {
    pub fn name(&self) -> &'static str {
        match self {
            CameraMode::Orthographic => "Orthographic",
            CameraMode::Perspective => "Perspective",
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested camera mode is not a known projection family
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown camera mode: {0}")]
pub struct UnknownCameraMode(pub String);

impl FromStr for CameraMode {
    type Err = UnknownCameraMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orthographic" | "ortho" => Ok(CameraMode::Orthographic),
            "perspective" | "persp" => Ok(CameraMode::Perspective),
            _ => Err(UnknownCameraMode(s.to_string())),
        }
    }
}

/// Camera parameters that do not change with the mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub near: f32,
    pub far: f32,
    /// Vertical field of view of the perspective camera
    pub fov_y_degrees: f32,
    /// Pixels per world unit of the orthographic camera
    pub ortho_zoom: f32,
    pub home_position: Vec3,
    pub home_target: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 1000.0,
            fov_y_degrees: 75.0,
            ortho_zoom: 50.0,
            home_position: Vec3::new(30.0, 75.0, 100.0),
            home_target: Vec3::ZERO,
        }
    }
}

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Frustum spans ±width/2 × ±height/2 pixels, divided by `zoom`
    Orthographic { zoom: f32 },
    Perspective { fov_y_degrees: f32 },
}

/// Camera uniform data sent to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// A positioned camera with an orthographic or perspective projection
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
    viewport: Vec2,
}

impl Camera {
    /// Creates a camera of the given mode at the home position, looking at the home target.
    pub fn new(mode: CameraMode, width: f32, height: f32, settings: &CameraSettings) -> Self {
        let projection = match mode {
            CameraMode::Orthographic => Projection::Orthographic {
                zoom: settings.ortho_zoom,
            },
            CameraMode::Perspective => Projection::Perspective {
                fov_y_degrees: settings.fov_y_degrees,
            },
        };

        let mut camera = Self {
            position: settings.home_position,
            orientation: Quat::IDENTITY,
            near: settings.near,
            far: settings.far,
            projection,
            viewport: Vec2::ONE,
        };
        camera.set_viewport(width, height);
        camera.look_at(settings.home_target);
        camera
    }

    pub fn mode(&self) -> CameraMode {
        match self.projection {
            Projection::Orthographic { .. } => CameraMode::Orthographic,
            Projection::Perspective { .. } => CameraMode::Perspective,
        }
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y
    }

    /// Orthographic zoom, or None for perspective cameras
    pub fn zoom(&self) -> Option<f32> {
        match self.projection {
            Projection::Orthographic { zoom } => Some(zoom),
            Projection::Perspective { .. } => None,
        }
    }

    /// Sets the orthographic zoom. Ignored by perspective cameras.
    pub fn set_zoom(&mut self, value: f32) {
        if let Projection::Orthographic { zoom } = &mut self.projection {
            *zoom = value.max(1e-3);
        }
    }

    /// Rotates the camera so that it faces `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() < 1e-12 {
            return;
        }

        // Looking straight up or down needs another up vector
        let up = if forward.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.orientation = rotation.normalize();
    }

    /// Direction the camera looks in
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Orthographic { zoom } => {
                let half_w = self.viewport.x / 2.0 / zoom;
                let half_h = self.viewport.y / 2.0 / zoom;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
            Projection::Perspective { fov_y_degrees } => {
                Mat4::perspective_rh(fov_y_degrees.to_radians(), self.aspect(), self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Builds a world-space ray through normalized device coordinates in [-1, 1].
    ///
    /// The ray starts on the near plane.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Converts a pixel position inside the viewport to normalized device coordinates.
    pub fn screen_to_ndc(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        Vec2::new(
            screen_x / self.viewport.x * 2.0 - 1.0,
            -(screen_y / self.viewport.y) * 2.0 + 1.0,
        )
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection().to_cols_array_2d(),
            eye: self.position.extend(1.0).to_array(),
        }
    }
}
