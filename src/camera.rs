//! Scene orientation and the camera looking at it.
//!
//! The backdrop planes and the particle system share one [`Orientation`]:
//! a spin about the plane normal (Z) and a tilt about X. The camera itself
//! stays put apart from its distance, which follows the zoom level.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

/// A rotation produced by dragging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationDelta {
    /// Radians about the plane normal, from horizontal drag.
    pub spin: f32,
    /// Radians about the X axis, from vertical drag.
    pub tilt: f32,
}

/// Accumulated rotation of everything in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub spin: f32,
    pub tilt: f32,
}

impl Orientation {
    /// Apply a drag rotation. Tilt is kept within a quarter turn either way.
    pub fn rotate(&mut self, delta: RotationDelta) {
        self.spin += delta.spin;
        self.tilt = (self.tilt + delta.tilt).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Advance autonomous rotation by `angular_speed` rad/s over `secs`.
    pub fn advance(&mut self, angular_speed: f32, secs: f32) {
        self.spin += angular_speed * secs;
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt) * Mat4::from_rotation_z(self.spin)
    }
}

/// Fixed-tilt camera looking at the origin from below and in front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Downward tilt in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Point the camera looks at.
    pub target: Vec3,
}

impl Camera {
    pub fn new(pitch: f32, distance: f32, fov_y: f32) -> Self {
        Self {
            pitch,
            distance,
            fov_y,
            target: Vec3::ZERO,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let y = -self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos();
        self.target + Vec3::new(0.0, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let far = (self.distance * 4.0).max(100.0);
        Mat4::perspective_rh(self.fov_y, aspect, 1.0, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(35f32.to_radians(), 1570.0, 16f32.to_radians())
    }
}

/// Everything a renderer needs to place the scene for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub orientation: Orientation,
    pub camera: Camera,
}

impl SceneTransform {
    /// Combined projection, view and model matrix.
    pub fn view_proj_model(&self, aspect: f32) -> Mat4 {
        self.camera.projection(aspect) * self.camera.view_matrix() * self.orientation.model_matrix()
    }
}
