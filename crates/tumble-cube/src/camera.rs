//! World/view/projection state for the cube.

use glam::{Mat4, Vec3};

/// Radians of rotation per pixel of pointer movement.
pub const RADIANS_PER_PIXEL: f32 = 0.01;

/// Fixed camera parameters. View and projection never change after `start`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    /// Accumulated rotation only.
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Transform {
    pub fn new(camera: &CameraConfig, aspect: f32) -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::look_at_rh(camera.eye, camera.target, camera.up),
            projection: Mat4::perspective_rh(camera.fov_y_degrees.to_radians(), aspect, camera.near, camera.far),
        }
    }

    /// Applies `rotation_increment(dx, dy)` on top of the current rotation.
    ///
    /// `dx` turns about the X axis and `dy` about the Y axis.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.world = rotation_increment(dx, dy) * self.world;
    }
}

/// `Rx(dx · k) · Ry(dy · k)` with `k = RADIANS_PER_PIXEL`.
pub fn rotation_increment(dx: f32, dy: f32) -> Mat4 {
    Mat4::from_rotation_x(dx * RADIANS_PER_PIXEL) * Mat4::from_rotation_y(dy * RADIANS_PER_PIXEL)
}
