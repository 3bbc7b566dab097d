/// Per-frame camera constant and the default orbit camera

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::renderer::Extent2D;

/// Uniform block written into the current swap image's uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// projection * view * model
    pub view_proj: Mat4,
}

impl CameraUniform {
    pub const SIZE: u64 = std::mem::size_of::<CameraUniform>() as u64;

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self { view_proj: Mat4::IDENTITY }
    }
}

/// Camera spinning the model about +Z while looking at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Model rotation speed in degrees per second
    pub spin_degrees_per_second: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(2.0, 2.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 10.0,
            spin_degrees_per_second: 90.0,
        }
    }
}

impl OrbitCamera {
    pub fn model(&self, elapsed_seconds: f32) -> Mat4 {
        Mat4::from_rotation_z((elapsed_seconds * self.spin_degrees_per_second).to_radians())
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Right-handed perspective with depth in [0, 1] and Y flipped for clip space
    pub fn projection(&self, extent: Extent2D) -> Mat4 {
        let mut proj = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            extent.aspect_ratio(),
            self.near,
            self.far,
        );
        proj.y_axis.y *= -1.0;
        proj
    }

    pub fn uniform(&self, elapsed_seconds: f32, extent: Extent2D) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection(extent) * self.view() * self.model(elapsed_seconds),
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
