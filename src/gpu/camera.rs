//! Fixed perspective camera looking at the field.

use glam::{Mat4, Vec3};

use crate::config::RenderConfig;

/// Perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(config: &RenderConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: 1.0,
            near: config.near,
            far: config.far,
            position: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Recompute the aspect ratio. A zero-sized viewport keeps the old one.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_camera() {
        let camera = PerspectiveCamera::new(&RenderConfig::default(), 1600, 900);
        assert!((camera.fov_y - 75.0_f32.to_radians()).abs() < 1e-6);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 25.0));
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let mut camera = PerspectiveCamera::new(&RenderConfig::default(), 800, 400);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(300, 300);
        assert_eq!(camera.aspect, 1.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = PerspectiveCamera::new(&RenderConfig::default(), 800, 600);
        let clip = camera.view_proj() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
        // Depth equals distance from the camera
        assert!((clip.w - 25.0).abs() < 1e-4);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }
}
