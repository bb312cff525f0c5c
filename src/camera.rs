//! Fixed perspective camera with screen-ray unprojection for click picking.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Stationary camera at eye height, looking into the room
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    fov_degrees: f32,
    near: f32,
    far: f32,
    aspect: f32,
}

impl Camera {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::from_array(config.eye_position),
            target: Vec3::from_array(config.look_target),
            fov_degrees: config.fov_degrees,
            near: config.near_plane_m,
            far: config.far_plane_m,
            aspect: config.aspect_ratio(),
        }
    }

    /// Track window resizes so the projection never stretches
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// View-projection matrix (right-handed, Y up, wgpu depth 0..1)
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        proj * view
    }

    /// Unproject a normalized-device-coordinate point (x right, y up, both
    /// -1..1) into a world-space pick ray.
    ///
    /// Returns (origin, normalized direction).
    pub fn screen_ray(&self, ndc_x: f32, ndc_y: f32) -> (Vec3, Vec3) {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        (near, (far - near).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&RenderConfig::default())
    }

    #[test]
    fn test_view_proj_is_well_formed() {
        let view_proj = camera().view_proj();
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(view_proj.determinant().is_finite());
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = camera();
        let (origin, dir) = camera.screen_ray(0.0, 0.0);

        // Origin sits on the near plane in front of the eye
        assert!((origin - camera.eye).length() < 0.1);

        // Direction runs from the eye toward the look target
        let expected = (camera.target - camera.eye).normalize();
        assert!(dir.dot(expected) > 0.999);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_offcenter_rays_diverge() {
        let camera = camera();
        let (_, left) = camera.screen_ray(-0.8, 0.0);
        let (_, right) = camera.screen_ray(0.8, 0.0);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!(left.dot(right) < 1.0);
    }

    #[test]
    fn test_aspect_update() {
        let mut camera = camera();
        let before = camera.view_proj();
        camera.set_aspect(800, 800);
        assert_ne!(camera.view_proj(), before);

        // Degenerate sizes are ignored
        camera.set_aspect(800, 0);
        assert!(camera.view_proj().determinant().is_finite());
    }
}
