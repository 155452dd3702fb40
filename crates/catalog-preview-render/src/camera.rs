//! Preview camera.
//!
//! Each render context has a fixed perspective camera framed once on the
//! model bounds. Rotation is applied to the model, never to the camera.

use catalog_preview_core::Aabb;
use glam::{Mat4, Vec3};

/// Direction from the target toward the camera: front-right, slightly above.
const VIEW_DIRECTION: Vec3 = Vec3::new(1.0, 0.8, 1.4);

/// A perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Frames a bounding box so it stays fully visible at any rotation about
    /// the up axis.
    pub fn frame_bounds(&mut self, bounds: &Aabb) {
        let center = bounds.center();
        let radius = bounds.radius().max(1e-3);

        // Fit the bounding sphere into the narrower field of view
        let half_fov = (self.fov * 0.5).min((self.fov * 0.5).tan().atan2(1.0 / self.aspect_ratio));
        let distance = radius / half_fov.sin() * 1.05;

        self.target = center;
        self.position = center + VIEW_DIRECTION.normalize() * distance;
        self.near = (distance - radius).max(distance * 0.01);
        self.far = distance + radius * 2.0;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(4.0 / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_perspective() {
        let camera = Camera::new(1.0);
        let proj = camera.projection_matrix();
        // Perspective matrix has non-zero w division
        assert!(proj.w_axis.z != 0.0);
    }

    #[test]
    fn test_frame_bounds_keeps_corners_on_screen() {
        let mut camera = Camera::new(4.0 / 3.0);
        let bounds = Aabb::centered(Vec3::new(39.0, 19.0, 19.0));
        camera.frame_bounds(&bounds);
        assert_eq!(camera.target, Vec3::ZERO);

        let vp = camera.view_projection_matrix();
        for corner in bounds.corners() {
            let clip = vp * corner.extend(1.0);
            assert!(clip.w > 0.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{corner:?} -> {ndc:?}");
            assert!((0.0..=1.0).contains(&ndc.z));
        }
    }
}
