use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera with a slow cosmetic "gyro" drift.
///
/// The position is a closed-form function of elapsed time and is never
/// simulated, so it cannot drift or diverge.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov_y_radians: f32,
    near: f32,
    far: f32,
    aspect: f32,
    base: Vec3,
    /// Current eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
}

impl Camera {
    /// Creates a camera at the configured base position.
    #[must_use]
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let base = Vec3::from(config.base_position);
        let mut camera = Self {
            fov_y_radians: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            aspect: 1.0,
            base,
            position: base,
            target: Vec3::ZERO,
        };
        camera.set_aspect(aspect);
        camera
    }

    /// Sets the aspect ratio; degenerate values fall back to 1.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Vertical field of view.
    #[must_use]
    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_radians
    }

    /// Moves the camera along its gyro curve for elapsed time `t_ms`.
    pub fn update_gyro(&mut self, t_ms: f64) {
        let t = if t_ms.is_finite() { t_ms } else { 0.0 };
        let slow = t * 0.00012;

        let drift = Vec3::new(
            (slow.sin() * 9.0) as f32,
            ((t * 0.00009).sin() * 3.0) as f32,
            ((slow * 0.6).cos() * 8.0) as f32,
        );
        self.position = self.base + drift;
        self.target = Vec3::new(0.0, 10.0 + ((t * 0.0004).sin() * 0.5) as f32, 0.0);
    }

    /// Right-handed GL perspective projection.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    /// World-to-camera transform.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection times view.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let mut camera = Camera::new(&CameraConfig::default(), 0.0);
        assert_eq!(camera.aspect(), 1.0);

        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect(), 1.0);

        camera.set_aspect(800.0 / 600.0);
        assert!((camera.aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert!(camera.projection().is_finite());
    }

    #[test]
    fn test_projection_is_aspect_corrected() {
        let camera = Camera::new(&CameraConfig::default(), 2.0);
        let projection = camera.projection();
        // x scale = y scale / aspect
        let ratio = projection.y_axis.y / projection.x_axis.x;
        assert!((ratio - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_gyro_stays_near_base() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        for step in 0..100 {
            camera.update_gyro(step as f64 * 5_000.0);
            let offset = camera.position - Vec3::new(0.0, 26.0, 240.0);
            assert!(offset.x.abs() <= 9.0 + 1e-4);
            assert!(offset.y.abs() <= 3.0 + 1e-4);
            assert!(offset.z.abs() <= 8.0 + 1e-4);
            assert!((camera.target.y - 10.0).abs() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_gyro_on_long_uptimes() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        let t_ms = 36_000_000.75;
        camera.update_gyro(t_ms);

        let expected_x = ((t_ms * 0.00012).sin() * 9.0) as f32;
        let expected_target = 10.0 + ((t_ms * 0.0004).sin() * 0.5) as f32;
        assert!((camera.position.x - expected_x).abs() < 1e-5);
        assert!((camera.target.y - expected_target).abs() < 1e-5);
    }

    #[test]
    fn test_gyro_at_origin_time() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        camera.update_gyro(0.0);
        assert_eq!(camera.position, Vec3::new(0.0, 26.0, 248.0));
        assert_eq!(camera.target, Vec3::new(0.0, 10.0, 0.0));
    }
}
