//! Scene graph of the backdrop.
//!
//! The tree is shallow and fixed: the camera (carrying the starfield), the
//! global lights, and one focal group that carries the core, the energy
//! shell, the point lights, the orbiter and the HUD panel. World matrices are
//! computed on demand from the focal group's position and each child's local
//! transform.

mod camera;
pub mod geometry;

pub use camera::Camera;
use glam::{Mat4, Quat, Vec3};

use self::geometry::Star;
use crate::{
    config::{BackdropConfig, rgb},
    random::RandomSource,
    sim::MotionState,
};

/// Local translation, rotation and scale of a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Offset from the parent.
    pub translation: Vec3,
    /// Orientation relative to the parent.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform {
    /// Identity rotation and unit scale at `translation`.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    /// Local-to-parent matrix (scale, then rotation, then translation).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Point light attached to the focal group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Brightness multiplier.
    pub intensity: f32,
    /// Cutoff distance; zero means unbounded.
    pub distance: f32,
    /// Falloff exponent over `distance`.
    pub decay: f32,
    /// Position relative to the focal group.
    pub offset: Vec3,
}

/// Sun-like light shining toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Brightness multiplier.
    pub intensity: f32,
    /// Light position; the light shines from here toward the origin.
    pub position: Vec3,
}

/// Every light of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSet {
    /// Linear RGB color of the ambient term.
    pub ambient_color: [f32; 3],
    /// Ambient brightness.
    pub ambient_intensity: f32,
    /// Key light.
    pub directional: DirectionalLight,
    /// Light inside the core; its intensity follows the motion.
    pub core: PointLight,
    /// Violet back light behind the core.
    pub rim: PointLight,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            ambient_color: [1.0; 3],
            ambient_intensity: 0.08,
            directional: DirectionalLight {
                color: rgb(0xdff6ff),
                intensity: 0.9,
                position: Vec3::new(50.0, 80.0, 30.0),
            },
            core: PointLight {
                color: rgb(0x66eaff),
                intensity: 1.1,
                distance: 500.0,
                decay: 2.0,
                offset: Vec3::ZERO,
            },
            rim: PointLight {
                color: rgb(0x8844ff),
                intensity: 0.7,
                distance: 260.0,
                decay: 2.2,
                offset: Vec3::new(0.0, 0.0, -40.0),
            },
        }
    }
}

/// Surface parameters for the lit meshes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Albedo in linear RGB.
    pub base_color: [f32; 3],
    /// Emitted light in linear RGB.
    pub emissive: [f32; 3],
    /// Multiplier on `emissive`.
    pub emissive_intensity: f32,
    /// Microfacet roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metallic factor in `[0, 1]`.
    pub metalness: f32,
}

impl Material {
    /// Glassy cyan core sphere.
    pub const CORE: Self = Self {
        base_color: [0.909, 0.984, 1.0],
        emissive: [0.0, 0.616, 1.0],
        emissive_intensity: 0.45,
        roughness: 0.06,
        metalness: 0.35,
    };

    /// Metallic orbiting cube.
    pub const ORBITER: Self = Self {
        base_color: [0.4, 0.8, 1.0],
        emissive: [0.133, 0.6, 1.0],
        emissive_intensity: 1.0,
        roughness: 0.2,
        metalness: 0.6,
    };
}

/// The glowing sphere at the center of the focal group.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreObject {
    /// Local transform within the focal group.
    pub transform: Transform,
    /// Surface parameters; emission follows the motion.
    pub material: Material,
    spin: f32,
}

/// Small cube circling the core.
#[derive(Debug, Clone, PartialEq)]
pub struct Orbiter {
    /// Local transform within the focal group.
    pub transform: Transform,
    /// Surface parameters.
    pub material: Material,
    angle: f32,
    tumble: [f32; 2],
}

impl Orbiter {
    fn advance(&mut self, radius: f32, angular_speed: f32, dt_ms: f32) {
        use std::f32::consts::TAU;

        // wrapped to one turn; every use is periodic in TAU
        self.angle = (self.angle + dt_ms * angular_speed).rem_euclid(TAU);
        self.tumble[0] = (self.tumble[0] + 0.01).rem_euclid(TAU);
        self.tumble[1] = (self.tumble[1] + 0.015).rem_euclid(TAU);

        let a = self.angle;
        self.transform.translation = Vec3::new(a.cos() * radius, (a * 2.0).sin() * 6.0, a.sin() * radius);
        self.transform.rotation = Quat::from_euler(glam::EulerRot::XYZ, self.tumble[0], self.tumble[1], 0.0);
    }

    /// Orbit angle in radians, within `[0, TAU)`.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// Plane the HUD texture is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudPanel {
    /// Width and height in world units.
    pub size: [f32; 2],
    /// Local transform within the focal group.
    pub transform: Transform,
}

/// All positioned objects of one mounted backdrop.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Perspective camera.
    pub camera: Camera,
    /// Ambient, directional and point lights.
    pub lights: LightSet,
    stars: Vec<Star>,
    /// World position of the focal group.
    pub focal: Vec3,
    /// Core sphere.
    pub core: CoreObject,
    /// Radius of the additive energy shell around the core.
    pub shell_radius: f32,
    /// Present unless disabled in the configuration.
    pub orbiter: Option<Orbiter>,
    /// HUD plane.
    pub hud_panel: HudPanel,
    /// Animation clock in milliseconds, as of the last update.
    pub time_ms: f64,
}

impl Scene {
    /// Builds the scene for a surface of the given aspect ratio; stars are drawn from `rng`.
    #[must_use]
    pub fn new(config: &BackdropConfig, aspect: f32, rng: &mut dyn RandomSource) -> Self {
        let hud_panel = HudPanel {
            size: config.hud.panel_size,
            transform: Transform {
                translation: Vec3::from(config.hud.panel_offset),
                rotation: Quat::from_rotation_x(config.hud.panel_tilt),
                scale: Vec3::ONE,
            },
        };

        let orbiter = config.orbiter.enabled.then(|| Orbiter {
            transform: Transform::default(),
            material: Material::ORBITER,
            angle: 0.0,
            tumble: [0.0; 2],
        });

        Self {
            camera: Camera::new(&config.camera, aspect),
            lights: LightSet::default(),
            stars: geometry::starfield(&config.stars, rng),
            focal: Vec3::ZERO,
            core: CoreObject { transform: Transform::default(), material: Material::CORE, spin: 0.0 },
            shell_radius: config.core.shell_radius,
            orbiter,
            hud_panel,
            time_ms: 0.0,
        }
    }

    /// Positions every object for the frame at `now_ms`.
    ///
    /// The focal group eases toward the newest motion path point plus the
    /// configured offset; it never snaps. A non-finite clock holds the
    /// previous time; a non-finite or negative delta counts as zero.
    pub fn update(&mut self, config: &BackdropConfig, now_ms: f64, dt_ms: f64, motion: &MotionState) {
        let now_ms = if now_ms.is_finite() { now_ms } else { self.time_ms };
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        self.time_ms = now_ms;

        self.camera.update_gyro(now_ms);

        let target = motion.latest().unwrap_or(Vec3::ZERO) + Vec3::from(config.motion.focal_offset);
        self.focal = self.focal.lerp(target, config.motion.focal_ease);

        let pulse = (((now_ms * 0.0066).sin() + 1.0) * 0.5) as f32;
        self.core.spin += 0.0025;
        self.core.transform.scale = Vec3::splat(1.0 + pulse * 0.04);
        self.core.transform.rotation = Quat::from_rotation_y(self.core.spin);

        if let Some(orbiter) = &mut self.orbiter {
            orbiter.advance(config.orbiter.radius, config.orbiter.angular_speed, dt_ms as f32);
        }

        let magnitude = motion.magnitude();
        self.core.material.emissive_intensity = 0.35 + magnitude * 0.5;
        self.lights.core.intensity = 1.0 + magnitude * 0.8;
    }

    /// Updates the projection after a surface change.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    /// Starfield points in world space.
    #[must_use]
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Shell shader clock in seconds.
    #[must_use]
    pub fn shell_time(&self) -> f32 {
        (self.time_ms * 0.001) as f32
    }

    /// World matrix of the focal group.
    #[must_use]
    pub fn focal_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.focal)
    }

    /// World matrix of the core.
    #[must_use]
    pub fn core_matrix(&self) -> Mat4 {
        self.focal_matrix() * self.core.transform.matrix()
    }

    /// World matrix of the orbiter, if present.
    #[must_use]
    pub fn orbiter_matrix(&self) -> Option<Mat4> {
        self.orbiter
            .as_ref()
            .map(|o| self.focal_matrix() * o.transform.matrix())
    }

    /// World matrix of the HUD plane.
    #[must_use]
    pub fn hud_matrix(&self) -> Mat4 {
        self.focal_matrix() * self.hud_panel.transform.matrix()
    }

    /// World positions of the core and rim point lights.
    #[must_use]
    pub fn point_light_positions(&self) -> [Vec3; 2] {
        [self.focal + self.lights.core.offset, self.focal + self.lights.rim.offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn scene() -> (BackdropConfig, Scene) {
        let config = BackdropConfig { stars: crate::config::StarConfig { count: 4, ..Default::default() }, ..Default::default() };
        let scene = Scene::new(&config, 4.0 / 3.0, &mut ScriptedRandom::constant(0.25));
        (config, scene)
    }

    #[test]
    fn test_focal_eases_toward_target() {
        let (config, mut scene) = scene();
        let mut motion = MotionState::new(32);
        motion.step(&config.motion, 0.0, 0.0);

        scene.update(&config, 0.0, 0.0, &motion);
        // 8% of the way toward (0, 6, -14)
        assert!((scene.focal - Vec3::new(0.0, 0.48, -1.12)).length() < 1e-5);

        for _ in 0..200 {
            scene.update(&config, 0.0, 0.0, &motion);
        }
        assert!((scene.focal - Vec3::new(0.0, 6.0, -14.0)).length() < 1e-3);
    }

    #[test]
    fn test_motion_drives_glow() {
        let (config, mut scene) = scene();
        let mut motion = MotionState::new(32);
        motion.vx = 1.0;

        scene.update(&config, 0.0, 0.0, &motion);
        assert!((scene.core.material.emissive_intensity - 0.85).abs() < 1e-6);
        assert!((scene.lights.core.intensity - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_orbiter_follows_angle() {
        let (config, mut scene) = scene();
        let motion = MotionState::new(32);
        scene.update(&config, 1000.0, 1000.0, &motion);

        let orbiter = scene.orbiter.as_ref().unwrap();
        assert!((orbiter.angle() - 0.6).abs() < 1e-6);
        let expected = Vec3::new(0.6f32.cos() * 28.0, 1.2f32.sin() * 6.0, 0.6f32.sin() * 28.0);
        assert!((orbiter.transform.translation - expected).length() < 1e-4);
    }

    #[test]
    fn test_core_pulse_on_long_uptimes() {
        let (config, mut scene) = scene();
        let motion = MotionState::new(32);
        let now_ms = 36_000_000.5;

        scene.update(&config, now_ms, 16.0, &motion);

        let pulse = ((now_ms * 0.0066).sin() + 1.0) * 0.5;
        let expected = (1.0 + pulse * 0.04) as f32;
        assert!((scene.core.transform.scale.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_orbiter_angle_wraps() {
        let (config, mut scene) = scene();
        let motion = MotionState::new(32);
        for frame in 0..2_000 {
            scene.update(&config, f64::from(frame) * 1000.0, 1000.0, &motion);
        }

        let angle = scene.orbiter.as_ref().unwrap().angle();
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
        let expected = (2_000.0f64 * 0.6).rem_euclid(std::f64::consts::TAU) as f32;
        assert!((angle - expected).abs() < 1e-2, "{angle} vs {expected}");
    }

    #[test]
    fn test_orbiter_disabled() {
        let mut config = BackdropConfig::default();
        config.stars.count = 0;
        config.orbiter.enabled = false;
        let scene = Scene::new(&config, 1.0, &mut ScriptedRandom::constant(0.5));
        assert!(scene.orbiter.is_none());
        assert!(scene.orbiter_matrix().is_none());
        assert!(scene.stars().is_empty());
    }

    #[test]
    fn test_children_follow_focal_group() {
        let (config, mut scene) = scene();
        scene.focal = Vec3::new(10.0, 0.0, 0.0);

        let hud = scene.hud_matrix().transform_point3(Vec3::ZERO);
        assert!((hud - (Vec3::new(10.0, 0.0, 0.0) + Vec3::from(config.hud.panel_offset))).length() < 1e-5);
        assert_eq!(scene.point_light_positions()[1], Vec3::new(10.0, 0.0, -40.0));
    }
}
