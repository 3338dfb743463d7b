//! Visual and simulation parameters for the backdrop.
//!
//! Every constant that shapes the scene lives here, so alternate "skins" of the
//! backdrop are just different [`BackdropConfig`] values over the same engine.
//! With the `serde` feature, every struct deserializes with `#[serde(default)]`,
//! allowing a host page to override only the fields it cares about.

use compact_str::CompactString;

/// Complete configuration for one backdrop session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackdropConfig {
    /// Background color as packed `0xRRGGBB`.
    pub clear_color: u32,
    /// Upper bound for the device pixel ratio used to size the drawing surface.
    pub max_pixel_ratio: f32,
    /// Exposure applied before ACES filmic tone mapping.
    pub exposure: f32,
    /// Camera lens and resting position.
    pub camera: CameraConfig,
    /// Glow pass.
    pub bloom: BloomConfig,
    /// Background starfield.
    pub stars: StarConfig,
    /// Core sphere and shell sizes.
    pub core: CoreConfig,
    /// Focal-point motion field.
    pub motion: MotionConfig,
    /// Spark emission.
    pub particles: ParticleConfig,
    /// Orbiting cube.
    pub orbiter: OrbiterConfig,
    /// HUD raster and panel.
    pub hud: HudConfig,
}

/// Perspective camera parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Resting position the gyro motion oscillates around.
    pub base_position: [f32; 3],
}

/// Brightness-threshold glow parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BloomConfig {
    /// Luminance above which pixels contribute to the glow.
    pub threshold: f32,
    /// Glow contribution when composited over the scene.
    pub strength: f32,
    /// Blur spread; scales the gaussian tap spacing.
    pub radius: f32,
}

/// Starfield layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StarConfig {
    /// Number of stars.
    pub count: u32,
    /// Inner radius of the star ring.
    pub min_radius: f32,
    /// Outer radius of the star ring.
    pub max_radius: f32,
}

/// Core sphere and energy shell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Radius of the lit core sphere.
    pub core_radius: f32,
    /// Radius of the additive shell; larger than `core_radius`.
    pub shell_radius: f32,
    /// Sphere tessellation (both width and height segments).
    pub segments: u32,
}

/// Damped procedural motion of the focal point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Geometric velocity decay applied every step before the new force.
    pub damping: f32,
    /// Force-to-velocity gain per millisecond of frame time.
    pub force_gain: f32,
    /// Inclusive normalized bounds for both axes.
    pub bounds: [f32; 2],
    /// Maximum number of retained path points.
    pub path_capacity: usize,
    /// World-space extent of the normalized `[0, 1]` square.
    pub world_span: [f32; 2],
    /// Fraction of the remaining distance the focal group covers per frame.
    pub focal_ease: f32,
    /// Offset from the latest path point to the focal group's target.
    pub focal_offset: [f32; 3],
}

/// Spark particle lifecycle parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParticleConfig {
    /// Maximum live population; zero disables sparks.
    pub capacity: usize,
    /// Per-frame admission probability at rest.
    pub base_spawn_rate: f32,
    /// Extra admission probability at full motion magnitude.
    pub motion_spawn_boost: f32,
    /// Lifetime band in seconds.
    pub lifetime: [f32; 2],
    /// Speed band in world units per second.
    pub speed: [f32; 2],
    /// Rendered point size in pixels at unit distance scale.
    pub point_size: f32,
}

/// Small cube orbiting the core.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbiterConfig {
    /// Whether the orbiter is part of the scene.
    pub enabled: bool,
    /// Orbit radius around the core.
    pub radius: f32,
    /// Orbit angle advance in radians per millisecond.
    pub angular_speed: f32,
    /// Cube edge length.
    pub size: f32,
}

/// Heads-up display raster and panel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HudConfig {
    /// Raster width in pixels, at most [`HudConfig::MAX_RASTER_SIDE`].
    pub width: u32,
    /// Raster height in pixels, at most [`HudConfig::MAX_RASTER_SIDE`].
    pub height: u32,
    /// Panel size in world units.
    pub panel_size: [f32; 2],
    /// Panel position relative to the focal group.
    pub panel_offset: [f32; 3],
    /// Panel tilt about the X axis, in radians.
    pub panel_tilt: f32,
    /// First HUD line.
    pub label: CompactString,
    /// Per-frame probability of advancing the iteration counter.
    pub iteration_chance: f32,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            clear_color: 0x020308,
            max_pixel_ratio: 1.75,
            exposure: 0.9,
            camera: CameraConfig::default(),
            bloom: BloomConfig::default(),
            stars: StarConfig::default(),
            core: CoreConfig::default(),
            motion: MotionConfig::default(),
            particles: ParticleConfig::default(),
            orbiter: OrbiterConfig::default(),
            hud: HudConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 38.0,
            near: 0.1,
            far: 8000.0,
            base_position: [0.0, 26.0, 240.0],
        }
    }
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self { threshold: 0.4, strength: 0.55, radius: 0.2 }
    }
}

impl Default for StarConfig {
    fn default() -> Self {
        Self { count: 800, min_radius: 400.0, max_radius: 1600.0 }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self { core_radius: 9.5, shell_radius: 13.5, segments: 72 }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            damping: 0.92,
            force_gain: 0.00012,
            bounds: [0.02, 0.98],
            path_capacity: 32,
            world_span: [90.0, 50.0],
            focal_ease: 0.08,
            focal_offset: [0.0, 6.0, -14.0],
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 48,
            base_spawn_rate: 0.08,
            motion_spawn_boost: 0.5,
            lifetime: [0.6, 1.6],
            speed: [6.0, 18.0],
            point_size: 5.0,
        }
    }
}

impl Default for OrbiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 28.0,
            angular_speed: 0.0006,
            size: 2.2,
        }
    }
}

impl HudConfig {
    /// Largest raster side accepted; larger values are clamped.
    pub const MAX_RASTER_SIDE: u32 = 2048;
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 128,
            panel_size: [130.0, 30.0],
            panel_offset: [0.0, -26.0, -38.0],
            panel_tilt: -0.12,
            label: CompactString::const_new("OPEN CORE"),
            iteration_chance: 0.015,
        }
    }
}

impl BackdropConfig {
    /// Returns a copy with out-of-range values pulled back into a usable range.
    ///
    /// Bands are reordered so that `min <= max`, probabilities are clamped to
    /// `[0, 1]`, motion bounds stay inside the unit square, and sizes that feed
    /// divisions or allocations are kept at least 1.
    #[must_use]
    pub fn validated(&self) -> Self {
        let mut config = self.clone();

        config.max_pixel_ratio = finite_or(config.max_pixel_ratio, 1.0).max(0.25);
        config.exposure = finite_or(config.exposure, 1.0).max(0.0);

        let camera = &mut config.camera;
        camera.fov_degrees = finite_or(camera.fov_degrees, 38.0).clamp(1.0, 170.0);
        camera.near = finite_or(camera.near, 0.1).max(1e-4);
        camera.far = finite_or(camera.far, 8000.0).max(camera.near * 2.0);

        let bloom = &mut config.bloom;
        bloom.threshold = finite_or(bloom.threshold, 0.4).clamp(0.0, 1.0);
        bloom.strength = finite_or(bloom.strength, 0.55).max(0.0);
        bloom.radius = finite_or(bloom.radius, 0.2).max(0.0);

        let stars = &mut config.stars;
        [stars.min_radius, stars.max_radius] = ordered([stars.min_radius, stars.max_radius]);

        config.core.segments = config.core.segments.max(3);

        let motion = &mut config.motion;
        motion.damping = finite_or(motion.damping, 0.92).clamp(0.0, 1.0);
        motion.bounds = unit_bounds(motion.bounds);
        motion.path_capacity = motion.path_capacity.max(1);
        motion.focal_ease = finite_or(motion.focal_ease, 0.08).clamp(0.0, 1.0);

        let particles = &mut config.particles;
        particles.base_spawn_rate = finite_or(particles.base_spawn_rate, 0.0).clamp(0.0, 1.0);
        particles.motion_spawn_boost = finite_or(particles.motion_spawn_boost, 0.0).clamp(0.0, 1.0);
        particles.lifetime = ordered(particles.lifetime);
        particles.lifetime[0] = particles.lifetime[0].max(1e-3);
        particles.lifetime[1] = particles.lifetime[1].max(particles.lifetime[0]);
        particles.speed = ordered(particles.speed);

        let hud = &mut config.hud;
        hud.width = hud.width.clamp(1, HudConfig::MAX_RASTER_SIDE);
        hud.height = hud.height.clamp(1, HudConfig::MAX_RASTER_SIDE);
        hud.iteration_chance = finite_or(hud.iteration_chance, 0.0).clamp(0.0, 1.0);

        config
    }

    /// Background color as linear `[r, g, b]` components in `0.0..=1.0`.
    #[must_use]
    pub fn clear_rgb(&self) -> [f32; 3] {
        rgb(self.clear_color)
    }
}

/// Unpacks a `0xRRGGBB` color into normalized components.
#[must_use]
pub fn rgb(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    ]
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn ordered([a, b]: [f32; 2]) -> [f32; 2] {
    let a = finite_or(a, 0.0);
    let b = finite_or(b, a);
    if a <= b { [a, b] } else { [b, a] }
}

/// Orders `[lo, hi]` and keeps both inside `[0, 1]`; a non-finite end falls back to the other one, or 0.
pub(crate) fn unit_bounds(bounds: [f32; 2]) -> [f32; 2] {
    let [lo, hi] = ordered(bounds);
    [lo.clamp(0.0, 1.0), hi.clamp(0.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_unpacking() {
        assert_eq!(rgb(0xFF0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x00FF00), [0.0, 1.0, 0.0]);
        let [r, g, b] = rgb(0x020308);
        assert!((r - 2.0 / 255.0).abs() < 1e-6);
        assert!((g - 3.0 / 255.0).abs() < 1e-6);
        assert!((b - 8.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_validated_reorders_bands() {
        let mut config = BackdropConfig::default();
        config.particles.lifetime = [2.0, 0.5];
        config.motion.bounds = [0.9, -0.2];
        config.hud.iteration_chance = 4.0;

        let config = config.validated();
        assert_eq!(config.particles.lifetime, [0.5, 2.0]);
        assert_eq!(config.motion.bounds, [0.0, 0.9]);
        assert_eq!(config.hud.iteration_chance, 1.0);
    }

    #[test]
    fn test_validated_caps_hud_raster() {
        let mut config = BackdropConfig::default();
        config.hud.width = 40_000;
        config.hud.height = 0;

        let config = config.validated();
        assert_eq!(config.hud.width, HudConfig::MAX_RASTER_SIDE);
        assert_eq!(config.hud.height, 1);
    }

    #[test]
    fn test_validated_keeps_defaults() {
        let config = BackdropConfig::default();
        assert_eq!(config.validated(), config);
    }

    #[test]
    fn test_validated_replaces_non_finite() {
        let mut config = BackdropConfig::default();
        config.motion.damping = f32::NAN;
        config.camera.far = f32::INFINITY;

        let config = config.validated();
        assert_eq!(config.motion.damping, 0.92);
        assert_eq!(config.camera.far, 8000.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_overrides() {
        let config: BackdropConfig =
            serde_json::from_str(r#"{ "particles": { "capacity": 8 }, "hud": { "label": "CORE" } }"#)
                .unwrap();

        assert_eq!(config.particles.capacity, 8);
        assert_eq!(config.particles.lifetime, ParticleConfig::default().lifetime);
        assert_eq!(config.hud.label, "CORE");
        assert_eq!(config.stars, StarConfig::default());
    }
}
