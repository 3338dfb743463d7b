use std::collections::VecDeque;

use glam::{Vec2, Vec3};

use crate::config::{MotionConfig, unit_bounds};

/// Damped 2-D state of the focal point in normalized coordinates.
///
/// `x` and `y` always lie within the configured bounds; the path holds the
/// most recent world-space points in arrival order, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    /// Normalized horizontal position.
    pub x: f32,
    /// Normalized vertical position.
    pub y: f32,
    /// Horizontal velocity per frame.
    pub vx: f32,
    /// Vertical velocity per frame.
    pub vy: f32,
    path: VecDeque<Vec3>,
    path_capacity: usize,
}

impl MotionState {
    /// Creates a resting state centered in the unit square.
    #[must_use]
    pub fn new(path_capacity: usize) -> Self {
        let path_capacity = path_capacity.max(1);
        Self {
            x: 0.5,
            y: 0.5,
            vx: 0.0,
            vy: 0.0,
            path: VecDeque::with_capacity(path_capacity + 1),
            path_capacity,
        }
    }

    /// Advances the state by one frame.
    ///
    /// `dt_ms` and `now_ms` are milliseconds. Non-finite or negative frame
    /// deltas count as zero, so a replayed or out-of-order clock can never push
    /// the position out of bounds or poison it with NaN. Bounds are ordered and
    /// kept inside `[0, 1]` even when `config` was never validated.
    pub fn step(&mut self, config: &MotionConfig, dt_ms: f64, now_ms: f64) {
        let dt = sanitize_dt(dt_ms) as f32;
        let now = if now_ms.is_finite() { now_ms } else { 0.0 };

        let force = force_field(self.x, self.y, now);
        self.vx = self.vx * config.damping + force.x * dt * config.force_gain;
        self.vy = self.vy * config.damping + force.y * dt * config.force_gain;
        if !(self.vx.is_finite() && self.vy.is_finite()) {
            self.vx = 0.0;
            self.vy = 0.0;
        }

        let [lo, hi] = unit_bounds(config.bounds);
        self.x = (self.x + self.vx).clamp(lo, hi);
        self.y = (self.y + self.vy).clamp(lo, hi);

        let span = Vec2::from(config.world_span);
        self.push_point(Vec3::new((self.x - 0.5) * span.x, (self.y - 0.5) * span.y, 0.0));
    }

    /// Velocity magnitude mapped to `[0, 1]`; drives emissive glow and spark rate.
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        (self.vx.hypot(self.vy) * 50.0).min(1.0)
    }

    /// The retained world-space path, oldest first.
    pub fn path(&self) -> impl ExactSizeIterator<Item = &Vec3> {
        self.path.iter()
    }

    /// Number of retained path points.
    #[must_use]
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Most recent path point, if any step has run.
    #[must_use]
    pub fn latest(&self) -> Option<Vec3> {
        self.path.back().copied()
    }

    fn push_point(&mut self, point: Vec3) {
        self.path.push_back(point);
        while self.path.len() > self.path_capacity {
            self.path.pop_front();
        }
    }
}

/// Smooth pseudo-random force at normalized position `(u, v)` and time `t_ms`.
///
/// A fixed combination of sinusoids: identical inputs always produce
/// identical output, which keeps replays reproducible.
#[must_use]
pub fn force_field(u: f32, v: f32, t_ms: f64) -> Vec2 {
    // phases in f64; page clocks outgrow f32 millisecond resolution
    let nx = f64::from(u) * 2.0 - 1.0;
    let ny = f64::from(v) * 2.0 - 1.0;

    Vec2::new(
        ((nx * 2.3 + t_ms * 0.001).sin() * 0.45) as f32,
        ((ny * 2.8 - t_ms * 0.0012).cos() * 0.4) as f32,
    )
}

pub(crate) fn sanitize_dt(dt_ms: f64) -> f64 {
    if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MotionConfig {
        MotionConfig::default()
    }

    #[test]
    fn test_force_field_keeps_precision_on_long_uptimes() {
        // ten hours into the page's lifetime
        let t_ms = 36_000_000.25;
        let force = force_field(0.5, 0.5, t_ms);

        let expected_x = ((t_ms * 0.001).sin() * 0.45) as f32;
        let expected_y = ((-t_ms * 0.0012).cos() * 0.4) as f32;
        assert!((force.x - expected_x).abs() < 1e-6, "{} vs {expected_x}", force.x);
        assert!((force.y - expected_y).abs() < 1e-6, "{} vs {expected_y}", force.y);

        assert_ne!(force_field(0.5, 0.5, t_ms), force_field(0.5, 0.5, t_ms + 1.0));
    }

    #[test]
    fn test_force_field_is_deterministic() {
        let a = force_field(0.3, 0.7, 1234.5);
        let b = force_field(0.3, 0.7, 1234.5);
        assert_eq!(a, b);
        assert!(a.x.abs() <= 0.45 && a.y.abs() <= 0.4);
    }

    #[test]
    fn test_velocity_decays_geometrically_without_force_time() {
        let mut state = MotionState::new(32);
        state.vx = 0.01;
        state.vy = -0.01;

        // zero dt: no new force, only damping
        state.step(&config(), 0.0, 0.0);
        assert!((state.vx - 0.0092).abs() < 1e-7);
        assert!((state.vy + 0.0092).abs() < 1e-7);
    }

    #[test]
    fn test_position_clamped_for_huge_dt() {
        let mut state = MotionState::new(32);
        for i in 0..200 {
            state.step(&config(), 1.0e9, i as f64 * 1.0e6);
            assert!((0.02..=0.98).contains(&state.x), "x={}", state.x);
            assert!((0.02..=0.98).contains(&state.y), "y={}", state.y);
        }
    }

    #[test]
    fn test_non_finite_inputs_do_not_poison_state() {
        let mut state = MotionState::new(32);
        state.step(&config(), f64::NAN, f64::INFINITY);
        state.step(&config(), -16.0, f64::NAN);
        assert!(state.x.is_finite() && state.y.is_finite());
        assert!(state.vx.is_finite() && state.vy.is_finite());
    }

    #[test]
    fn test_unvalidated_bounds_are_sanitized() {
        let reversed = MotionConfig { bounds: [0.98, 0.02], ..config() };
        let mut state = MotionState::new(32);
        for i in 0..50 {
            state.step(&reversed, 1.0e6, i as f64 * 1.0e5);
            assert!((0.02..=0.98).contains(&state.x), "x={}", state.x);
            assert!((0.02..=0.98).contains(&state.y), "y={}", state.y);
        }

        let not_a_number = MotionConfig { bounds: [f32::NAN, f32::NAN], ..config() };
        let mut state = MotionState::new(32);
        state.step(&not_a_number, 16.0, 16.0);
        assert!(state.x.is_finite() && state.y.is_finite());

        let outside = MotionConfig { bounds: [-3.0, f32::NAN], ..config() };
        let mut state = MotionState::new(32);
        state.step(&outside, 1.0e9, 1.0e6);
        assert!((0.0..=1.0).contains(&state.x));
    }

    #[test]
    fn test_path_is_bounded_fifo() {
        let mut state = MotionState::new(4);
        let mut pushed = Vec::new();
        for i in 0..10 {
            state.step(&config(), 16.0, i as f64 * 16.0);
            pushed.push(state.latest().unwrap());
        }

        assert_eq!(state.path_len(), 4);
        let kept: Vec<Vec3> = state.path().copied().collect();
        assert_eq!(kept, pushed[6..].to_vec());
    }

    #[test]
    fn test_world_mapping_of_center() {
        let mut state = MotionState::new(8);
        state.step(&config(), 0.0, 0.0);
        assert_eq!(state.latest(), Some(Vec3::ZERO));
    }

    #[test]
    fn test_magnitude_saturates() {
        let mut state = MotionState::new(8);
        state.vx = 1.0;
        assert_eq!(state.magnitude(), 1.0);
        state.vx = 0.0;
        assert_eq!(state.magnitude(), 0.0);
    }
}
