//! Per-session simulation state and the single-frame step.

mod hud;
mod motion;
mod particles;

pub use hud::{HudColor, HudFont, HudFrame, HudLine, HudState, Scanlines, uptime_text};
pub use motion::{MotionState, force_field};
pub use particles::{Particle, ParticlePhase, ParticleStep, ParticleSystem};

use crate::{config::BackdropConfig, random::RandomSource, scene::Scene, schedule::FrameTick};

/// Everything one mounted backdrop mutates from frame to frame.
///
/// Created at mount, discarded at unmount. Two sessions never share state.
#[derive(Debug, Clone)]
pub struct Session {
    config: BackdropConfig,
    /// Damped focal-point motion.
    pub motion: MotionState,
    /// Spark population around the focal group.
    pub particles: ParticleSystem,
    /// Telemetry shown on the HUD panel.
    pub hud: HudState,
    /// Camera, lights and objects positioned for the current frame.
    pub scene: Scene,
}

/// Outcome of one [`Session::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Scheduler frame number this report belongs to.
    pub frame: u64,
    /// Spawn and retirement counts.
    pub particles: ParticleStep,
    /// Whether the HUD iteration counter advanced.
    pub iteration_advanced: bool,
    /// HUD layout for this frame, ready to be rasterized.
    pub hud: HudFrame,
}

impl Session {
    /// Starts a session at `start_time_ms` for a surface of the given aspect ratio.
    ///
    /// The configuration is validated first, so a session never runs on
    /// out-of-range parameters.
    #[must_use]
    pub fn new(config: &BackdropConfig, start_time_ms: f64, aspect: f32, rng: &mut dyn RandomSource) -> Self {
        let config = config.validated();
        let scene = Scene::new(&config, aspect, rng);

        Self {
            motion: MotionState::new(config.motion.path_capacity),
            particles: ParticleSystem::new(config.particles.capacity),
            hud: HudState::new(start_time_ms),
            scene,
            config,
        }
    }

    /// The validated configuration this session runs on.
    #[must_use]
    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    /// Runs one frame: motion, scene positions, particles, then the HUD.
    ///
    /// Synchronous start to finish and free of any GPU access, so a frame can
    /// be replayed in a test with a scripted random source.
    pub fn step(&mut self, tick: FrameTick, rng: &mut dyn RandomSource) -> StepReport {
        self.motion
            .step(&self.config.motion, tick.dt_ms, tick.now_ms);

        self.scene
            .update(&self.config, tick.now_ms, tick.dt_ms, &self.motion);

        let particles = self.particles.step(
            &self.config.particles,
            (tick.dt_ms / 1000.0) as f32,
            self.scene.focal,
            self.motion.magnitude(),
            rng,
        );

        let iteration_advanced = self.hud.tick(self.config.hud.iteration_chance, rng);
        let hud = self.hud.frame(&self.config.hud, tick.now_ms);

        StepReport { frame: tick.frame, particles, iteration_advanced, hud }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn session() -> Session {
        let mut config = BackdropConfig::default();
        config.stars.count = 8;
        Session::new(&config, 0.0, 1.0, &mut ScriptedRandom::constant(0.5))
    }

    #[test]
    fn test_step_reports_hud_and_spawns() {
        let mut session = session();
        let mut rng = ScriptedRandom::constant(0.0);

        let report = session.step(FrameTick { now_ms: 1500.0, dt_ms: 16.0, frame: 0 }, &mut rng);
        assert_eq!(report.particles.spawned, 1);
        assert!(report.iteration_advanced);
        assert_eq!(report.hud.lines[1].text, "uptime: 1.5s");
        assert_eq!(session.hud.iteration(), 1);
    }

    #[test]
    fn test_step_with_closed_gates() {
        let mut session = session();
        let mut rng = ScriptedRandom::constant(0.999);

        for frame in 0..10 {
            let report = session.step(FrameTick { now_ms: frame as f64 * 16.0, dt_ms: 16.0, frame }, &mut rng);
            assert_eq!(report.particles.spawned, 0);
            assert!(!report.iteration_advanced);
        }
        assert!(session.particles.is_empty());
        assert_eq!(session.motion.path_len(), 10);
    }

    #[test]
    fn test_sparks_spawn_at_focal_group() {
        let mut session = session();
        session.step(FrameTick { now_ms: 0.0, dt_ms: 0.0, frame: 0 }, &mut ScriptedRandom::constant(0.0));
        assert_eq!(session.particles.live()[0].position, session.scene.focal);
    }
}
