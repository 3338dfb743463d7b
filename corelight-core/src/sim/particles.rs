use glam::Vec3;

use crate::{config::ParticleConfig, random::RandomSource};

/// A short-lived spark emitted from the focal group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World-space position.
    pub position: Vec3,
    /// World units per second.
    pub velocity: Vec3,
    /// Seconds since spawn.
    pub age: f32,
    /// Seconds the particle stays alive.
    pub lifetime: f32,
}

/// Lifecycle phase of a particle.
///
/// `Spawned` until its first non-zero tick; `Retired` particles are dropped
/// from the live set in the step that retires them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticlePhase {
    /// Created this frame, not yet aged.
    Spawned,
    /// Alive and fading.
    Aging,
    /// Past its lifetime; removed in the same step.
    Retired,
}

impl Particle {
    /// Displayed opacity, fading linearly to zero over the lifetime.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        (1.0 - self.age / self.lifetime).max(0.0)
    }

    /// Lifecycle phase derived from `age` and `lifetime`.
    #[must_use]
    pub fn phase(&self) -> ParticlePhase {
        if self.age > self.lifetime {
            ParticlePhase::Retired
        } else if self.age == 0.0 {
            ParticlePhase::Spawned
        } else {
            ParticlePhase::Aging
        }
    }
}

/// Counts from one lifecycle step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticleStep {
    /// Particles admitted this step (0 or 1).
    pub spawned: usize,
    /// Particles dropped after outliving their lifetime.
    pub retired: usize,
}

/// Load-bounded spark population.
///
/// The live count never exceeds the capacity. Admission is gated per frame by
/// a probability boosted by the current motion magnitude, so emission reacts to
/// motion instead of following a fixed interval.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    live: Vec<Particle>,
    capacity: usize,
}

impl ParticleSystem {
    /// Creates an empty population that admits at most `capacity` particles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { live: Vec::with_capacity(capacity), capacity }
    }

    /// Ages every particle, retires the expired ones, then runs the spawn gate.
    ///
    /// Retirement happens in the same step in which `age` first exceeds
    /// `lifetime`; a particle is never observable with a negative opacity.
    pub fn step(
        &mut self,
        config: &ParticleConfig,
        dt_secs: f32,
        emitter: Vec3,
        motion: f32,
        rng: &mut dyn RandomSource,
    ) -> ParticleStep {
        let dt = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };

        for particle in &mut self.live {
            particle.age += dt;
            particle.position += particle.velocity * dt;
        }

        let before = self.live.len();
        self.live.retain(|p| p.phase() != ParticlePhase::Retired);
        let retired = before - self.live.len();

        let spawned = match self.try_spawn(config, emitter, motion, rng) {
            Some(particle) => {
                self.live.push(particle);
                1
            },
            None => 0,
        };

        ParticleStep { spawned, retired }
    }

    /// Admission gate: a free slot and a successful probability draw.
    fn try_spawn(
        &self,
        config: &ParticleConfig,
        emitter: Vec3,
        motion: f32,
        rng: &mut dyn RandomSource,
    ) -> Option<Particle> {
        if self.live.len() >= self.capacity {
            return None;
        }

        let probability = config.base_spawn_rate + config.motion_spawn_boost * motion.clamp(0.0, 1.0);
        if !rng.chance(probability) {
            return None;
        }

        // uniform direction on the unit sphere
        let z = rng.range(-1.0, 1.0);
        let theta = rng.range(0.0, std::f32::consts::TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let direction = Vec3::new(r * theta.cos(), r * theta.sin(), z);

        let [min_speed, max_speed] = config.speed;
        let [min_life, max_life] = config.lifetime;

        Some(Particle {
            position: emitter,
            velocity: direction * rng.range(min_speed, max_speed),
            age: 0.0,
            lifetime: rng.range(min_life, max_life).max(f32::EPSILON),
        })
    }

    /// Live particles in spawn order.
    #[must_use]
    pub fn live(&self) -> &[Particle] {
        &self.live
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// `true` when no particle is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Maximum number of live particles.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every live particle.
    pub fn clear(&mut self) {
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn always_spawn() -> ParticleConfig {
        ParticleConfig {
            capacity: 5,
            base_spawn_rate: 1.0,
            motion_spawn_boost: 0.0,
            lifetime: [1.0, 1.0],
            speed: [10.0, 10.0],
            point_size: 4.0,
        }
    }

    #[test]
    fn test_population_capped_when_gate_always_succeeds() {
        let mut system = ParticleSystem::new(5);
        let mut rng = ScriptedRandom::constant(0.0);
        let config = ParticleConfig { lifetime: [100.0, 100.0], ..always_spawn() };

        for _ in 0..50 {
            system.step(&config, 0.016, Vec3::ZERO, 1.0, &mut rng);
            assert!(system.len() <= 5);
        }
        assert_eq!(system.len(), 5);
    }

    #[test]
    fn test_zero_capacity_never_spawns() {
        let mut system = ParticleSystem::new(0);
        let mut rng = ScriptedRandom::constant(0.0);
        let step = system.step(&always_spawn(), 0.016, Vec3::ZERO, 1.0, &mut rng);
        assert_eq!(step, ParticleStep::default());
        assert!(system.is_empty());
    }

    #[test]
    fn test_retired_in_step_lifetime_is_exceeded() {
        let mut system = ParticleSystem::new(1);
        let mut rng = ScriptedRandom::constant(0.0);
        let step = system.step(&always_spawn(), 0.0, Vec3::ZERO, 0.0, &mut rng);
        assert_eq!(step.spawned, 1);
        assert_eq!(system.live()[0].phase(), ParticlePhase::Spawned);

        let closed = ParticleConfig { base_spawn_rate: 0.0, ..always_spawn() };

        // exactly at lifetime: still alive, fully faded
        system.step(&closed, 1.0, Vec3::ZERO, 0.0, &mut rng);
        assert_eq!(system.len(), 1);
        assert_eq!(system.live()[0].opacity(), 0.0);

        // past lifetime: retired in this same step
        let step = system.step(&closed, 0.001, Vec3::ZERO, 0.0, &mut rng);
        assert_eq!(step.retired, 1);
        assert!(system.is_empty());
    }

    #[test]
    fn test_motion_boosts_admission() {
        let config = ParticleConfig {
            base_spawn_rate: 0.1,
            motion_spawn_boost: 0.5,
            ..always_spawn()
        };

        // draw of 0.3 fails the resting gate but passes the boosted one
        let mut resting = ParticleSystem::new(5);
        resting.step(&config, 0.016, Vec3::ZERO, 0.0, &mut ScriptedRandom::constant(0.3));
        assert!(resting.is_empty());

        let mut moving = ParticleSystem::new(5);
        moving.step(&config, 0.016, Vec3::ZERO, 1.0, &mut ScriptedRandom::constant(0.3));
        assert_eq!(moving.len(), 1);
    }

    #[test]
    fn test_particles_advance_by_velocity() {
        let mut system = ParticleSystem::new(1);
        let config = ParticleConfig { lifetime: [10.0, 10.0], ..always_spawn() };
        let emitter = Vec3::new(1.0, 2.0, 3.0);
        system.step(&config, 0.0, emitter, 0.0, &mut ScriptedRandom::constant(0.0));

        let spawned = system.live()[0];
        assert_eq!(spawned.position, emitter);
        assert!((spawned.velocity.length() - 10.0).abs() < 1e-4);

        system.step(&config, 0.5, Vec3::ZERO, 0.0, &mut ScriptedRandom::constant(0.99));
        let moved = system.live()[0];
        assert!((moved.position - (emitter + spawned.velocity * 0.5)).length() < 1e-4);
        assert!((moved.opacity() - 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_negative_dt_does_not_rewind() {
        let mut system = ParticleSystem::new(1);
        let config = ParticleConfig { lifetime: [10.0, 10.0], ..always_spawn() };
        system.step(&config, 0.0, Vec3::ZERO, 0.0, &mut ScriptedRandom::constant(0.0));
        system.step(&config, -5.0, Vec3::ZERO, 0.0, &mut ScriptedRandom::constant(0.99));
        assert_eq!(system.live()[0].age, 0.0);
    }
}
