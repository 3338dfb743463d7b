use std::collections::BTreeSet;

use corelight_core::{
    BackdropConfig, FrameHost, FrameScheduler, FrameTick, ScriptedRandom, SeededRandom, Session, Surface,
    config::ParticleConfig,
};

fn tick(now_ms: f64, dt_ms: f64, frame: u64) -> FrameTick {
    FrameTick { now_ms, dt_ms, frame }
}

fn quiet_config() -> BackdropConfig {
    let mut config = BackdropConfig::default();
    config.stars.count = 16;
    config
}

#[test]
fn motion_stays_in_bounds_for_any_clock() {
    let config = quiet_config();
    let mut rng = SeededRandom::new(7);
    let mut session = Session::new(&config, 0.0, 1.5, &mut rng);

    let timestamps = [0.0, 16.0, 5.0, 1e9, -3e4, f64::NAN, 250.0, f64::INFINITY, 17.0, 1e12];
    for (frame, now) in timestamps.iter().cycle().take(2_000).enumerate() {
        let dt = if frame % 3 == 0 { 400.0 } else { now - 10.0 };
        session.step(tick(*now, dt, frame as u64), &mut rng);

        let m = &session.motion;
        assert!((0.02..=0.98).contains(&m.x), "x out of bounds: {}", m.x);
        assert!((0.02..=0.98).contains(&m.y), "y out of bounds: {}", m.y);
    }
}

#[test]
fn path_keeps_latest_32_in_order() {
    let config = quiet_config();
    let mut rng = ScriptedRandom::constant(0.9);
    let mut session = Session::new(&config, 0.0, 1.0, &mut rng);

    let mut arrivals = Vec::new();
    for frame in 0..45u64 {
        session.step(tick(frame as f64 * 16.0, 16.0, frame), &mut rng);
        arrivals.push(session.motion.latest().unwrap());
        assert!(session.motion.path_len() <= 32);
    }

    assert_eq!(session.motion.path_len(), 32);
    let path: Vec<_> = session.motion.path().copied().collect();
    assert_eq!(path, arrivals[arrivals.len() - 32..]);
}

#[test]
fn particle_cap_holds_when_gate_always_fires() {
    let mut config = quiet_config();
    config.particles = ParticleConfig { capacity: 5, lifetime: [10.0, 10.0], ..ParticleConfig::default() };

    // zero samples make every positive-probability gate succeed
    let mut rng = ScriptedRandom::constant(0.0);
    let mut session = Session::new(&config, 0.0, 1.0, &mut rng);

    for frame in 0..200u64 {
        session.step(tick(frame as f64 * 16.0, 16.0, frame), &mut rng);
        assert!(session.particles.len() <= 5);
    }
    assert_eq!(session.particles.len(), 5);
}

#[test]
fn particles_retire_within_one_frame_of_expiry() {
    let mut config = quiet_config();
    config.particles = ParticleConfig { capacity: 12, lifetime: [0.05, 0.12], ..ParticleConfig::default() };

    let mut rng = SeededRandom::new(42);
    let mut session = Session::new(&config, 0.0, 1.0, &mut rng);

    let mut retired = 0;
    for frame in 0..600u64 {
        let report = session.step(tick(frame as f64 * 16.0, 16.0, frame), &mut rng);
        retired += report.particles.retired;

        for p in session.particles.live() {
            assert!(p.age <= p.lifetime, "expired particle still live");
            assert!(p.opacity() >= 0.0);
        }
    }
    assert!(retired > 0);
}

#[test]
fn hud_uptime_is_rounded_to_one_decimal() {
    let config = quiet_config();
    let mut rng = ScriptedRandom::constant(0.5);
    let mut session = Session::new(&config, 0.0, 1.0, &mut rng);

    let report = session.step(tick(1500.0, 16.0, 0), &mut rng);
    let texts: Vec<&str> = report.hud.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["OPEN CORE", "uptime: 1.5s", "iter: 0"]);
}

#[test]
fn resize_through_zero_restores_aspect() {
    let config = quiet_config();
    let mut rng = ScriptedRandom::constant(0.5);
    let mut surface = Surface::new(1024, 768, 1.0);
    let mut session = Session::new(&config, 0.0, surface.aspect(), &mut rng);

    assert!(surface.resize(0, 0, 1.0));
    session.scene.set_aspect(surface.aspect());
    assert_eq!(surface.physical_size(), (1, 1));
    assert!(session.scene.camera.projection().is_finite());

    assert!(surface.resize(800, 600, 1.0));
    session.scene.set_aspect(surface.aspect());

    let projection = session.scene.camera.projection();
    assert!(projection.is_finite());
    let aspect = projection.y_axis.y / projection.x_axis.x;
    assert!((aspect - 4.0 / 3.0).abs() < 1e-5);

    // unchanged dimensions are a no-op
    assert!(!surface.resize(800, 600, 1.0));
}

#[derive(Debug, Default)]
struct CountingHost {
    next: u32,
    outstanding: BTreeSet<u32>,
}

impl FrameHost for CountingHost {
    type Handle = u32;

    fn request_frame(&mut self) -> Option<u32> {
        self.next += 1;
        self.outstanding.insert(self.next);
        Some(self.next)
    }

    fn cancel_frame(&mut self, handle: u32) {
        self.outstanding.remove(&handle);
    }
}

#[test]
fn stop_before_first_frame_leaves_no_registrations() {
    let mut scheduler = FrameScheduler::new(CountingHost::default());
    scheduler.start();
    assert_eq!(scheduler.host().outstanding.len(), 1);

    scheduler.stop();
    scheduler.stop();
    assert!(scheduler.host().outstanding.is_empty());
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.frames(), 0);
}
