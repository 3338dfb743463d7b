//! Frame scheduling state machine, independent of any display host.

use tracing::debug;

/// Something that can deliver a callback on the next display refresh.
///
/// In the browser this is `requestAnimationFrame`; tests use a counting fake.
pub trait FrameHost {
    /// Registration token returned by `request_frame`.
    type Handle: Copy + std::fmt::Debug;

    /// Registers a callback for the next refresh; `None` if the host refused.
    fn request_frame(&mut self) -> Option<Self::Handle>;

    /// Cancels a registration that has not fired yet.
    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Timing of one scheduled step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Host timestamp in milliseconds.
    pub now_ms: f64,
    /// Milliseconds since the previous tick; zero on the first frame and
    /// whenever the clock stalls or runs backwards.
    pub dt_ms: f64,
    /// Zero-based frame counter.
    pub frame: u64,
}

/// Drives one step per refresh while running.
///
/// At most one registration with the host is outstanding at any time, and
/// [`FrameScheduler::stop`] cancels it, so nothing fires after teardown.
#[derive(Debug)]
pub struct FrameScheduler<H: FrameHost> {
    host: H,
    pending: Option<H::Handle>,
    running: bool,
    last_timestamp: Option<f64>,
    frames: u64,
}

impl<H: FrameHost> FrameScheduler<H> {
    /// Wraps `host` in a stopped scheduler.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            pending: None,
            running: false,
            last_timestamp: None,
            frames: 0,
        }
    }

    /// Starts requesting frames. Calling it while running is a no-op.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.request();
    }

    /// Handles a host callback and schedules the next one.
    ///
    /// Returns `None` when the scheduler has been stopped in the meantime;
    /// the caller must then skip its step entirely.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<FrameTick> {
        self.pending = None;
        if !self.running {
            return None;
        }

        let now_ms = if timestamp_ms.is_finite() { timestamp_ms } else { self.last_timestamp.unwrap_or(0.0) };
        let dt_ms = match self.last_timestamp {
            Some(last) if now_ms > last => now_ms - last,
            _ => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        let tick = FrameTick { now_ms, dt_ms, frame: self.frames };
        self.frames += 1;

        self.request();
        Some(tick)
    }

    /// Stops scheduling and cancels any outstanding registration. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
        if self.running {
            debug!(frames = self.frames, "frame scheduler stopped");
        }
        self.running = false;
    }

    /// `true` between `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames delivered since creation.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `true` while a host registration is outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The display host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the display host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn request(&mut self) {
        self.pending = self.host.request_frame();
        if self.pending.is_none() {
            debug!("frame host refused registration; stopping");
            self.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    /// Host that tracks outstanding registrations.
    #[derive(Debug, Default)]
    struct CountingHost {
        next: u32,
        outstanding: BTreeSet<u32>,
        refuse: bool,
    }

    impl FrameHost for CountingHost {
        type Handle = u32;

        fn request_frame(&mut self) -> Option<u32> {
            if self.refuse {
                return None;
            }
            self.next += 1;
            self.outstanding.insert(self.next);
            Some(self.next)
        }

        fn cancel_frame(&mut self, handle: u32) {
            self.outstanding.remove(&handle);
        }
    }

    impl CountingHost {
        /// Fires the outstanding registration, as the display would.
        fn fire(&mut self) -> bool {
            self.outstanding.pop_first().is_some()
        }
    }

    #[test]
    fn test_first_dt_is_zero() {
        let mut scheduler = FrameScheduler::new(CountingHost::default());
        scheduler.start();

        assert!(scheduler.host_mut().fire());
        let tick = scheduler.on_frame(1000.0).unwrap();
        assert_eq!(tick, FrameTick { now_ms: 1000.0, dt_ms: 0.0, frame: 0 });

        assert!(scheduler.host_mut().fire());
        let tick = scheduler.on_frame(1016.5).unwrap();
        assert_eq!(tick.dt_ms, 16.5);
        assert_eq!(tick.frame, 1);
    }

    #[test]
    fn test_backwards_clock_yields_zero_dt() {
        let mut scheduler = FrameScheduler::new(CountingHost::default());
        scheduler.start();
        scheduler.on_frame(500.0);
        let tick = scheduler.on_frame(100.0).unwrap();
        assert_eq!(tick.dt_ms, 0.0);

        let tick = scheduler.on_frame(f64::NAN).unwrap();
        assert_eq!(tick.dt_ms, 0.0);
        assert_eq!(tick.now_ms, 100.0);
    }

    #[test]
    fn test_single_outstanding_registration() {
        let mut scheduler = FrameScheduler::new(CountingHost::default());
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.host().outstanding.len(), 1);

        for i in 0..5 {
            scheduler.host_mut().fire();
            scheduler.on_frame(i as f64 * 16.0);
            assert_eq!(scheduler.host().outstanding.len(), 1);
        }
    }

    #[test]
    fn test_stop_before_first_frame_leaves_nothing_registered() {
        let mut scheduler = FrameScheduler::new(CountingHost::default());
        scheduler.start();
        scheduler.stop();

        assert!(scheduler.host().outstanding.is_empty());
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.frames(), 0);
    }

    #[test]
    fn test_stop_is_idempotent_and_late_callbacks_noop() {
        let mut scheduler = FrameScheduler::new(CountingHost::default());
        scheduler.start();
        scheduler.host_mut().fire();
        scheduler.on_frame(0.0);
        scheduler.stop();
        scheduler.stop();

        assert!(scheduler.host().outstanding.is_empty());
        assert!(scheduler.on_frame(16.0).is_none());
        assert!(scheduler.host().outstanding.is_empty());
    }

    #[test]
    fn test_refused_registration_stops() {
        let host = CountingHost { refuse: true, ..CountingHost::default() };
        let mut scheduler = FrameScheduler::new(host);
        scheduler.start();
        assert!(!scheduler.is_running());
        assert!(scheduler.on_frame(0.0).is_none());
    }
}
