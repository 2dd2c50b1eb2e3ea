use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Simulated video refresh rate
pub const FRAME_RATE: u32 = 60;
pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / FRAME_RATE as u64);

/// Monotonic time source for frame pacing.
///
/// `now` is measured from an arbitrary fixed origin and must never go back.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> MonotonicClock {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced explicitly by its owner.
///
/// Clones share the same time, so a driver (or a test) can keep one handle
/// and give the other to the emulator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    pub fn advance(&self, elapsed: Duration) {
        self.now.set(self.now.get() + elapsed);
    }

    /// Move forward by `frames` frame intervals
    pub fn advance_frames(&self, frames: u32) {
        self.advance(FRAME_INTERVAL * frames);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Deadline of the next simulated vblank
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    next_vblank: Duration,
    interval: Duration,
}

impl FrameClock {
    /// The first frame ends one interval after `now`
    pub fn new(now: Duration) -> FrameClock {
        FrameClock {
            next_vblank: now + FRAME_INTERVAL,
            interval: FRAME_INTERVAL,
        }
    }

    pub fn reset(&mut self, now: Duration) {
        self.next_vblank = now + self.interval;
    }

    /// Returns true if a frame boundary was reached.
    ///
    /// At most one boundary is reported per call; after a stall the deadline
    /// catches up past `now` instead of reporting the missed frames.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_vblank {
            return false;
        }

        while self.next_vblank <= now {
            self.next_vblank += self.interval;
        }
        true
    }

    pub fn next_vblank(&self) -> Duration {
        self.next_vblank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_boundary_after_one_interval() {
        let clock = ManualClock::new();
        let mut frames = FrameClock::new(clock.now());
        assert!(!frames.poll(clock.now()));

        clock.advance_frames(1);

        assert!(frames.poll(clock.now()));
        assert!(!frames.poll(clock.now()));
    }

    #[test]
    fn test_one_boundary_per_interval() {
        let clock = ManualClock::new();
        let mut frames = FrameClock::new(clock.now());

        clock.advance(FRAME_INTERVAL / 2);
        assert!(!frames.poll(clock.now()));

        clock.advance(FRAME_INTERVAL / 2);
        assert!(frames.poll(clock.now()));
        assert!(!frames.poll(clock.now()));
    }

    #[test]
    fn test_stall_catches_up_once() {
        let clock = ManualClock::new();
        let mut frames = FrameClock::new(clock.now());

        clock.advance(FRAME_INTERVAL * 10 + FRAME_INTERVAL / 2);

        assert!(frames.poll(clock.now()));
        assert!(!frames.poll(clock.now()));
        assert!(frames.next_vblank() > clock.now());
    }

    #[test]
    fn test_stall_of_whole_frames_catches_up_once() {
        let clock = ManualClock::new();
        let mut frames = FrameClock::new(clock.now());

        clock.advance_frames(20);

        assert!(frames.poll(clock.now()));
        assert!(!frames.poll(clock.now()));
        assert_eq!(frames.next_vblank(), FRAME_INTERVAL * 21);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance_frames(3);

        assert_eq!(clock.now(), FRAME_INTERVAL * 3);
    }
}
