//! Monotonic time sources.
//!
//! The scheduler, scenes and the telemetry sampler never read wall time
//! directly; they take microsecond timestamps from a [`Clock`].

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic microsecond clock.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;
}

/// High-precision clock backed by `quanta`.
pub struct SystemClock {
    clock: quanta::Clock,
    origin: quanta::Instant,
}

impl SystemClock {
    /// Create a new clock whose origin is now.
    pub fn new() -> Self {
        let clock = quanta::Clock::new();
        let origin = clock.now();
        Self { clock, origin }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_us(&self) -> u64 {
        self.clock.now().duration_since(self.origin).as_micros() as u64
    }
}

/// Manually driven clock for deterministic runs.
///
/// Every read returns the current time and then advances it by `step_us`,
/// so a scheduler driven by this clock sees time pass without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    step_us: u64,
}

impl ManualClock {
    /// Create a clock frozen at `start_us`.
    pub fn new(start_us: u64) -> Self {
        Self {
            now: AtomicU64::new(start_us),
            step_us: 0,
        }
    }

    /// Create a clock that advances by `step_us` on every read.
    pub fn with_step(start_us: u64, step_us: u64) -> Self {
        Self {
            now: AtomicU64::new(start_us),
            step_us,
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta_us: u64) {
        self.now.fetch_add(delta_us, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_us: u64) {
        self.now.store(now_us, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now.fetch_add(self.step_us, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_us(), 1_000);
        assert_eq!(clock.now_us(), 1_000);

        clock.advance(500);
        assert_eq!(clock.now_us(), 1_500);

        clock.set(42);
        assert_eq!(clock.now_us(), 42);
    }

    #[test]
    fn test_manual_clock_step() {
        let clock = ManualClock::with_step(0, 10);
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_us(), 10);
        assert_eq!(clock.now_us(), 20);
    }
}
