//! Real-time sources for the timeline.
//!
//! The timeline never reads wall-clock time directly. It asks a
//! [`TimeSource`] for a monotonic reading and derives logical time from it,
//! which lets tests substitute a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::SimTime;

/// A monotonic real-time reading in [`SimTime`] units.
pub trait TimeSource: Send + Sync {
    /// Current reading. Must never decrease.
    fn now(&self) -> SimTime;
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> SimTime {
        self.origin.elapsed().as_millis() as SimTime
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give
/// the other to a [`Timeline`](crate::timeline::Timeline).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    reading: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: SimTime) {
        self.reading.fetch_add(delta, Ordering::SeqCst);
    }

    /// Moves the clock to `time`. Earlier readings are ignored.
    pub fn set(&self, time: SimTime) {
        self.reading.fetch_max(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> SimTime {
        self.reading.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_reading() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(25);
        assert_eq!(clock.now(), 25);

        handle.set(40);
        assert_eq!(clock.now(), 40);
    }

    #[test]
    fn test_manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        clock.set(100);
        clock.set(10);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
