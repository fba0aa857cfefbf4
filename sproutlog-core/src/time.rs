//! Time management for the polling loop
//!
//! Provides a clock abstraction so the pipeline can run against:
//! - System wall-clock time (when NTP has synced)
//! - A monotonic boot counter (before sync; persistence is refused)
//! - A fixed, manually advanced clock (tests)

use core::cell::Cell;

/// Timestamp in milliseconds since the Unix epoch (or device boot for
/// monotonic sources).
pub type Timestamp = u64;

/// Source of time for the pipeline.
pub trait Clock {
    /// Current timestamp in milliseconds.
    fn now(&self) -> Timestamp;

    /// Whether this source currently provides real wall-clock time.
    ///
    /// Persistence requires a wall clock; a record stamped with a boot
    /// counter would be meaningless in the log.
    fn is_wall_clock(&self) -> bool;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// System time source (requires std).
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Manually driven clock for tests.
///
/// Interior mutability lets a test advance time while the pipeline holds
/// the clock by shared reference. Single-threaded only, like the polling
/// loop it stands in for.
#[derive(Debug, Default)]
pub struct FixedClock {
    now_ms: Cell<Timestamp>,
    wall_clock: Cell<bool>,
}

impl FixedClock {
    /// Create a clock reporting wall-clock time starting at `timestamp`.
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            now_ms: Cell::new(timestamp),
            wall_clock: Cell::new(true),
        }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, timestamp: Timestamp) {
        self.now_ms.set(timestamp);
    }

    /// Move time forward.
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    /// Simulate NTP sync state.
    pub fn set_wall_clock(&self, synced: bool) {
        self.wall_clock.set(synced);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now_ms.get()
    }

    fn is_wall_clock(&self) -> bool {
        self.wall_clock.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);
    }

    #[test]
    fn fixed_clock_sync_state() {
        let clock = FixedClock::new(0);
        assert!(clock.is_wall_clock());

        clock.set_wall_clock(false);
        assert!(!clock.is_wall_clock());
    }

    #[test]
    fn clock_through_reference() {
        fn read<C: Clock>(clock: C) -> Timestamp {
            clock.now()
        }

        let clock = FixedClock::new(42);
        assert_eq!(read(&clock), 42);
        // The original is still usable after handing out a reference.
        clock.advance(8);
        assert_eq!(read(&clock), 50);
    }
}
