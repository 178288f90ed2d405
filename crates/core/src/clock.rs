//! Time sources.
//!
//! Derivations never read the wall clock directly; they are handed a
//! `Timestamp` obtained from a `TimeSource`, so tests can pin time.

use core::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix time in whole seconds.
pub type Timestamp = i64;

/// A provider of the current time.
pub trait TimeSource {
    fn now(&self) -> Timestamp;
}

/// Shared handle to a time source.
pub type SharedClock = Rc<dyn TimeSource>;

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    #[inline]
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Reads the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as Timestamp)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Moves the clock forward by `secs` and returns the new time.
    pub fn advance(&self, secs: i64) -> Timestamp {
        let now = self.now.get().saturating_add(secs);
        self.now.set(now);
        now
    }
}

impl TimeSource for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(60), 1_060);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_shared_clock_sees_updates() {
        let clock = Rc::new(ManualClock::new(10));
        let shared: SharedClock = clock.clone();
        clock.advance(5);
        assert_eq!(shared.now(), 15);
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
