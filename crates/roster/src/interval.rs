//! Host-driven recurring timer.
//!
//! The roster has no thread or event loop of its own. The host calls
//! `Interval::poll` with the current time and learns how many periods have
//! elapsed since the last due time. A cancelled interval never fires again.

use waitboard_core::Timestamp;

/// A cancellable fixed-period timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    period: i64,
    next_due: Option<Timestamp>,
}

impl Interval {
    /// Creates a disarmed interval. Periods below one second are raised to one.
    pub fn new(period_secs: u64) -> Self {
        Self {
            period: i64::try_from(period_secs).unwrap_or(i64::MAX).max(1),
            next_due: None,
        }
    }

    #[inline]
    pub fn period(&self) -> i64 {
        self.period
    }

    /// Arms the interval so the first period ends at `now + period`.
    ///
    /// Re-arming an armed interval restarts its period.
    pub fn start(&mut self, now: Timestamp) {
        self.next_due = Some(now.saturating_add(self.period));
    }

    /// Disarms the interval.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    #[inline]
    pub fn next_due(&self) -> Option<Timestamp> {
        self.next_due
    }

    /// Returns the number of periods that ended at or before `now` and
    /// advances the due time past `now`. Zero when disarmed or not yet due.
    pub fn poll(&mut self, now: Timestamp) -> u32 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }

        let elapsed = now.saturating_sub(due) / self.period + 1;
        self.next_due = Some(due.saturating_add(elapsed.saturating_mul(self.period)));
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }
}
