//! Deferred work items
//!
//! Timestamps (milliseconds since boot) owned by the motion driver instead of
//! callbacks. Cancelling one is dropping it.

/// One-shot completion deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    /// Instant the deadline fires (ms)
    pub at: u64,
}

impl Deadline {
    /// Deadline `after_ms` from `now`
    pub const fn after(now: u64, after_ms: u32) -> Self {
        Self {
            at: now.saturating_add(after_ms as u64),
        }
    }

    pub const fn is_due(&self, now: u64) -> bool {
        now >= self.at
    }
}

/// Fixed-period repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interval {
    /// Period between firings (ms, at least 1)
    pub period_ms: u32,
    /// Instant of the next firing (ms)
    pub next_at: u64,
}

impl Interval {
    /// Interval whose first firing is one period after `now`
    pub fn starting(now: u64, period_ms: u32) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_at: now.saturating_add(u64::from(period_ms)),
        }
    }

    pub const fn is_due(&self, now: u64) -> bool {
        now >= self.next_at
    }

    /// Move to the following firing
    ///
    /// Firings are scheduled from the previous slot, not from the time they
    /// were serviced, so a late poll catches up without drift.
    pub fn advance(&mut self) {
        self.next_at = self.next_at.saturating_add(u64::from(self.period_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline() {
        let d = Deadline::after(1000, 500);
        assert_eq!(d.at, 1500);
        assert!(!d.is_due(1499));
        assert!(d.is_due(1500));
    }

    #[test]
    fn test_interval_catch_up() {
        let mut i = Interval::starting(0, 100);
        assert!(!i.is_due(99));

        let mut fired = 0;
        while i.is_due(350) {
            fired += 1;
            i.advance();
        }
        assert_eq!(fired, 3);
        assert_eq!(i.next_at, 400);
    }

    #[test]
    fn test_interval_minimum_period() {
        let i = Interval::starting(10, 0);
        assert_eq!(i.period_ms, 1);
        assert_eq!(i.next_at, 11);
    }
}
