//! Fixed-period flush schedule.
//!
//! The registry does not own a timer.  The host drives time by calling
//! [`FlushSchedule::poll`] (through `ConfigRegistry::flush_due`) from
//! whatever loop it already runs; the schedule only answers "is a flush due
//! now?".
//!
//! ```text
//!  unarmed ──arm(now)──► armed(next_due = now + period)
//!                          │
//!            poll(t < next_due) → false
//!            poll(t ≥ next_due) → true, next_due += period
//! ```
//!
//! The schedule starts unarmed because the host's timer facility may only
//! become available some time after the registry is created.

use std::time::{Duration, Instant};

/// Period between automatic flushes of dirty configurations.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Tracks when the next periodic flush is due.
#[derive(Debug, Clone)]
pub struct FlushSchedule {
    period: Duration,
    next_due: Option<Instant>,
}

impl FlushSchedule {
    /// Creates an unarmed schedule with the given period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Starts the schedule; the first flush is due one period after `now`.
    ///
    /// Arming an already armed schedule keeps the existing deadline.  A
    /// period too long to be represented as an `Instant` leaves the schedule
    /// unarmed.
    pub fn arm(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = now.checked_add(self.period);
        }
    }

    /// Returns `true` when a flush is due at `now` and advances the deadline.
    ///
    /// The next deadline is one period after the one that fired.  If the host
    /// stalled past that too, only one flush is reported and the schedule
    /// restarts one period after `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = due
                    .checked_add(self.period)
                    .filter(|next| *next > now)
                    .or_else(|| now.checked_add(self.period));
                true
            }
            _ => false,
        }
    }
}

impl Default for FlushSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_INTERVAL)
    }
}
