// LogPoller - core/schedule.rs
//
// Injectable time and the repeating tick schedule.
//
// Time is expressed as a `Duration` since an arbitrary clock origin so that
// `ManualClock` can be advanced deterministically in tests while
// `SystemClock` follows `Instant`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
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

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual time that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// A fixed-interval schedule: first tick due immediately on `arm`, then one
/// tick per interval measured from when the previous tick fired.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next_due: Option<Duration>,
}

impl TickSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Start the schedule; the first tick is due at `now`.
    pub fn arm(&mut self, now: Duration) {
        self.next_due = Some(now);
    }

    /// Stop the schedule; no tick is due until re-armed.
    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn is_due(&self, now: Duration) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Consume the due tick at `now`. Returns false if no tick was due.
    ///
    /// The next tick is scheduled a full interval after `now`, so
    /// consecutive ticks are never closer than the interval even when the
    /// driver wakes late.
    pub fn fire(&mut self, now: Duration) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.next_due = Some(now + self.interval);
        true
    }

    /// Time until the next tick (zero if overdue), or `None` when disarmed.
    pub fn time_until_due(&self, now: Duration) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_sub(now))
    }
}
