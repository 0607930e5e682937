use std::time::{Duration, Instant};

/// Whether the scheduler is currently producing ticks.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SchedulerState {
    Running,
    Suspended,
    /// Final; a cancelled scheduler never fires again.
    Cancelled,
}

/// Fixed-cadence tick source.
///
/// The caller polls with the current time; the scheduler reports at most one
/// due tick per poll and measures the next one from the moment it fired.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    last_tick: Instant,
    state: SchedulerState,
}

impl TickScheduler {
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_tick: now,
            state: SchedulerState::Running,
        }
    }

    /// Returns true and restarts the interval when a tick is due at `now`.
    pub fn is_due(&mut self, now: Instant) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }
        if now.saturating_duration_since(self.last_tick) < self.interval {
            return false;
        }
        self.last_tick = now;
        true
    }

    /// Returns how long to wait from `now` until the next tick is due.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_tick))
    }

    /// Stops producing ticks until [`TickScheduler::resume`] is called.
    pub fn suspend(&mut self) {
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Suspended;
        }
    }

    /// Resumes a suspended scheduler; the next tick is a full interval away.
    pub fn resume(&mut self, now: Instant) {
        if self.state == SchedulerState::Suspended {
            self.state = SchedulerState::Running;
            self.last_tick = now;
        }
    }

    pub fn cancel(&mut self) {
        self.state = SchedulerState::Cancelled;
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }
}
