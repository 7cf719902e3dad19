use std::time::{Duration, Instant};

/// Periodic wake-up that the frame loop polls without blocking.
#[derive(Clone, Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
    immediate: bool,
}

impl Ticker {
    /// Fires `rate` times per second, starting one period after `now`.
    pub fn new(rate: u32, now: Instant) -> Self {
        let period = period_for(rate);
        Ticker { period, next: now + period, immediate: false }
    }

    /// Replaces the period. The next tick is one new period from `now`.
    pub fn set_rate(&mut self, rate: u32, now: Instant) {
        self.period = period_for(rate);
        self.next = now + self.period;
    }

    /// Makes the next poll fire regardless of the deadline.
    pub fn fire_now(&mut self) {
        self.immediate = true;
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if self.immediate {
            self.immediate = false;
            self.next = now + self.period;
            return true;
        }

        if now < self.next {
            return false;
        }

        self.next += self.period;
        // Fell more than a period behind, don't try to catch up
        if self.next <= now {
            self.next = now + self.period;
        }

        true
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

fn period_for(rate: u32) -> Duration {
    Duration::from_secs(1) / rate.max(1)
}
