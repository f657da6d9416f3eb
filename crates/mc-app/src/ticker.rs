//! Fixed-period tick sources.
//!
//! [`IntervalTicker`] sleeps until each deadline of a [`SampleClock`] anchored
//! at construction. [`ManualTicker`] never blocks and is used for host runs
//! that should go as fast as possible, and in tests.

use std::time::{Duration, Instant};

use mc_controls::{SampleClock, SampleConfig};

/// Blocks the loop thread until the next control tick is due.
pub trait Ticker {
    /// Wait for the next period boundary.
    ///
    /// Returns `false` if the boundary had already passed (an overrun).
    fn wait(&mut self) -> bool;
}

impl<T: Ticker + ?Sized> Ticker for &mut T {
    fn wait(&mut self) -> bool {
        (**self).wait()
    }
}

/// Deadline-based ticker on the monotonic clock.
#[derive(Debug)]
pub struct IntervalTicker {
    start: Instant,
    clock: SampleClock,
    missed: u64,
}

impl IntervalTicker {
    /// First deadline is one period from now.
    pub fn new(config: SampleConfig) -> Self {
        Self {
            start: Instant::now(),
            clock: SampleClock::new(config, 0.0),
            missed: 0,
        }
    }

    /// Deadlines skipped because a tick ran more than a whole period late.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self) -> bool {
        let now = self.now();
        if !self.clock.should_sample(now) {
            std::thread::sleep(Duration::from_secs_f64(self.clock.time_until_sample(now)));
            self.clock.advance();
            return true;
        }

        // Late: run now, and drop deadlines already in the past so the loop
        // does not burst to catch up.
        let late_s = now - self.clock.next_sample_time;
        self.clock.advance();
        while self.clock.should_sample(now) {
            self.clock.advance();
            self.missed += 1;
        }
        tracing::warn!(late_s, missed = self.missed, "control tick overrun");
        false
    }
}

/// Ticker that never blocks.
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    ticks: u64,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Ticker for ManualTicker {
    fn wait(&mut self) -> bool {
        self.ticks += 1;
        true
    }
}
