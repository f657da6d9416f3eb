//! Lightweight loop timing utilities.
//!
//! The control loop records how long each tick spent computing and whether the
//! fixed-period deadline was missed. Nothing here allocates, so it is safe to
//! call from the tick path.

use std::time::{Duration, Instant};

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return the elapsed time.
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

/// Accumulated statistics over control ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    count: u64,
    total_ns: u64,
    max_ns: u64,
    overruns: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            count: 0,
            total_ns: 0,
            max_ns: 0,
            overruns: 0,
        }
    }

    /// Record one tick's compute time.
    pub fn record(&mut self, busy: Duration) {
        let nanos = u64::try_from(busy.as_nanos()).unwrap_or(u64::MAX);
        self.total_ns = self.total_ns.saturating_add(nanos);
        self.max_ns = self.max_ns.max(nanos);
        self.count += 1;
    }

    /// Record a missed deadline.
    pub fn record_overrun(&mut self) {
        self.overruns += 1;
    }

    /// Number of ticks recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Total compute time (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns as f64 / 1e9
    }

    /// Average compute time per tick (in seconds).
    pub fn average_seconds(&self) -> f64 {
        if self.count > 0 {
            self.total_seconds() / self.count as f64
        } else {
            0.0
        }
    }

    /// Worst-case compute time (in seconds).
    pub fn max_seconds(&self) -> f64 {
        self.max_ns as f64 / 1e9
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_stats_accumulate() {
        let mut stats = TickStats::new();
        stats.record(Duration::from_micros(100));
        stats.record(Duration::from_micros(300));
        stats.record_overrun();

        assert_eq!(stats.count(), 2);
        assert_eq!(stats.overruns(), 1);
        assert!((stats.average_seconds() - 200e-6).abs() < 1e-12);
        assert!((stats.max_seconds() - 300e-6).abs() < 1e-12);

        stats.reset();
        assert_eq!(stats, TickStats::default());
    }

    #[test]
    fn empty_stats_average_is_zero() {
        assert_eq!(TickStats::new().average_seconds(), 0.0);
    }

    #[test]
    fn timer_measures_something() {
        let timer = Timer::start("tick");
        assert_eq!(timer.label(), "tick");
        let _ = timer.stop();
    }
}
