//! Feedback sources.
//!
//! A feedback source produces one speed measurement per control tick. The
//! concrete source is picked once when the loop is built; the control core
//! only sees [`FeedbackSource`].

use std::sync::Arc;

use mc_core::{Frequency, ensure_finite, hz};
use mc_hal::{MicrosClock, PulseCounter};

use crate::error::{ControlError, ControlResult};

/// Produces the process measurement once per tick.
pub trait FeedbackSource {
    /// Start a fresh measurement window. Called once before the first sample.
    fn init(&mut self) {}

    /// Measure the current speed.
    fn sample(&mut self) -> Frequency;
}

impl<F: FeedbackSource + ?Sized> FeedbackSource for Box<F> {
    fn init(&mut self) {
        (**self).init()
    }

    fn sample(&mut self) -> Frequency {
        (**self).sample()
    }
}

/// Deterministic sawtooth ramp for bench testing without a motor.
///
/// Each call adds `step_hz`; once the value passes `high_hz` it drops back to
/// `low_hz`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRamp {
    start_hz: f64,
    step_hz: f64,
    low_hz: f64,
    high_hz: f64,
    current_hz: f64,
}

impl SyntheticRamp {
    pub fn new(start_hz: f64, step_hz: f64, low_hz: f64, high_hz: f64) -> ControlResult<Self> {
        ensure_finite(start_hz, "ramp start_hz")?;
        ensure_finite(low_hz, "ramp low_hz")?;
        ensure_finite(high_hz, "ramp high_hz")?;
        if low_hz > high_hz {
            return Err(ControlError::InvalidArg {
                what: "ramp low_hz must not exceed high_hz",
            });
        }
        if start_hz < low_hz || start_hz > high_hz {
            return Err(ControlError::InvalidArg {
                what: "ramp start_hz must lie within [low_hz, high_hz]",
            });
        }
        if !step_hz.is_finite() || step_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ramp step_hz must be positive",
            });
        }
        Ok(Self {
            start_hz,
            step_hz,
            low_hz,
            high_hz,
            current_hz: start_hz,
        })
    }

    /// Return to the initial value; the next samples repeat the first run.
    pub fn restart(&mut self) {
        self.current_hz = self.start_hz;
    }
}

impl Default for SyntheticRamp {
    fn default() -> Self {
        Self {
            start_hz: 400.0,
            step_hz: 0.5,
            low_hz: 400.0,
            high_hz: 1000.0,
            current_hz: 400.0,
        }
    }
}

impl FeedbackSource for SyntheticRamp {
    fn init(&mut self) {
        self.restart();
    }

    fn sample(&mut self) -> Frequency {
        let mut next = self.current_hz + self.step_hz;
        if next > self.high_hz {
            next = self.low_hz;
        }
        self.current_hz = next;
        tracing::trace!(speed_hz = next, "synthetic speed");
        hz(next)
    }
}

/// Speed from an interrupt-driven quadrature pulse counter.
///
/// Hz = (pulses / pulses_per_revolution) * (1e6 / elapsed_us), where the
/// window is the time since the previous sample.
pub struct EncoderFeedback<C> {
    counter: Arc<PulseCounter>,
    clock: C,
    pulses_per_revolution: f64,
    last_us: u64,
}

impl<C: MicrosClock> EncoderFeedback<C> {
    /// # Arguments
    ///
    /// * `counter` - Counter also held by the edge interrupt
    /// * `clock` - Monotonic microsecond clock
    /// * `pulses_per_revolution` - Encoder resolution (must be positive)
    pub fn new(counter: Arc<PulseCounter>, clock: C, pulses_per_revolution: f64) -> ControlResult<Self> {
        if !pulses_per_revolution.is_finite() || pulses_per_revolution <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "pulses_per_revolution must be positive",
            });
        }
        let last_us = clock.now_us();
        Ok(Self {
            counter,
            clock,
            pulses_per_revolution,
            last_us,
        })
    }

    pub fn counter(&self) -> &Arc<PulseCounter> {
        &self.counter
    }
}

impl<C: MicrosClock> FeedbackSource for EncoderFeedback<C> {
    fn init(&mut self) {
        self.counter.take();
        self.last_us = self.clock.now_us();
    }

    fn sample(&mut self) -> Frequency {
        let now = self.clock.now_us();
        let pulses = self.counter.take();
        let elapsed_us = now.saturating_sub(self.last_us);
        self.last_us = now;

        if elapsed_us == 0 {
            return hz(0.0);
        }
        let speed =
            (f64::from(pulses) / self.pulses_per_revolution) * (1_000_000.0 / elapsed_us as f64);
        tracing::trace!(speed_hz = speed, pulses, elapsed_us, "encoder speed");
        hz(speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::as_hz;
    use mc_hal::{Direction, FakeClock};

    #[test]
    fn ramp_matches_reference_sequence() {
        let mut ramp = SyntheticRamp::default();
        assert_eq!(as_hz(ramp.sample()), 400.5);
        assert_eq!(as_hz(ramp.sample()), 401.0);
    }

    #[test]
    fn ramp_wraps_into_band() {
        let mut ramp = SyntheticRamp::new(9.0, 1.0, 5.0, 10.0).unwrap();
        let seq: Vec<f64> = (0..4).map(|_| as_hz(ramp.sample())).collect();
        assert_eq!(seq, vec![10.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn ramp_restart_is_reproducible() {
        let mut ramp = SyntheticRamp::new(0.0, 2.5, 0.0, 20.0).unwrap();
        let first: Vec<f64> = (0..12).map(|_| as_hz(ramp.sample())).collect();
        ramp.restart();
        let second: Vec<f64> = (0..12).map(|_| as_hz(ramp.sample())).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ramp_rejects_bad_band() {
        assert!(SyntheticRamp::new(0.0, 1.0, 10.0, 5.0).is_err());
        assert!(SyntheticRamp::new(0.0, 0.0, 0.0, 5.0).is_err());
        assert!(matches!(
            SyntheticRamp::new(f64::NAN, 1.0, 0.0, 5.0),
            Err(ControlError::Core(_))
        ));
    }

    #[test]
    fn ramp_rejects_start_outside_band() {
        assert!(matches!(
            SyntheticRamp::new(1.0, 1.0, 5.0, 10.0),
            Err(ControlError::InvalidArg { .. })
        ));
        assert!(SyntheticRamp::new(10.5, 1.0, 5.0, 10.0).is_err());
        // Both band edges are valid starts
        assert!(SyntheticRamp::new(5.0, 1.0, 5.0, 10.0).is_ok());
        assert!(SyntheticRamp::new(10.0, 1.0, 5.0, 10.0).is_ok());
    }

    #[test]
    fn encoder_converts_pulses_to_hz() {
        let clock = FakeClock::new();
        let counter = Arc::new(PulseCounter::new());
        let mut enc = EncoderFeedback::new(Arc::clone(&counter), clock.clone(), 1000.0).unwrap();

        for _ in 0..500 {
            counter.record_edge(Direction::Forward);
        }
        clock.advance(1_000_000);
        assert!((as_hz(enc.sample()) - 0.5).abs() < 1e-12);

        // 20 pulses in 10 ms at 1000 PPR = 2 rev/s
        for _ in 0..20 {
            counter.record_edge(Direction::Forward);
        }
        clock.advance(10_000);
        assert!((as_hz(enc.sample()) - 2.0).abs() < 1e-12);
        assert_eq!(counter.peek(), 0);
    }

    #[test]
    fn encoder_zero_elapsed_is_zero_hz() {
        let clock = FakeClock::new();
        let counter = Arc::new(PulseCounter::new());
        let mut enc = EncoderFeedback::new(Arc::clone(&counter), clock, 1000.0).unwrap();
        counter.record_edge(Direction::Forward);
        assert_eq!(as_hz(enc.sample()), 0.0);
    }

    #[test]
    fn encoder_reverse_rotation_is_negative() {
        let clock = FakeClock::new();
        let counter = Arc::new(PulseCounter::new());
        let mut enc = EncoderFeedback::new(Arc::clone(&counter), clock.clone(), 100.0).unwrap();
        for _ in 0..10 {
            counter.record_edge(Direction::Reverse);
        }
        clock.advance(100_000);
        assert!(as_hz(enc.sample()) < 0.0);
    }

    #[test]
    fn encoder_init_discards_stale_pulses() {
        let clock = FakeClock::new();
        let counter = Arc::new(PulseCounter::new());
        let mut enc = EncoderFeedback::new(Arc::clone(&counter), clock.clone(), 1000.0).unwrap();
        for _ in 0..50 {
            counter.record_edge(Direction::Forward);
        }
        clock.advance(5_000);
        enc.init();
        clock.advance(1_000);
        assert_eq!(as_hz(enc.sample()), 0.0);
    }

    #[test]
    fn encoder_rejects_zero_ppr() {
        let counter = Arc::new(PulseCounter::new());
        assert!(EncoderFeedback::new(counter, FakeClock::new(), 0.0).is_err());
    }
}
