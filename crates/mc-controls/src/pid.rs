//! Fixed-interval PID regulator.
//!
//! The regulator runs at a fixed sample interval `dt` chosen at construction;
//! callers invoke [`Pid::update`] exactly once per control tick.
//!
//! The integral accumulates on every update, including while the output is
//! saturated. Sustained saturation therefore winds the integral up and
//! recovery overshoots; callers that re-arm the loop call [`Pid::reset`].
//!
//! Every finite input produces an output inside the configured bounds. A
//! step that would push the integral past `f64::MAX` leaves it where it was,
//! and a zero gain contributes nothing even when its term has overflowed.

use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
}

/// PID regulator with output clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    gains: PidGains,
    /// Sample interval (seconds).
    dt: f64,
    /// Accumulated error integral (error-seconds).
    integral: f64,
    prev_error: f64,
    out_min: f64,
    out_max: f64,
}

impl Pid {
    /// Create a new regulator with zeroed history.
    ///
    /// # Arguments
    ///
    /// * `kp`, `ki`, `kd` - Gains
    /// * `dt` - Sample interval in seconds; must be positive (not checked here)
    /// * `out_min`, `out_max` - Output bounds, `out_min <= out_max`
    pub fn new(kp: f64, ki: f64, kd: f64, dt: f64, out_min: f64, out_max: f64) -> Self {
        Self::from_gains(PidGains { kp, ki, kd }, dt, out_min, out_max)
    }

    pub fn from_gains(gains: PidGains, dt: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            gains,
            dt,
            integral: 0.0,
            prev_error: 0.0,
            out_min,
            out_max,
        }
    }

    /// Clear integral and derivative history. Gains and bounds are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// Compute the next output.
    ///
    /// `setpoint` and `measurement` share a unit (Hz for the speed loop).
    /// Returns a value in [`out_min`, `out_max`].
    pub fn update(&mut self, setpoint: f64, measurement: f64) -> f64 {
        let error = setpoint - measurement;

        let integral = self.integral + error * self.dt;
        if integral.is_finite() {
            self.integral = integral;
        }

        let derivative = if self.dt > 0.0 {
            (error - self.prev_error) / self.dt
        } else {
            0.0
        };

        let raw = term(self.gains.kp, error)
            + term(self.gains.ki, self.integral)
            + term(self.gains.kd, derivative);
        self.prev_error = error;

        // Not f64::clamp: that panics on inverted bounds
        if raw.is_nan() {
            self.out_min
        } else if raw > self.out_max {
            self.out_max
        } else if raw < self.out_min {
            self.out_min
        } else {
            raw
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }

    /// Output bounds as `(out_min, out_max)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.out_min, self.out_max)
    }
}

/// `gain * value`, or zero for a zero gain so `0 * inf` cannot turn into NaN.
fn term(gain: f64, value: f64) -> f64 {
    if gain == 0.0 { 0.0 } else { gain * value }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn gains() -> impl Strategy<Value = (f64, f64, f64)> {
        (0.0_f64..10.0, 0.0_f64..10.0, 0.0_f64..1.0)
    }

    fn any_finite() -> impl Strategy<Value = f64> {
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
    }

    proptest! {
        #[test]
        fn output_stays_in_bounds(
            (kp, ki, kd) in gains(),
            dt in 1e-4_f64..1.0,
            lo in -100.0_f64..0.0,
            span in 0.0_f64..200.0,
            inputs in prop::collection::vec((any_finite(), any_finite()), 1..50),
        ) {
            let hi = lo + span;
            let mut pid = Pid::new(kp, ki, kd, dt, lo, hi);
            for (sp, pv) in inputs {
                let out = pid.update(sp, pv);
                prop_assert!(out >= lo && out <= hi, "output {} outside [{}, {}]", out, lo, hi);
                prop_assert!(pid.integral().is_finite());
            }
        }

        #[test]
        fn first_update_after_reset_ignores_history(
            (kp, ki, kd) in gains(),
            dt in 1e-4_f64..1.0,
            history in prop::collection::vec((-1e4_f64..1e4, -1e4_f64..1e4), 0..20),
            sp in -1e4_f64..1e4,
            pv in -1e4_f64..1e4,
        ) {
            let mut fresh = Pid::new(kp, ki, kd, dt, -1e3, 1e3);
            let mut used = fresh.clone();
            for (h_sp, h_pv) in history {
                used.update(h_sp, h_pv);
            }
            used.reset();

            prop_assert_eq!(used.update(sp, pv), fresh.update(sp, pv));
        }
    }
}
