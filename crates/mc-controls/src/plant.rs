//! Simulated motor for closing the loop on a host.
//!
//! The plant reads back the duty the actuator committed to the MCPWM compare
//! register. Each sample the speed moves toward `duty * max_speed_hz` at
//! `(target - speed) / tau_s`, with the acceleration capped at
//! `max_accel_hz_per_s` and the speed held inside `[0, max_speed_hz]`.
//!
//! ```
//! use mc_controls::{FeedbackSource, MotorParams, MotorPlant};
//! use mc_hal::{CarrierSetup, FakeRegisters, Mcpwm, McpwmLayout};
//!
//! let regs = FakeRegisters::new();
//! let pwm = Mcpwm::new(regs.clone(), McpwmLayout::default());
//! // 25 % duty
//! pwm.configure_carrier(CarrierSetup::solve(160_000_000, 20_000, 8000).unwrap(), 2000);
//!
//! let view = Mcpwm::new(regs, McpwmLayout::default());
//! let mut plant = MotorPlant::new(view, MotorParams::default(), 0.01).unwrap();
//! for _ in 0..300 {
//!     plant.sample();
//! }
//! assert!((plant.speed_hz() - 500.0).abs() < 1.0);
//! ```

use mc_core::{Frequency, hz};
use mc_hal::{Mcpwm, RegisterAccess};

use crate::error::{ControlError, ControlResult};
use crate::feedback::FeedbackSource;

/// Physical response of the simulated motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorParams {
    /// Speed time constant (s).
    pub tau_s: f64,
    /// Speed reached at 100 % duty.
    pub max_speed_hz: f64,
    pub max_accel_hz_per_s: f64,
}

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            tau_s: 0.1,
            max_speed_hz: 2000.0,
            max_accel_hz_per_s: 5000.0,
        }
    }
}

/// Motor model fed by the MCPWM compare register.
#[derive(Debug, Clone)]
pub struct MotorPlant<R> {
    pwm: Mcpwm<R>,
    params: MotorParams,
    /// Time advanced per sample (the control period).
    dt: f64,
    speed_hz: f64,
}

impl<R: RegisterAccess> MotorPlant<R> {
    /// `pwm` must view the same registers the actuator writes.
    pub fn new(pwm: Mcpwm<R>, params: MotorParams, dt: f64) -> ControlResult<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(params.tau_s) {
            return Err(ControlError::InvalidArg {
                what: "plant tau_s must be positive",
            });
        }
        if !positive(params.max_speed_hz) {
            return Err(ControlError::InvalidArg {
                what: "plant max_speed_hz must be positive",
            });
        }
        if !positive(params.max_accel_hz_per_s) {
            return Err(ControlError::InvalidArg {
                what: "plant max_accel_hz_per_s must be positive",
            });
        }
        if !positive(dt) {
            return Err(ControlError::InvalidArg {
                what: "plant dt must be positive",
            });
        }
        Ok(Self {
            pwm,
            params,
            dt,
            speed_hz: 0.0,
        })
    }

    /// Duty fraction currently on the carrier, 0 if the carrier is not running.
    pub fn duty_fraction(&self) -> f64 {
        let period = self.pwm.period_ticks();
        if period == 0 {
            return 0.0;
        }
        (f64::from(self.pwm.compare()) / f64::from(period)).min(1.0)
    }

    pub fn speed_hz(&self) -> f64 {
        self.speed_hz
    }

    pub fn params(&self) -> MotorParams {
        self.params
    }
}

impl<R: RegisterAccess> FeedbackSource for MotorPlant<R> {
    fn init(&mut self) {
        self.speed_hz = 0.0;
    }

    fn sample(&mut self) -> Frequency {
        let MotorParams {
            tau_s,
            max_speed_hz,
            max_accel_hz_per_s,
        } = self.params;

        let target_hz = self.duty_fraction() * max_speed_hz;
        let accel =
            ((target_hz - self.speed_hz) / tau_s).clamp(-max_accel_hz_per_s, max_accel_hz_per_s);
        self.speed_hz = (self.speed_hz + accel * self.dt).clamp(0.0, max_speed_hz);

        tracing::trace!(target_hz, speed_hz = self.speed_hz, "plant speed");
        hz(self.speed_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::as_hz;
    use mc_hal::{CarrierSetup, FakeRegisters, McpwmLayout};

    /// Plant watching a carrier running at `compare` / 8000.
    fn plant_at(compare: u16, params: MotorParams) -> MotorPlant<FakeRegisters> {
        let regs = FakeRegisters::new();
        let pwm = Mcpwm::new(regs.clone(), McpwmLayout::default());
        pwm.configure_carrier(CarrierSetup::solve(160_000_000, 20_000, 8000).unwrap(), compare);
        MotorPlant::new(Mcpwm::new(regs, McpwmLayout::default()), params, 0.01).unwrap()
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let pwm = || Mcpwm::new(FakeRegisters::new(), McpwmLayout::default());
        let bad = [
            MotorParams {
                tau_s: 0.0,
                ..MotorParams::default()
            },
            MotorParams {
                max_speed_hz: -1.0,
                ..MotorParams::default()
            },
            MotorParams {
                max_accel_hz_per_s: f64::NAN,
                ..MotorParams::default()
            },
        ];
        for params in bad {
            assert!(MotorPlant::new(pwm(), params, 0.01).is_err());
        }
        assert!(MotorPlant::new(pwm(), MotorParams::default(), 0.0).is_err());
    }

    #[test]
    fn idles_without_carrier() {
        let pwm = Mcpwm::new(FakeRegisters::new(), McpwmLayout::default());
        let mut plant = MotorPlant::new(pwm, MotorParams::default(), 0.01).unwrap();
        assert_eq!(plant.duty_fraction(), 0.0);
        assert_eq!(as_hz(plant.sample()), 0.0);
    }

    #[test]
    fn acceleration_is_capped() {
        let params = MotorParams {
            tau_s: 0.01,
            max_speed_hz: 2000.0,
            max_accel_hz_per_s: 100.0,
        };
        let mut plant = plant_at(4000, params);
        // Unlimited this would jump straight to 1000 Hz
        assert!((as_hz(plant.sample()) - 1.0).abs() < 1e-9);
        assert!((as_hz(plant.sample()) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn follows_committed_duty() {
        let params = MotorParams {
            tau_s: 0.05,
            max_accel_hz_per_s: 1e5,
            ..MotorParams::default()
        };
        let mut plant = plant_at(4000, params);
        assert!((plant.duty_fraction() - 0.5).abs() < 1e-12);

        let mut last = 0.0;
        for _ in 0..200 {
            last = as_hz(plant.sample());
        }
        assert!((last - 1000.0).abs() < 1.0);
    }

    #[test]
    fn init_stops_the_rotor() {
        let mut plant = plant_at(8000, MotorParams::default());
        for _ in 0..10 {
            plant.sample();
        }
        assert!(plant.speed_hz() > 0.0);
        plant.init();
        assert_eq!(plant.speed_hz(), 0.0);
    }
}
