//! Actuator driver: regulator output to carrier duty.
//!
//! The regulator works on a percentage-like scale; the carrier wants integer
//! compare ticks. [`DutyMapping`] does the fixed linear conversion and
//! [`DutyActuator::set_duty`] clamps to the configured resolution before
//! committing, so an out-of-range request is never an error.

use mc_core::saturating_u16;
use mc_hal::{CarrierSetup, Mcpwm, RegisterAccess};
use serde::{Deserialize, Serialize};

use crate::error::ControlResult;

/// Fixed linear map from regulator output to compare ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyMapping {
    /// Ticks per unit of regulator output (80 maps 0..100 % onto 0..8000).
    pub ticks_per_unit: f64,
}

impl DutyMapping {
    pub fn new(ticks_per_unit: f64) -> Self {
        Self { ticks_per_unit }
    }

    /// Negative and NaN outputs map to 0; large ones saturate at `u16::MAX`.
    pub fn to_ticks(&self, output: f64) -> u16 {
        saturating_u16(output * self.ticks_per_unit)
    }
}

impl Default for DutyMapping {
    fn default() -> Self {
        Self {
            ticks_per_unit: 80.0,
        }
    }
}

/// Something that can hold a fixed-frequency carrier at a commanded duty.
pub trait DutyActuator {
    /// Set up the carrier. Repeating the same call is harmless.
    fn configure(&mut self, carrier_hz: u32, resolution_ticks: u16) -> ControlResult<()>;

    /// Clamp `ticks` to `[0, resolution]`, commit it, and return what was committed.
    ///
    /// The new duty takes effect at the next period boundary.
    fn set_duty(&mut self, ticks: u16) -> u16;

    /// Ticks per period; 0 until configured.
    fn resolution(&self) -> u16;

    /// Last committed duty in ticks.
    fn duty(&self) -> u16;
}

/// [`DutyActuator`] on the MCPWM0 carrier.
#[derive(Debug, Clone)]
pub struct PwmActuator<R> {
    pwm: Mcpwm<R>,
    timebase_hz: u32,
    resolution: u16,
    duty: u16,
}

impl<R: RegisterAccess> PwmActuator<R> {
    /// # Arguments
    ///
    /// * `pwm` - Peripheral driver
    /// * `timebase_hz` - Clock feeding the MCPWM prescaler (160 MHz on the reference board)
    pub fn new(pwm: Mcpwm<R>, timebase_hz: u32) -> Self {
        Self {
            pwm,
            timebase_hz,
            resolution: 0,
            duty: 0,
        }
    }

    pub fn pwm(&self) -> &Mcpwm<R> {
        &self.pwm
    }
}

impl<R: RegisterAccess> DutyActuator for PwmActuator<R> {
    fn configure(&mut self, carrier_hz: u32, resolution_ticks: u16) -> ControlResult<()> {
        let setup = CarrierSetup::solve(self.timebase_hz, carrier_hz, resolution_ticks)?;
        self.pwm.configure_carrier(setup, 0);
        self.resolution = resolution_ticks;
        self.duty = 0;
        Ok(())
    }

    fn set_duty(&mut self, ticks: u16) -> u16 {
        let ticks = ticks.min(self.resolution);
        self.pwm.commit_compare(ticks);
        self.duty = ticks;
        ticks
    }

    fn resolution(&self) -> u16 {
        self.resolution
    }

    fn duty(&self) -> u16 {
        self.duty
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use mc_hal::{FakeRegisters, McpwmLayout};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn committed_duty_never_exceeds_resolution(ticks in any::<u16>()) {
            let regs = FakeRegisters::new();
            let mut act = PwmActuator::new(Mcpwm::new(regs, McpwmLayout::default()), 160_000_000);
            act.configure(20_000, 8000).unwrap();

            let committed = act.set_duty(ticks);
            prop_assert_eq!(committed, ticks.min(8000));
            prop_assert_eq!(act.pwm().compare(), committed);
        }
    }
}
