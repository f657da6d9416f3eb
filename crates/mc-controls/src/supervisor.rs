//! Supervisory state machine.
//!
//! The supervisor owns the actuator and decides, once per control tick, what
//! the regulator and actuator do in the current [`OperatingMode`]:
//!
//! | Mode | Per-tick action |
//! |---|---|
//! | Initializing | configure carrier, neutral duty, reset regulator, enter Running and run it once |
//! | Stopped | duty 0 |
//! | Running | regulator output to duty; measurement outside the envelope faults |
//! | Faulted | duty 0 until re-armed through Initializing |
//!
//! Disallowed mode requests are logged and ignored.

use serde::{Deserialize, Serialize};

use crate::actuator::{DutyActuator, DutyMapping};
use crate::mode::{OperatingMode, Transition, TransitionRule};
use crate::pid::Pid;

/// Range of plausible measurements. Anything outside, including NaN, is a fault.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidEnvelope {
    pub min_hz: f64,
    pub max_hz: f64,
}

impl ValidEnvelope {
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    pub fn contains(&self, measurement_hz: f64) -> bool {
        measurement_hz >= self.min_hz && measurement_hz <= self.max_hz
    }
}

impl Default for ValidEnvelope {
    fn default() -> Self {
        Self {
            min_hz: 0.0,
            max_hz: 2000.0,
        }
    }
}

/// Fixed parameters the supervisor applies to its actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupervisorConfig {
    pub carrier_hz: u32,
    pub resolution_ticks: u16,
    /// Duty held while arming.
    pub neutral_ticks: u16,
    pub mapping: DutyMapping,
    pub envelope: ValidEnvelope,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            carrier_hz: 20_000,
            resolution_ticks: 8000,
            neutral_ticks: 4000,
            mapping: DutyMapping::default(),
            envelope: ValidEnvelope::default(),
        }
    }
}

/// What one [`Supervisor::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Mode after the step.
    pub mode: OperatingMode,
    /// Regulator output, if the regulator ran this tick.
    pub output: Option<f64>,
    /// Duty committed to the actuator.
    pub duty_ticks: u16,
}

#[derive(Debug)]
pub struct Supervisor<A> {
    actuator: A,
    config: SupervisorConfig,
    mode: OperatingMode,
}

impl<A: DutyActuator> Supervisor<A> {
    /// Starts in [`OperatingMode::Initializing`]; nothing touches the actuator
    /// until the first [`step`](Self::step).
    pub fn new(actuator: A, config: SupervisorConfig) -> Self {
        Self {
            actuator,
            config,
            mode: OperatingMode::Initializing,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Ask for a mode change. Never fails; a disallowed request is logged and
    /// reported as [`Transition::Rejected`].
    pub fn request(&mut self, target: OperatingMode) -> Transition {
        let from = self.mode;
        match from.rule_to(target) {
            TransitionRule::Allow => {
                self.mode = target;
                if target == OperatingMode::Faulted {
                    tracing::error!(%from, "entering Faulted");
                } else {
                    tracing::info!(%from, to = %target, "mode transition");
                }
                Transition::Changed { from, to: target }
            }
            TransitionRule::NoOp => {
                tracing::debug!(mode = %from, "transition request is a no-op");
                Transition::Unchanged(from)
            }
            TransitionRule::Reject => {
                tracing::warn!(%from, requested = %target, "transition rejected");
                Transition::Rejected {
                    from,
                    requested: target,
                }
            }
        }
    }

    /// Run one control tick in the current mode.
    pub fn step(&mut self, pid: &mut Pid, setpoint_hz: f64, measurement_hz: f64) -> StepReport {
        let report = match self.mode {
            OperatingMode::Initializing => self.arm(pid, setpoint_hz, measurement_hz),
            OperatingMode::Running => self.regulate(pid, setpoint_hz, measurement_hz),
            OperatingMode::Stopped | OperatingMode::Faulted => StepReport {
                mode: self.mode,
                output: None,
                duty_ticks: self.actuator.set_duty(0),
            },
        };
        tracing::debug!(
            mode = %report.mode,
            measurement_hz,
            output = report.output,
            duty_ticks = report.duty_ticks,
            "tick"
        );
        report
    }

    fn arm(&mut self, pid: &mut Pid, setpoint_hz: f64, measurement_hz: f64) -> StepReport {
        let SupervisorConfig {
            carrier_hz,
            resolution_ticks,
            neutral_ticks,
            ..
        } = self.config;

        if let Err(err) = self.actuator.configure(carrier_hz, resolution_ticks) {
            tracing::error!(%err, carrier_hz, resolution_ticks, "carrier configuration failed");
            self.request(OperatingMode::Faulted);
            return StepReport {
                mode: self.mode,
                output: None,
                duty_ticks: self.actuator.duty(),
            };
        }
        self.actuator.set_duty(neutral_ticks);
        pid.reset();
        self.request(OperatingMode::Running);

        // One re-dispatch only: the regulate handler never re-enters `step`.
        self.regulate(pid, setpoint_hz, measurement_hz)
    }

    fn regulate(&mut self, pid: &mut Pid, setpoint_hz: f64, measurement_hz: f64) -> StepReport {
        let output = pid.update(setpoint_hz, measurement_hz);
        let duty_ticks = self.actuator.set_duty(self.config.mapping.to_ticks(output));

        if !self.config.envelope.contains(measurement_hz) {
            tracing::error!(
                measurement_hz,
                min_hz = self.config.envelope.min_hz,
                max_hz = self.config.envelope.max_hz,
                "measurement outside valid envelope"
            );
            self.request(OperatingMode::Faulted);
        }

        StepReport {
            mode: self.mode,
            output: Some(output),
            duty_ticks,
        }
    }
}
