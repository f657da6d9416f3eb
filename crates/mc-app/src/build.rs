//! Assemble a runnable controller from a configuration.

use std::sync::Arc;

use mc_config::{BackendKind, ControllerConfig, FeedbackDef, HardwareDef};
use mc_controls::{
    DutyMapping, EncoderFeedback, FeedbackSource, MotorParams, MotorPlant, Pid, PidGains,
    PwmActuator, SampleConfig, Supervisor, SupervisorConfig, SyntheticRamp, ValidEnvelope,
};
use mc_hal::{
    FakeRegisters, Mcpwm, McpwmLayout, MonotonicClock, PulseCounter, RegisterBackend,
    SystemClockLayout, cpu_clock_hz, set_cpu_clock_240mhz,
};

use crate::control_loop::ControlLoop;
use crate::error::{AppError, AppResult};
use crate::schedule::Schedule;

/// Control loop with the feedback variant picked at runtime.
pub type SystemLoop = ControlLoop<Box<dyn FeedbackSource>, PwmActuator<RegisterBackend>>;

pub struct BuiltSystem {
    pub control: SystemLoop,
    /// Register backend shared by the actuator and, for the plant, the feedback.
    pub registers: RegisterBackend,
    /// Counter the encoder edge interrupt must feed, when encoder feedback is configured.
    pub pulse_counter: Option<Arc<PulseCounter>>,
}

impl std::fmt::Debug for BuiltSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltSystem")
            .field("mode", &self.control.mode())
            .field("registers", &self.registers)
            .field("pulse_counter", &self.pulse_counter)
            .finish()
    }
}

/// Build on a fresh in-memory register file.
///
/// The MMIO backend needs a register handle created on target; use
/// [`build_system_with`] for that.
pub fn build_system(config: &ControllerConfig) -> AppResult<BuiltSystem> {
    match config.hardware.backend {
        BackendKind::Fake => build_system_with(config, RegisterBackend::Fake(FakeRegisters::new())),
        BackendKind::Mmio => Err(AppError::Unsupported {
            message: "mmio backend needs registers constructed on target; call build_system_with"
                .to_string(),
        }),
    }
}

pub fn build_system_with(
    config: &ControllerConfig,
    registers: RegisterBackend,
) -> AppResult<BuiltSystem> {
    mc_config::validate_config(config)?;

    let hw = &config.hardware;
    if hw.configure_clock {
        let layout = SystemClockLayout {
            system_base: hw.system_base,
        };
        set_cpu_clock_240mhz(&registers, layout);
        tracing::debug!(cpu_hz = cpu_clock_hz(&registers, layout), "clock configured");
    }

    let layout = mcpwm_layout(hw);
    let actuator = PwmActuator::new(
        Mcpwm::new(registers.clone(), layout),
        config.actuator.timebase_hz,
    );

    let sample = SampleConfig::new(config.control.period_s)?;
    let (feedback, pulse_counter) = build_feedback(config, &registers, layout)?;

    let pid = Pid::from_gains(
        PidGains {
            kp: config.pid.kp,
            ki: config.pid.ki,
            kd: config.pid.kd,
        },
        sample.dt,
        config.pid.out_min,
        config.pid.out_max,
    );

    let supervisor = Supervisor::new(
        actuator,
        SupervisorConfig {
            carrier_hz: config.actuator.carrier_hz,
            resolution_ticks: config.actuator.resolution_ticks,
            neutral_ticks: config.actuator.neutral_ticks,
            mapping: DutyMapping::new(config.actuator.duty_scale),
            envelope: ValidEnvelope::new(config.envelope.min_hz, config.envelope.max_hz),
        },
    );

    let control = ControlLoop::new(feedback, pid, supervisor, sample, config.control.setpoint_hz)
        .with_schedule(Schedule::from_defs(&config.schedule))
        .with_status_every(config.control.status_every_ticks);

    tracing::info!(
        name = %config.name,
        period_s = sample.dt,
        setpoint_hz = config.control.setpoint_hz,
        "controller assembled"
    );

    Ok(BuiltSystem {
        control,
        registers,
        pulse_counter,
    })
}

fn mcpwm_layout(hw: &HardwareDef) -> McpwmLayout {
    McpwmLayout {
        mcpwm_base: hw.mcpwm_base,
        gpio_base: hw.gpio_base,
        gpio_matrix_base: hw.gpio_matrix_base,
        output_gpio: hw.output_gpio,
        ..McpwmLayout::default()
    }
}

type FeedbackParts = (Box<dyn FeedbackSource>, Option<Arc<PulseCounter>>);

fn build_feedback(
    config: &ControllerConfig,
    registers: &RegisterBackend,
    layout: McpwmLayout,
) -> AppResult<FeedbackParts> {
    match config.feedback {
        FeedbackDef::SyntheticRamp {
            start_hz,
            step_hz,
            low_hz,
            high_hz,
        } => {
            let ramp = SyntheticRamp::new(start_hz, step_hz, low_hz, high_hz)?;
            Ok((Box::new(ramp), None))
        }
        FeedbackDef::Encoder {
            pulses_per_revolution,
        } => {
            let counter = Arc::new(PulseCounter::new());
            let encoder = EncoderFeedback::new(
                Arc::clone(&counter),
                MonotonicClock::new(),
                pulses_per_revolution,
            )?;
            Ok((Box::new(encoder), Some(counter)))
        }
        FeedbackDef::Plant {
            tau_s,
            max_speed_hz,
            max_accel_hz_per_s,
        } => {
            let plant = MotorPlant::new(
                Mcpwm::new(registers.clone(), layout),
                MotorParams {
                    tau_s,
                    max_speed_hz,
                    max_accel_hz_per_s,
                },
                config.control.period_s,
            )?;
            Ok((Box::new(plant), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::ManualTicker;
    use mc_controls::OperatingMode;

    #[test]
    fn default_config_builds_and_arms() {
        let mut system = build_system(&ControllerConfig::default()).unwrap();
        assert!(system.pulse_counter.is_none());

        let record = system.control.tick();
        assert_eq!(record.mode, OperatingMode::Running);
        assert_eq!(
            cpu_clock_hz(&system.registers, SystemClockLayout::default()),
            Some(240_000_000)
        );
    }

    #[test]
    fn default_backend_keeps_no_write_history() {
        let mut system = build_system(&ControllerConfig::default()).unwrap();
        system.control.run_for(200, ManualTicker::new());

        let RegisterBackend::Fake(regs) = &system.registers else {
            panic!("default backend is the in-memory register file");
        };
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn clock_setup_can_be_skipped() {
        let mut config = ControllerConfig::default();
        config.hardware.configure_clock = false;
        let system = build_system(&config).unwrap();
        assert_eq!(
            cpu_clock_hz(&system.registers, SystemClockLayout::default()),
            Some(40_000_000)
        );
    }

    #[test]
    fn encoder_config_exposes_counter() {
        let mut config = ControllerConfig::default();
        config.feedback = FeedbackDef::Encoder {
            pulses_per_revolution: 1000.0,
        };
        let system = build_system(&config).unwrap();
        assert!(system.pulse_counter.is_some());
    }

    #[test]
    fn mmio_needs_explicit_registers() {
        let mut config = ControllerConfig::default();
        config.hardware.backend = BackendKind::Mmio;
        assert!(matches!(
            build_system(&config),
            Err(AppError::Unsupported { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ControllerConfig::default();
        config.envelope.min_hz = 10.0;
        config.envelope.max_hz = 0.0;
        assert!(matches!(build_system(&config), Err(AppError::Config(_))));
    }
}
