//! Configuration validation logic.

use mc_hal::CarrierSetup;

use crate::schema::{ActuatorDef, CommandDef, ControllerConfig, FeedbackDef, PidDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

pub fn validate_config(config: &ControllerConfig) -> Result<(), ValidationError> {
    if config.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    validate_pid(&config.pid)?;
    validate_actuator(&config.actuator)?;
    validate_feedback(&config.feedback)?;

    require_finite("envelope.min_hz", config.envelope.min_hz)?;
    require_finite("envelope.max_hz", config.envelope.max_hz)?;
    if config.envelope.min_hz > config.envelope.max_hz {
        return Err(invalid(
            "envelope",
            format!("[{}, {}]", config.envelope.min_hz, config.envelope.max_hz),
            "min_hz must not exceed max_hz",
        ));
    }

    require_positive("control.period_s", config.control.period_s)?;
    require_finite("control.setpoint_hz", config.control.setpoint_hz)?;

    if config.hardware.output_gpio > 31 {
        return Err(ValidationError::Unsupported {
            feature: format!("hardware.output_gpio = {}", config.hardware.output_gpio),
            reason: "PWM output must be routed to GPIO 0..=31".to_string(),
        });
    }

    for (idx, entry) in config.schedule.iter().enumerate() {
        if let CommandDef::Setpoint { hz } = entry.command {
            require_finite(&format!("schedule[{idx}].command.hz"), hz)?;
        }
    }

    Ok(())
}

fn validate_pid(pid: &PidDef) -> Result<(), ValidationError> {
    require_finite("pid.kp", pid.kp)?;
    require_finite("pid.ki", pid.ki)?;
    require_finite("pid.kd", pid.kd)?;
    require_finite("pid.out_min", pid.out_min)?;
    require_finite("pid.out_max", pid.out_max)?;
    if pid.out_min > pid.out_max {
        return Err(invalid(
            "pid",
            format!("[{}, {}]", pid.out_min, pid.out_max),
            "out_min must not exceed out_max",
        ));
    }
    Ok(())
}

fn validate_actuator(actuator: &ActuatorDef) -> Result<(), ValidationError> {
    if let Err(err) = CarrierSetup::solve(
        actuator.timebase_hz,
        actuator.carrier_hz,
        actuator.resolution_ticks,
    ) {
        return Err(invalid(
            "actuator.carrier_hz",
            actuator.carrier_hz,
            &err.to_string(),
        ));
    }
    if actuator.neutral_ticks > actuator.resolution_ticks {
        return Err(invalid(
            "actuator.neutral_ticks",
            actuator.neutral_ticks,
            "must not exceed resolution_ticks",
        ));
    }
    require_finite("actuator.duty_scale", actuator.duty_scale)?;
    if actuator.duty_scale < 0.0 {
        return Err(invalid(
            "actuator.duty_scale",
            actuator.duty_scale,
            "must not be negative",
        ));
    }
    Ok(())
}

fn validate_feedback(feedback: &FeedbackDef) -> Result<(), ValidationError> {
    match *feedback {
        FeedbackDef::SyntheticRamp {
            start_hz,
            step_hz,
            low_hz,
            high_hz,
        } => {
            require_finite("feedback.start_hz", start_hz)?;
            require_positive("feedback.step_hz", step_hz)?;
            require_finite("feedback.low_hz", low_hz)?;
            require_finite("feedback.high_hz", high_hz)?;
            if low_hz > high_hz {
                return Err(invalid(
                    "feedback",
                    format!("[{low_hz}, {high_hz}]"),
                    "low_hz must not exceed high_hz",
                ));
            }
            if start_hz < low_hz || start_hz > high_hz {
                return Err(invalid(
                    "feedback.start_hz",
                    start_hz,
                    "must lie within [low_hz, high_hz]",
                ));
            }
        }
        FeedbackDef::Encoder {
            pulses_per_revolution,
        } => require_positive("feedback.pulses_per_revolution", pulses_per_revolution)?,
        FeedbackDef::Plant {
            tau_s,
            max_speed_hz,
            max_accel_hz_per_s,
        } => {
            require_positive("feedback.tau_s", tau_s)?;
            require_positive("feedback.max_speed_hz", max_speed_hz)?;
            require_positive("feedback.max_accel_hz_per_s", max_accel_hz_per_s)?;
        }
    }
    Ok(())
}
