//! Controller configuration schema.
//!
//! Every section has a default, so a file only needs the keys it changes.
//! `ControllerConfig::default()` is the reference board setup: 20 kHz carrier
//! at 8000 ticks, 10 ms loop, 800 Hz setpoint, synthetic ramp feedback.

use mc_controls::OperatingMode;
use serde::{Deserialize, Serialize};

use crate::migrate::LATEST_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    pub version: u32,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub pid: PidDef,
    #[serde(default)]
    pub actuator: ActuatorDef,
    #[serde(default)]
    pub feedback: FeedbackDef,
    #[serde(default)]
    pub envelope: EnvelopeDef,
    #[serde(default)]
    pub control: ControlDef,
    #[serde(default)]
    pub hardware: HardwareDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<ScheduledCommandDef>,
}

fn default_name() -> String {
    "motor".to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: default_name(),
            pid: PidDef::default(),
            actuator: ActuatorDef::default(),
            feedback: FeedbackDef::default(),
            envelope: EnvelopeDef::default(),
            control: ControlDef::default(),
            hardware: HardwareDef::default(),
            schedule: Vec::new(),
        }
    }
}

/// Regulator gains and output bounds. The sample interval is `control.period_s`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PidDef {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub out_min: f64,
    pub out_max: f64,
}

impl Default for PidDef {
    fn default() -> Self {
        Self {
            kp: 0.02,
            ki: 0.005,
            kd: 0.0,
            out_min: 0.0,
            out_max: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActuatorDef {
    /// Clock feeding the MCPWM prescaler.
    pub timebase_hz: u32,
    pub carrier_hz: u32,
    pub resolution_ticks: u16,
    /// Duty held while arming.
    pub neutral_ticks: u16,
    /// Ticks per unit of regulator output.
    pub duty_scale: f64,
}

impl Default for ActuatorDef {
    fn default() -> Self {
        Self {
            timebase_hz: 160_000_000,
            carrier_hz: 20_000,
            resolution_ticks: 8000,
            neutral_ticks: 4000,
            duty_scale: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackDef {
    SyntheticRamp {
        start_hz: f64,
        step_hz: f64,
        low_hz: f64,
        high_hz: f64,
    },
    Encoder {
        pulses_per_revolution: f64,
    },
    /// Simulated motor driven by the committed duty.
    Plant {
        tau_s: f64,
        max_speed_hz: f64,
        max_accel_hz_per_s: f64,
    },
}

impl Default for FeedbackDef {
    fn default() -> Self {
        FeedbackDef::SyntheticRamp {
            start_hz: 400.0,
            step_hz: 0.5,
            low_hz: 400.0,
            high_hz: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvelopeDef {
    pub min_hz: f64,
    pub max_hz: f64,
}

impl Default for EnvelopeDef {
    fn default() -> Self {
        Self {
            min_hz: 0.0,
            max_hz: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlDef {
    pub period_s: f64,
    pub setpoint_hz: f64,
    /// Log a status line every this many ticks; 0 disables it.
    pub status_every_ticks: u64,
}

impl Default for ControlDef {
    fn default() -> Self {
        Self {
            period_s: 0.01,
            setpoint_hz: 800.0,
            status_every_ticks: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-memory register file.
    #[default]
    Fake,
    /// Volatile accesses at the configured addresses. Only valid on target.
    Mmio,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HardwareDef {
    pub backend: BackendKind,
    pub mcpwm_base: u32,
    pub gpio_base: u32,
    pub gpio_matrix_base: u32,
    pub output_gpio: u8,
    pub system_base: u32,
    /// Switch the CPU to 240 MHz before arming.
    pub configure_clock: bool,
}

impl Default for HardwareDef {
    fn default() -> Self {
        Self {
            backend: BackendKind::Fake,
            mcpwm_base: 0x3F40_0000,
            gpio_base: 0x3F40_4000,
            gpio_matrix_base: 0x3F40_8000,
            output_gpio: 18,
            system_base: 0x600C_0000,
            configure_clock: true,
        }
    }
}

/// Operator command applied at the start of tick `at_tick` (0-based).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduledCommandDef {
    pub at_tick: u64,
    pub command: CommandDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandDef {
    Request { mode: OperatingMode },
    Setpoint { hz: f64 },
}
