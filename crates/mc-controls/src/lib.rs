//! Control core for the single-motor speed controller.
//!
//! One control tick flows through these pieces, leaves first:
//! - [`FeedbackSource`] produces the measured speed
//! - [`Pid`] turns (setpoint, measurement) into a bounded output
//! - [`DutyActuator`] maps that output to carrier ticks and commits them
//! - [`Supervisor`] decides per operating mode which of the above runs
//!
//! # Design Principles
//!
//! - **Single owner**: all state is owned by the loop thread; nothing here locks
//! - **Faults are states**: an implausible measurement moves the supervisor to
//!   [`OperatingMode::Faulted`], it never panics or returns an error
//! - **Hardware behind traits**: feedback and actuation are swappable at
//!   construction time, so the same core runs on target and in tests

pub mod actuator;
pub mod error;
pub mod feedback;
pub mod mode;
pub mod pid;
pub mod plant;
pub mod sampled;
pub mod supervisor;

pub use actuator::{DutyActuator, DutyMapping, PwmActuator};
pub use error::{ControlError, ControlResult};
pub use feedback::{EncoderFeedback, FeedbackSource, SyntheticRamp};
pub use mode::{OperatingMode, Transition, TransitionRule};
pub use pid::{Pid, PidGains};
pub use plant::{MotorParams, MotorPlant};
pub use sampled::{SampleClock, SampleConfig};
pub use supervisor::{StepReport, Supervisor, SupervisorConfig, ValidEnvelope};
