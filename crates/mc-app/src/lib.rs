//! Control loop service layer for motorctl.
//!
//! This crate turns a validated configuration into a running controller and
//! drives it at a fixed period. The CLI is a thin shell over it.

pub mod build;
pub mod control_loop;
pub mod error;
pub mod schedule;
pub mod ticker;
pub mod trace;

pub use build::{BuiltSystem, SystemLoop, build_system, build_system_with};
pub use control_loop::{ControlLoop, TickRecord};
pub use error::{AppError, AppResult};
pub use schedule::{Command, Schedule, ScheduledCommand};
pub use ticker::{IntervalTicker, ManualTicker, Ticker};
pub use trace::{TRACE_HEADER, trace_to_csv, write_trace_csv};
