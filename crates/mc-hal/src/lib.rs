//! Hardware boundary for the motor controller.
//!
//! Everything that touches a peripheral goes through [`RegisterAccess`], which
//! has two backends:
//! - [`MmioRegisters`] performs volatile reads/writes on the target
//! - [`FakeRegisters`] is an in-memory register file for host runs and tests
//!
//! On top of that sit the MCPWM carrier driver, the SoC clock collaborator,
//! the interrupt-safe encoder pulse counter and a microsecond clock.

pub mod clock;
pub mod error;
pub mod mcpwm;
pub mod pulse;
pub mod registers;
pub mod time;

pub use clock::{SystemClockLayout, cpu_clock_hz, set_cpu_clock_240mhz};
pub use error::{HalError, HalResult};
pub use mcpwm::{CarrierSetup, Mcpwm, McpwmLayout};
pub use pulse::{Direction, PulseCounter};
pub use registers::{FakeRegisters, MmioRegisters, RegisterAccess, RegisterBackend};
pub use time::{FakeClock, MicrosClock, MonotonicClock};
