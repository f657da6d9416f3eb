//! mc-core: shared foundation for motorctl.
//!
//! Contains:
//! - units (uom frequency type + constructors)
//! - numeric (finiteness check + saturating duty conversion)
//! - timing (per-tick loop statistics)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use timing::{TickStats, Timer};
pub use units::*;
