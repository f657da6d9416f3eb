//! Tick trace export.

use std::path::Path;

use crate::control_loop::TickRecord;
use crate::error::{AppError, AppResult};

pub const TRACE_HEADER: &str = "tick,time_s,setpoint_hz,measurement_hz,mode,output,duty_ticks";

/// Render records as CSV. `period_s` converts tick numbers to time.
///
/// Ticks where the regulator did not run leave `output` empty.
pub fn trace_to_csv(records: &[TickRecord], period_s: f64) -> String {
    let mut csv = String::from(TRACE_HEADER);
    csv.push('\n');
    for r in records {
        let output = r.output.map(|o| o.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.tick,
            r.tick as f64 * period_s,
            r.setpoint_hz,
            r.measurement_hz,
            r.mode,
            output,
            r.duty_ticks
        ));
    }
    csv
}

pub fn write_trace_csv(path: &Path, records: &[TickRecord], period_s: f64) -> AppResult<()> {
    std::fs::write(path, trace_to_csv(records, period_s)).map_err(|source| {
        AppError::TraceWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}
