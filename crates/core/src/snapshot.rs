//! Point-in-time view of the monitor and its text rendering.

use std::fmt;

use serde::Serialize;

/// Every monitor field, captured under both lock domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub workload_level: u64,
    pub resource_factor: u64,
    pub critical_alerts: u64,
    pub gpu_temp_celsius: u64,
    pub memory_pressure_percent: u64,
    pub timer_ticks: u64,
    /// Milliseconds since the sampler last fired. `None` before the first tick.
    pub since_last_sample_ms: Option<u64>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workload: {}%", self.workload_level)?;
        writeln!(f, "Resource Factor: {}", self.resource_factor)?;
        writeln!(f, "Critical Alerts: {}", self.critical_alerts)?;
        writeln!(f, "Simulated GPU Temp: {}C", self.gpu_temp_celsius)?;
        writeln!(
            f,
            "Simulated Memory Pressure: {}%",
            self.memory_pressure_percent
        )?;
        writeln!(f, "Timer Ticks: {}", self.timer_ticks)
    }
}

/// Positional read over a rendered buffer.
///
/// Returns an empty slice once `offset` is at or past the end, otherwise
/// at most `max_len` bytes starting at `offset`.
pub fn read_at(content: &[u8], offset: u64, max_len: usize) -> &[u8] {
    let Ok(start) = usize::try_from(offset) else {
        return &[];
    };
    if start >= content.len() {
        return &[];
    }
    let end = start + max_len.min(content.len() - start);
    &content[start..end]
}
