//! Fixed bounds and timing constants of the monitor.

use std::time::Duration;

/// Upper bound of the simulated workload level (percent).
pub const MAX_WORKLOAD_LEVEL: u64 = 100;

/// Lowest resource factor the controller will step down to.
pub const MIN_RESOURCE_FACTOR: u64 = 1;

/// Saturation point of the resource factor.
pub const MAX_RESOURCE_FACTOR: u64 = 10;

/// Resource factor at startup.
pub const INITIAL_RESOURCE_FACTOR: u64 = 5;

/// Workload above this steps the resource factor up.
pub const HIGH_WORKLOAD_THRESHOLD: u64 = 80;

/// Workload below this steps the resource factor down.
pub const LOW_WORKLOAD_THRESHOLD: u64 = 20;

/// Default period between sampler firings.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// The workload is perturbed once every this many ticks (~1 s).
pub const PERTURB_EVERY_TICKS: u64 = 10;

/// Perturbation delta range, inclusive of both ends.
pub const PERTURB_DELTA_MIN: i64 = -10;
pub const PERTURB_DELTA_MAX: i64 = 9;

/// Longest accepted write payload, in bytes.
pub const MAX_WRITE_LEN: usize = 255;

/// Name of the status device node.
pub const DEVICE_NAME: &str = "auto_monitor";

/// Name of the attribute directory.
pub const ATTR_DIR_NAME: &str = "auto_monitor";

/// Attribute entry names.
pub const ATTR_CURRENT_WORKLOAD: &str = "current_workload";
pub const ATTR_RESOURCE_FACTOR: &str = "resource_factor";
pub const ATTR_CRITICAL_ALERTS: &str = "critical_alerts";
