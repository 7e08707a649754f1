use std::time::Duration;

use automon_core::limits::SAMPLE_INTERVAL;

/// Default seed of the simulated metrics source.
const DEFAULT_SEED: u64 = 0x5EED;

/// Settings of the monitor core.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Sampler period (default: 100 ms).
    pub sample_interval: Duration,
    /// Seed of the pseudo-random workload perturbation.
    pub seed: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
            seed: DEFAULT_SEED,
        }
    }
}

/// Daemon configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `7070`).
    pub port: u16,
    pub monitor: MonitorConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("SAMPLE_INTERVAL_MS must be greater than zero")]
    ZeroInterval,
}

impl DaemonConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default     |
    /// |----------------------|-------------|
    /// | `HOST`               | `127.0.0.1` |
    /// | `PORT`               | `7070`      |
    /// | `SAMPLE_INTERVAL_MS` | `100`       |
    /// | `SAMPLE_SEED`        | `24301`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port: u16 = parse_var(&lookup, "PORT", "u16")?.unwrap_or(7070);

        let interval_ms: u64 = parse_var(&lookup, "SAMPLE_INTERVAL_MS", "u64")?
            .unwrap_or(SAMPLE_INTERVAL.as_millis() as u64);
        if interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let seed: u64 = parse_var(&lookup, "SAMPLE_SEED", "u64")?.unwrap_or(DEFAULT_SEED);

        Ok(Self {
            host,
            port,
            monitor: MonitorConfig {
                sample_interval: Duration::from_millis(interval_ms),
                seed,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            })
        })
        .transpose()
}
