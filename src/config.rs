//! Engine configuration
//!
//! All tunables the ordering and move engine consumes: sort key spacing, gap
//! threshold, and lock timing. These are injected configuration, never
//! process-wide literals; loading layers an optional TOML file under
//! `TREELINE_`-prefixed environment variables.

use crate::logging::LoggingConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sort key allocation tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Spacing between keys handed out at the end of a sibling set, and the
    /// uniform step used by rebalancing.
    #[serde(default = "default_step")]
    pub default_step: i64,

    /// Smallest gap midpoint insertion is allowed to split. At or below this,
    /// the sibling set is rebalanced instead.
    #[serde(default = "default_min_gap")]
    pub min_gap: i64,

    /// Sibling counts above this emit a warning when rebalanced; the batch
    /// still runs unpaginated so it stays atomic.
    #[serde(default = "default_rebalance_warn_threshold")]
    pub rebalance_warn_threshold: usize,
}

fn default_step() -> i64 {
    1024
}

fn default_min_gap() -> i64 {
    10
}

fn default_rebalance_warn_threshold() -> usize {
    10_000
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            default_step: default_step(),
            min_gap: default_min_gap(),
            rebalance_warn_threshold: default_rebalance_warn_threshold(),
        }
    }
}

/// Project move lock timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long an acquired lock is held before an unrelated owner may take
    /// it over (crashed-holder recovery).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Spin budget for acquisition; exceeded means "operation busy".
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Delay between acquisition attempts.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_ttl_secs() -> u64 {
    30
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub sort: SortConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from an optional TOML file layered under
    /// `TREELINE_`-prefixed environment variables
    /// (e.g. `TREELINE_SORT__MIN_GAP=16`).
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix("TREELINE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
