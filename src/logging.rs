//! Logging
//!
//! Structured logging via the `tracing` crate. The engine itself only emits
//! events; this module carries the configuration type and a subscriber
//! initializer for hosts that do not install their own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Build the env-filter directive string: base level plus per-module
    /// overrides, with `RUST_LOG` taking precedence when set.
    fn filter(&self) -> EnvFilter {
        let mut directives = self.level.clone();
        for (module, level) in &self.modules {
            directives.push_str(&format!(",{}={}", module, level));
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
    }
}

/// Install a global subscriber from the config. Returns false when logging is
/// disabled or a subscriber is already installed (e.g. by the host or another
/// test).
pub fn init(config: &LoggingConfig) -> bool {
    if !config.enabled {
        return false;
    }

    let filter = config.filter();
    let result = if config.format == "json" {
        tracing::subscriber::set_global_default(
            fmt::Subscriber::builder().json().with_env_filter(filter).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            fmt::Subscriber::builder().with_env_filter(filter).finish(),
        )
    };
    result.is_ok()
}
