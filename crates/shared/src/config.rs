//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

/// Ledger engine timing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Deadline for one atomic unit of work, lock wait included.
    #[serde(default = "default_unit_of_work_timeout")]
    pub unit_of_work_timeout_ms: u64,
    /// How long a single row lock may be waited on inside the store.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Bound on the post-commit audit write.
    #[serde(default = "default_audit_timeout")]
    pub audit_timeout_ms: u64,
}

fn default_unit_of_work_timeout() -> u64 {
    5_000
}

fn default_lock_timeout() -> u64 {
    2_000
}

fn default_audit_timeout() -> u64 {
    1_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            unit_of_work_timeout_ms: default_unit_of_work_timeout(),
            lock_timeout_ms: default_lock_timeout(),
            audit_timeout_ms: default_audit_timeout(),
        }
    }
}

impl LedgerConfig {
    /// Deadline for one atomic unit of work.
    #[must_use]
    pub const fn unit_of_work_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_of_work_timeout_ms)
    }

    /// Store-side row lock wait limit.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Bound on the audit write.
    #[must_use]
    pub const fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "corebank=info,ledgerctl=info,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COREBANK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
