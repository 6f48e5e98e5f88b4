//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Parsing goes through a
//! lookup function so tests can feed values without touching the process
//! environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set when USE_PERSISTENT_STORES=true")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where products and cart lines live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    /// Upper bound on waiting for a row/store lock.
    pub lock_timeout: Duration,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let persistent: bool = parse_or(&lookup, "USE_PERSISTENT_STORES", Some(false))?;
        let lock_timeout_ms: u64 = parse_or(&lookup, "LOCK_TIMEOUT_MS", Some(DEFAULT_LOCK_TIMEOUT_MS))?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "LOCK_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let storage = if persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing { var: "DATABASE_URL" })?;
            let max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(DEFAULT_MAX_CONNECTIONS))?;
            StorageConfig::Postgres {
                database_url,
                max_connections,
            }
        } else {
            StorageConfig::InMemory
        };

        Ok(Self {
            bind_addr,
            storage,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing { var }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_to_in_memory() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.lock_timeout, Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS));
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = load(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: "DATABASE_URL" });
    }

    #[test]
    fn persistent_reads_pool_settings() {
        let cfg = load(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("LOCK_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/shop".to_string(),
                max_connections: 4,
            }
        );
        assert_eq!(cfg.lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn malformed_values_are_reported() {
        assert!(matches!(
            load(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("LOCK_TIMEOUT_MS", "0")]),
            Err(ConfigError::Invalid { var: "LOCK_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            load(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
