//! Process configuration read from environment variables.

use std::time::Duration;

use thiserror::Error;

use pricewise_inventory::StockThresholds;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Thresholds given to inventory records created with new products.
    pub default_thresholds: StockThresholds,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of touching the environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_persistent: bool = parse_or(&lookup, "USE_PERSISTENT_STORES", false)?;

        let database = if use_persistent {
            let url = lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let max_connections: u32 = parse_or(&lookup, "PRICEWISE_DB_MAX_CONNECTIONS", 10)?;
            if max_connections == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "PRICEWISE_DB_MAX_CONNECTIONS",
                    value: "0".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            let timeout_secs: u64 = parse_or(&lookup, "PRICEWISE_DB_CONNECT_TIMEOUT_SECS", 5)?;
            Some(DatabaseConfig {
                url,
                max_connections,
                connect_timeout: Duration::from_secs(timeout_secs),
            })
        } else {
            None
        };

        let low = parse_or(&lookup, "PRICEWISE_LOW_STOCK_THRESHOLD", StockThresholds::DEFAULT_LOW)?;
        let high = parse_or(&lookup, "PRICEWISE_HIGH_STOCK_THRESHOLD", StockThresholds::DEFAULT_HIGH)?;
        let default_thresholds =
            StockThresholds::new(low, high).map_err(|e| ConfigError::InvalidValue {
                key: "PRICEWISE_LOW_STOCK_THRESHOLD",
                value: low.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            database,
            default_thresholds,
        })
    }

    pub fn uses_persistent_store(&self) -> bool {
        self.database.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            default_thresholds: StockThresholds::default(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory_with_default_thresholds() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.uses_persistent_store());
    }

    #[test]
    fn persistent_store_requires_database_url() {
        let err = Config::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn reads_database_settings() {
        let config = Config::from_lookup(lookup(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/pricewise"),
            ("PRICEWISE_DB_MAX_CONNECTIONS", "4"),
            ("PRICEWISE_DB_CONNECT_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/pricewise");
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = Config::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "yes please")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key: "USE_PERSISTENT_STORES", .. } => {}
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = Config::from_lookup(lookup(&[
            ("PRICEWISE_LOW_STOCK_THRESHOLD", "50"),
            ("PRICEWISE_HIGH_STOCK_THRESHOLD", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
