//! Connection settings, read from the process environment.

use std::env;

use log::info;
use sqlx::postgres::PgConnectOptions;

use crate::error::{GymError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PgConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl PgConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub postgres: PgConfig,
    pub mongo_uri: String,
    pub mongo_database: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let port = var("PG_PORT", "5432");
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| GymError::Config(format!("PG_PORT '{}' is not a port: {}", port, e)))?;

        Ok(Self {
            postgres: PgConfig {
                host: var("PG_HOST", "localhost"),
                database: var("PG_DB", "labdb"),
                user: var("PG_USER", "student"),
                password: var("PG_PASS", "password"),
                port,
            },
            mongo_uri: var("MONGO_URI", "mongodb://localhost:27017/"),
            mongo_database: var("MONGO_DB", "gym_tracker"),
        })
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_local_setup() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.database, "labdb");
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017/");
        assert_eq!(config.mongo_database, "gym_tracker");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("PG_HOST", "db.internal"),
            ("PG_PORT", "6543"),
            ("PG_USER", "coach"),
            ("MONGO_URI", "mongodb://mongo:27017"),
        ]))
        .unwrap();
        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.postgres.port, 6543);
        assert_eq!(config.postgres.user, "coach");
        assert_eq!(config.mongo_uri, "mongodb://mongo:27017");
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("PG_PORT", "fivefour")])).unwrap_err();
        assert!(matches!(err, GymError::Config(_)));
    }
}
