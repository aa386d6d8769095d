// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration for the collector daemon.
//!
//! Knobs:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `NOCLOG_HOST` | `0.0.0.0` | UDP bind host |
//! | `NOCLOG_PORT` | `514` | UDP bind port |
//! | `DB_HOST` | — (required) | ClickHouse HTTP endpoint, e.g. `http://ch:8123` |
//! | `DB_NAME` | `default` | ClickHouse database |
//! | `DB_USER` | `default` | ClickHouse user |
//! | `DB_PASS` | empty | ClickHouse password |
//! | `NOCLOG_TABLE` | `mikrotik_logs` | target table |
//! | `NOCLOG_BATCH_SIZE` | `1000` | size flush trigger |
//! | `NOCLOG_FLUSH_INTERVAL_SECS` | `2` | time flush trigger |
//! | `NOCLOG_QUEUE_CAPACITY` | `10000` | bounded queue capacity |
//!
//! `NOCLOG_LOG_LEVEL` (default `info`) is read directly by the binary: the
//! tracing subscriber has to exist before configuration loads so that load
//! failures are logged.

use std::env;
use std::time::Duration;

use crate::batcher::BatcherConfig;
use crate::clickhouse::ClickHouseConfig;
use crate::constants;
use crate::listener::ListenerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required variable: {0}")]
    Missing(&'static str),
}

/// Full configuration for one collector process.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub host: String,
    pub port: u16,
    pub db_url: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub table: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
}

impl CollectorConfig {
    /// Reads configuration from the environment and validates it.
    pub fn from_env() -> Result<CollectorConfig, ConfigError> {
        let host = env::var("NOCLOG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("NOCLOG_PORT", 514)?;
        let db_url = env::var("DB_HOST").map_err(|_| ConfigError::Missing("DB_HOST"))?;
        let db_name = env::var("DB_NAME").unwrap_or_else(|_| "default".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "default".to_string());
        let db_password = env::var("DB_PASS").unwrap_or_default();
        let table = env::var("NOCLOG_TABLE").unwrap_or_else(|_| "mikrotik_logs".to_string());
        let batch_size = parse_var("NOCLOG_BATCH_SIZE", constants::DEFAULT_BATCH_SIZE)?;
        let flush_interval_secs = parse_var(
            "NOCLOG_FLUSH_INTERVAL_SECS",
            constants::DEFAULT_FLUSH_INTERVAL.as_secs(),
        )?;
        let queue_capacity = parse_var("NOCLOG_QUEUE_CAPACITY", constants::DEFAULT_QUEUE_CAPACITY)?;

        let config = CollectorConfig {
            host,
            port,
            db_url,
            db_name,
            db_user,
            db_password,
            table,
            batch_size,
            flush_interval: Duration::from_secs(flush_interval_secs),
            queue_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "NOCLOG_PORT must be greater than 0".to_string(),
            ));
        }
        if self.db_url.trim().is_empty() {
            return Err(ConfigError::Invalid("DB_HOST cannot be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "NOCLOG_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "NOCLOG_FLUSH_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "NOCLOG_QUEUE_CAPACITY must be greater than 0".to_string(),
            ));
        }
        // The table name is interpolated into the INSERT statement; restrict
        // it to identifier characters.
        if self.table.is_empty()
            || !self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Invalid(format!(
                "NOCLOG_TABLE must be a plain identifier, got {:?}",
                self.table
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }

    #[must_use]
    pub fn batcher(&self) -> BatcherConfig {
        BatcherConfig {
            flush_interval: self.flush_interval,
            max_batch_entries: self.batch_size,
            flush_timeout: constants::FLUSH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn clickhouse(&self) -> ClickHouseConfig {
        ClickHouseConfig {
            url: self.db_url.clone(),
            database: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            table: self.table.clone(),
            request_timeout: constants::FLUSH_TIMEOUT,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(format!("{name} has an invalid value: {raw:?}"))),
        Err(_) => Ok(default),
    }
}
