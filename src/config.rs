//! Process configuration (C9), read once from the environment at startup.

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required but was not set")]
    Missing(&'static str),
    #[error("{name} must be an integer, got {value:?}")]
    InvalidInt { name: &'static str, value: String },
}

/// Database pool tuning, mirroring the five `DB_*` environment variables.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub max_overflow: u32,
    pub connect_timeout: Duration,
    pub idle_recycle: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub pool: PoolConfig,
    pub default_heartbeat_interval: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("OCPP_HOST", "0.0.0.0");
        let port = env_int("OCPP_PORT", 9000)?;
        let log_level = env_or("LOG_LEVEL", "info");
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let max_connections = env_int("DB_POOL_SIZE", 10)?;
        let max_overflow = env_int("DB_MAX_OVERFLOW", 20)?;
        let connect_timeout_secs = env_int("DB_POOL_TIMEOUT", 30)?;
        let idle_recycle_secs = env_int("DB_POOL_RECYCLE", 3600)?;
        let default_heartbeat_interval = env_int("DEFAULT_HEARTBEAT_INTERVAL", 300)?;

        Ok(Self {
            host,
            port: port as u16,
            log_level,
            database_url,
            pool: PoolConfig {
                max_connections: max_connections as u32,
                max_overflow: max_overflow as u32,
                connect_timeout: Duration::from_secs(connect_timeout_secs as u64),
                idle_recycle: Duration::from_secs(idle_recycle_secs as u64),
            },
            default_heartbeat_interval: default_heartbeat_interval as u32,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_int(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidInt { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_int_falls_back_to_default() {
        // SAFETY: test runs single-threaded w.r.t. this var name.
        unsafe { env::remove_var("OCPP_TEST_MISSING_VAR") };
        assert_eq!(env_int("OCPP_TEST_MISSING_VAR", 42).unwrap(), 42);
    }

    #[test]
    fn env_int_rejects_garbage() {
        unsafe { env::set_var("OCPP_TEST_BAD_INT", "not-a-number") };
        let err = env_int("OCPP_TEST_BAD_INT", 42).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInt { .. }));
        unsafe { env::remove_var("OCPP_TEST_BAD_INT") };
    }
}
