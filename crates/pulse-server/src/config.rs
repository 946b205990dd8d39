use std::time::Duration;

use anyhow::{Context, Result};

/// Process configuration, loaded once at startup and handed to each
/// component at construction. Components never read the environment
/// themselves.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub tick_period: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env_or("PULSE_PORT", "3000")
            .parse()
            .context("PULSE_PORT must be a port number")?;
        let token_ttl_secs: u64 = env_or("PULSE_TOKEN_TTL_SECS", "3600")
            .parse()
            .context("PULSE_TOKEN_TTL_SECS must be a number of seconds")?;
        let tick_secs: u64 = env_or("PULSE_TICK_SECS", "5")
            .parse()
            .context("PULSE_TICK_SECS must be a number of seconds")?;

        Ok(Self {
            host: env_or("PULSE_HOST", "0.0.0.0"),
            port,
            db_path: env_or("PULSE_DB_PATH", "pulse.db"),
            jwt_secret: env_or("PULSE_JWT_SECRET", "dev-secret-change-me"),
            token_ttl: Duration::from_secs(token_ttl_secs),
            tick_period: Duration::from_secs(tick_secs),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
