use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::auth::AuthConfig;

/// Runtime settings, read once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite database file. Parent directories are created on startup.
    pub database_path: PathBuf,
    pub port: u16,
    pub auth: AuthConfig,
    /// How long in-flight requests get to finish after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DATABASE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./pr-reviewer.db"));

        let port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid port number")?;

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be blank");
        }

        let access_ttl = parse_secs(&lookup, "ACCESS_TOKEN_TTL_SECS", 15 * 60)?;
        let refresh_ttl = parse_secs(&lookup, "REFRESH_TOKEN_TTL_SECS", 7 * 24 * 60 * 60)?;
        let shutdown_secs = parse_secs(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?;

        Ok(ServerConfig {
            database_path,
            port,
            auth: AuthConfig::new(jwt_secret, access_ttl, refresh_ttl),
            shutdown_timeout: Duration::from_secs(shutdown_secs as u64),
        })
    }
}

/// Positive number of seconds, or `default` when unset.
fn parse_secs<F>(lookup: &F, key: &str, default: i64) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let secs = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{} must be a whole number of seconds", key))?;
    if secs <= 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(secs)
}
