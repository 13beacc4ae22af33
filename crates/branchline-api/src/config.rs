//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use branchline_core::config::FlowConfig;

use crate::error::AppError;
use crate::state::SessionPolicy;

/// Everything the server needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Flow parameters applied to every hosted dialogue.
    pub flow: FlowConfig,
    /// When hosted sessions are evicted.
    pub sessions: SessionPolicy,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if any variable is set to a malformed value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; unset keys fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if any value is malformed or the resulting
    /// flow configuration is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = FlowConfig::default();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;

        let flow = FlowConfig {
            reveal_interval: duration_or(
                &lookup,
                "BRANCHLINE_REVEAL_INTERVAL_MS",
                defaults.reveal_interval,
                Duration::from_millis,
            )?,
            grid_columns: parse_or(&lookup, "BRANCHLINE_GRID_COLUMNS", defaults.grid_columns)?,
            advance_cooldown: duration_or(
                &lookup,
                "BRANCHLINE_ADVANCE_COOLDOWN_MS",
                defaults.advance_cooldown,
                Duration::from_millis,
            )?,
            choice_cooldown: duration_or(
                &lookup,
                "BRANCHLINE_CHOICE_COOLDOWN_MS",
                defaults.choice_cooldown,
                Duration::from_millis,
            )?,
        }
        .validate()?;

        let session_defaults = SessionPolicy::default();
        let sessions = SessionPolicy {
            finished_retention: duration_or(
                &lookup,
                "BRANCHLINE_SESSION_RETENTION_SECS",
                session_defaults.finished_retention,
                Duration::from_secs,
            )?,
            idle_timeout: duration_or(
                &lookup,
                "BRANCHLINE_SESSION_IDLE_TIMEOUT_SECS",
                session_defaults.idle_timeout,
                Duration::from_secs,
            )?,
        };

        Ok(Self {
            host,
            port,
            flow,
            sessions,
        })
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is not valid: {e}"))),
        None => Ok(default),
    }
}

fn duration_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, AppError> {
    match lookup(key) {
        Some(_) => parse_or(lookup, key, 0).map(unit),
        None => Ok(default),
    }
}
