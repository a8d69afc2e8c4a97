use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::relay::CleanupConfig;
use crate::shared::AppError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "public";

/// Process configuration, read once from the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Directory holding the browser client (index.html and assets)
    pub static_dir: PathBuf,
    pub cleanup: CleanupConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Reads BIND_ADDR, PORT, STATIC_DIR, ROOM_CLEANUP_INTERVAL_SECS and
    /// ROOM_INACTIVITY_THRESHOLD_SECS, falling back to defaults when unset
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => defaults.port,
        };
        let cleanup_interval = match lookup("ROOM_CLEANUP_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("ROOM_CLEANUP_INTERVAL_SECS", &raw)?),
            None => defaults.cleanup.cleanup_interval,
        };
        let inactivity_threshold = match lookup("ROOM_INACTIVITY_THRESHOLD_SECS") {
            Some(raw) => Duration::from_secs(parse_number(
                "ROOM_INACTIVITY_THRESHOLD_SECS",
                &raw,
            )?),
            None => defaults.cleanup.inactivity_threshold,
        };

        if cleanup_interval.is_zero() {
            return Err(AppError::Config(
                "ROOM_CLEANUP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            cleanup: CleanupConfig {
                cleanup_interval,
                inactivity_threshold,
            },
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address: {}", e)))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{} must be a number ({}): {}", key, raw, e)))
}
