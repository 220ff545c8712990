// src/config.rs
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_API_URL: &str = "https://www.buda.com/api/v2";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub api_url: String,
    pub upstream_timeout: Duration,
    /// `None` when the catalog is only loaded at startup.
    pub catalog_refresh: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid("LISTEN_ADDR", &listen_addr, e))?;

        let api_url = lookup("BUDA_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_ms = parse_u64(&lookup, "UPSTREAM_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(invalid("UPSTREAM_TIMEOUT_MS", "0", "must be positive"));
        }
        let refresh_secs = parse_u64(&lookup, "CATALOG_REFRESH_SECS", 0)?;

        Ok(Self {
            listen_addr,
            api_url,
            upstream_timeout: Duration::from_millis(timeout_ms),
            catalog_refresh: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(key, &raw, e)),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
