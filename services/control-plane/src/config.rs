use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use cirrus_id::Region;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub region: Region,
    pub provider_url: String,
    pub provider_timeout: Duration,
    pub log_level: String,
    /// Serve from an in-memory provider instead of the provider API.
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("CIRRUS_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("invalid CIRRUS_LISTEN_ADDR")?;

        let region = std::env::var("CIRRUS_REGION").unwrap_or_else(|_| "us-east1".to_string());
        let region = Region::parse(&region).context("invalid CIRRUS_REGION")?;

        let provider_url = std::env::var("CIRRUS_PROVIDER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9300".to_string());

        let provider_timeout = std::env::var("CIRRUS_PROVIDER_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("invalid CIRRUS_PROVIDER_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let log_level = std::env::var("CIRRUS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dev_mode = std::env::var("CIRRUS_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            region,
            provider_url,
            provider_timeout,
            log_level,
            dev_mode,
        })
    }
}
