//! Environment configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Directory holding per-session cart files.
    pub data_dir: PathBuf,
    /// Base URL of the discount/checkout backend.
    pub backend_url: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8083".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let data_dir =
            PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "./data/carts".to_string()));
        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?;
        Ok(Self { port, data_dir, backend_url, request_timeout: Duration::from_secs(timeout_secs) })
    }
}
