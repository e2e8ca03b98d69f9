// Client configuration: where the server lives, how long to wait for it,
// and the optional API key forwarded in `extra_data`.

use crate::error::{ClientError, Result};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8188;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Applied to every request the client makes.
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Build a config from an existing `http://host:port` URL.
    pub fn from_base_url(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| ClientError::InvalidConfig(format!("{}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ClientError::InvalidConfig(format!("{}: missing host", url)))?;
        let port = parsed.port_or_known_default().unwrap_or(DEFAULT_PORT);
        Ok(ClientConfig::new(host, port))
    }

    /// Defaults overlaid with `COMFY_HOST`, `COMFY_PORT`,
    /// `COMFY_TIMEOUT_SECS` and `COMFY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();
        if let Some(host) = lookup("COMFY_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("COMFY_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ClientError::InvalidConfig(format!("COMFY_PORT={}", port)))?;
        }
        if let Some(secs) = lookup("COMFY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ClientError::InvalidConfig(format!("COMFY_TIMEOUT_SECS={}", secs)))?;
            config.timeout = Duration::from_secs(secs);
        }
        config.api_key = lookup("COMFY_API_KEY").filter(|k| !k.is_empty());
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
