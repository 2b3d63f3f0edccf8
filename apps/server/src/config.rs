//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use onkyo_core::protocol_constants::{
    CONNECT_TIMEOUT, DEFAULT_BIND_PORT, DEFAULT_EISCP_PORT, RESPONSE_TIMEOUT,
};
use onkyo_core::Profile;
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Receiver host name or IP address.
    /// Override: `ONKYO_HOST`
    pub host: String,

    /// Receiver eISCP port.
    /// Override: `ONKYO_PORT`
    pub port: u16,

    /// Port to bind the HTTP server to.
    /// Override: `ONKYO_BIND_PORT`
    pub bind_port: u16,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Query response timeout in milliseconds.
    pub response_timeout_ms: u64,

    /// Listening profiles. The built-in table is used when absent.
    pub profiles: Option<Vec<Profile>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_EISCP_PORT,
            bind_port: DEFAULT_BIND_PORT,
            connect_timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
            response_timeout_ms: RESPONSE_TIMEOUT.as_millis() as u64,
            profiles: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("ONKYO_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host;
        }

        if let Some(port) = lookup("ONKYO_PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }

        if let Some(port) = lookup("ONKYO_BIND_PORT").and_then(|v| v.parse().ok()) {
            self.bind_port = port;
        }
    }

    /// Converts to onkyo-core's Config type.
    pub fn to_core_config(&self) -> onkyo_core::Config {
        let mut config = onkyo_core::Config {
            host: self.host.clone(),
            port: self.port,
            bind_port: self.bind_port,
            connect_timeout_ms: self.connect_timeout_ms,
            response_timeout_ms: self.response_timeout_ms,
            ..Default::default()
        };
        if let Some(ref profiles) = self.profiles {
            config.profiles = profiles.clone();
        }
        config
    }
}
