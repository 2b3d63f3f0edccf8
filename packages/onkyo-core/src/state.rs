//! Core configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::eiscp::SessionConfig;
use crate::protocol_constants::{
    CONNECT_TIMEOUT, DEFAULT_BIND_PORT, DEFAULT_EISCP_PORT, RESPONSE_TIMEOUT,
};
use crate::services::profiles::{self, Profile};

/// Configuration for the onkyo-ctl core.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    // Receiver
    /// Receiver host name or IP address.
    pub host: String,

    /// Receiver eISCP port.
    pub port: u16,

    /// TCP connect timeout (milliseconds).
    pub connect_timeout_ms: u64,

    /// Time to wait for a query response (milliseconds).
    pub response_timeout_ms: u64,

    // Server
    /// Port for the HTTP API.
    pub bind_port: u16,

    // Profiles
    /// Listening profiles, keyed by input name.
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_EISCP_PORT,
            connect_timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
            response_timeout_ms: RESPONSE_TIMEOUT.as_millis() as u64,
            bind_port: DEFAULT_BIND_PORT,
            profiles: profiles::default_profiles(),
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.connect_timeout_ms == 0 {
            return Err("connect_timeout_ms must be >= 1".to_string());
        }
        if self.response_timeout_ms == 0 {
            return Err("response_timeout_ms must be >= 1".to_string());
        }
        for profile in &self.profiles {
            profile
                .validate()
                .map_err(|e| format!("invalid profile '{}': {}", profile.name, e))?;
        }
        Ok(())
    }

    /// Session timeouts derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
        }
    }
}
