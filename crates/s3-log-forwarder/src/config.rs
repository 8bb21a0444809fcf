// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::credential::{Credential, CredentialError};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 20000;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;
const INTAKE_DOMAIN: &str = "data.logs.insight.rapid7.com";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("invalid token: {0}")]
    Token(#[from] CredentialError),
}

/// Process-wide forwarder settings, read once at startup
#[derive(Clone)]
pub struct ForwarderConfig {
    /// AWS region of the log intake (e.g., eu, us, ap)
    pub region: String,
    /// Log token prefixed to every line
    pub token: String,
    /// Intake host override, defaults to `<region>.data.logs.insight.rapid7.com`
    pub endpoint: Option<String>,
    /// Intake TLS port
    pub port: u16,
    /// Per-address TCP connect timeout
    pub connect_timeout: Duration,
    /// Socket write (and handshake read) timeout
    pub write_timeout: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("region", &self.region)
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            token: String::new(),
            endpoint: None,
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; `from_env` uses the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = lookup("region").ok_or(ConfigError::Missing("region"))?;
        let token = lookup("token").ok_or(ConfigError::Missing("token"))?;
        let endpoint = lookup("endpoint").filter(|host| !host.trim().is_empty());
        let port = match lookup("port") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "port",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let connect_timeout =
            parse_secs(&lookup, "connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let write_timeout = parse_secs(&lookup, "write_timeout_secs", DEFAULT_WRITE_TIMEOUT_SECS)?;
        let log_level = lookup("log_level")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            region,
            token,
            endpoint,
            port,
            connect_timeout,
            write_timeout,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "region",
                reason: "cannot be empty".to_string(),
            });
        }

        Credential::parse(&self.token)?;

        if self.port == 0 {
            return Err(ConfigError::Invalid {
                name: "port",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.connect_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                name: "log_level",
                reason: format!(
                    "'{}' must be one of: trace, debug, info, warn, error",
                    self.log_level
                ),
            });
        }

        Ok(())
    }

    /// Host name of the log intake
    pub fn host(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}.{INTAKE_DOMAIN}", self.region),
        }
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        None => Ok(Duration::from_secs(default)),
    }
}
