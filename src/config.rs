//! Configuration for the NetraCam client
//!
//! Loaded from a TOML file; `defaults()` serves tests and development.

use crate::connection::Endpoint;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Remote camera endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Host name or IP address of the camera service
    pub address: String,
    /// TCP port of the camera service
    pub port: u16,
}

/// Session behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Receive timeout for setting changes, in milliseconds
    pub command_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration (localhost camera on the standard port)
    pub fn defaults() -> Self {
        Config {
            camera: CameraConfig {
                address: "127.0.0.1".to_string(),
                port: 5555,
            },
            session: SessionConfig {
                command_timeout_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.camera.address.clone(), self.camera.port)
    }

    /// The configured command timeout
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.session.command_timeout_ms)
    }
}
