//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::snowflake::SnowflakeConfig;
use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default exporter port.
pub const DEFAULT_PORT: u16 = 9975;

/// Default path serving metrics.
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

/// Liveness probe path. Reserved, so it cannot serve metrics.
pub const HEALTH_PATH: &str = "/healthz";

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9975).
    pub port: u16,

    /// Path under which to expose metrics (default: "/metrics").
    pub telemetry_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            telemetry_path: DEFAULT_TELEMETRY_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Listen address built from `bind` and `port`. Accepts IPv4 and IPv6.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if `bind` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind.parse().map_err(|_| {
            ConfigError::ValidationError(format!("invalid server bind address: '{}'", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// Snowflake account configuration.
    pub snowflake: SnowflakeConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    /// The result is not validated, so CLI overrides can be applied first.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns the first invalid server or Snowflake setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.socket_addr()?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        let path = &self.server.telemetry_path;
        if !path.starts_with('/') || path == "/" {
            return Err(ConfigError::ValidationError(format!(
                "telemetry path must start with '/' and not be the root: '{path}'"
            )));
        }
        if path == HEALTH_PATH {
            return Err(ConfigError::ValidationError(format!(
                "telemetry path '{path}' is reserved for the health probe"
            )));
        }

        self.snowflake.validate()
    }
}
