//! Configuration module for the Snowflake exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (bind address, port, telemetry path)
//! - Snowflake settings (account, credentials, role, warehouse, query options)

mod app;
mod snowflake;
mod validation;

pub use app::{AppConfig, ServerConfig};
pub use snowflake::SnowflakeConfig;
pub use validation::{ConfigError, expand_env_vars};

// Re-export constants
pub use app::{DEFAULT_PORT, DEFAULT_TELEMETRY_PATH, HEALTH_PATH};
pub use snowflake::DEFAULT_ROLE;
