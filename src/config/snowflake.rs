//! Snowflake account settings and connection string construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigError, non_empty};
use crate::collector::ConnectionError;
use crate::snowflake::{DEFAULT_QUERY_TIMEOUT, Dsn, encode_private_key, load_private_key};

/// Role used when none is configured.
pub const DEFAULT_ROLE: &str = "ACCOUNTADMIN";

/// Snowflake account and query settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakeConfig {
    /// Account identifier (e.g. `xy12345.us-east-2.aws` or `myorg-myaccount`).
    pub account_name: String,

    pub username: String,

    pub password: Option<String>,

    /// PKCS#8 PEM file holding the user's RSA private key.
    pub private_key_path: Option<String>,

    /// Passphrase for an encrypted private key.
    pub private_key_password: Option<String>,

    /// Role used for queries (default: ACCOUNTADMIN).
    pub role: String,

    pub warehouse: String,

    /// Skip soft-deleted tables in table storage and drop the deleted-table count.
    pub exclude_deleted_tables: bool,

    /// Log every SQL API request and response.
    pub enable_tracing: bool,

    /// Per-statement timeout (default: 60s).
    #[serde(with = "humantime_serde")]
    pub query_timeout: Duration,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            username: String::new(),
            password: None,
            private_key_path: None,
            private_key_password: None,
            role: DEFAULT_ROLE.to_string(),
            warehouse: String::new(),
            exclude_deleted_tables: false,
            enable_tracing: false,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("account_name", &self.account_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_password",
                &self.private_key_password.as_ref().map(|_| "***"),
            )
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("exclude_deleted_tables", &self.exclude_deleted_tables)
            .field("enable_tracing", &self.enable_tracing)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl SnowflakeConfig {
    /// Check required fields, returning the first missing one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_name.is_empty() {
            return Err(ConfigError::MissingAccountName);
        }
        if self.username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        if non_empty(&self.password).is_none() && non_empty(&self.private_key_path).is_none() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.role.is_empty() {
            return Err(ConfigError::MissingRole);
        }
        if self.warehouse.is_empty() {
            return Err(ConfigError::MissingWarehouse);
        }
        Ok(())
    }

    /// Check the credentials can be used with the SQL API provider, which
    /// only authenticates with a key pair.
    ///
    /// # Errors
    /// Returns [`ConfigError::KeyPairRequired`] when no private key is set.
    pub fn require_key_pair(&self) -> Result<(), ConfigError> {
        if non_empty(&self.private_key_path).is_none() {
            return Err(ConfigError::KeyPairRequired);
        }
        Ok(())
    }

    /// Build the connection string for the `SNOWFLAKE` database.
    ///
    /// A configured private key takes precedence over a password; the key
    /// file is read on every call so rotated keys are picked up.
    pub fn connection_string(&self) -> Result<String, ConnectionError> {
        let mut dsn = Dsn::new(&self.account_name, &self.username)
            .with_role(&self.role)
            .with_warehouse(&self.warehouse)
            .with_tracing(self.enable_tracing);

        if let Some(path) = non_empty(&self.private_key_path) {
            let key = load_private_key(path, non_empty(&self.private_key_password))?;
            dsn = dsn.with_private_key(encode_private_key(&key)?);
        } else if let Some(password) = non_empty(&self.password) {
            dsn = dsn.with_password(password);
        }

        Ok(dsn.to_string())
    }
}
