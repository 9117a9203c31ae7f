//! Configuration errors and helpers.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Server settings are invalid.
    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("account_name must be specified")]
    MissingAccountName,

    #[error("username must be specified")]
    MissingUsername,

    #[error("password OR private key path must be specified")]
    MissingCredentials,

    #[error("role must be specified")]
    MissingRole,

    #[error("warehouse must be specified")]
    MissingWarehouse,

    /// Only a password is configured, but the SQL API needs a key pair.
    #[error("the SQL API does not accept passwords; private key path must be specified")]
    KeyPairRequired,
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

/// Treat an empty optional string as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("account_name: xy12345"), "account_name: xy12345");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("warehouse: ${NONEXISTENT_WAREHOUSE_12345:-COMPUTE_WH}");
        assert_eq!(result, "warehouse: COMPUTE_WH");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: This test runs in isolation and only modifies a test-specific variable.
        unsafe {
            std::env::set_var("TEST_SNOWFLAKE_EXPAND", "secret_value");
        }
        let result = expand_env_vars("password: ${TEST_SNOWFLAKE_EXPAND}");
        assert_eq!(result, "password: secret_value");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("TEST_SNOWFLAKE_EXPAND");
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
    }

    #[test]
    fn test_missing_field_messages() {
        assert_eq!(
            ConfigError::MissingCredentials.to_string(),
            "password OR private key path must be specified"
        );
        assert_eq!(
            ConfigError::MissingAccountName.to_string(),
            "account_name must be specified"
        );
    }
}
