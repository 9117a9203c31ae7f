//! Snowflake connection strings.
//!
//! Format: `user[:password]@<account>.snowflakecomputing.com:443?<params>`.
//! User, password and parameter values are query-escaped; the account is
//! written as given. Parameters are emitted sorted by key.

use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use crate::collector::ConnectionError;

/// Database holding the account usage views.
pub const DEFAULT_DATABASE: &str = "SNOWFLAKE";

/// Authenticator value selecting key-pair JWT auth.
pub const JWT_AUTHENTICATOR: &str = "SNOWFLAKE_JWT";

/// Host suffix appended to the account identifier.
pub const HOST_SUFFIX: &str = ".snowflakecomputing.com";

/// HTTPS port used for every account.
pub const DEFAULT_PORT: u16 = 443;

const TRACING_LEVEL: &str = "trace";

/// Parsed connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn {
    pub account: String,
    pub user: String,
    pub password: Option<String>,
    pub port: u16,
    pub database: String,
    pub role: String,
    pub warehouse: String,
    pub authenticator: Option<String>,
    /// Base64url PKCS#8 DER of the RSA private key.
    pub private_key: Option<String>,
    pub tracing: bool,
}

impl Dsn {
    /// Create a connection string for `account` and `user` with defaults.
    pub fn new(account: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
            password: None,
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            role: String::new(),
            warehouse: String::new(),
            authenticator: None,
            private_key: None,
            tracing: false,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = warehouse.into();
        self
    }

    /// Switch to key-pair auth with an encoded private key.
    pub fn with_private_key(mut self, encoded: impl Into<String>) -> Self {
        self.authenticator = Some(JWT_AUTHENTICATOR.to_string());
        self.private_key = Some(encoded.into());
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    /// Whether key-pair auth is selected.
    pub fn uses_key_pair(&self) -> bool {
        self.authenticator.as_deref() == Some(JWT_AUTHENTICATOR) && self.private_key.is_some()
    }

    /// Host name of the account endpoint.
    pub fn host(&self) -> String {
        format!("{}{}", self.account, HOST_SUFFIX)
    }

    fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(authenticator) = &self.authenticator {
            query.append_pair("authenticator", authenticator);
        }
        query.append_pair("database", &self.database);
        query.append_pair("ocspFailOpen", "true");
        if let Some(key) = &self.private_key {
            query.append_pair("privateKey", key);
        }
        query.append_pair("role", &self.role);
        if self.tracing {
            query.append_pair("tracing", TRACING_LEVEL);
        }
        query.append_pair("validateDefaultParameters", "true");
        query.append_pair("warehouse", &self.warehouse);
        query.finish()
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(&self.user))?;
        if let Some(password) = &self.password {
            write!(f, ":{}", escape(password))?;
        }
        write!(
            f,
            "@{}:{}?{}",
            self.host(),
            self.port,
            self.query_string()
        )
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("port", &self.port)
            .field("database", &self.database)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("authenticator", &self.authenticator)
            .field("tracing", &self.tracing)
            .finish_non_exhaustive()
    }
}

impl FromStr for Dsn {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (credentials, location) = s
            .rsplit_once('@')
            .ok_or_else(|| invalid("missing '@' between user and account"))?;

        let (user, password) = match credentials.split_once(':') {
            Some((user, password)) => (unescape(user), Some(unescape(password))),
            None => (unescape(credentials), None),
        };
        if user.is_empty() {
            return Err(invalid("user is empty"));
        }

        let (address, query) = location.split_once('?').unwrap_or((location, ""));
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid(&format!("invalid port '{port}'")))?;
                (host, port)
            }
            None => (address, DEFAULT_PORT),
        };
        let account = host.strip_suffix(HOST_SUFFIX).unwrap_or(host);
        if account.is_empty() {
            return Err(invalid("account is empty"));
        }

        let mut dsn = Dsn::new(account, user);
        dsn.password = password;
        dsn.port = port;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "authenticator" => dsn.authenticator = Some(value.into_owned()),
                "database" => dsn.database = value.into_owned(),
                "privateKey" => dsn.private_key = Some(value.into_owned()),
                "role" => dsn.role = value.into_owned(),
                "tracing" => dsn.tracing = value == TRACING_LEVEL,
                "warehouse" => dsn.warehouse = value.into_owned(),
                _ => {}
            }
        }

        Ok(dsn)
    }
}

fn escape(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn unescape(s: &str) -> String {
    form_urlencoded::parse(s.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

fn invalid(reason: &str) -> ConnectionError {
    ConnectionError::InvalidConnectionString(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_dsn() -> Dsn {
        Dsn::new("some-account", "some-user")
            .with_password("some-pass")
            .with_role("ACCOUNTADMIN")
            .with_warehouse("some-warehouse")
    }

    #[test]
    fn test_dsn_password() {
        assert_eq!(
            password_dsn().to_string(),
            "some-user:some-pass@some-account.snowflakecomputing.com:443?database=SNOWFLAKE&ocspFailOpen=true&role=ACCOUNTADMIN&validateDefaultParameters=true&warehouse=some-warehouse"
        );
    }

    #[test]
    fn test_dsn_tracing_sorted_in_place() {
        assert_eq!(
            password_dsn().with_tracing(true).to_string(),
            "some-user:some-pass@some-account.snowflakecomputing.com:443?database=SNOWFLAKE&ocspFailOpen=true&role=ACCOUNTADMIN&tracing=trace&validateDefaultParameters=true&warehouse=some-warehouse"
        );
    }

    #[test]
    fn test_dsn_escaping() {
        let dsn = Dsn::new("some%account", "some%user")
            .with_password("some pass")
            .with_role("ACCOUNTADMIN!")
            .with_warehouse("some!warehouse");

        assert_eq!(
            dsn.to_string(),
            "some%25user:some+pass@some%account.snowflakecomputing.com:443?database=SNOWFLAKE&ocspFailOpen=true&role=ACCOUNTADMIN%21&validateDefaultParameters=true&warehouse=some%21warehouse"
        );
    }

    #[test]
    fn test_dsn_private_key() {
        let dsn = Dsn::new("some-account", "some-user")
            .with_role("ACCOUNTADMIN")
            .with_warehouse("wh")
            .with_private_key("abc-_=");

        assert!(dsn.uses_key_pair());
        assert_eq!(
            dsn.to_string(),
            "some-user@some-account.snowflakecomputing.com:443?authenticator=SNOWFLAKE_JWT&database=SNOWFLAKE&ocspFailOpen=true&privateKey=abc-_%3D&role=ACCOUNTADMIN&validateDefaultParameters=true&warehouse=wh"
        );
    }

    #[test]
    fn test_dsn_parse() {
        let dsn: Dsn = "some%25user:some+pass@some%account.snowflakecomputing.com:443?database=SNOWFLAKE&ocspFailOpen=true&role=ACCOUNTADMIN%21&tracing=trace&validateDefaultParameters=true&warehouse=some%21warehouse"
            .parse()
            .unwrap();

        assert_eq!(dsn.account, "some%account");
        assert_eq!(dsn.user, "some%user");
        assert_eq!(dsn.password.as_deref(), Some("some pass"));
        assert_eq!(dsn.port, 443);
        assert_eq!(dsn.role, "ACCOUNTADMIN!");
        assert_eq!(dsn.warehouse, "some!warehouse");
        assert!(dsn.tracing);
        assert!(!dsn.uses_key_pair());
    }

    #[test]
    fn test_dsn_parse_private_key() {
        let original = Dsn::new("xy12345.us-east-2.aws", "svc")
            .with_role("R")
            .with_warehouse("W")
            .with_private_key("MIIE-_==");
        let parsed: Dsn = original.to_string().parse().unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_dsn_parse_invalid() {
        assert!(matches!(
            "no-at-sign".parse::<Dsn>(),
            Err(ConnectionError::InvalidConnectionString(_))
        ));
        assert!("@account.snowflakecomputing.com:443".parse::<Dsn>().is_err());
        assert!("user@account.snowflakecomputing.com:notaport".parse::<Dsn>().is_err());
        assert!("user@.snowflakecomputing.com:443".parse::<Dsn>().is_err());
    }

    #[test]
    fn test_dsn_debug_redacts_password() {
        let debug = format!("{:?}", password_dsn());
        assert!(!debug.contains("some-pass"));
        assert!(debug.contains("***"));
    }
}
