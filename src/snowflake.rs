//! Snowflake connectivity.
//!
//! - [`dsn`]: connection string codec
//! - [`auth`]: private key loading and key-pair JWTs
//! - [`client`]: [`SqlApiProvider`], the production [`ConnectionProvider`]
//!
//! [`ConnectionProvider`]: crate::collector::ConnectionProvider

pub mod auth;
pub mod client;
pub mod dsn;

pub use auth::{KeyPairAuth, encode_private_key, load_private_key};
pub use client::{DEFAULT_QUERY_TIMEOUT, SqlApiConnection, SqlApiProvider};
pub use dsn::Dsn;
