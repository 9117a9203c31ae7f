//! Database connection seam used by the collection engine.
//!
//! The engine only needs to open a connection from a connection string, run
//! parameterless queries on it, and close it. [`ConnectionProvider`] is the
//! injection point: production uses the Snowflake SQL API provider, tests use
//! a scripted in-memory one.

use std::sync::Arc;

use futures::stream::BoxStream;
use thiserror::Error;

use super::row::Row;

/// Stream of result rows. An `Err` item fails the query that produced it.
pub type RowStream = BoxStream<'static, Result<Row, ConnectionError>>;

/// Errors raised while opening or using a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Authentication material is missing, malformed, or unsupported.
    #[error("authentication error: {0}")]
    Auth(String),

    /// HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the statement.
    #[error("query failed [{code}]: {message}")]
    Api { code: String, message: String },

    /// The statement did not finish within its timeout.
    #[error("query timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Reading a result row failed.
    #[error("row error: {0}")]
    Row(String),

    /// Any other query failure.
    #[error("query error: {0}")]
    Query(String),

    /// Connection was used after `close()`.
    #[error("connection is closed")]
    Closed,
}

/// A live database connection shared by the tasks of one scrape.
#[async_trait::async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Execute `sql` and return its rows.
    async fn query(&self, sql: &str) -> Result<RowStream, ConnectionError>;

    /// Release the connection. Further queries fail with [`ConnectionError::Closed`].
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Opens connections from a connection string.
#[async_trait::async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Open a live connection, or fail.
    async fn open(&self, connection_string: &str) -> Result<Arc<dyn Connection>, ConnectionError>;
}
