//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use futures::stream;
use snowflake_exporter::collector::{
    Connection, ConnectionError, ConnectionProvider, Row, RowStream, queries,
};
use snowflake_exporter::config::SnowflakeConfig;
use snowflake_exporter::row;

/// Connection answering a fixed set of queries. Unknown queries fail.
#[derive(Debug, Default)]
pub struct StaticConnection {
    rows: HashMap<&'static str, Vec<Row>>,
    pub closes: AtomicUsize,
}

impl StaticConnection {
    pub fn with(mut self, sql: &'static str, rows: Vec<Row>) -> Self {
        self.rows.insert(sql, rows);
        self
    }

    /// One or two rows for every query of a scrape.
    pub fn healthy() -> Self {
        let table = || {
            row![
                "mock_table",
                "3",
                "mock_schema",
                "4",
                "mock_db",
                "1",
                "1028",
                "2048",
                "4096",
                "0"
            ]
        };

        Self::default()
            .with(queries::STORAGE, vec![row!["1028.0", "2048.0", "4096.0"]])
            .with(
                queries::DATABASE_STORAGE,
                vec![row!["mock_db", "1", "1028.0", "2048.0"]],
            )
            .with(
                queries::CREDITS,
                vec![row!["mock_service_type", "mock_service", "48", "0.5"]],
            )
            .with(
                queries::WAREHOUSE_CREDITS,
                vec![row!["mock_warehouse", "5", "56", "12"]],
            )
            .with(
                queries::LOGINS,
                vec![row!["mock_client_type", "1.0.0", "24", "216", "240"]],
            )
            .with(
                queries::WAREHOUSE_LOAD,
                vec![row!["mock_warehouse", "5", "8", "4", "2", "1"]],
            )
            .with(
                queries::AUTO_CLUSTERING,
                vec![row![
                    "mock_table",
                    "3",
                    "mock_schema",
                    "4",
                    "mock_db",
                    "1",
                    "12",
                    "2048",
                    "100"
                ]],
            )
            .with(queries::TABLE_STORAGE, vec![table()])
            .with(queries::TABLE_STORAGE_EXCLUDE_DELETED, vec![table()])
            .with(queries::DELETED_TABLES, vec![row!["12"]])
            .with(
                queries::REPLICATION,
                vec![row!["mock_db", "1", "10", "4096"]],
            )
    }
}

#[async_trait::async_trait]
impl Connection for StaticConnection {
    async fn query(&self, sql: &str) -> Result<RowStream, ConnectionError> {
        match self.rows.get(sql) {
            Some(rows) => Ok(stream::iter(rows.clone().into_iter().map(Ok)).boxed()),
            None => Err(ConnectionError::Query("object does not exist".to_string())),
        }
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Provider handing out the same connection on every open.
#[derive(Debug)]
pub struct StaticProvider {
    pub connection: Option<Arc<StaticConnection>>,
}

impl StaticProvider {
    pub fn new(connection: StaticConnection) -> Self {
        Self {
            connection: Some(Arc::new(connection)),
        }
    }

    /// Provider whose every open fails.
    pub fn unreachable() -> Self {
        Self { connection: None }
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for StaticProvider {
    async fn open(&self, _connection_string: &str) -> Result<Arc<dyn Connection>, ConnectionError> {
        match &self.connection {
            Some(connection) => Ok(connection.clone()),
            None => Err(ConnectionError::Auth("JWT token is invalid".to_string())),
        }
    }
}

/// Password-based config; connection strings build without touching disk.
pub fn snowflake_config() -> SnowflakeConfig {
    SnowflakeConfig {
        account_name: "xy12345".to_string(),
        username: "exporter".to_string(),
        password: Some("secret".to_string()),
        warehouse: "MONITOR_WH".to_string(),
        ..Default::default()
    }
}
