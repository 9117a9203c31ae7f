//! Scripted in-memory connections for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::stream;

use super::connection::{Connection, ConnectionError, ConnectionProvider, RowStream};
use super::row::Row;

/// Canned reply for one query.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<Row>),
    /// Yield the rows, then fail iteration.
    RowsThenError(Vec<Row>, String),
    QueryError(String),
}

/// Replays canned replies keyed by SQL text and records usage.
#[derive(Debug, Default)]
pub struct MockConnection {
    replies: HashMap<String, Reply>,
    queries: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.replies.insert(sql.to_string(), Reply::Rows(rows));
        self
    }

    pub fn with_row_error(mut self, sql: &str, rows: Vec<Row>, message: &str) -> Self {
        self.replies
            .insert(sql.to_string(), Reply::RowsThenError(rows, message.to_string()));
        self
    }

    pub fn with_query_error(mut self, sql: &str, message: &str) -> Self {
        self.replies
            .insert(sql.to_string(), Reply::QueryError(message.to_string()));
        self
    }

    /// Queries issued so far, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn query(&self, sql: &str) -> Result<RowStream, ConnectionError> {
        self.queries.lock().unwrap().push(sql.to_string());
        if self.close_count() > 0 {
            return Err(ConnectionError::Closed);
        }

        match self.replies.get(sql).cloned() {
            Some(Reply::Rows(rows)) => Ok(stream::iter(rows.into_iter().map(Ok)).boxed()),
            Some(Reply::RowsThenError(rows, message)) => Ok(stream::iter(
                rows.into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(ConnectionError::Row(message)))),
            )
            .boxed()),
            Some(Reply::QueryError(message)) => Err(ConnectionError::Query(message)),
            None => Err(ConnectionError::Query(format!("unexpected query: {sql}"))),
        }
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out scripted connections in order, one per `open`.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<Arc<MockConnection>, String>>>,
    opened: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(self, connection: Arc<MockConnection>) -> Self {
        self.script.lock().unwrap().push_back(Ok(connection));
        self
    }

    pub fn with_open_error(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Connection strings passed to `open`.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for MockProvider {
    async fn open(&self, connection_string: &str) -> Result<Arc<dyn Connection>, ConnectionError> {
        self.opened
            .lock()
            .unwrap()
            .push(connection_string.to_string());

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(connection)) => Ok(connection),
            Some(Err(message)) => Err(ConnectionError::Auth(message)),
            None => Err(ConnectionError::Query("no scripted connection".to_string())),
        }
    }
}
