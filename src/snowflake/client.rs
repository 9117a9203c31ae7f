//! Connections over the Snowflake SQL REST API (`/api/v2/statements`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use super::auth::{KeyPairAuth, decode_private_key};
use super::dsn::Dsn;
use crate::collector::{Connection, ConnectionError, ConnectionProvider, Row, RowStream, Value};

/// Default per-statement timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between status polls of a running statement.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Extra HTTP timeout on top of the statement timeout.
const HTTP_GRACE: Duration = Duration::from_secs(30);

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const KEYPAIR_JWT: &str = "KEYPAIR_JWT";

/// Opens [`SqlApiConnection`]s from connection strings.
#[derive(Debug, Clone)]
pub struct SqlApiProvider {
    http: Client,
    query_timeout: Duration,
}

impl SqlApiProvider {
    pub fn new(query_timeout: Duration) -> Result<Self, ConnectionError> {
        let http = Client::builder()
            .user_agent(concat!("snowflake-exporter/", env!("CARGO_PKG_VERSION")))
            .timeout(query_timeout + HTTP_GRACE)
            .build()?;

        Ok(Self {
            http,
            query_timeout,
        })
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for SqlApiProvider {
    /// Parse the connection string and prepare auth. No network I/O happens
    /// until the first query.
    async fn open(&self, connection_string: &str) -> Result<Arc<dyn Connection>, ConnectionError> {
        let dsn: Dsn = connection_string.parse()?;

        let encoded = match (&dsn.private_key, dsn.uses_key_pair()) {
            (Some(encoded), true) => encoded,
            _ => {
                return Err(ConnectionError::Auth(
                    "the SQL API requires key-pair authentication; configure a private key"
                        .to_string(),
                ));
            }
        };
        let key = decode_private_key(encoded)?;
        let auth = KeyPairAuth::new(&dsn.account, &dsn.user, &key)?;

        tracing::debug!(account = %dsn.account, user = %dsn.user, "Opened SQL API connection");

        Ok(Arc::new(SqlApiConnection {
            http: self.http.clone(),
            base_url: format!("https://{}:{}", dsn.host(), dsn.port),
            auth,
            database: dsn.database,
            warehouse: dsn.warehouse,
            role: dsn.role,
            timeout: self.query_timeout,
            trace: dsn.tracing,
            closed: AtomicBool::new(false),
        }))
    }
}

/// One logical connection. The SQL API is sessionless, so this only holds
/// auth and statement context.
pub struct SqlApiConnection {
    http: Client,
    base_url: String,
    auth: KeyPairAuth,
    database: String,
    warehouse: String,
    role: String,
    timeout: Duration,
    trace: bool,
    closed: AtomicBool,
}

impl std::fmt::Debug for SqlApiConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlApiConnection")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    database: &'a str,
    warehouse: &'a str,
    role: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    code: Option<String>,
    message: Option<String>,
    statement_handle: Option<String>,
    statement_status_url: Option<String>,
    #[serde(rename = "resultSetMetaData")]
    metadata: Option<ResultSetMetadata>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetadata {
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Deserialize)]
struct PartitionInfo {}

#[derive(Debug, Deserialize)]
struct PartitionResponse {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

/// Interpreted statement response.
#[derive(Debug, PartialEq)]
enum Outcome {
    /// Still running; poll the status URL.
    Pending(String),
    /// Finished with the first partition's rows.
    Complete {
        handle: String,
        partitions: usize,
        rows: Vec<Row>,
    },
}

fn to_rows(data: Vec<Vec<Option<String>>>) -> Vec<Row> {
    data.into_iter()
        .map(|values| values.into_iter().map(Value::from).collect())
        .collect()
}

fn api_error(status: StatusCode, body: &str) -> ConnectionError {
    match serde_json::from_str::<StatementResponse>(body) {
        Ok(StatementResponse {
            code: Some(code),
            message,
            ..
        }) => ConnectionError::Api {
            code,
            message: message.unwrap_or_default(),
        },
        _ => ConnectionError::Api {
            code: status.as_u16().to_string(),
            message: body.trim().to_string(),
        },
    }
}

/// Map an HTTP status and body to a statement outcome.
fn interpret(status: StatusCode, body: &str, timeout: Duration) -> Result<Outcome, ConnectionError> {
    match status {
        StatusCode::OK => {
            let response: StatementResponse = serde_json::from_str(body)
                .map_err(|e| ConnectionError::Row(format!("malformed result set: {e}")))?;
            let partitions = response
                .metadata
                .map_or(1, |m| m.partition_info.len().max(1));
            Ok(Outcome::Complete {
                handle: response.statement_handle.unwrap_or_default(),
                partitions,
                rows: to_rows(response.data),
            })
        }
        StatusCode::ACCEPTED => {
            let response: StatementResponse = serde_json::from_str(body).unwrap_or_default();
            let url = response
                .statement_status_url
                .or_else(|| {
                    response
                        .statement_handle
                        .map(|handle| format!("/api/v2/statements/{handle}"))
                })
                .ok_or_else(|| {
                    ConnectionError::Query("statement accepted without a status URL".to_string())
                })?;
            Ok(Outcome::Pending(url))
        }
        StatusCode::REQUEST_TIMEOUT => Err(ConnectionError::Timeout(timeout)),
        _ => Err(api_error(status, body)),
    }
}

impl SqlApiConnection {
    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header(TOKEN_TYPE_HEADER, KEYPAIR_JWT)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn exchange(&self, request: RequestBuilder) -> Result<Outcome, ConnectionError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if self.trace {
            tracing::debug!(status = status.as_u16(), body = %body, "SQL API response");
        }
        interpret(status, &body, self.timeout)
    }
}

#[async_trait::async_trait]
impl Connection for SqlApiConnection {
    async fn query(&self, sql: &str) -> Result<RowStream, ConnectionError> {
        self.ensure_open()?;
        let token = self.auth.token()?;
        let url = format!(
            "{}/api/v2/statements?requestId={}",
            self.base_url,
            Uuid::new_v4()
        );
        if self.trace {
            tracing::debug!(url = %url, statement = %sql, "SQL API request");
        }

        let body = StatementRequest {
            statement: sql,
            timeout: self.timeout.as_secs(),
            database: &self.database,
            warehouse: &self.warehouse,
            role: &self.role,
        };
        let mut outcome = self
            .exchange(self.authorized(self.http.post(&url), &token).json(&body))
            .await?;

        let deadline = Instant::now() + self.timeout;
        let (handle, partitions, rows) = loop {
            match outcome {
                Outcome::Complete {
                    handle,
                    partitions,
                    rows,
                } => break (handle, partitions, rows),
                Outcome::Pending(status_url) => {
                    if Instant::now() >= deadline {
                        return Err(ConnectionError::Timeout(self.timeout));
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                    self.ensure_open()?;
                    let url = format!("{}{}", self.base_url, status_url);
                    outcome = self
                        .exchange(self.authorized(self.http.get(&url), &token))
                        .await?;
                }
            }
        };

        let fetcher = PartitionFetcher {
            http: self.http.clone(),
            url: format!("{}/api/v2/statements/{}", self.base_url, handle),
            token,
            trace: self.trace,
        };

        let first = stream::iter(rows.into_iter().map(Ok::<Row, ConnectionError>));
        let rest = stream::iter(1..partitions)
            .then(move |partition| {
                let fetcher = fetcher.clone();
                async move { fetcher.fetch(partition).await }
            })
            .flat_map(|result| match result {
                Ok(rows) => stream::iter(rows.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(async move { Err::<Row, _>(e) }).right_stream(),
            });

        Ok(first.chain(rest).boxed())
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(base_url = %self.base_url, "Closed SQL API connection");
        }
        Ok(())
    }
}

/// Fetches the remaining result partitions of a finished statement.
#[derive(Clone)]
struct PartitionFetcher {
    http: Client,
    url: String,
    token: String,
    trace: bool,
}

impl PartitionFetcher {
    async fn fetch(&self, partition: usize) -> Result<Vec<Row>, ConnectionError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("partition", partition)])
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, KEYPAIR_JWT)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if self.trace {
            tracing::debug!(partition, status = status.as_u16(), "SQL API partition");
        }
        if status != StatusCode::OK {
            return Err(api_error(status, &body));
        }

        let response: PartitionResponse = serde_json::from_str(&body)
            .map_err(|e| ConnectionError::Row(format!("malformed partition {partition}: {e}")))?;
        Ok(to_rows(response.data))
    }
}
