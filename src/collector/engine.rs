//! Concurrent scrape of every metric group over one connection.
//!
//! Each scrape opens a fresh connection, runs all groups as independent
//! tasks, forwards each group's samples only if the whole group succeeded,
//! and finishes with `snowflake_up`: 1 if everything succeeded, else 0.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::StreamExt;
use tokio::task::JoinSet;

use super::connection::{Connection, ConnectionError, ConnectionProvider};
use super::groups::{UP, all_descriptors, scrape_groups};
use super::metric::{MetricDesc, Sample, SampleSink};
use super::traits::{Collector, CollectorError, MetricGroup, RowPolicy};
use crate::config::SnowflakeConfig;
use crate::snowflake::SqlApiProvider;

/// Collector for Snowflake account usage metrics.
pub struct SnowflakeCollector {
    config: SnowflakeConfig,
    provider: Arc<dyn ConnectionProvider>,
    groups: Vec<Arc<dyn MetricGroup>>,
}

impl SnowflakeCollector {
    /// Create a collector backed by the SQL API.
    pub fn new(config: SnowflakeConfig) -> Result<Self, ConnectionError> {
        let provider = SqlApiProvider::new(config.query_timeout)?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Create a collector that opens connections through `provider`.
    pub fn with_provider(config: SnowflakeConfig, provider: Arc<dyn ConnectionProvider>) -> Self {
        let groups = scrape_groups(config.exclude_deleted_tables);
        Self {
            config,
            provider,
            groups,
        }
    }

    #[cfg(test)]
    fn with_groups(mut self, groups: Vec<Arc<dyn MetricGroup>>) -> Self {
        self.groups = groups;
        self
    }
}

impl std::fmt::Debug for SnowflakeCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeCollector")
            .field("config", &self.config)
            .field(
                "groups",
                &self.groups.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for SnowflakeCollector {
    fn describe(&self) -> Vec<&'static MetricDesc> {
        all_descriptors()
    }

    async fn collect(&self, sink: &SampleSink) {
        let start = Instant::now();
        tracing::debug!("Collecting metrics");

        let connection_string = match self.config.connection_string() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate connection string");
                emit_up(sink, false);
                return;
            }
        };

        let connection = match self.provider.open(&connection_string).await {
            Ok(connection) => ConnectionGuard::new(connection),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Snowflake");
                emit_up(sink, false);
                return;
            }
        };

        let health = ScrapeHealth::default();
        let mut tasks = JoinSet::new();
        for group in &self.groups {
            let group = Arc::clone(group);
            let connection = connection.get();
            let sink = sink.clone();
            let health = health.clone();

            tasks.spawn(async move {
                let name = group.name();
                match run_group(group.as_ref(), connection.as_ref()).await {
                    Ok(samples) => {
                        for sample in samples {
                            if sink.send(sample).is_err() {
                                tracing::debug!(group = name, "Sample sink closed");
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(group = name, error = %e, "Failed to collect metrics");
                        health.mark_failed();
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                let err = CollectorError::Aborted(e.to_string());
                tracing::error!(error = %err, "Collection task failed");
                health.mark_failed();
            }
        }

        emit_up(sink, health.is_up());
        connection.release().await;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            up = health.is_up(),
            "Finished collecting metrics"
        );
    }
}

/// Query one group and decode every row.
///
/// Samples are returned only when the query, every row, and the row-count
/// constraint all succeed.
async fn run_group(
    group: &dyn MetricGroup,
    connection: &dyn Connection,
) -> Result<Vec<Sample>, CollectorError> {
    let name = group.name();
    let start = Instant::now();
    tracing::debug!(group = name, "Collecting group");

    let mut rows = connection.query(group.query()).await?;
    tracing::debug!(group = name, "Done querying group");

    let mut samples = Vec::new();
    let mut row_count = 0usize;
    while let Some(row) = rows.next().await {
        let row = row?;
        row_count += 1;
        group.decode(&row, &mut samples)?;
    }

    if group.row_policy() == RowPolicy::ExactlyOne {
        match row_count {
            0 => return Err(CollectorError::NoData),
            1 => {}
            n => return Err(CollectorError::UnexpectedRows(n)),
        }
    }

    tracing::debug!(
        group = name,
        rows = row_count,
        samples = samples.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Finished collecting group"
    );
    Ok(samples)
}

fn emit_up(sink: &SampleSink, up: bool) {
    let value = if up { 1.0 } else { 0.0 };
    if sink.send(Sample::new(&UP, value, Vec::new())).is_err() {
        tracing::debug!("Sample sink closed before liveness was reported");
    }
}

/// Liveness flag shared by the tasks of one scrape. Only ever goes 1 -> 0.
#[derive(Debug, Clone)]
struct ScrapeHealth(Arc<AtomicBool>);

impl Default for ScrapeHealth {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl ScrapeHealth {
    fn mark_failed(&self) {
        self.0.store(false, Ordering::Release);
    }

    fn is_up(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Closes the scrape's connection exactly once.
///
/// [`release`](Self::release) closes it after all tasks finish. If the
/// scrape is dropped first, `Drop` schedules the close on the runtime.
struct ConnectionGuard {
    connection: Arc<dyn Connection>,
    released: bool,
}

impl ConnectionGuard {
    fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            released: false,
        }
    }

    fn get(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.connection)
    }

    async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.connection.close().await {
            tracing::warn!(error = %e, "Failed to close connection");
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let connection = Arc::clone(&self.connection);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = connection.close().await {
                        tracing::warn!(error = %e, "Failed to close abandoned connection");
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime to close abandoned connection"),
        }
    }
}
