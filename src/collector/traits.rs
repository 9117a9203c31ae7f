//! Core collector traits and types.

use thiserror::Error;
use tokio::sync::mpsc;

use super::connection::ConnectionError;
use super::metric::{MetricDesc, Sample, SampleSink};
use super::row::{DecodeError, Row};

/// Errors that fail one metric group of a scrape.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Query execution or row iteration failed.
    #[error("failed to query metrics: {0}")]
    Connection(#[from] ConnectionError),

    /// A row could not be decoded.
    #[error("failed to scan row: {0}")]
    Decode(#[from] DecodeError),

    /// A single-row query returned nothing.
    #[error("expected a single row to be returned, but none was found")]
    NoData,

    /// A single-row query returned more than one row.
    #[error("expected a single row to be returned, but got {0}")]
    UnexpectedRows(usize),

    /// The group task panicked or was cancelled.
    #[error("collection task aborted: {0}")]
    Aborted(String),
}

/// How many rows a group's query is allowed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Zero or more rows.
    #[default]
    Any,
    /// Exactly one row; zero or several is a failure.
    ExactlyOne,
}

/// One fixed query and the samples decoded from each of its rows.
///
/// Groups hold no mutable state; the engine runs each on its own task.
pub trait MetricGroup: Send + Sync + 'static {
    /// Short name used in logs (e.g. "warehouse load").
    fn name(&self) -> &'static str;

    /// SQL text issued against the account usage views.
    fn query(&self) -> &'static str;

    /// Every description this group can emit.
    fn descriptors(&self) -> &'static [&'static MetricDesc];

    /// Row-count constraint on the result.
    fn row_policy(&self) -> RowPolicy {
        RowPolicy::Any
    }

    /// Decode one row, pushing a sample for each non-null numeric column.
    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError>;
}

/// A source of metric samples in the describe/collect style of Prometheus
/// collectors.
///
/// # Error Handling Philosophy
///
/// `collect()` has no error return. Failures are logged and folded into the
/// samples it emits (typically a liveness gauge), so a scrape always yields
/// some output.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Every description this collector can emit, whether or not the next
    /// scrape produces data for it.
    fn describe(&self) -> Vec<&'static MetricDesc>;

    /// Perform one scrape, pushing samples into `sink`.
    async fn collect(&self, sink: &SampleSink);
}

/// Run one scrape and return its samples in emission order.
pub async fn gather(collector: &dyn Collector) -> Vec<Sample> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    collector.collect(&tx).await;
    drop(tx);

    let mut samples = Vec::new();
    while let Some(sample) = rx.recv().await {
        samples.push(sample);
    }
    samples
}
