//! Collector Layer
//!
//! Scrapes Snowflake account usage views into Prometheus samples. Every
//! scrape opens one connection, runs each metric group on its own Tokio task
//! and reports overall success through `snowflake_up`.
//!
//! # Architecture
//!
//! - [`Collector`]: describe/collect trait implemented by scrape sources
//! - [`SnowflakeCollector`]: the concurrent multi-query engine
//! - [`MetricGroup`]: one fixed query and its row decoder
//! - [`ConnectionProvider`]: opens connections; swapped for a mock in tests
//!
//! # Example
//!
//! ```rust,no_run
//! use snowflake_exporter::collector::{SnowflakeCollector, gather};
//! use snowflake_exporter::config::SnowflakeConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SnowflakeConfig {
//!     account_name: "xy12345".to_string(),
//!     username: "exporter".to_string(),
//!     private_key_path: Some("/etc/snowflake/rsa_key.p8".to_string()),
//!     warehouse: "MONITOR_WH".to_string(),
//!     ..Default::default()
//! };
//! let collector = SnowflakeCollector::new(config)?;
//! for sample in gather(&collector).await {
//!     println!("{} {}", sample.desc().name, sample.value());
//! }
//! # Ok(())
//! # }
//! ```

mod connection;
mod engine;
pub mod groups;
mod metric;
pub mod queries;
mod row;
mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use connection::{Connection, ConnectionError, ConnectionProvider, RowStream};
pub use engine::SnowflakeCollector;
pub use metric::{MetricDesc, MetricKind, Sample, SampleSink};
pub use row::{DecodeError, Row, Value};
pub use traits::{Collector, CollectorError, MetricGroup, RowPolicy, gather};
