//! Snowflake Exporter - Prometheus metrics for Snowflake account usage
//!
//! This crate scrapes the `SNOWFLAKE.ACCOUNT_USAGE` views and republishes
//! storage, credit, login, warehouse load and replication figures as
//! Prometheus gauges. It can be used as a library, or run as a standalone
//! binary with the `snowflake-exporter` executable.
//!
//! # Architecture
//!
//! - **Collector**: concurrent per-group scrape engine with `snowflake_up` liveness
//! - **Snowflake**: connection strings, key-pair auth and the SQL REST API client
//! - **Config**: YAML + env configuration and validation
//! - **Exposition**: Prometheus text format rendering
//! - **Server**: Axum HTTP surface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use snowflake_exporter::{AppConfig, AppState, SnowflakeCollector, create_router};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("configs/config.yaml")?;
//! config.validate()?;
//! config.snowflake.require_key_pair()?;
//!
//! let state = AppState {
//!     collector: Arc::new(SnowflakeCollector::new(config.snowflake)?),
//!     registry: snowflake_exporter::exposition::build_info_registry()?,
//!     telemetry_path: config.server.telemetry_path,
//! };
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9975").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod exposition;
pub mod server;
pub mod snowflake;

pub use collector::{Collector, CollectorError, ConnectionError, Sample, SnowflakeCollector};
pub use config::{AppConfig, ConfigError, SnowflakeConfig};
pub use server::{AppState, create_router};
