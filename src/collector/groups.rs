//! Metric groups: one fixed account-usage query each.
//!
//! - [`storage`]: account, database and table storage, deleted tables
//! - [`usage`]: credit consumption, auto-clustering, replication
//! - [`activity`]: logins and warehouse load

use std::sync::Arc;

use super::metric::{MetricDesc, Sample};
use super::row::{DecodeError, Value};
use super::traits::MetricGroup;

pub mod activity;
pub mod storage;
pub mod usage;

const LABEL_NAME: &str = "name";
const LABEL_ID: &str = "id";
const LABEL_DATABASE_ID: &str = "database_id";
const LABEL_DATABASE_NAME: &str = "database_name";
const LABEL_SERVICE_TYPE: &str = "service_type";
const LABEL_SERVICE: &str = "service";
const LABEL_CLIENT_TYPE: &str = "client_type";
const LABEL_CLIENT_VERSION: &str = "client_version";
const LABEL_TABLE_NAME: &str = "table_name";
const LABEL_TABLE_ID: &str = "table_id";
const LABEL_SCHEMA_NAME: &str = "schema_name";
const LABEL_SCHEMA_ID: &str = "schema_id";

const NAME_ID_LABELS: &[&str] = &[LABEL_NAME, LABEL_ID];
const TABLE_LABELS: &[&str] = &[
    LABEL_TABLE_NAME,
    LABEL_TABLE_ID,
    LABEL_SCHEMA_NAME,
    LABEL_SCHEMA_ID,
    LABEL_DATABASE_NAME,
    LABEL_DATABASE_ID,
];

/// Liveness of the whole scrape.
pub static UP: MetricDesc = MetricDesc {
    name: "snowflake_up",
    help: "Metric indicating the status of the exporter collection. 1 indicates that the connection to Snowflake was successful, and all available metrics were collected. 0 indicates that the exporter failed to collect 1 or more metrics, due to an inability to connect to Snowflake.",
    labels: &[],
};

/// Every description the exporter can emit, liveness last.
pub fn all_descriptors() -> Vec<&'static MetricDesc> {
    [
        storage::STORAGE.descriptors(),
        storage::DATABASE_STORAGE.descriptors(),
        usage::CREDITS.descriptors(),
        usage::WAREHOUSE_CREDITS.descriptors(),
        activity::LOGINS.descriptors(),
        activity::WAREHOUSE_LOAD.descriptors(),
        usage::AUTO_CLUSTERING.descriptors(),
        storage::TABLE_STORAGE.descriptors(),
        storage::DELETED_TABLES.descriptors(),
        usage::REPLICATION.descriptors(),
    ]
    .into_iter()
    .flatten()
    .copied()
    .chain(std::iter::once(&UP))
    .collect()
}

/// Groups queried on every scrape.
///
/// With `exclude_deleted`, table storage skips soft-deleted tables and the
/// deleted-table count is not collected.
pub fn scrape_groups(exclude_deleted: bool) -> Vec<Arc<dyn MetricGroup>> {
    let mut groups: Vec<Arc<dyn MetricGroup>> = vec![
        Arc::new(storage::STORAGE),
        Arc::new(storage::DATABASE_STORAGE),
        Arc::new(usage::CREDITS),
        Arc::new(usage::WAREHOUSE_CREDITS),
        Arc::new(activity::LOGINS),
        Arc::new(activity::WAREHOUSE_LOAD),
        Arc::new(usage::AUTO_CLUSTERING),
    ];

    if exclude_deleted {
        groups.push(Arc::new(storage::TABLE_STORAGE_EXCLUDING_DELETED));
    } else {
        groups.push(Arc::new(storage::TABLE_STORAGE));
        groups.push(Arc::new(storage::DELETED_TABLES));
    }

    groups.push(Arc::new(usage::REPLICATION));
    groups
}

/// Render label columns as label values.
fn label_values(columns: &[Value]) -> Vec<String> {
    columns.iter().map(Value::to_label).collect()
}

/// Push one sample per non-null numeric column.
///
/// `metrics` pairs each description with the index of its column in `row`;
/// every value is divided by `divisor`. Label values come from `labels`.
fn push_samples(
    samples: &mut Vec<Sample>,
    row: &[Value],
    metrics: &[(&'static MetricDesc, usize)],
    labels: &[Value],
    divisor: f64,
) -> Result<(), DecodeError> {
    // Decode every column first so a bad value rejects the whole row.
    let mut decoded = Vec::with_capacity(metrics.len());
    for &(desc, column) in metrics {
        if let Some(value) = row[column].as_f64(column)? {
            decoded.push((desc, value / divisor));
        }
    }

    for (desc, value) in decoded {
        samples.push(Sample::new(desc, value, label_values(labels)));
    }
    Ok(())
}
