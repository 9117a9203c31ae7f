//! Credit consumption groups.

use super::{
    LABEL_DATABASE_ID, LABEL_DATABASE_NAME, LABEL_SERVICE, LABEL_SERVICE_TYPE, NAME_ID_LABELS,
    TABLE_LABELS, push_samples,
};
use crate::collector::metric::{MetricDesc, Sample};
use crate::collector::queries;
use crate::collector::row::{DecodeError, Row};
use crate::collector::traits::MetricGroup;

const SERVICE_LABELS: &[&str] = &[LABEL_SERVICE_TYPE, LABEL_SERVICE];
const DATABASE_LABELS: &[&str] = &[LABEL_DATABASE_NAME, LABEL_DATABASE_ID];

pub static USED_COMPUTE_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_used_compute_credits",
    help: "Average overall credits billed per hour for virtual warehouses over the last 24 hours.",
    labels: SERVICE_LABELS,
};

pub static USED_CLOUD_SERVICES_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_used_cloud_services_credits",
    help: "Average overall credits billed per hour for cloud services over the last 24 hours.",
    labels: SERVICE_LABELS,
};

pub static WAREHOUSE_USED_COMPUTE_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_used_compute_credits",
    help: "Average overall credits billed per hour for the warehouse over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

pub static WAREHOUSE_USED_CLOUD_SERVICE_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_used_cloud_service_credits",
    help: "Average overall credits billed per hour for cloud services for the warehouse over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

pub static AUTO_CLUSTERING_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_auto_clustering_credits",
    help: "Sum of the number of credits billed for automatic reclustering over the last 24 hours.",
    labels: TABLE_LABELS,
};

pub static AUTO_CLUSTERING_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_auto_clustering_bytes",
    help: "Sum of the number of bytes reclustered during automatic reclustering over the last 24 hours.",
    labels: TABLE_LABELS,
};

pub static AUTO_CLUSTERING_ROWS: MetricDesc = MetricDesc {
    name: "snowflake_auto_clustering_rows",
    help: "Sum of the number of rows clustered during automatic reclustering over the last 24 hours.",
    labels: TABLE_LABELS,
};

pub static REPLICATION_USED_CREDITS: MetricDesc = MetricDesc {
    name: "snowflake_db_replication_used_credits",
    help: "Sum of the number of credits used for database replication over the last 24 hours.",
    labels: DATABASE_LABELS,
};

pub static REPLICATION_TRANSFERRED_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_db_replication_transferred_bytes",
    help: "Sum of the number of transferred bytes for database replication over the last 24 hours.",
    labels: DATABASE_LABELS,
};

/// Hourly credit averages per service.
#[derive(Debug, Clone, Copy)]
pub struct CreditsGroup;

pub const CREDITS: CreditsGroup = CreditsGroup;

impl MetricGroup for CreditsGroup {
    fn name(&self) -> &'static str {
        "service credits"
    }

    fn query(&self) -> &'static str {
        queries::CREDITS
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[&USED_COMPUTE_CREDITS, &USED_CLOUD_SERVICES_CREDITS];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<4>()?;
        push_samples(
            samples,
            columns,
            &[(&USED_COMPUTE_CREDITS, 2), (&USED_CLOUD_SERVICES_CREDITS, 3)],
            &columns[..2],
            1.0,
        )
    }
}

/// Hourly credit averages per warehouse.
#[derive(Debug, Clone, Copy)]
pub struct WarehouseCreditsGroup;

pub const WAREHOUSE_CREDITS: WarehouseCreditsGroup = WarehouseCreditsGroup;

impl MetricGroup for WarehouseCreditsGroup {
    fn name(&self) -> &'static str {
        "warehouse credits"
    }

    fn query(&self) -> &'static str {
        queries::WAREHOUSE_CREDITS
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &WAREHOUSE_USED_COMPUTE_CREDITS,
            &WAREHOUSE_USED_CLOUD_SERVICE_CREDITS,
        ];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<4>()?;
        push_samples(
            samples,
            columns,
            &[
                (&WAREHOUSE_USED_COMPUTE_CREDITS, 2),
                (&WAREHOUSE_USED_CLOUD_SERVICE_CREDITS, 3),
            ],
            &columns[..2],
            1.0,
        )
    }
}

/// Automatic reclustering totals per table.
#[derive(Debug, Clone, Copy)]
pub struct AutoClusteringGroup;

pub const AUTO_CLUSTERING: AutoClusteringGroup = AutoClusteringGroup;

impl MetricGroup for AutoClusteringGroup {
    fn name(&self) -> &'static str {
        "auto-clustering"
    }

    fn query(&self) -> &'static str {
        queries::AUTO_CLUSTERING
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &AUTO_CLUSTERING_CREDITS,
            &AUTO_CLUSTERING_BYTES,
            &AUTO_CLUSTERING_ROWS,
        ];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<9>()?;
        push_samples(
            samples,
            columns,
            &[
                (&AUTO_CLUSTERING_CREDITS, 6),
                (&AUTO_CLUSTERING_BYTES, 7),
                (&AUTO_CLUSTERING_ROWS, 8),
            ],
            &columns[..6],
            1.0,
        )
    }
}

/// Database replication totals.
#[derive(Debug, Clone, Copy)]
pub struct ReplicationGroup;

pub const REPLICATION: ReplicationGroup = ReplicationGroup;

impl MetricGroup for ReplicationGroup {
    fn name(&self) -> &'static str {
        "replication"
    }

    fn query(&self) -> &'static str {
        queries::REPLICATION
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &REPLICATION_USED_CREDITS,
            &REPLICATION_TRANSFERRED_BYTES,
        ];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<4>()?;
        push_samples(
            samples,
            columns,
            &[
                (&REPLICATION_USED_CREDITS, 2),
                (&REPLICATION_TRANSFERRED_BYTES, 3),
            ],
            &columns[..2],
            1.0,
        )
    }
}
