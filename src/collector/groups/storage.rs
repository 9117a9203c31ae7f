//! Storage groups.

use super::{NAME_ID_LABELS, TABLE_LABELS, push_samples};
use crate::collector::metric::{MetricDesc, Sample};
use crate::collector::queries;
use crate::collector::row::{DecodeError, Row};
use crate::collector::traits::{MetricGroup, RowPolicy};

pub static STORAGE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_storage_bytes",
    help: "Number of bytes of table storage used, including bytes for data currently in Time Travel.",
    labels: &[],
};

pub static STAGE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_stage_bytes",
    help: "Number of bytes of stage storage used by files in all internal stages (named, table, and user).",
    labels: &[],
};

pub static FAILSAFE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_failsafe_bytes",
    help: "Number of bytes of data in Fail-safe.",
    labels: &[],
};

pub static DATABASE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_database_bytes",
    help: "Average number of bytes of database storage used, including data in Time Travel.",
    labels: NAME_ID_LABELS,
};

pub static DATABASE_FAILSAFE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_database_failsafe_bytes",
    help: "Average number of bytes of Fail-safe storage used.",
    labels: NAME_ID_LABELS,
};

pub static TABLE_ACTIVE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_table_active_bytes",
    help: "Sum of active bytes owned by the table.",
    labels: TABLE_LABELS,
};

pub static TABLE_TIME_TRAVEL_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_table_time_travel_bytes",
    help: "Sum of bytes in Time Travel state owned by the table.",
    labels: TABLE_LABELS,
};

pub static TABLE_FAILSAFE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_table_failsafe_bytes",
    help: "Sum of bytes in Fail-Safe state owned by the table.",
    labels: TABLE_LABELS,
};

pub static TABLE_CLONE_BYTES: MetricDesc = MetricDesc {
    name: "snowflake_table_clone_bytes",
    help: "Sum of bytes owned by the table that are retained after deletion because they are referenced by one or more clones.",
    labels: TABLE_LABELS,
};

pub static TABLE_DELETED_TABLES: MetricDesc = MetricDesc {
    name: "snowflake_table_deleted_tables",
    help: "Number of tables that have been purged from storage.",
    labels: &[],
};

/// Account-wide storage from the most recent usage date.
#[derive(Debug, Clone, Copy)]
pub struct StorageGroup;

pub const STORAGE: StorageGroup = StorageGroup;

impl MetricGroup for StorageGroup {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn query(&self) -> &'static str {
        queries::STORAGE
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[&STORAGE_BYTES, &STAGE_BYTES, &FAILSAFE_BYTES];
        DESCRIPTORS
    }

    fn row_policy(&self) -> RowPolicy {
        RowPolicy::ExactlyOne
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<3>()?;
        push_samples(
            samples,
            columns,
            &[(&STORAGE_BYTES, 0), (&STAGE_BYTES, 1), (&FAILSAFE_BYTES, 2)],
            &[],
            1.0,
        )
    }
}

/// Per-database storage.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseStorageGroup;

pub const DATABASE_STORAGE: DatabaseStorageGroup = DatabaseStorageGroup;

impl MetricGroup for DatabaseStorageGroup {
    fn name(&self) -> &'static str {
        "database storage"
    }

    fn query(&self) -> &'static str {
        queries::DATABASE_STORAGE
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[&DATABASE_BYTES, &DATABASE_FAILSAFE_BYTES];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<4>()?;
        push_samples(
            samples,
            columns,
            &[(&DATABASE_BYTES, 2), (&DATABASE_FAILSAFE_BYTES, 3)],
            &columns[..2],
            1.0,
        )
    }
}

/// Per-table storage, optionally skipping soft-deleted tables.
#[derive(Debug, Clone, Copy)]
pub struct TableStorageGroup {
    exclude_deleted: bool,
}

pub const TABLE_STORAGE: TableStorageGroup = TableStorageGroup {
    exclude_deleted: false,
};

pub const TABLE_STORAGE_EXCLUDING_DELETED: TableStorageGroup = TableStorageGroup {
    exclude_deleted: true,
};

impl MetricGroup for TableStorageGroup {
    fn name(&self) -> &'static str {
        "table storage"
    }

    fn query(&self) -> &'static str {
        if self.exclude_deleted {
            queries::TABLE_STORAGE_EXCLUDE_DELETED
        } else {
            queries::TABLE_STORAGE
        }
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &TABLE_ACTIVE_BYTES,
            &TABLE_TIME_TRAVEL_BYTES,
            &TABLE_FAILSAFE_BYTES,
            &TABLE_CLONE_BYTES,
        ];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<10>()?;
        push_samples(
            samples,
            columns,
            &[
                (&TABLE_ACTIVE_BYTES, 6),
                (&TABLE_TIME_TRAVEL_BYTES, 7),
                (&TABLE_FAILSAFE_BYTES, 8),
                (&TABLE_CLONE_BYTES, 9),
            ],
            &columns[..6],
            1.0,
        )
    }
}

/// Count of tables purged from storage.
#[derive(Debug, Clone, Copy)]
pub struct DeletedTablesGroup;

pub const DELETED_TABLES: DeletedTablesGroup = DeletedTablesGroup;

impl MetricGroup for DeletedTablesGroup {
    fn name(&self) -> &'static str {
        "deleted tables"
    }

    fn query(&self) -> &'static str {
        queries::DELETED_TABLES
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[&TABLE_DELETED_TABLES];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<1>()?;
        push_samples(samples, columns, &[(&TABLE_DELETED_TABLES, 0)], &[], 1.0)
    }
}
