//! Login and warehouse load groups.

use super::{LABEL_CLIENT_TYPE, LABEL_CLIENT_VERSION, NAME_ID_LABELS, push_samples};
use crate::collector::metric::{MetricDesc, Sample};
use crate::collector::queries;
use crate::collector::row::{DecodeError, Row};
use crate::collector::traits::MetricGroup;

const CLIENT_LABELS: &[&str] = &[LABEL_CLIENT_TYPE, LABEL_CLIENT_VERSION];

/// Login counts cover a 24 hour window; rates are per hour.
const HOURS_PER_WINDOW: f64 = 24.0;

pub static LOGIN_RATE: MetricDesc = MetricDesc {
    name: "snowflake_login_rate",
    help: "Rate of logins per-hour over the last 24 hours.",
    labels: CLIENT_LABELS,
};

pub static SUCCESSFUL_LOGIN_RATE: MetricDesc = MetricDesc {
    name: "snowflake_successful_login_rate",
    help: "Rate of successful logins per-hour over the last 24 hours.",
    labels: CLIENT_LABELS,
};

pub static FAILED_LOGIN_RATE: MetricDesc = MetricDesc {
    name: "snowflake_failed_login_rate",
    help: "Rate of failed logins per-hour over the last 24 hours.",
    labels: CLIENT_LABELS,
};

pub static WAREHOUSE_EXECUTED_QUERIES: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_executed_queries",
    help: "Average query load for queries executed over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

pub static WAREHOUSE_OVERLOADED_QUEUE_SIZE: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_overloaded_queue_size",
    help: "Average load value for queries queued because the warehouse was being overloaded over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

pub static WAREHOUSE_PROVISIONING_QUEUE_SIZE: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_provisioning_queue_size",
    help: "Average load value for queries queued because the warehouse was being provisioned over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

pub static WAREHOUSE_BLOCKED_QUERIES: MetricDesc = MetricDesc {
    name: "snowflake_warehouse_blocked_queries",
    help: "Average load value for queries blocked by a transaction lock over the last 24 hours.",
    labels: NAME_ID_LABELS,
};

/// Per-client login rates.
#[derive(Debug, Clone, Copy)]
pub struct LoginsGroup;

pub const LOGINS: LoginsGroup = LoginsGroup;

impl MetricGroup for LoginsGroup {
    fn name(&self) -> &'static str {
        "logins"
    }

    fn query(&self) -> &'static str {
        queries::LOGINS
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &LOGIN_RATE,
            &SUCCESSFUL_LOGIN_RATE,
            &FAILED_LOGIN_RATE,
        ];
        DESCRIPTORS
    }

    // Columns: client type, client version, failures, successes, total.
    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<5>()?;
        push_samples(
            samples,
            columns,
            &[
                (&LOGIN_RATE, 4),
                (&FAILED_LOGIN_RATE, 2),
                (&SUCCESSFUL_LOGIN_RATE, 3),
            ],
            &columns[..2],
            HOURS_PER_WINDOW,
        )
    }
}

/// Average warehouse load.
#[derive(Debug, Clone, Copy)]
pub struct WarehouseLoadGroup;

pub const WAREHOUSE_LOAD: WarehouseLoadGroup = WarehouseLoadGroup;

impl MetricGroup for WarehouseLoadGroup {
    fn name(&self) -> &'static str {
        "warehouse load"
    }

    fn query(&self) -> &'static str {
        queries::WAREHOUSE_LOAD
    }

    fn descriptors(&self) -> &'static [&'static MetricDesc] {
        static DESCRIPTORS: &[&MetricDesc] = &[
            &WAREHOUSE_EXECUTED_QUERIES,
            &WAREHOUSE_OVERLOADED_QUEUE_SIZE,
            &WAREHOUSE_PROVISIONING_QUEUE_SIZE,
            &WAREHOUSE_BLOCKED_QUERIES,
        ];
        DESCRIPTORS
    }

    fn decode(&self, row: &Row, samples: &mut Vec<Sample>) -> Result<(), DecodeError> {
        let columns = row.columns::<6>()?;
        push_samples(
            samples,
            columns,
            &[
                (&WAREHOUSE_EXECUTED_QUERIES, 2),
                (&WAREHOUSE_OVERLOADED_QUEUE_SIZE, 3),
                (&WAREHOUSE_PROVISIONING_QUEUE_SIZE, 4),
                (&WAREHOUSE_BLOCKED_QUERIES, 5),
            ],
            &columns[..2],
            1.0,
        )
    }
}
