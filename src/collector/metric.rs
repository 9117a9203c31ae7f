//! Metric descriptions and samples produced during a scrape.

use std::fmt;

use strum_macros::{AsRefStr, Display};
use tokio::sync::mpsc;

/// Channel end that receives the samples of a scrape.
pub type SampleSink = mpsc::UnboundedSender<Sample>;

/// Prometheus metric type of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    /// Point-in-time value.
    Gauge,
}

/// Immutable description of one metric.
///
/// Descriptions are declared as statics and shared by reference, so two
/// `describe()` calls hand out the same values.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MetricDesc {
    /// Fully-qualified metric name (e.g. `snowflake_storage_bytes`).
    pub name: &'static str,
    /// Help text.
    pub help: &'static str,
    /// Ordered label names.
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Metric type. Every metric exported here is a gauge.
    pub fn kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

impl fmt::Display for MetricDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.name, self.labels.join(","))
    }
}

/// One value emitted for a [`MetricDesc`] during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    desc: &'static MetricDesc,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Create a sample.
    ///
    /// # Panics
    /// Panics if the number of label values differs from the number of
    /// label names declared by `desc`.
    pub fn new(desc: &'static MetricDesc, value: f64, label_values: Vec<String>) -> Self {
        assert_eq!(
            desc.labels.len(),
            label_values.len(),
            "{} expects {} label values, got {}",
            desc.name,
            desc.labels.len(),
            label_values.len()
        );

        Self {
            desc,
            value,
            label_values,
        }
    }

    /// Description this sample belongs to.
    pub fn desc(&self) -> &'static MetricDesc {
        self.desc
    }

    /// Sample value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Label values, in the order of `desc().labels`.
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Iterate `(name, value)` label pairs.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Look up a single label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}
