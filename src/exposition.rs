//! Prometheus text exposition of scrape samples.
//!
//! Samples are grouped into one gauge family per description. The exporter's
//! own build info lives in a regular [`Registry`] and is gathered alongside.

use std::collections::BTreeMap;

use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::collector::{MetricKind, Sample};

/// Name under which the exporter reports itself.
pub const EXPORTER_NAME: &str = "snowflake_exporter";

/// Content type of the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Errors raised while rendering a scrape.
#[derive(Debug, Error)]
pub enum ExpositionError {
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("encoded metrics are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Registry holding `snowflake_exporter_build_info{version} 1`.
pub fn build_info_registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    let build_info = IntGaugeVec::new(
        Opts::new(
            format!("{EXPORTER_NAME}_build_info"),
            format!(
                "A metric with a constant '1' value labeled by version from which {EXPORTER_NAME} was built."
            ),
        ),
        &["version"],
    )?;
    build_info
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1);
    registry.register(Box::new(build_info))?;
    Ok(registry)
}

fn metric_type(kind: MetricKind) -> MetricType {
    match kind {
        MetricKind::Gauge => MetricType::GAUGE,
    }
}

/// Group samples into metric families, one per description, sorted by name.
///
/// Descriptions without samples produce no family.
pub fn to_families(samples: &[Sample]) -> Vec<MetricFamily> {
    let mut families: BTreeMap<&'static str, MetricFamily> = BTreeMap::new();

    for sample in samples {
        let desc = sample.desc();
        let family = families.entry(desc.name).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(desc.name.to_string());
            family.set_help(desc.help.to_string());
            family.set_field_type(metric_type(desc.kind()));
            family
        });

        let mut metric = Metric::default();
        for (name, value) in sample.labels() {
            let mut pair = LabelPair::default();
            pair.set_name(name.to_string());
            pair.set_value(value.to_string());
            metric.mut_label().push(pair);
        }
        match desc.kind() {
            MetricKind::Gauge => {
                let mut gauge = Gauge::default();
                gauge.set_value(sample.value());
                metric.set_gauge(gauge);
            }
        }
        family.mut_metric().push(metric);
    }

    families.into_values().collect()
}

/// Render the registry and the scrape's samples in text format.
pub fn encode(registry: &Registry, samples: &[Sample]) -> Result<String, ExpositionError> {
    let mut families = registry.gather();
    families.extend(to_families(samples));
    families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
