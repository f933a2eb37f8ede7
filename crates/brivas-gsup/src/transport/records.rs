//! Log and metric records carried through the transport

use crate::errors::{GsupError, Result};
use chrono::Utc;
use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Log line queued for the log writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub service: String,
    pub level: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

impl LogRecord {
    pub fn new(service: &str, level: tracing::Level, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            service: service.to_string(),
            level: level.as_str().to_lowercase(),
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricAction {
    Inc,
    Dec,
    Set,
}

/// Metric sample queued for the metric exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "TYPE")]
    pub metric_type: MetricType,
    #[serde(rename = "HELP", default)]
    pub help: String,
    #[serde(rename = "LABELS", default, deserialize_with = "labels_from_map_or_list")]
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "ACTION")]
    pub action: MetricAction,
    #[serde(rename = "VALUE")]
    pub value: f64,
    /// Optional time-series point mirrored by the exporter
    #[serde(rename = "INFLUX", default, skip_serializing_if = "Option::is_none")]
    pub influx: Option<serde_json::Value>,
}

impl MetricRecord {
    pub fn new(
        service_name: &str,
        name: &str,
        metric_type: MetricType,
        action: MetricAction,
        value: f64,
    ) -> Result<Self> {
        if !value.is_finite() {
            return Err(GsupError::InvalidMetric(format!(
                "{} value must be finite, got {}",
                name, value
            )));
        }

        Ok(Self {
            service_name: service_name.to_string(),
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            name: name.to_string(),
            metric_type,
            help: String::new(),
            labels: BTreeMap::new(),
            action,
            value,
            influx: None,
        })
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_influx(mut self, point: serde_json::Value) -> Self {
        self.influx = Some(point);
        self
    }
}

/// Producers without labels send an empty list rather than an object
fn labels_from_map_or_list<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Labels {
        Map(BTreeMap<String, String>),
        List(Vec<IgnoredAny>),
    }

    Ok(match Labels::deserialize(deserializer)? {
        Labels::Map(map) => map,
        Labels::List(items) if items.is_empty() => BTreeMap::new(),
        Labels::List(items) => {
            return Err(D::Error::custom(format!(
                "LABELS list must be empty, got {} items",
                items.len()
            )))
        }
    })
}
