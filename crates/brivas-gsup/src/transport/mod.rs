//! Queue/transport collaborator interface
//!
//! Callers of the builder move encoded messages, log lines and metric samples
//! between processes through a keyed queue store. The store itself is
//! external; this module defines its contract, the records carried through
//! it, and an in-process implementation.

mod memory;
mod records;

pub use memory::MemoryTransport;
pub use records::{LogRecord, MetricAction, MetricRecord, MetricType};

use crate::errors::Result;
use crate::gsup::{GsupCodec, GsupMessage};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/// Queue drained by the log writer
pub const LOG_QUEUE: &str = "log";
/// Queue drained by the metric exporter
pub const METRIC_QUEUE: &str = "metric";

/// `{hostname}:{service}:` key prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPrefix {
    pub hostname: String,
    pub service: String,
}

impl Default for KeyPrefix {
    fn default() -> Self {
        Self {
            hostname: "unknown".to_string(),
            service: "common".to_string(),
        }
    }
}

impl KeyPrefix {
    pub fn new(hostname: &str, service: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            service: service.to_string(),
        }
    }

    pub fn apply(&self, key: &str) -> String {
        format!("{}:{}:{}", self.hostname, self.service, key)
    }
}

/// Apply an optional prefix to a key or queue name
pub fn prefixed_key(key: &str, prefix: Option<&KeyPrefix>) -> String {
    match prefix {
        Some(p) => p.apply(key),
        None => key.to_string(),
    }
}

/// Keyed queue, value and hash store
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push a payload onto the tail of a queue, optionally (re)setting the
    /// queue's expiry
    async fn enqueue(&self, queue: &str, payload: Bytes, ttl: Option<Duration>) -> Result<()>;

    /// Wait until the queue is non-empty, then pop its head
    async fn dequeue_blocking(&self, queue: &str) -> Result<Bytes>;

    /// Wait until the queue is non-empty, then pop up to `count` payloads
    /// from its tail
    async fn dequeue_bulk_blocking(&self, queue: &str, count: usize) -> Result<Vec<Bytes>>;

    async fn delete_queue(&self, queue: &str) -> Result<bool>;

    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_value(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    async fn hash_get(&self, name: &str, field: &str) -> Result<Option<String>>;

    async fn hash_set(
        &self,
        name: &str,
        field: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<()>;

    async fn hash_delete(&self, name: &str, field: &str) -> Result<bool>;

    /// Every field of a hash. Values that parse as JSON are returned decoded,
    /// anything else as a JSON string.
    async fn hash_get_all(&self, name: &str) -> Result<HashMap<String, serde_json::Value>>;

    /// Every payload in a queue, head to tail, leaving the queue untouched
    async fn list_range(&self, queue: &str) -> Result<Vec<Bytes>>;

    /// Full (prefixed) names of live queues matching a glob pattern
    async fn queue_names(&self, pattern: &str) -> Result<Vec<String>>;

    /// First live queue matching a glob pattern
    async fn next_queue(&self, pattern: &str) -> Result<Option<String>> {
        Ok(self.queue_names(pattern).await?.into_iter().next())
    }
}

/// Decode a stored hash value, keeping non-JSON text as a string
pub fn decode_hash_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Enqueue a structured log line for the log writer
#[instrument(skip(transport, record), fields(service = %record.service))]
pub async fn send_log<T: Transport + ?Sized>(
    transport: &T,
    record: &LogRecord,
    ttl: Option<Duration>,
) -> Result<()> {
    let payload = serde_json::to_vec(record)?;
    transport.enqueue(LOG_QUEUE, Bytes::from(payload), ttl).await
}

/// Enqueue a batch of metric samples for the metric exporter
#[instrument(skip(transport, records), fields(count = records.len()))]
pub async fn send_metric<T: Transport + ?Sized>(
    transport: &T,
    records: &[MetricRecord],
    ttl: Option<Duration>,
) -> Result<()> {
    let payload = serde_json::to_vec(records)?;
    transport.enqueue(METRIC_QUEUE, Bytes::from(payload), ttl).await
}

/// Encode a finished message and enqueue it
#[instrument(skip(transport, codec, message), fields(msg_type = %message.msg_type()))]
pub async fn send_message<T, C>(
    transport: &T,
    codec: &C,
    queue: &str,
    message: &GsupMessage,
    ttl: Option<Duration>,
) -> Result<()>
where
    T: Transport + ?Sized,
    C: GsupCodec + ?Sized,
{
    let payload = codec.encode(message)?;
    transport.enqueue(queue, payload, ttl).await
}

/// Wait for the next message on a queue and decode it
pub async fn receive_message<T, C>(transport: &T, codec: &C, queue: &str) -> Result<GsupMessage>
where
    T: Transport + ?Sized,
    C: GsupCodec + ?Sized,
{
    let payload = transport.dequeue_blocking(queue).await?;
    codec.decode(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_key() {
        let prefix = KeyPrefix::new("hss01", "gsup");
        assert_eq!(prefixed_key("log", Some(&prefix)), "hss01:gsup:log");
        assert_eq!(prefixed_key("log", None), "log");
        assert_eq!(KeyPrefix::default().apply("metric"), "unknown:common:metric");
    }

    #[test]
    fn test_decode_hash_value() {
        assert_eq!(decode_hash_value("42"), serde_json::json!(42));
        assert_eq!(
            decode_hash_value(r#"{"apn":"internet"}"#),
            serde_json::json!({"apn": "internet"})
        );
        assert_eq!(decode_hash_value("internet"), serde_json::json!("internet"));
    }
}
