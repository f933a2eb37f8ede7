//! In-process transport

use super::{decode_hash_value, KeyPrefix, Transport};
use crate::config::TransportConfig;
use crate::errors::{GsupError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use glob::Pattern;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, instrument};

/// Stored value with optional expiry
#[derive(Debug)]
struct Slot<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Slot<T> {
    fn new(value: T, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Instant::now() >= at)
    }

    fn refresh(&mut self, ttl: Option<Duration>) {
        if let Some(ttl) = ttl {
            self.expires_at = Some(Instant::now() + ttl);
        }
    }
}

/// Non-durable [`Transport`] backed by concurrent maps.
///
/// Expiry is applied lazily when a key is next touched. Blocking dequeues
/// park on a shared [`Notify`] that every enqueue wakes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    prefix: Option<KeyPrefix>,
    queues: DashMap<String, Slot<VecDeque<Bytes>>>,
    values: DashMap<String, Slot<String>>,
    hashes: DashMap<String, Slot<HashMap<String, String>>>,
    enqueued: Notify,
}

impl MemoryTransport {
    pub fn new(prefix: Option<KeyPrefix>) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.key_prefix())
    }

    fn key(&self, key: &str) -> String {
        super::prefixed_key(key, self.prefix.as_ref())
    }

    /// Number of live payloads in a queue
    pub fn queue_len(&self, queue: &str) -> usize {
        let key = self.key(queue);
        self.queues.remove_if(&key, |_, slot| slot.is_expired());
        self.queues.get(&key).map_or(0, |slot| slot.value.len())
    }

    fn pop(&self, key: &str, count: usize, from_tail: bool) -> Vec<Bytes> {
        self.queues.remove_if(key, |_, slot| slot.is_expired());

        let mut popped = Vec::new();
        let drained = match self.queues.get_mut(key) {
            Some(mut slot) => {
                while popped.len() < count {
                    let next = if from_tail {
                        slot.value.pop_back()
                    } else {
                        slot.value.pop_front()
                    };
                    match next {
                        Some(payload) => popped.push(payload),
                        None => break,
                    }
                }
                slot.value.is_empty()
            }
            None => false,
        };

        // An emptied queue no longer exists, and neither does its expiry
        if drained {
            self.queues.remove_if(key, |_, slot| slot.value.is_empty());
        }
        popped
    }

    async fn wait_for(&self, key: &str, count: usize, from_tail: bool) -> Vec<Bytes> {
        loop {
            let notified = self.enqueued.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let popped = self.pop(key, count, from_tail);
            if !popped.is_empty() {
                return popped;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    async fn enqueue(&self, queue: &str, payload: Bytes, ttl: Option<Duration>) -> Result<()> {
        let key = self.key(queue);
        self.queues.remove_if(&key, |_, slot| slot.is_expired());

        {
            let mut slot = self
                .queues
                .entry(key.clone())
                .or_insert_with(|| Slot::new(VecDeque::new(), None));
            slot.value.push_back(payload);
            slot.refresh(ttl);
        }

        debug!(queue = %key, "Enqueued payload");
        self.enqueued.notify_waiters();
        Ok(())
    }

    async fn dequeue_blocking(&self, queue: &str) -> Result<Bytes> {
        let key = self.key(queue);
        self.wait_for(&key, 1, false)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| GsupError::Transport(format!("Queue {} yielded no payload", key)))
    }

    async fn dequeue_bulk_blocking(&self, queue: &str, count: usize) -> Result<Vec<Bytes>> {
        if count == 0 {
            return Err(GsupError::Transport("Bulk dequeue count must be positive".to_string()));
        }
        let key = self.key(queue);
        Ok(self.wait_for(&key, count, true).await)
    }

    async fn delete_queue(&self, queue: &str) -> Result<bool> {
        let key = self.key(queue);
        Ok(self.queues.remove(&key).is_some())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let key = self.key(key);
        self.values.remove_if(&key, |_, slot| slot.is_expired());
        Ok(self.values.get(&key).map(|slot| slot.value.clone()))
    }

    async fn set_value(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.values.insert(self.key(key), Slot::new(value, ttl));
        Ok(())
    }

    async fn hash_get(&self, name: &str, field: &str) -> Result<Option<String>> {
        let key = self.key(name);
        self.hashes.remove_if(&key, |_, slot| slot.is_expired());
        Ok(self
            .hashes
            .get(&key)
            .and_then(|slot| slot.value.get(field).cloned()))
    }

    async fn hash_set(
        &self,
        name: &str,
        field: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.key(name);
        self.hashes.remove_if(&key, |_, slot| slot.is_expired());

        let mut slot = self
            .hashes
            .entry(key)
            .or_insert_with(|| Slot::new(HashMap::new(), None));
        slot.value.insert(field.to_string(), value);
        slot.refresh(ttl);
        Ok(())
    }

    async fn hash_delete(&self, name: &str, field: &str) -> Result<bool> {
        let key = self.key(name);
        self.hashes.remove_if(&key, |_, slot| slot.is_expired());

        let removed = match self.hashes.get_mut(&key) {
            Some(mut slot) => slot.value.remove(field).is_some(),
            None => false,
        };
        self.hashes.remove_if(&key, |_, slot| slot.value.is_empty());
        Ok(removed)
    }

    async fn hash_get_all(&self, name: &str) -> Result<HashMap<String, serde_json::Value>> {
        let key = self.key(name);
        self.hashes.remove_if(&key, |_, slot| slot.is_expired());

        Ok(self
            .hashes
            .get(&key)
            .map(|slot| {
                slot.value
                    .iter()
                    .map(|(field, raw)| (field.clone(), decode_hash_value(raw)))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_range(&self, queue: &str) -> Result<Vec<Bytes>> {
        let key = self.key(queue);
        self.queues.remove_if(&key, |_, slot| slot.is_expired());

        Ok(self
            .queues
            .get(&key)
            .map(|slot| slot.value.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn queue_names(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = Pattern::new(&self.key(pattern))
            .map_err(|e| GsupError::Transport(format!("Invalid queue pattern: {}", e)))?;
        self.queues.retain(|_, slot| !slot.is_expired());

        let mut names: Vec<String> = self
            .queues
            .iter()
            .filter(|entry| pattern.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
