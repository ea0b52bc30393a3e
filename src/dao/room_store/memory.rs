//! In-process room backend built on `DashMap` hashes and per-subscriber Tokio queues.
//!
//! Expired hashes are dropped the next time anything touches them, and a background sweeper
//! removes the ones nobody touches again.

use std::{
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use futures::{StreamExt, future::BoxFuture};
use indexmap::IndexMap;
use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::AbortHandle,
    time::{Instant, MissedTickBehavior, interval},
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use super::{RoomBackend, TopicStream};
use crate::dao::storage::{StorageError, StorageResult};

const BACKEND: &str = "memory";
/// Default period between two sweeps of expired keys.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// [`RoomBackend`] keeping every room in process memory.
///
/// Each subscriber owns an unbounded queue, so a slow consumer only delays its own
/// deliveries and never loses any.
#[derive(Clone)]
pub struct MemoryRoomBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    hashes: DashMap<String, StoredHash>,
    topics: DashMap<String, Vec<mpsc::UnboundedSender<String>>>,
    shut_down: AtomicBool,
    sweeper: OnceLock<AbortHandle>,
}

#[derive(Default)]
struct StoredHash {
    fields: IndexMap<String, String>,
    expires_at: Option<Instant>,
}

impl StoredHash {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

impl MemoryInner {
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.hashes.len();
        self.hashes.retain(|_, hash| !hash.is_expired(now));
        before.saturating_sub(self.hashes.len())
    }
}

impl Drop for MemoryInner {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get() {
            sweeper.abort();
        }
    }
}

impl MemoryRoomBackend {
    /// Create an empty backend that sweeps expired keys every `sweep_interval`.
    ///
    /// The sweeper needs a Tokio runtime. Outside of one, expired keys are only evicted when
    /// they are touched again.
    pub fn new(sweep_interval: Duration) -> Self {
        let inner = Arc::new(MemoryInner {
            hashes: DashMap::new(),
            topics: DashMap::new(),
            shut_down: AtomicBool::new(false),
            sweeper: OnceLock::new(),
        });

        match Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(run_sweeper(
                    Arc::downgrade(&inner),
                    sweep_interval.max(MIN_SWEEP_INTERVAL),
                ));
                let _ = inner.sweeper.set(task.abort_handle());
            }
            Err(_) => debug!("no runtime available; expired keys are evicted on access only"),
        }

        Self { inner }
    }

    /// Close every topic, stop the sweeper and refuse further commands.
    ///
    /// Open topic streams end, which is how consumers observe a lost connection.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.topics.clear();
        if let Some(sweeper) = self.inner.sweeper.get() {
            sweeper.abort();
        }
        debug!("memory room backend shut down");
    }

    /// Drop every expired key now, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.inner.sweep()
    }

    /// Number of live (non-expired) keys. Mostly useful in tests.
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.inner
            .hashes
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    fn ensure_running(&self) -> StorageResult<()> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            Err(StorageError::Shutdown { backend: BACKEND })
        } else {
            Ok(())
        }
    }

    fn evict_if_expired(&self, key: &str) {
        let now = Instant::now();
        if self
            .inner
            .hashes
            .remove_if(key, |_, hash| hash.is_expired(now))
            .is_some()
        {
            debug!(key, "evicted expired key");
        }
    }

    fn get_field(&self, key: &str, field: &str) -> StorageResult<Option<String>> {
        self.ensure_running()?;
        self.evict_if_expired(key);
        Ok(self
            .inner
            .hashes
            .get(key)
            .and_then(|hash| hash.fields.get(field).cloned()))
    }

    fn set_field(&self, key: &str, field: &str, value: String) -> StorageResult<()> {
        self.ensure_running()?;
        self.evict_if_expired(key);
        self.inner
            .hashes
            .entry(key.to_owned())
            .or_default()
            .fields
            .insert(field.to_owned(), value);
        Ok(())
    }

    fn get_all(&self, key: &str) -> StorageResult<IndexMap<String, String>> {
        self.ensure_running()?;
        self.evict_if_expired(key);
        Ok(self
            .inner
            .hashes
            .get(key)
            .map(|hash| hash.fields.clone())
            .unwrap_or_default())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.ensure_running()?;
        self.inner.hashes.remove(key);
        Ok(())
    }

    fn arm_ttl(&self, key: &str, ttl: Duration) -> StorageResult<()> {
        self.ensure_running()?;
        self.evict_if_expired(key);
        if let Some(mut hash) = self.inner.hashes.get_mut(key) {
            hash.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    fn send(&self, topic: &str, payload: String) -> StorageResult<usize> {
        self.ensure_running()?;
        let delivered = match self.inner.topics.get_mut(topic) {
            Some(mut subscribers) => {
                subscribers.retain(|subscriber| subscriber.send(payload.clone()).is_ok());
                subscribers.len()
            }
            None => 0,
        };
        if delivered == 0 {
            // Nobody listens anymore; forget the topic so idle rooms do not pile up.
            self.inner
                .topics
                .remove_if(topic, |_, subscribers| subscribers.is_empty());
        }
        Ok(delivered)
    }

    fn listen(&self, topic: &str) -> StorageResult<TopicStream> {
        self.ensure_running()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .topics
            .entry(topic.to_owned())
            .or_default()
            .push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

impl Default for MemoryRoomBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

async fn run_sweeper(inner: Weak<MemoryInner>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let removed = inner.sweep();
        if removed > 0 {
            debug!(removed, "swept expired keys");
        }
    }
}

impl RoomBackend for MemoryRoomBackend {
    fn hash_get(&self, key: &str, field: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let result = self.get_field(key, field);
        Box::pin(async move { result })
    }

    fn hash_set(&self, key: &str, field: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.set_field(key, field, value);
        Box::pin(async move { result })
    }

    fn hash_get_all(&self, key: &str) -> BoxFuture<'static, StorageResult<IndexMap<String, String>>> {
        let result = self.get_all(key);
        Box::pin(async move { result })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.remove(key);
        Box::pin(async move { result })
    }

    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.arm_ttl(key, ttl);
        Box::pin(async move { result })
    }

    fn publish(&self, topic: &str, payload: String) -> BoxFuture<'static, StorageResult<usize>> {
        let result = self.send(topic, payload);
        Box::pin(async move { result })
    }

    fn subscribe(&self, topic: &str) -> BoxFuture<'static, StorageResult<TopicStream>> {
        let result = self.listen(topic);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_running();
        Box::pin(async move { result })
    }
}
