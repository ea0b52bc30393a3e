pub mod memory;
/// Redis-backed room store.
#[cfg(feature = "redis-store")]
pub mod redis;

use std::time::Duration;

use futures::{future::BoxFuture, stream::BoxStream};
use indexmap::IndexMap;

use crate::dao::storage::StorageResult;

/// Stream of raw payloads published on a topic. It ends when the backend closes the topic.
pub type TopicStream = BoxStream<'static, String>;

/// Key-value and publish/subscribe primitives the room store is built on.
///
/// Implementations must be safe to share across every room, caller and subscription of the
/// process; no locking is layered on top of them.
pub trait RoomBackend: Send + Sync {
    /// Read a single field of a hash.
    fn hash_get(&self, key: &str, field: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Write a single field of a hash, creating the hash when needed.
    fn hash_set(&self, key: &str, field: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Read every field of a hash in field insertion order. Missing hashes are empty.
    fn hash_get_all(&self, key: &str) -> BoxFuture<'static, StorageResult<IndexMap<String, String>>>;
    /// Delete a key entirely.
    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// (Re)arm the time-to-live of a key. Missing keys are ignored.
    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'static, StorageResult<()>>;
    /// Publish a payload on a topic, returning how many subscribers received it.
    fn publish(&self, topic: &str, payload: String) -> BoxFuture<'static, StorageResult<usize>>;
    /// Start receiving a topic. Payloads published after this resolves are delivered.
    fn subscribe(&self, topic: &str) -> BoxFuture<'static, StorageResult<TopicStream>>;
    /// Check that the backend still answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Key of the hash holding every user's collection entry for a room.
pub fn games_key(room: &str) -> String {
    format!("games:{room}")
}

/// Key of the hash holding every user's vote record for a room.
pub fn votes_key(room: &str) -> String {
    format!("votes:{room}")
}

/// Name of the fan-out topic for a room.
pub fn room_topic(room: &str) -> String {
    room.to_owned()
}
