use std::time::Duration;

use futures::{StreamExt, future::BoxFuture};
use indexmap::IndexMap;
use redis::{Client, aio::MultiplexedConnection};
use tracing::{info, warn};

use super::{
    config::RedisConfig,
    error::{RedisDaoError, RedisResult},
};
use crate::dao::{
    room_store::{RoomBackend, TopicStream},
    storage::StorageResult,
};

/// Room backend talking to a single Redis instance.
///
/// Commands share one multiplexed connection; every subscription opens its own pub/sub
/// connection so closing one never affects the others.
#[derive(Clone)]
pub struct RedisRoomBackend {
    client: Client,
    connection: MultiplexedConnection,
}

impl RedisRoomBackend {
    /// Open the command connection and check that the server answers.
    pub async fn connect(config: RedisConfig) -> RedisResult<Self> {
        let client = config.client()?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|source| RedisDaoError::Connect { source })?;

        let backend = Self { client, connection };
        backend.ping().await?;
        info!(url = %config.url, "connected to Redis");
        Ok(backend)
    }

    async fn ping(&self) -> RedisResult<()> {
        let mut connection = self.connection.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "PING",
                key: String::new(),
                source,
            })?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(RedisDaoError::UnexpectedPong { reply })
        }
    }

    async fn hget(&self, key: String, field: String) -> RedisResult<Option<String>> {
        let mut connection = self.connection.clone();
        redis::cmd("HGET")
            .arg(&key)
            .arg(&field)
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "HGET",
                key,
                source,
            })
    }

    async fn hset(&self, key: String, field: String, value: String) -> RedisResult<()> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(&key)
            .arg(&field)
            .arg(value)
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "HSET",
                key,
                source,
            })?;
        Ok(())
    }

    async fn hgetall(&self, key: String) -> RedisResult<IndexMap<String, String>> {
        let mut connection = self.connection.clone();
        let pairs: Vec<(String, String)> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "HGETALL",
                key,
                source,
            })?;
        Ok(pairs.into_iter().collect())
    }

    async fn del(&self, key: String) -> RedisResult<()> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "DEL",
                key,
                source,
            })?;
        Ok(())
    }

    async fn expire_key(&self, key: String, ttl: Duration) -> RedisResult<()> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("EXPIRE")
            .arg(&key)
            .arg(ttl.as_secs().max(1))
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "EXPIRE",
                key,
                source,
            })?;
        Ok(())
    }

    async fn publish_payload(&self, topic: String, payload: String) -> RedisResult<usize> {
        let mut connection = self.connection.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&topic)
            .arg(payload)
            .query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command: "PUBLISH",
                key: topic,
                source,
            })?;
        Ok(usize::try_from(receivers).unwrap_or_default())
    }

    async fn open_topic(&self, topic: String) -> RedisResult<TopicStream> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|source| RedisDaoError::Subscribe {
                topic: topic.clone(),
                source,
            })?;
        pubsub
            .subscribe(&topic)
            .await
            .map_err(|source| RedisDaoError::Subscribe {
                topic: topic.clone(),
                source,
            })?;

        let stream = pubsub.into_on_message().filter_map(move |message| {
            let topic = topic.clone();
            async move {
                match message.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(err) => {
                        warn!(%topic, error = %err, "dropping non-text pub/sub payload");
                        None
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}

impl RoomBackend for RedisRoomBackend {
    fn hash_get(&self, key: &str, field: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let (key, field) = (key.to_owned(), field.to_owned());
        Box::pin(async move { store.hget(key, field).await.map_err(Into::into) })
    }

    fn hash_set(&self, key: &str, field: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let (key, field) = (key.to_owned(), field.to_owned());
        Box::pin(async move { store.hset(key, field, value).await.map_err(Into::into) })
    }

    fn hash_get_all(&self, key: &str) -> BoxFuture<'static, StorageResult<IndexMap<String, String>>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move { store.hgetall(key).await.map_err(Into::into) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move { store.del(key).await.map_err(Into::into) })
    }

    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_owned();
        Box::pin(async move { store.expire_key(key, ttl).await.map_err(Into::into) })
    }

    fn publish(&self, topic: &str, payload: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        let topic = topic.to_owned();
        Box::pin(async move {
            store
                .publish_payload(topic, payload)
                .await
                .map_err(Into::into)
        })
    }

    fn subscribe(&self, topic: &str) -> BoxFuture<'static, StorageResult<TopicStream>> {
        let store = self.clone();
        let topic = topic.to_owned();
        Box::pin(async move { store.open_topic(topic).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
