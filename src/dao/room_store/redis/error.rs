//! Error types shared by the Redis room backend.

use thiserror::Error;

/// Convenient result alias returning [`RedisDaoError`] failures.
pub type RedisResult<T> = Result<T, RedisDaoError>;

/// Failures that can occur while interacting with Redis.
#[derive(Debug, Error)]
pub enum RedisDaoError {
    /// The connection URL could not be parsed.
    #[error("invalid Redis URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: redis::RedisError,
    },
    /// Opening the multiplexed command connection failed.
    #[error("failed to connect to Redis")]
    Connect {
        #[source]
        source: redis::RedisError,
    },
    /// A command against `key` failed.
    #[error("Redis `{command}` failed for `{key}`")]
    Command {
        command: &'static str,
        key: String,
        #[source]
        source: redis::RedisError,
    },
    /// Opening a pub/sub connection or subscribing to `topic` failed.
    #[error("failed to subscribe to Redis topic `{topic}`")]
    Subscribe {
        topic: String,
        #[source]
        source: redis::RedisError,
    },
    /// The server answered PING with something other than PONG.
    #[error("unexpected Redis PING reply `{reply}`")]
    UnexpectedPong { reply: String },
}
