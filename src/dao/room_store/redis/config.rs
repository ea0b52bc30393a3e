use super::error::{RedisDaoError, RedisResult};

/// Runtime configuration describing how to reach Redis.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: String,
}

impl RedisConfig {
    /// Construct a configuration from an explicit connection URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Parse the URL into a client handle without connecting.
    pub(super) fn client(&self) -> RedisResult<redis::Client> {
        redis::Client::open(self.url.as_str()).map_err(|source| RedisDaoError::InvalidUrl {
            url: self.url.clone(),
            source,
        })
    }
}
