//! Process-wide handle shared by every room operation.

use std::{sync::Arc, time::Duration};

use crate::{
    config::AppConfig,
    dao::{
        bgg::BggClient,
        room_store::{RoomBackend, memory::MemoryRoomBackend},
    },
    error::ServiceError,
};

/// Cheaply clonable handle to the [`AppState`].
pub type SharedState = Arc<AppState>;

/// Store connection, upstream client and configuration, built once at startup and passed
/// explicitly to the services.
pub struct AppState {
    store: Arc<dyn RoomBackend>,
    bgg: BggClient,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn RoomBackend>, bgg: BggClient, config: AppConfig) -> SharedState {
        Arc::new(Self { store, bgg, config })
    }

    /// State backed by the in-process store, for single-node deployments and tests.
    pub fn in_memory(config: AppConfig) -> Result<SharedState, ServiceError> {
        let store = MemoryRoomBackend::new(config.sweep_interval);
        let bgg = BggClient::new(&config.bgg)?;
        Ok(Self::new(Arc::new(store), bgg, config))
    }

    /// Connect to the configured Redis store and build the upstream client.
    #[cfg(feature = "redis-store")]
    pub async fn connect(config: AppConfig) -> Result<SharedState, ServiceError> {
        use crate::dao::room_store::redis::{RedisConfig, RedisRoomBackend};

        let store = RedisRoomBackend::connect(RedisConfig::new(config.redis_url.clone()))
            .await
            .map_err(crate::dao::storage::StorageError::from)?;
        let bgg = BggClient::new(&config.bgg)?;
        Ok(Self::new(Arc::new(store), bgg, config))
    }

    /// Backend every room lives in.
    pub fn store(&self) -> &Arc<dyn RoomBackend> {
        &self.store
    }

    /// Client of the upstream inventory service.
    pub fn bgg(&self) -> &BggClient {
        &self.bgg
    }

    /// Configuration the state was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Inactivity window after which a room's keys expire.
    pub fn room_ttl(&self) -> Duration {
        self.config.room_ttl
    }
}
