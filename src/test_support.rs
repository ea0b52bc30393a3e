//! Fixtures shared by unit tests across modules.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use reqwest::StatusCode;

use crate::{
    config::AppConfig,
    dao::{
        bgg::{BggClient, BggResult, BggTransport, RetryPolicy, UpstreamRequest, UpstreamResponse},
        models::{GameEntity, GameInfoEntity},
        room_store::memory::MemoryRoomBackend,
    },
    state::{AppState, SharedState},
};

/// Replays canned responses and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<(StatusCode, &'static str)>>,
    pub(crate) requests: Mutex<Vec<UpstreamRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(script: impl IntoIterator<Item = (StatusCode, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BggTransport for ScriptedTransport {
    fn get(&self, request: UpstreamRequest) -> BoxFuture<'static, BggResult<UpstreamResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport script exhausted");
        Box::pin(async move {
            Ok(UpstreamResponse {
                status,
                body: body.to_owned(),
            })
        })
    }
}

pub(crate) fn scripted_client(transport: Arc<ScriptedTransport>) -> BggClient {
    BggClient::with_transport(
        transport,
        RetryPolicy {
            max_attempts: 10,
            delay: Duration::from_secs(1),
        },
    )
}

/// State over a fresh in-memory store whose upstream replays `transport`.
pub(crate) fn memory_state(transport: Arc<ScriptedTransport>) -> (SharedState, MemoryRoomBackend) {
    let config = AppConfig::default();
    let store = MemoryRoomBackend::new(config.sweep_interval);
    let state = AppState::new(
        Arc::new(store.clone()),
        scripted_client(transport),
        config,
    );
    (state, store)
}

/// State whose upstream must never be called.
pub(crate) fn offline_state() -> (SharedState, MemoryRoomBackend) {
    memory_state(ScriptedTransport::new([]))
}

pub(crate) fn game(id: &str, name: &str) -> GameEntity {
    GameEntity {
        id: id.to_owned(),
        name: name.to_owned(),
        thumbnail: format!("https://cf.geekdo-images.com/{id}.jpg"),
        info: GameInfoEntity {
            min_players: 2,
            max_players: 4,
            min_playtime: 30,
            max_playtime: 60,
        },
    }
}
