use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use super::{
    config::BggConfig,
    error::{BggError, BggResult},
    models::{CollectionDocument, ThingDocument},
    transport::{BggTransport, ClientIdentity, HttpTransport, UpstreamRequest},
};
use crate::dao::models::GameEntity;

/// How a collection that is still being prepared upstream gets polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of requests, the first one included.
    pub max_attempts: u32,
    /// Fixed pause between two requests.
    pub delay: Duration,
}

impl From<&BggConfig> for RetryPolicy {
    fn from(config: &BggConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay,
        }
    }
}

/// Outcome of a single collection request.
enum Poll {
    Ready(String),
    Processing,
}

/// Aborts the polling task when the fetch that spawned it is dropped.
struct PollTask(JoinHandle<BggResult<Vec<GameEntity>>>);

impl Drop for PollTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fetches collections and game metadata from the inventory service.
#[derive(Clone)]
pub struct BggClient {
    transport: Arc<dyn BggTransport>,
    policy: RetryPolicy,
}

impl BggClient {
    /// Build a client that talks HTTP to the configured base URL.
    pub fn new(config: &BggConfig) -> BggResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config.into()))
    }

    /// Build a client on top of any transport.
    pub fn with_transport(transport: Arc<dyn BggTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetch the games owned by `username`.
    ///
    /// The upstream prepares collections asynchronously and answers `202 Accepted` until the
    /// data is ready, so the request is repeated with a fixed delay up to the policy's
    /// attempt bound. The polling runs on its own task, which is aborted if the returned
    /// future is dropped before it completes.
    pub async fn fetch_collection(
        &self,
        username: &str,
        identity: Option<ClientIdentity>,
    ) -> BggResult<Vec<GameEntity>> {
        let client = self.clone();
        let username = username.to_owned();
        let mut task = PollTask(tokio::spawn(async move {
            client.poll_collection(username, identity).await
        }));
        (&mut task.0)
            .await
            .map_err(|source| BggError::TaskJoin { source })?
    }

    /// Look up metadata of a single game.
    pub async fn fetch_game_info(&self, id: &str) -> BggResult<GameEntity> {
        let request = UpstreamRequest::thing(id);
        let endpoint = request.endpoint;
        let response = self.transport.get(request).await?;
        if response.status == StatusCode::ACCEPTED || !response.status.is_success() {
            return Err(BggError::UpstreamStatus {
                endpoint,
                status: response.status,
                body: response.body,
            });
        }
        ThingDocument::parse(id, &response.body)
    }

    async fn poll_collection(
        &self,
        username: String,
        identity: Option<ClientIdentity>,
    ) -> BggResult<Vec<GameEntity>> {
        let request = UpstreamRequest::collection(&username, identity);
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            match self.request_collection(request.clone()).await? {
                Poll::Ready(body) => {
                    let games = CollectionDocument::parse(&body)?;
                    info!(username = %username, attempt, count = games.len(), "fetched collection");
                    return Ok(games);
                }
                Poll::Processing => {
                    debug!(username = %username, attempt, max_attempts, "collection still processing");
                    if attempt < max_attempts {
                        sleep(self.policy.delay).await;
                    }
                }
            }
        }

        warn!(username = %username, attempts = max_attempts, "gave up polling collection");
        Err(BggError::RetryExhausted {
            username,
            attempts: max_attempts,
        })
    }

    async fn request_collection(&self, request: UpstreamRequest) -> BggResult<Poll> {
        let endpoint = request.endpoint;
        let response = self.transport.get(request).await?;
        match response.status {
            StatusCode::ACCEPTED => Ok(Poll::Processing),
            status if status.is_success() => Ok(Poll::Ready(response.body)),
            status => Err(BggError::UpstreamStatus {
                endpoint,
                status,
                body: response.body,
            }),
        }
    }
}
