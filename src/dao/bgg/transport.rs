use std::{fmt, sync::Arc};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};

use super::{
    config::BggConfig,
    error::{BggError, BggResult},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Identity of the end user a fetch is made for, forwarded so the upstream rate limit
/// applies to that user instead of the server's shared egress address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Wrap the address (or other identity) taken from the inbound request.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single GET against one endpoint of the inventory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Path segment below the base URL (`collection`, `thing`).
    pub endpoint: &'static str,
    /// Query string parameters, in order.
    pub query: Vec<(&'static str, String)>,
    /// End user the request is made for, if known.
    pub identity: Option<ClientIdentity>,
}

impl UpstreamRequest {
    /// Owned, non-expansion items of `username`, with statistics.
    pub fn collection(username: &str, identity: Option<ClientIdentity>) -> Self {
        Self {
            endpoint: "collection",
            query: vec![
                ("username", username.to_owned()),
                ("own", "1".into()),
                ("excludesubtype", "expansion".into()),
                ("stats", "1".into()),
                ("wishlist", "0".into()),
            ],
            identity,
        }
    }

    /// Metadata of the board game with identifier `id`.
    pub fn thing(id: &str) -> Self {
        Self {
            endpoint: "thing",
            query: vec![("type", "boardgame".into()), ("id", id.to_owned())],
            identity: None,
        }
    }
}

/// Raw answer of the inventory service.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status of the answer.
    pub status: StatusCode,
    /// Raw response body.
    pub body: String,
}

/// Sends requests to the inventory service.
pub trait BggTransport: Send + Sync {
    /// Perform `request` and return the raw answer, whatever its status.
    fn get(&self, request: UpstreamRequest) -> BoxFuture<'static, BggResult<UpstreamResponse>>;
}

/// [`BggTransport`] over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Arc<str>,
    identity_header: Arc<str>,
}

impl HttpTransport {
    /// Build the HTTP client described by `config`.
    pub fn new(config: &BggConfig) -> BggResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| BggError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            identity_header: Arc::<str>::from(config.identity_header.as_str()),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

impl BggTransport for HttpTransport {
    fn get(&self, request: UpstreamRequest) -> BoxFuture<'static, BggResult<UpstreamResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let endpoint = request.endpoint;
            let mut builder = transport
                .client
                .get(transport.url(endpoint))
                .query(&request.query);
            if let Some(identity) = &request.identity {
                builder = builder.header(&*transport.identity_header, identity.as_str());
            }

            let response = builder
                .send()
                .await
                .map_err(|source| BggError::RequestSend { endpoint, source })?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|source| BggError::ReadBody { endpoint, source })?;

            Ok(UpstreamResponse { status, body })
        })
    }
}
