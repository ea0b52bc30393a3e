//! Error types raised while talking to the inventory service.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`BggError`] failures.
pub type BggResult<T> = Result<T, BggError>;

/// Failures that can occur while fetching data from the inventory service.
#[derive(Debug, Error)]
pub enum BggError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build inventory HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send request to `{endpoint}`")]
    RequestSend {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be read.
    #[error("failed to read response body from `{endpoint}`")]
    ReadBody {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The collection was still being prepared after every allowed poll.
    #[error("collection for `{username}` still processing after {attempts} attempts")]
    RetryExhausted { username: String, attempts: u32 },
    /// The service answered with a non-success status; `body` is kept for diagnostics.
    #[error("inventory service returned {status} for `{endpoint}`: {body}")]
    UpstreamStatus {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    /// The service answered 200 but reported an error document (unknown user, etc).
    #[error("inventory service rejected the request: {message}")]
    Rejected { message: String },
    /// The response body was not the expected XML document.
    #[error("malformed response from `{endpoint}`")]
    MalformedResponse {
        endpoint: &'static str,
        #[source]
        source: quick_xml::DeError,
    },
    /// No game exists with the requested identifier.
    #[error("game `{id}` not found")]
    NotFound { id: String },
    /// The fetch task panicked or was cancelled before completing.
    #[error("fetch task failed")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}
