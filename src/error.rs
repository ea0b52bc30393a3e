use thiserror::Error;

use crate::{codec::DecodeError, dao::bgg::BggError, dao::storage::StorageError};

/// Errors that can occur in room service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Room store backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// A value read back from the store could not be decoded.
    #[error("corrupt {kind} record for user `{user}` in room `{room}`")]
    CorruptRecord {
        /// Room the record belongs to.
        room: String,
        /// Hash field (user) holding the record.
        user: String,
        /// Which hash the record was read from (`games` or `vote`).
        kind: &'static str,
        #[source]
        source: DecodeError,
    },
    /// A value could not be serialised before being written or published.
    #[error("failed to encode {what}")]
    Encode {
        /// What was being serialised.
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The upstream inventory service could not provide the requested data.
    #[error("upstream lookup failed")]
    Upstream(#[source] BggError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<BggError> for ServiceError {
    fn from(err: BggError) -> Self {
        ServiceError::Upstream(err)
    }
}
