use std::error::Error;
use thiserror::Error;

/// Result alias for room store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by room store backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the command (connection refused, timeout, protocol error).
    #[error("{backend} store unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend has been shut down and no longer accepts commands or subscriptions.
    #[error("{backend} store is shut down")]
    Shutdown { backend: &'static str },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(
        backend: &'static str,
        message: String,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            backend,
            message,
            source: Box::new(source),
        }
    }
}
