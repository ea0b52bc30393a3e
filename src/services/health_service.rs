use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the room store, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "room store health check failed");
            HealthResponse::degraded()
        }
    }
}
