use serde::Serialize;

/// Health payload reported to whatever surface embeds the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
}

impl HealthResponse {
    /// The room store answers.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    /// The room store does not answer; room operations will fail.
    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }

    /// Whether the status is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
