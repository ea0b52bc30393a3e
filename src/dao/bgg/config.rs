use std::time::Duration;

/// Public endpoint of the XML API 2.
pub const DEFAULT_BASE_URL: &str = "https://boardgamegeek.com/xmlapi2";
/// Header carrying the end user's address so upstream throttling is attributed to them.
pub const DEFAULT_IDENTITY_HEADER: &str = "X-Forwarded-For";
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration describing how to reach the inventory service.
#[derive(Debug, Clone)]
pub struct BggConfig {
    /// Base URL of the XML API, without a trailing slash.
    pub base_url: String,
    /// Total number of requests made for one collection before giving up.
    pub max_attempts: u32,
    /// Fixed pause between two polls of a collection that is still being prepared.
    pub retry_delay: Duration,
    /// Upper bound for a single HTTP request, body included.
    pub request_timeout: Duration,
    /// Header the caller's identity is forwarded in.
    pub identity_header: String,
}

impl BggConfig {
    /// Point the client at another base URL, keeping the default policy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for BggConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            identity_header: DEFAULT_IDENTITY_HEADER.to_owned(),
        }
    }
}
