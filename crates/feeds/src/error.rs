//! Error taxonomy for provider operations.

use thiserror::Error;

/// Errors that can occur while talking to a data provider.
///
/// The monitor never surfaces these to users: transient errors degrade to
/// "no data this cycle", missing keys silently disable an adapter family.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("resource not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Parse(String),

    #[error("API key for {0} is not configured")]
    MissingApiKey(&'static str),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl FetchError {
    /// True if a retry with backoff may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout
                | FetchError::RateLimited
                | FetchError::Transport(_)
                | FetchError::Status(_)
        )
    }
}
