use thiserror::Error;

/// Typed failure returned by a [`Fetcher`](crate::Fetcher).
///
/// The orchestrator absorbs every variant: a failed source contributes no
/// offers and is reported in its [`SourceReport`](crate::SourceReport).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("blocked by anti-bot protection at {url}: {reason}")]
    Blocked { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search page not found: {url}")]
    NotFound { url: String },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("source {source_id} is not configured: {reason}")]
    NotConfigured { source_id: String, reason: String },
}

/// Input errors rejected before any source is contacted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("max_results must be between 1 and {limit}, got {max_results}")]
    InvalidMaxResults { max_results: usize, limit: usize },

    #[error("none of the requested platforms ({requested}) are available; available: {available}")]
    NoMatchingSources { requested: String, available: String },
}

impl From<pricescout_core::CoreError> for SearchError {
    fn from(err: pricescout_core::CoreError) -> Self {
        match err {
            pricescout_core::CoreError::UnsupportedRegion(region) => {
                SearchError::UnsupportedRegion(region)
            }
        }
    }
}
