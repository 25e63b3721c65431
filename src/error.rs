use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised by the outbound [`crate::fetcher::Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Failures inside the two-stage pipeline. Never surfaced to HTTP callers;
/// [`crate::extractor::Extractor::extract`] turns all of them into an empty result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("stage {stage} fetch failed: {source}")]
    Fetch {
        stage: u8,
        #[source]
        source: FetchError,
    },

    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractError {
    pub(crate) fn stage(stage: u8) -> impl FnOnce(FetchError) -> ExtractError {
        move |source| match source {
            FetchError::Cancelled => ExtractError::Cancelled,
            source => ExtractError::Fetch { stage, source },
        }
    }
}

/// Infrastructure failures around an extraction; the only source of HTTP 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("extraction limiter closed")]
    Limiter(#[from] tokio::sync::AcquireError),

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
