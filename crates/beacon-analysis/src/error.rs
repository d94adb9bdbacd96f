use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The service answered, but not with a valid `AnalysisResult`.
    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),

    #[error("nothing to analyze")]
    EmptyText,

    #[error("analysis endpoint is not configured")]
    NotConfigured,
}
