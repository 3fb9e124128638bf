use thiserror::Error;

/// Errors raised while talking to the recommendation service.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Recommendation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RecommendationError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Connection(_) => "connection",
            Self::Status { .. } => "status",
            Self::Encode(_) => "encode",
        }
    }
}
