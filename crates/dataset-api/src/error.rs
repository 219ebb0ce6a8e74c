use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),

    #[error("server error: HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    /// Operation invoked without the state it needs. A usage bug, never retried.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
