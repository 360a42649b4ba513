//! OCR client error types.

use thiserror::Error;

pub type OcrResult<T> = Result<T, OcrError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrError {
    #[error("OCR request timed out after {0}ms")]
    Timeout(u64),

    #[error("OCR service temporarily unavailable")]
    ServiceUnavailable,

    #[error("OCR service returned HTTP {0}")]
    RemoteError(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("OCR request cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl OcrError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-success HTTP status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            503 => Self::ServiceUnavailable,
            other => Self::RemoteError(other),
        }
    }

    /// Check if error is transient and worth another attempt.
    ///
    /// Connectivity failures are not included; see
    /// `OcrClientConfig::retry_transport_errors`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OcrError::Timeout(_) | OcrError::ServiceUnavailable)
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            OcrError::Timeout(_) => "timeout",
            OcrError::ServiceUnavailable => "service_unavailable",
            OcrError::RemoteError(_) => "remote_error",
            OcrError::Transport(_) => "transport",
            OcrError::Cancelled => "cancelled",
            OcrError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
