//! Ledger error types.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Ledger backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    pub fn not_found(user_id: impl Into<String>) -> Self {
        Self::NotFound(user_id.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::NotFound(_) => "not_found",
            Self::Backend(_) => "backend",
        }
    }
}
