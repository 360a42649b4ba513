//! Queue error types.

use thiserror::Error;

use clipocr_models::{ClipId, ClipStatus};

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Duplicate clip ID: {0}")]
    DuplicateId(ClipId),

    #[error("Unknown clip ID: {0}")]
    UnknownId(ClipId),

    #[error("Reorder omits {} queued clip(s)", .0.len())]
    MissingItems(Vec<ClipId>),

    #[error("Queue order is frozen while a batch is running")]
    OrderFrozen,

    #[error("Clip {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ClipId,
        from: ClipStatus,
        to: ClipStatus,
    },
}

impl QueueError {
    pub fn invalid_transition(id: &ClipId, from: ClipStatus, to: ClipStatus) -> Self {
        Self::InvalidTransition {
            id: id.clone(),
            from,
            to,
        }
    }
}
