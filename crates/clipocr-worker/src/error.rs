//! Worker error types.

use thiserror::Error;

use clipocr_models::ClipId;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("A batch is already running")]
    BatchInProgress,

    #[error("No clips are waiting for recognition")]
    NothingPending,

    #[error("Insufficient credits: {needed} needed, {available} available")]
    InsufficientCredits { needed: u64, available: u64 },

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Queue error: {0}")]
    Queue(#[from] clipocr_queue::QueueError),

    #[error("OCR error: {0}")]
    Ocr(#[from] clipocr_ocr_client::OcrError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] clipocr_ledger::LedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
