//! Batch OCR worker.
//!
//! Drains the clip queue through the OCR client one clip at a time,
//! optionally gated by a per-user credit ledger.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, BatchLogger};
pub use orchestrator::{CreditGate, Orchestrator};
pub use processor::{BatchProcessor, CancelHandle, ClipOutcome};
