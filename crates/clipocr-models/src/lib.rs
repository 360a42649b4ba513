//! Shared data models for the clip OCR pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Clips (units of OCR work) and their status machine
//! - Batch aggregates
//! - Progress notifications consumed by the presentation layer
//! - Credit transactions recorded by the ledger

pub mod batch;
pub mod clip;
pub mod credit_transaction;
pub mod progress;

// Re-export common types
pub use batch::BatchResult;
pub use clip::{Clip, ClipId, ClipResult, ClipStatus, ParseStatusError, Payload};
pub use credit_transaction::{CreditOperationType, CreditTransaction};
pub use progress::ProgressEvent;
