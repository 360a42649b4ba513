//! Ordered clip work queue.
//!
//! This crate provides:
//! - Insertion-ordered clip storage with explicit reordering
//! - Status updates guarded by the clip state machine
//! - Eligibility queries used by the batch processor

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{SharedQueue, WorkQueue};
