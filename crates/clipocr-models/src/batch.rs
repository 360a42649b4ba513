//! Batch aggregate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome counts for one batch run.
///
/// `total` is the number of clips eligible when the batch started. Clips a
/// cancelled batch never reached are counted in `failed_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total: u32,
    pub success_count: u32,
    pub failed_count: u32,
    /// The loop stopped on a cancellation request
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchResult {
    pub fn new(total: u32, success_count: u32, cancelled: bool) -> Self {
        Self {
            total,
            success_count,
            failed_count: total.saturating_sub(success_count),
            cancelled,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.total > 0 && self.failed_count == 0
    }
}
