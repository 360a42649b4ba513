//! Batch metrics.

use metrics::counter;

pub mod names {
    pub const BATCH_CLIPS_TOTAL: &str = "ocr_batch_clips_total";
    pub const BATCHES_TOTAL: &str = "ocr_batches_total";
    pub const CREDIT_ERRORS_TOTAL: &str = "ocr_credit_errors_total";
}

/// Count one clip outcome: `success`, `failed` or `skipped`.
pub fn record_clip(outcome: &'static str) {
    counter!(names::BATCH_CLIPS_TOTAL, "outcome" => outcome).increment(1);
}

/// Count a finished batch.
pub fn record_batch(cancelled: bool) {
    let status = if cancelled { "cancelled" } else { "completed" };
    counter!(names::BATCHES_TOTAL, "status" => status).increment(1);
}

/// Count a ledger failure that did not stop the run.
pub fn record_credit_error(stage: &'static str, kind: &'static str) {
    counter!(names::CREDIT_ERRORS_TOTAL, "stage" => stage, "kind" => kind).increment(1);
}
