//! OCR client metrics.
//!
//! Request counters by outcome, retry counters by reason and per-attempt
//! latency. Without an installed recorder these are no-ops.

use metrics::{counter, histogram};

pub mod names {
    /// Completed calls by final outcome.
    pub const REQUESTS_TOTAL: &str = "ocr_requests_total";

    /// Retries scheduled, by the error kind that caused them.
    pub const RETRIES_TOTAL: &str = "ocr_retries_total";

    /// Latency of a single attempt in seconds.
    pub const ATTEMPT_LATENCY_SECONDS: &str = "ocr_attempt_latency_seconds";
}

/// Record the final outcome of a call.
pub fn record_request(outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a retry.
pub fn record_retry(reason: &'static str) {
    counter!(names::RETRIES_TOTAL, "reason" => reason).increment(1);
}

/// Record how long one attempt took.
pub fn record_attempt_latency(latency_secs: f64) {
    histogram!(names::ATTEMPT_LATENCY_SECONDS).record(latency_secs);
}
