//! Structured batch logging and subscriber setup.

use tracing::{debug, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipocr_models::{BatchResult, ClipId};

use crate::processor::ClipOutcome;

/// Per-batch logger. Every event carries the batch id and the number of
/// clips the batch started with.
#[derive(Debug, Clone)]
pub struct BatchLogger {
    batch_id: String,
    total: u32,
}

impl BatchLogger {
    pub fn new(total: u32) -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            total,
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn log_start(&self) {
        info!(batch_id = %self.batch_id, total = self.total, "Batch started");
    }

    /// One clip finished; `index` is 0-based.
    pub fn log_clip(&self, index: usize, clip_id: &ClipId, outcome: &ClipOutcome) {
        let position = index + 1;
        match outcome {
            ClipOutcome::Failed(reason) => warn!(
                batch_id = %self.batch_id,
                clip_id = %clip_id,
                position = position,
                total = self.total,
                "Clip failed: {}", reason
            ),
            _ => debug!(
                batch_id = %self.batch_id,
                clip_id = %clip_id,
                position = position,
                total = self.total,
                outcome = ?outcome,
                "Clip finished"
            ),
        }
    }

    pub fn log_finished(&self, result: &BatchResult) {
        if result.cancelled {
            warn!(
                batch_id = %self.batch_id,
                succeeded = result.success_count,
                total = self.total,
                "Batch cancelled"
            );
        } else if result.all_succeeded() || result.is_empty() {
            info!(batch_id = %self.batch_id, total = self.total, "Batch completed");
        } else {
            warn!(
                batch_id = %self.batch_id,
                succeeded = result.success_count,
                failed = result.failed_count,
                "Batch completed with failures"
            );
        }
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("batch", batch_id = %self.batch_id, total = self.total)
    }
}

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, colored text
/// otherwise. `RUST_LOG` is honored on top of the crate defaults.
pub fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("clipocr=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_batch_gets_its_own_id() {
        let a = BatchLogger::new(3);
        let b = BatchLogger::new(3);
        assert_ne!(a.batch_id(), b.batch_id());
        assert!(uuid::Uuid::parse_str(a.batch_id()).is_ok());
    }
}
