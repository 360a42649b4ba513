//! Credit-gated batch runs.
//!
//! Credits are checked before a batch starts and charged after it finishes,
//! only for clips that were recognized.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use clipocr_ledger::{CreditLedger, LedgerError};
use clipocr_models::{BatchResult, ClipId};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics::record_credit_error;
use crate::processor::{BatchProcessor, ClipOutcome};

/// Ledger account charged for recognized clips.
#[derive(Clone)]
pub struct CreditGate {
    pub ledger: Arc<dyn CreditLedger>,
    pub user_id: String,
    pub credits_per_clip: u64,
}

impl CreditGate {
    pub fn new(ledger: Arc<dyn CreditLedger>, user_id: impl Into<String>) -> Self {
        Self {
            ledger,
            user_id: user_id.into(),
            credits_per_clip: 1,
        }
    }

    pub fn with_credits_per_clip(mut self, credits: u64) -> Self {
        self.credits_per_clip = credits;
        self
    }

    /// Fail with `InsufficientCredits` if the balance cannot cover `clips`.
    ///
    /// A user without an account has a balance of zero. Backend failures are
    /// logged and do not block the run.
    async fn ensure_covers(&self, clips: u64) -> WorkerResult<()> {
        let needed = clips.saturating_mul(self.credits_per_clip);
        let available = match self.ledger.get_balance(&self.user_id).await {
            Ok(balance) => balance,
            Err(LedgerError::NotFound(_)) => 0,
            Err(e) => {
                warn!(user_id = %self.user_id, "Credit check failed, continuing: {}", e);
                record_credit_error("check", e.kind());
                return Ok(());
            }
        };

        if available < needed {
            info!(
                user_id = %self.user_id,
                needed = needed,
                available = available,
                "Not enough credits to start"
            );
            return Err(WorkerError::InsufficientCredits { needed, available });
        }
        Ok(())
    }

    /// Charge for `clips` recognized clips. Failures are logged, never
    /// returned: the recognized text is kept either way.
    async fn charge(&self, clips: u32) {
        let amount = u64::from(clips).saturating_mul(self.credits_per_clip);
        if amount == 0 {
            debug!(user_id = %self.user_id, "Nothing to charge");
            return;
        }

        let description = format!("OCR: {} clip(s) processed", clips);
        match self.ledger.debit(&self.user_id, amount, &description).await {
            Ok(receipt) => info!(
                user_id = %self.user_id,
                credits = receipt.debited,
                balance = receipt.balance_after,
                "Charged credits"
            ),
            Err(e) => {
                error!(
                    user_id = %self.user_id,
                    credits = amount,
                    "Failed to charge credits: {}", e
                );
                record_credit_error("charge", e.kind());
            }
        }
    }
}

/// Runs batches with an optional credit gate around them.
pub struct Orchestrator {
    processor: Arc<BatchProcessor>,
    credits: Option<CreditGate>,
}

impl Orchestrator {
    pub fn new(processor: Arc<BatchProcessor>, credits: Option<CreditGate>) -> Self {
        Self { processor, credits }
    }

    pub fn processor(&self) -> &Arc<BatchProcessor> {
        &self.processor
    }

    pub fn credits(&self) -> Option<&CreditGate> {
        self.credits.as_ref()
    }

    /// Check credits, process every eligible clip, then charge for the
    /// successes.
    pub async fn run(&self) -> WorkerResult<BatchResult> {
        let pending = self.processor.queue().read().await.pending().len() as u64;
        if pending == 0 {
            return Err(WorkerError::NothingPending);
        }

        if let Some(gate) = &self.credits {
            gate.ensure_covers(pending).await?;
        }

        let result = self.processor.process_all().await?;

        if let Some(gate) = &self.credits {
            gate.charge(result.success_count).await;
        }
        Ok(result)
    }

    /// Recognize a single clip, charging for it on success.
    pub async fn run_one(&self, id: &ClipId) -> WorkerResult<ClipOutcome> {
        let eligible = match self.processor.queue().read().await.get(id) {
            Some(clip) => clip.status.is_eligible(),
            None => return Err(WorkerError::ClipNotFound(id.clone())),
        };

        if let (Some(gate), true) = (&self.credits, eligible) {
            gate.ensure_covers(1).await?;
        }

        let outcome = self.processor.process_one(id).await?;

        if let (Some(gate), ClipOutcome::Succeeded) = (&self.credits, &outcome) {
            gate.charge(1).await;
        }
        Ok(outcome)
    }
}
