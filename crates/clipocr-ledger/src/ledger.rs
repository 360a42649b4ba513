//! Credit ledger capability.

use async_trait::async_trait;

use clipocr_models::CreditTransaction;

use crate::error::LedgerResult;

/// Outcome of a successful debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitReceipt {
    /// Recorded transaction, `None` for a zero-credit debit
    pub transaction_id: Option<String>,
    pub debited: u64,
    pub balance_after: u64,
}

/// Per-user credit balance store.
///
/// Implementations must apply `debit` atomically: either the full amount is
/// taken and a transaction recorded, or nothing changes.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance. `NotFound` if the user has no account.
    async fn get_balance(&self, user_id: &str) -> LedgerResult<u64>;

    /// Take `amount` credits. Fails with `InsufficientFunds` if the balance
    /// does not cover it.
    async fn debit(&self, user_id: &str, amount: u64, description: &str)
        -> LedgerResult<DebitReceipt>;

    /// Add credits, opening the account if needed. Returns the new balance.
    async fn top_up(&self, user_id: &str, amount: u64, description: &str) -> LedgerResult<u64>;

    /// Most recent transactions first, at most `limit`.
    async fn history(&self, user_id: &str, limit: usize) -> LedgerResult<Vec<CreditTransaction>>;
}
