//! In-process ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use clipocr_models::{CreditOperationType, CreditTransaction};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{CreditLedger, DebitReceipt};

#[derive(Debug, Default)]
struct Account {
    balance: u64,
    transactions: Vec<CreditTransaction>,
}

impl Account {
    fn record(
        &mut self,
        user_id: &str,
        operation_type: CreditOperationType,
        credits: u64,
        description: &str,
    ) -> String {
        let tx = CreditTransaction::new(
            user_id,
            operation_type,
            credits,
            description,
            self.balance,
        );
        let id = tx.id.clone();
        self.transactions.push(tx);
        id
    }
}

/// Ledger kept in memory, used by the local binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with one funded account.
    pub fn with_balance(user_id: impl Into<String>, credits: u64) -> Self {
        let user_id = user_id.into();
        let mut account = Account {
            balance: credits,
            transactions: Vec::new(),
        };
        account.record(
            &user_id,
            CreditOperationType::TestAddition,
            credits,
            "Initial balance",
        );

        let mut accounts = HashMap::new();
        accounts.insert(user_id, account);
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn get_balance(&self, user_id: &str) -> LedgerResult<u64> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(user_id)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::not_found(user_id))
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: u64,
        description: &str,
    ) -> LedgerResult<DebitReceipt> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(user_id).ok_or_else(|| {
            warn!(user_id = %user_id, "User not found when debiting credits");
            LedgerError::not_found(user_id)
        })?;

        if amount == 0 {
            return Ok(DebitReceipt {
                transaction_id: None,
                debited: 0,
                balance_after: account.balance,
            });
        }

        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: account.balance,
            });
        }

        account.balance -= amount;
        let transaction_id =
            account.record(user_id, CreditOperationType::Usage, amount, description);

        info!(
            user_id = %user_id,
            credits = amount,
            balance = account.balance,
            "Debited credits"
        );

        Ok(DebitReceipt {
            transaction_id: Some(transaction_id),
            debited: amount,
            balance_after: account.balance,
        })
    }

    async fn top_up(&self, user_id: &str, amount: u64, description: &str) -> LedgerResult<u64> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.entry(user_id.to_string()).or_default();

        account.balance = account.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::backend(format!("Balance overflow for user {}", user_id))
        })?;
        account.record(user_id, CreditOperationType::Purchase, amount, description);

        debug!(user_id = %user_id, credits = amount, balance = account.balance, "Added credits");
        Ok(account.balance)
    }

    async fn history(&self, user_id: &str, limit: usize) -> LedgerResult<Vec<CreditTransaction>> {
        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(user_id)
            .ok_or_else(|| LedgerError::not_found(user_id))?;

        Ok(account
            .transactions
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
