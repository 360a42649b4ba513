//! Credit transaction data models.
//!
//! Each ledger mutation records what it was for and the resulting balance.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type of credit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreditOperationType {
    /// Credits consumed by recognized clips
    Usage,
    /// Purchased credits
    Purchase,
    /// Test or manual top-up
    TestAddition,
}

impl CreditOperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::Purchase => "purchase",
            Self::TestAddition => "test_addition",
        }
    }

    /// Returns a human-readable label for the operation type.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Usage => "OCR Usage",
            Self::Purchase => "Credit Purchase",
            Self::TestAddition => "Test Credits",
        }
    }

    /// Whether this operation removes credits from the balance.
    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Usage)
    }
}

/// A credit transaction record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreditTransaction {
    /// Unique identifier for this transaction (UUID)
    pub id: String,

    pub user_id: String,

    pub operation_type: CreditOperationType,

    /// Number of credits moved
    pub credits: u64,

    /// Human-readable description of the operation
    pub description: String,

    /// Balance after this transaction
    pub balance_after: u64,

    pub timestamp: DateTime<Utc>,
}

impl CreditTransaction {
    pub fn new(
        user_id: impl Into<String>,
        operation_type: CreditOperationType,
        credits: u64,
        description: impl Into<String>,
        balance_after: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            operation_type,
            credits,
            description: description.into(),
            balance_after,
            timestamp: Utc::now(),
        }
    }

    /// Signed display string, e.g. `-3` for usage or `+10` for a top-up.
    pub fn signed_amount(&self) -> String {
        if self.operation_type.is_debit() {
            format!("-{}", self.credits)
        } else {
            format!("+{}", self.credits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount() {
        let usage = CreditTransaction::new("u1", CreditOperationType::Usage, 3, "OCR", 7);
        assert_eq!(usage.signed_amount(), "-3");

        let top_up = CreditTransaction::new("u1", CreditOperationType::TestAddition, 10, "Test", 17);
        assert_eq!(top_up.signed_amount(), "+10");
    }

    #[test]
    fn test_operation_type_serialization() {
        let json = serde_json::to_string(&CreditOperationType::TestAddition).unwrap();
        assert_eq!(json, "\"test_addition\"");
    }
}
