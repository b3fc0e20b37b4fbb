//! Ledger domain types.
//!
//! Operation types are a closed set. Each one is either a debit (consumes
//! prior credit) or a credit (provides balance that later debits consume),
//! and the kind fixes the sign a caller must use for the amount.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, TransactionId};

use super::error::LedgerError;

/// Whether an operation consumes or provides balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Consumes credit. Amounts are negative.
    Debit,
    /// Provides credit. Amounts are positive.
    Credit,
}

impl OperationKind {
    /// Returns true if `amount` carries the sign this kind requires.
    ///
    /// Zero carries no sign and is never accepted.
    #[must_use]
    pub fn accepts(self, amount: Decimal) -> bool {
        match self {
            Self::Debit => amount < Decimal::ZERO,
            Self::Credit => amount > Decimal::ZERO,
        }
    }
}

/// Operation type of a transaction, stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum OperationType {
    /// Cash purchase.
    Purchase = 1,
    /// Purchase paid in installments.
    InstallmentPurchase = 2,
    /// Cash withdrawal.
    Withdrawal = 3,
    /// Payment into the account.
    Payment = 4,
}

impl OperationType {
    /// Every operation type, in id order.
    pub const ALL: [Self; 4] = [
        Self::Purchase,
        Self::InstallmentPurchase,
        Self::Withdrawal,
        Self::Payment,
    ];

    /// Returns the stored integer id.
    #[must_use]
    pub const fn id(self) -> i32 {
        self as i32
    }

    /// Returns the debit/credit classification.
    #[must_use]
    pub const fn kind(self) -> OperationKind {
        match self {
            Self::Purchase | Self::InstallmentPurchase | Self::Withdrawal => OperationKind::Debit,
            Self::Payment => OperationKind::Credit,
        }
    }

    /// Human-readable label, matching the seeded `operation_types` table.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::InstallmentPurchase => "INSTALLMENT PURCHASE",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Payment => "PAYMENT",
        }
    }

    /// Returns true for operations that consume credit.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self.kind(), OperationKind::Debit)
    }

    /// Returns true for operations that provide credit.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self.kind(), OperationKind::Credit)
    }
}

impl TryFrom<i32> for OperationType {
    type Error = LedgerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.id() == value)
            .ok_or(LedgerError::InvalidOperationType(value))
    }
}

impl From<OperationType> for i32 {
    fn from(value: OperationType) -> Self {
        value.id()
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// An account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned identifier.
    pub account_id: AccountId,
    /// Caller-supplied document number (always positive).
    pub document_number: i64,
}

/// A recorded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identifier.
    pub transaction_id: TransactionId,
    /// The account this transaction belongs to.
    pub account_id: AccountId,
    /// The operation type.
    pub operation_type: OperationType,
    /// Signed amount: negative for debits, positive for credits.
    pub amount: Decimal,
    /// Credit rows: unconsumed credit. Debit rows: the part of the debit
    /// that no credit covered. Never negative.
    pub balance: Decimal,
    /// When the transaction was recorded.
    pub event_date: DateTime<Utc>,
}

/// A transaction row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The account this transaction belongs to.
    pub account_id: AccountId,
    /// The operation type.
    pub operation_type: OperationType,
    /// Signed, normalized amount.
    pub amount: Decimal,
    /// Initial balance: the amount for credits, zero for debits.
    pub balance: Decimal,
}

impl NewTransaction {
    /// Builds the row for a validated operation, with its initial balance.
    #[must_use]
    pub fn new(account_id: AccountId, operation_type: OperationType, amount: Decimal) -> Self {
        let balance = if operation_type.is_credit() {
            amount
        } else {
            Decimal::ZERO
        };

        Self {
            account_id,
            operation_type,
            amount,
            balance,
        }
    }
}

/// A credit transaction that still has balance to give.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditRow {
    /// The credit transaction.
    pub transaction_id: TransactionId,
    /// Its remaining balance.
    pub balance: Decimal,
    /// When it was recorded (drives consumption order).
    pub event_date: DateTime<Utc>,
}

impl From<&Transaction> for CreditRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            balance: tx.balance,
            event_date: tx.event_date,
        }
    }
}

/// A change to one credit row's balance produced by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// The credit transaction to update.
    pub transaction_id: TransactionId,
    /// Balance before the allocation.
    pub previous_balance: Decimal,
    /// Balance after the allocation.
    pub new_balance: Decimal,
}

impl BalanceUpdate {
    /// Amount taken from this row.
    #[must_use]
    pub fn consumed(&self) -> Decimal {
        self.previous_balance - self.new_balance
    }
}
