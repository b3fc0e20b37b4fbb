//! Balance consumption engine.
//!
//! When a debit is recorded it consumes outstanding credit from the
//! account's earlier credit transactions, newest first:
//!
//! 1. Keep rows with a positive balance.
//! 2. Order them by `event_date DESC, transaction_id DESC`.
//! 3. Take `min(balance, remaining)` from each row until the debit is covered.
//! 4. Emit an update for every row something was taken from.
//!
//! Whatever the rows cannot cover is reported as the remainder. The engine
//! never blocks a debit for lack of credit; the caller decides what to do.
//! No I/O happens here, the rows are fetched by the caller.

use rust_decimal::Decimal;
use tracing::debug;

use super::error::LedgerError;
use super::types::{BalanceUpdate, CreditRow};

/// Result of allocating one debit against credit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Rows that were consumed, in consumption order.
    pub updates: Vec<BalanceUpdate>,
    /// Part of the debit no credit covered. Never negative.
    pub remainder: Decimal,
}

impl Allocation {
    /// Total credit consumed across all updates.
    #[must_use]
    pub fn consumed(&self) -> Decimal {
        self.updates.iter().map(BalanceUpdate::consumed).sum()
    }

    /// Returns true if the debit was fully covered.
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.remainder.is_zero()
    }
}

/// Allocates debits against credit rows.
pub struct BalanceConsumptionEngine;

impl BalanceConsumptionEngine {
    /// Allocates `debit_amount` (an absolute value) against `rows`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `debit_amount` is not positive.
    pub fn allocate(
        mut rows: Vec<CreditRow>,
        debit_amount: Decimal,
    ) -> Result<Allocation, LedgerError> {
        if debit_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(debit_amount));
        }

        rows.retain(|row| row.balance > Decimal::ZERO);
        rows.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then_with(|| b.transaction_id.cmp(&a.transaction_id))
        });

        let mut remaining = debit_amount;
        let mut updates = Vec::new();

        for row in rows {
            if remaining.is_zero() {
                break;
            }

            let take = row.balance.min(remaining);
            remaining -= take;

            debug!(
                transaction_id = %row.transaction_id,
                available = %row.balance,
                take = %take,
                "Consuming credit"
            );

            updates.push(BalanceUpdate {
                transaction_id: row.transaction_id,
                previous_balance: row.balance,
                new_balance: row.balance - take,
            });
        }

        Ok(Allocation {
            updates,
            remainder: remaining,
        })
    }
}
