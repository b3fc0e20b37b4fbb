//! Transaction recorder.
//!
//! Records one transaction per unit of work:
//!
//! 1. Validate the account id, operation type, amount range and sign,
//!    reporting every violation at once (no store access yet)
//! 2. Open a unit of work, locking the account
//! 3. Insert the row (credit: balance = amount, debit: balance = 0)
//! 4. For debits, run the balance consumption engine over the account's
//!    credit rows and write every update back; an uncovered remainder is
//!    stored on the debit row
//! 5. Re-read the row, then commit
//!
//! Any failure after step 2 rolls the whole unit back.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, TransactionId};
use tracing::{debug, info, warn};

use super::allocation::BalanceConsumptionEngine;
use super::deadline::Deadline;
use super::error::{LedgerError, RecordStep};
use super::store::{LedgerStore, LedgerUnit};
use super::types::{NewTransaction, OperationType, Transaction};
use super::validation::{validate_record, validate_transaction_id};

/// Time a rollback gets once the request deadline has already passed.
const ROLLBACK_GRACE: Duration = Duration::from_millis(500);

/// Input for recording a transaction, as received from a caller.
#[derive(Debug, Clone)]
pub struct RecordTransactionInput {
    /// The account to record against.
    pub account_id: AccountId,
    /// Raw operation type id (1-4).
    pub operation_type_id: i32,
    /// Signed amount.
    pub amount: Decimal,
}

/// Records transactions and applies credit consumption atomically.
pub struct TransactionRecorder<S> {
    store: Arc<S>,
}

impl<S> Clone for TransactionRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> TransactionRecorder<S> {
    /// Creates a recorder over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records a transaction and returns it as persisted.
    ///
    /// # Errors
    ///
    /// Returns a validation error before touching the store, `UnknownAccount`
    /// if the account does not exist, or a `Timeout`/`Storage` error tagged
    /// with the failing step. Nothing is persisted when an error is returned.
    pub async fn record(
        &self,
        input: RecordTransactionInput,
        deadline: Deadline,
    ) -> Result<Transaction, LedgerError> {
        let (account_id, operation_type, amount) =
            validate_record(input.account_id, input.operation_type_id, input.amount)?;

        let mut unit = self
            .store
            .begin(account_id, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Begin, e))?;
        debug!(account_id = %account_id, remaining = ?deadline.remaining(), "Unit of work opened");

        let transaction =
            match Self::apply(&mut unit, account_id, operation_type, amount, deadline).await {
                Ok(transaction) => transaction,
                Err(err) => {
                    let rollback_deadline = if deadline.is_expired() {
                        Deadline::after(ROLLBACK_GRACE)
                    } else {
                        deadline
                    };
                    if let Err(rollback_err) = unit.rollback(rollback_deadline).await {
                        warn!(
                            account_id = %account_id,
                            error = %rollback_err,
                            "Rollback failed, unit is discarded on drop"
                        );
                    }
                    return Err(err);
                }
            };

        unit.commit(deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Commit, e))?;

        info!(
            account_id = %account_id,
            transaction_id = %transaction.transaction_id,
            operation_type = %operation_type,
            amount = %amount,
            balance = %transaction.balance,
            "Transaction recorded"
        );

        Ok(transaction)
    }

    /// Finds a committed transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransactionId`, `TransactionNotFound`, or a store error.
    pub async fn get(
        &self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Transaction, LedgerError> {
        let transaction_id = validate_transaction_id(transaction_id)?;

        self.store
            .find_transaction(transaction_id, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Lookup, e))?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    /// Steps 3 to 5, all inside `unit`.
    async fn apply(
        unit: &mut S::Unit,
        account_id: AccountId,
        operation_type: OperationType,
        amount: Decimal,
        deadline: Deadline,
    ) -> Result<Transaction, LedgerError> {
        let row = NewTransaction::new(account_id, operation_type, amount);
        let transaction_id = unit
            .insert_transaction(row, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Insert, e))?;

        if operation_type.is_debit() {
            let rows = unit
                .select_credit_rows(account_id, deadline)
                .await
                .map_err(|e| LedgerError::from_store(RecordStep::AllocationRead, e))?;

            let allocation = BalanceConsumptionEngine::allocate(rows, amount.abs())?;

            for update in &allocation.updates {
                unit.update_transaction_balance(update.transaction_id, update.new_balance, deadline)
                    .await
                    .map_err(|e| LedgerError::from_store(RecordStep::AllocationWrite, e))?;
            }

            if !allocation.is_fully_covered() {
                warn!(
                    account_id = %account_id,
                    transaction_id = %transaction_id,
                    remainder = %allocation.remainder,
                    "Debit exceeds available credit"
                );
                unit.update_transaction_balance(transaction_id, allocation.remainder, deadline)
                    .await
                    .map_err(|e| LedgerError::from_store(RecordStep::AllocationWrite, e))?;
            }
        }

        unit.find_transaction(transaction_id, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Reload, e))?
            .ok_or_else(|| LedgerError::Storage {
                step: RecordStep::Reload,
                message: format!("transaction {transaction_id} not visible after insert"),
            })
    }
}
