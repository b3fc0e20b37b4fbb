//! The storage contract the ledger core composes.
//!
//! Implementations live outside this crate (Postgres in `tally-db`) plus the
//! in-memory store in [`super::memory`]. Every call takes a [`Deadline`] and
//! must give up with [`StoreError::Timeout`] once it passes.
//!
//! A [`LedgerUnit`] is one atomic unit of work scoped to a single account.
//! Opening it serializes against other units for the same account; dropping
//! it without [`LedgerUnit::commit`] discards every write made through it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, TransactionId};
use thiserror::Error;

use super::deadline::Deadline;
use super::types::{Account, CreditRow, NewTransaction, Transaction};

/// Failures reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The call did not finish before its deadline.
    #[error("store call exceeded its deadline")]
    Timeout,

    /// The account a unit of work was opened for does not exist.
    #[error("account {0} does not exist")]
    AccountMissing(AccountId),

    /// Anything else the backend reported.
    #[error("{0}")]
    Backend(String),
}

/// Read and write primitives over accounts and transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Unit of work type returned by [`LedgerStore::begin`].
    type Unit: LedgerUnit;

    /// Inserts an account and returns it with its assigned id.
    async fn insert_account(
        &self,
        document_number: i64,
        deadline: Deadline,
    ) -> Result<Account, StoreError>;

    /// Finds an account by id.
    async fn find_account(
        &self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Option<Account>, StoreError>;

    /// Finds a committed transaction by id.
    async fn find_transaction(
        &self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Opens a unit of work holding the account's lock.
    ///
    /// Fails with [`StoreError::AccountMissing`] if the account does not exist.
    async fn begin(&self, account_id: AccountId, deadline: Deadline)
    -> Result<Self::Unit, StoreError>;
}

/// An atomic unit of work over one account's transactions.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Inserts a transaction row and returns its assigned id.
    async fn insert_transaction(
        &mut self,
        row: NewTransaction,
        deadline: Deadline,
    ) -> Result<TransactionId, StoreError>;

    /// Lists the account's credit rows with a nonzero balance,
    /// newest first (`event_date DESC, transaction_id DESC`).
    async fn select_credit_rows(
        &mut self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Vec<CreditRow>, StoreError>;

    /// Overwrites one transaction's balance.
    async fn update_transaction_balance(
        &mut self,
        transaction_id: TransactionId,
        balance: Decimal,
        deadline: Deadline,
    ) -> Result<(), StoreError>;

    /// Finds a transaction, including rows written by this unit.
    async fn find_transaction(
        &mut self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Makes every write of this unit visible at once.
    async fn commit(self, deadline: Deadline) -> Result<(), StoreError>;

    /// Discards every write of this unit.
    async fn rollback(self, deadline: Deadline) -> Result<(), StoreError>;
}
