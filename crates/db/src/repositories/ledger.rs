//! Postgres implementation of the ledger store.
//!
//! A unit of work is one database transaction. `begin` locks the account row
//! with `SELECT ... FOR UPDATE`, so concurrent units on the same account run
//! one after another while different accounts proceed in parallel. Dropping
//! a unit without committing rolls the database transaction back.
//!
//! Every call is bounded by the caller's deadline, further clamped to the
//! store's per-call timeout.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tally_core::ledger::{
    Account, CreditRow, Deadline, LedgerStore, LedgerUnit, NewTransaction, OperationType,
    StoreError, Transaction,
};
use tally_shared::types::{AccountId, TransactionId};
use tracing::debug;

use super::{account, transaction};
use crate::entities::{accounts, transactions};

/// Ledger store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    call_timeout: Duration,
}

impl PgLedgerStore {
    /// Creates a store over `db`. No single call may take longer than
    /// `call_timeout`, whatever the caller's deadline.
    #[must_use]
    pub const fn new(db: DatabaseConnection, call_timeout: Duration) -> Self {
        Self { db, call_timeout }
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn to_account(model: accounts::Model) -> Account {
    Account {
        account_id: AccountId::new(model.account_id),
        document_number: model.document_number,
    }
}

fn to_transaction(model: transactions::Model) -> Result<Transaction, StoreError> {
    let operation_type = OperationType::try_from(i32::from(model.operation_type_id))
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    Ok(Transaction {
        transaction_id: TransactionId::new(model.transaction_id),
        account_id: AccountId::new(model.account_id),
        operation_type,
        amount: model.amount,
        balance: model.balance,
        event_date: model.event_date.with_timezone(&Utc),
    })
}

fn to_credit_row(model: transactions::Model) -> CreditRow {
    CreditRow {
        transaction_id: TransactionId::new(model.transaction_id),
        balance: model.balance,
        event_date: model.event_date.with_timezone(&Utc),
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Unit = PgLedgerUnit;

    async fn insert_account(
        &self,
        document_number: i64,
        deadline: Deadline,
    ) -> Result<Account, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                account::insert(&self.db, document_number)
                    .await
                    .map(to_account)
                    .map_err(backend)
            })
            .await
    }

    async fn find_account(
        &self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Option<Account>, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                account::find_by_id(&self.db, account_id.into_inner())
                    .await
                    .map(|found| found.map(to_account))
                    .map_err(backend)
            })
            .await
    }

    async fn find_transaction(
        &self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                transaction::find_by_id(&self.db, transaction_id.into_inner())
                    .await
                    .map_err(backend)?
                    .map(to_transaction)
                    .transpose()
            })
            .await
    }

    async fn begin(
        &self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Self::Unit, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                let txn = self.db.begin().await.map_err(backend)?;
                let locked = account::lock(&txn, account_id.into_inner())
                    .await
                    .map_err(backend)?;

                if locked.is_none() {
                    txn.rollback().await.map_err(backend)?;
                    return Err(StoreError::AccountMissing(account_id));
                }

                debug!(account_id = %account_id, "Account locked");
                Ok(PgLedgerUnit {
                    txn,
                    call_timeout: self.call_timeout,
                })
            })
            .await
    }
}

/// Unit of work over one open database transaction.
pub struct PgLedgerUnit {
    txn: DatabaseTransaction,
    call_timeout: Duration,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn insert_transaction(
        &mut self,
        row: NewTransaction,
        deadline: Deadline,
    ) -> Result<TransactionId, StoreError> {
        let operation_type_id = i16::try_from(row.operation_type.id())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let input = transaction::InsertTransaction {
            account_id: row.account_id.into_inner(),
            operation_type_id,
            amount: row.amount,
            balance: row.balance,
            event_date: Utc::now(),
        };

        deadline
            .clamp(self.call_timeout)
            .run(async {
                transaction::insert(&self.txn, input)
                    .await
                    .map(|model| TransactionId::new(model.transaction_id))
                    .map_err(backend)
            })
            .await
    }

    async fn select_credit_rows(
        &mut self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Vec<CreditRow>, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                let rows = transaction::open_credit_rows(&self.txn, account_id.into_inner())
                    .await
                    .map_err(backend)?;
                Ok(rows.into_iter().map(to_credit_row).collect())
            })
            .await
    }

    async fn update_transaction_balance(
        &mut self,
        transaction_id: TransactionId,
        balance: Decimal,
        deadline: Deadline,
    ) -> Result<(), StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                let updated =
                    transaction::update_balance(&self.txn, transaction_id.into_inner(), balance)
                        .await
                        .map_err(backend)?;

                if updated == 1 {
                    Ok(())
                } else {
                    Err(StoreError::Backend(format!(
                        "balance update for transaction {transaction_id} touched {updated} rows"
                    )))
                }
            })
            .await
    }

    async fn find_transaction(
        &mut self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError> {
        deadline
            .clamp(self.call_timeout)
            .run(async {
                transaction::find_by_id(&self.txn, transaction_id.into_inner())
                    .await
                    .map_err(backend)?
                    .map(to_transaction)
                    .transpose()
            })
            .await
    }

    async fn commit(self, deadline: Deadline) -> Result<(), StoreError> {
        let Self { txn, call_timeout } = self;
        deadline
            .clamp(call_timeout)
            .run(async move { txn.commit().await.map_err(backend) })
            .await
    }

    async fn rollback(self, deadline: Deadline) -> Result<(), StoreError> {
        let Self { txn, call_timeout } = self;
        deadline
            .clamp(call_timeout)
            .run(async move { txn.rollback().await.map_err(backend) })
            .await
    }
}
