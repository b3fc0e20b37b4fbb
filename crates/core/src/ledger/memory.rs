//! In-memory ledger store.
//!
//! Backs the router and recorder tests, and serves as a reference for the
//! store contract: per-account serialization, staged writes that become
//! visible all at once on commit, and deadline-bounded calls. Failure
//! points and artificial latency can be injected to exercise rollback
//! and timeout paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, TransactionId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::deadline::Deadline;
use super::store::{LedgerStore, LedgerUnit, StoreError};
use super::types::{Account, CreditRow, NewTransaction, Transaction};

/// A unit-of-work call that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `insert_transaction`
    Insert,
    /// `select_credit_rows`
    CreditRead,
    /// `update_transaction_balance`
    BalanceUpdate,
    /// `commit`
    Commit,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

#[derive(Debug)]
struct Inner {
    state: RwLock<State>,
    next_account_id: AtomicI64,
    next_transaction_id: AtomicI64,
    account_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    failures: DashMap<FailurePoint, ()>,
    latency_ms: AtomicU64,
}

impl Inner {
    async fn delay(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check(&self, point: FailurePoint) -> Result<(), StoreError> {
        if self.failures.contains_key(&point) {
            return Err(StoreError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn lock_for(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        Arc::clone(self.account_locks.entry(account_id).or_default().value())
    }
}

/// Ledger store kept entirely in process memory.
#[derive(Debug, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedgerStore {
    /// Creates an empty store. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State::default()),
                next_account_id: AtomicI64::new(1),
                next_transaction_id: AtomicI64::new(1),
                account_locks: DashMap::new(),
                failures: DashMap::new(),
                latency_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Makes every later call at `point` fail with a backend error.
    pub fn inject_failure(&self, point: FailurePoint) {
        self.inner.failures.insert(point, ());
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.inner.failures.clear();
    }

    /// Delays every store call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Committed transactions of an account, in id order.
    pub async fn transactions_for(&self, account_id: AccountId) -> Vec<Transaction> {
        let state = self.inner.state.read().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by_key(|tx| tx.transaction_id);
        rows
    }

    /// Number of committed accounts.
    pub async fn account_count(&self) -> usize {
        self.inner.state.read().await.accounts.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Unit = InMemoryLedgerUnit;

    async fn insert_account(
        &self,
        document_number: i64,
        deadline: Deadline,
    ) -> Result<Account, StoreError> {
        let inner = &self.inner;
        deadline
            .run(async {
                inner.delay().await;
                let account = Account {
                    account_id: AccountId::new(inner.next_account_id.fetch_add(1, Ordering::SeqCst)),
                    document_number,
                };
                inner
                    .state
                    .write()
                    .await
                    .accounts
                    .insert(account.account_id, account.clone());
                Ok(account)
            })
            .await
    }

    async fn find_account(
        &self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Option<Account>, StoreError> {
        let inner = &self.inner;
        deadline
            .run(async {
                inner.delay().await;
                Ok(inner.state.read().await.accounts.get(&account_id).cloned())
            })
            .await
    }

    async fn find_transaction(
        &self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError> {
        let inner = &self.inner;
        deadline
            .run(async {
                inner.delay().await;
                Ok(inner
                    .state
                    .read()
                    .await
                    .transactions
                    .get(&transaction_id)
                    .cloned())
            })
            .await
    }

    async fn begin(
        &self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Self::Unit, StoreError> {
        let inner = Arc::clone(&self.inner);
        deadline
            .run(async move {
                inner.delay().await;
                if !inner.state.read().await.accounts.contains_key(&account_id) {
                    return Err(StoreError::AccountMissing(account_id));
                }
                let guard = inner.lock_for(account_id).lock_owned().await;
                Ok(InMemoryLedgerUnit {
                    inner,
                    _guard: guard,
                    inserted: Vec::new(),
                    balances: HashMap::new(),
                })
            })
            .await
    }
}

/// Unit of work over [`InMemoryLedgerStore`].
///
/// Holds the account lock until dropped. Writes are staged locally and
/// applied to shared state only by `commit`.
#[derive(Debug)]
pub struct InMemoryLedgerUnit {
    inner: Arc<Inner>,
    _guard: OwnedMutexGuard<()>,
    inserted: Vec<Transaction>,
    balances: HashMap<TransactionId, Decimal>,
}

impl InMemoryLedgerUnit {
    /// The transaction as this unit sees it: staged insert or committed row,
    /// with any staged balance applied.
    fn view(&self, state: &State, transaction_id: TransactionId) -> Option<Transaction> {
        let mut tx = self
            .inserted
            .iter()
            .find(|tx| tx.transaction_id == transaction_id)
            .or_else(|| state.transactions.get(&transaction_id))
            .cloned()?;
        if let Some(balance) = self.balances.get(&transaction_id) {
            tx.balance = *balance;
        }
        Some(tx)
    }
}

#[async_trait]
impl LedgerUnit for InMemoryLedgerUnit {
    async fn insert_transaction(
        &mut self,
        row: NewTransaction,
        deadline: Deadline,
    ) -> Result<TransactionId, StoreError> {
        let inner = Arc::clone(&self.inner);
        let id = deadline
            .run(async {
                inner.delay().await;
                inner.check(FailurePoint::Insert)?;
                Ok(TransactionId::new(
                    inner.next_transaction_id.fetch_add(1, Ordering::SeqCst),
                ))
            })
            .await?;

        self.inserted.push(Transaction {
            transaction_id: id,
            account_id: row.account_id,
            operation_type: row.operation_type,
            amount: row.amount,
            balance: row.balance,
            event_date: Utc::now(),
        });
        Ok(id)
    }

    async fn select_credit_rows(
        &mut self,
        account_id: AccountId,
        deadline: Deadline,
    ) -> Result<Vec<CreditRow>, StoreError> {
        let this = &*self;
        deadline
            .run(async {
                this.inner.delay().await;
                this.inner.check(FailurePoint::CreditRead)?;

                let state = this.inner.state.read().await;
                let ids = state
                    .transactions
                    .values()
                    .chain(this.inserted.iter())
                    .filter(|tx| tx.account_id == account_id && tx.operation_type.is_credit())
                    .map(|tx| tx.transaction_id);

                let mut rows: Vec<CreditRow> = ids
                    .filter_map(|id| this.view(&state, id))
                    .filter(|tx| !tx.balance.is_zero())
                    .map(|tx| CreditRow::from(&tx))
                    .collect();
                rows.sort_by(|a, b| {
                    b.event_date
                        .cmp(&a.event_date)
                        .then(b.transaction_id.cmp(&a.transaction_id))
                });
                Ok(rows)
            })
            .await
    }

    async fn update_transaction_balance(
        &mut self,
        transaction_id: TransactionId,
        balance: Decimal,
        deadline: Deadline,
    ) -> Result<(), StoreError> {
        let inner = Arc::clone(&self.inner);
        let this = &*self;
        deadline
            .run(async {
                inner.delay().await;
                inner.check(FailurePoint::BalanceUpdate)?;
                if balance.is_sign_negative() && !balance.is_zero() {
                    return Err(StoreError::Backend(format!(
                        "negative balance {balance} for transaction {transaction_id}"
                    )));
                }
                let state = inner.state.read().await;
                if this.view(&state, transaction_id).is_none() {
                    return Err(StoreError::Backend(format!(
                        "transaction {transaction_id} not found"
                    )));
                }
                Ok(())
            })
            .await?;

        self.balances.insert(transaction_id, balance);
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        transaction_id: TransactionId,
        deadline: Deadline,
    ) -> Result<Option<Transaction>, StoreError> {
        let this = &*self;
        deadline
            .run(async {
                this.inner.delay().await;
                let state = this.inner.state.read().await;
                Ok(this.view(&state, transaction_id))
            })
            .await
    }

    async fn commit(self, deadline: Deadline) -> Result<(), StoreError> {
        let inner = Arc::clone(&self.inner);
        deadline
            .run(async move {
                inner.delay().await;
                inner.check(FailurePoint::Commit)?;

                let mut state = inner.state.write().await;
                for tx in self.inserted {
                    state.transactions.insert(tx.transaction_id, tx);
                }
                for (id, balance) in self.balances {
                    if let Some(tx) = state.transactions.get_mut(&id) {
                        tx.balance = balance;
                    }
                }
                Ok(())
            })
            .await
    }

    async fn rollback(self, _deadline: Deadline) -> Result<(), StoreError> {
        drop(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::OperationType;
    use rust_decimal_macros::dec;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    async fn store_with_account() -> (InMemoryLedgerStore, AccountId) {
        let store = InMemoryLedgerStore::new();
        let account = store.insert_account(10, deadline()).await.unwrap();
        (store, account.account_id)
    }

    #[tokio::test]
    async fn test_begin_unknown_account() {
        let store = InMemoryLedgerStore::new();
        let err = store.begin(AccountId::new(3), deadline()).await.unwrap_err();
        assert_eq!(err, StoreError::AccountMissing(AccountId::new(3)));
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let (store, account_id) = store_with_account().await;

        let mut unit = store.begin(account_id, deadline()).await.unwrap();
        let id = unit
            .insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(40)),
                deadline(),
            )
            .await
            .unwrap();

        assert!(unit.find_transaction(id, deadline()).await.unwrap().is_some());
        assert!(store.find_transaction(id, deadline()).await.unwrap().is_none());

        unit.commit(deadline()).await.unwrap();
        let committed = store.find_transaction(id, deadline()).await.unwrap().unwrap();
        assert_eq!(committed.balance, dec!(40));
    }

    #[tokio::test]
    async fn test_dropped_unit_discards_writes() {
        let (store, account_id) = store_with_account().await;

        {
            let mut unit = store.begin(account_id, deadline()).await.unwrap();
            unit.insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(40)),
                deadline(),
            )
            .await
            .unwrap();
        }

        assert!(store.transactions_for(account_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_credit_rows_see_staged_balances() {
        let (store, account_id) = store_with_account().await;

        let mut unit = store.begin(account_id, deadline()).await.unwrap();
        let first = unit
            .insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(10)),
                deadline(),
            )
            .await
            .unwrap();
        let second = unit
            .insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(20)),
                deadline(),
            )
            .await
            .unwrap();
        unit.insert_transaction(
            NewTransaction::new(account_id, OperationType::Purchase, dec!(-5)),
            deadline(),
        )
        .await
        .unwrap();
        unit.update_transaction_balance(first, Decimal::ZERO, deadline())
            .await
            .unwrap();

        let rows = unit.select_credit_rows(account_id, deadline()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_id, second);
    }

    #[tokio::test]
    async fn test_negative_balance_rejected() {
        let (store, account_id) = store_with_account().await;

        let mut unit = store.begin(account_id, deadline()).await.unwrap();
        let id = unit
            .insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(10)),
                deadline(),
            )
            .await
            .unwrap();
        let err = unit
            .update_transaction_balance(id, dec!(-1), deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_unit_waits_for_account_lock() {
        let (store, account_id) = store_with_account().await;

        let held = store.begin(account_id, deadline()).await.unwrap();
        let err = store
            .begin(account_id, Deadline::after(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Timeout);

        drop(held);
        assert!(store.begin(account_id, deadline()).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let (store, account_id) = store_with_account().await;
        store.inject_failure(FailurePoint::Insert);

        let mut unit = store.begin(account_id, deadline()).await.unwrap();
        let err = unit
            .insert_transaction(
                NewTransaction::new(account_id, OperationType::Payment, dec!(10)),
                deadline(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
