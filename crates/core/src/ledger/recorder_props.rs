//! Property-based tests for the transaction recorder over the in-memory store.
//!
//! - Total outstanding credit equals payments minus covered debits
//! - No stored balance is ever negative
//! - Concurrent debits on one account never consume more than was paid in

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::accounts::AccountService;
use super::deadline::Deadline;
use super::memory::InMemoryLedgerStore;
use super::recorder::{RecordTransactionInput, TransactionRecorder};
use super::types::OperationType;

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

/// One operation: (operation type id, cents).
fn operation() -> impl Strategy<Value = (i32, i64)> {
    (1i32..=4, 1i64..50_000)
}

fn signed(operation_type_id: i32, cents: i64) -> Decimal {
    let magnitude = Decimal::new(cents, 2);
    if operation_type_id == OperationType::Payment.id() {
        magnitude
    } else {
        -magnitude
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_credit_is_conserved(ops in prop::collection::vec(operation(), 1..25)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(InMemoryLedgerStore::new());
            let account = AccountService::new(Arc::clone(&store))
                .create(1, deadline())
                .await
                .unwrap();
            let recorder = TransactionRecorder::new(Arc::clone(&store));

            // Expected outstanding credit, replayed with a simple running total.
            let mut available = Decimal::ZERO;
            let mut uncovered = Decimal::ZERO;
            for (operation_type_id, cents) in ops {
                let amount = signed(operation_type_id, cents);
                let tx = recorder
                    .record(
                        RecordTransactionInput {
                            account_id: account.account_id,
                            operation_type_id,
                            amount,
                        },
                        deadline(),
                    )
                    .await
                    .unwrap();

                if amount > Decimal::ZERO {
                    available += amount;
                } else {
                    let debit = -amount;
                    let covered = debit.min(available);
                    available -= covered;
                    prop_assert_eq!(tx.balance, debit - covered);
                    uncovered += debit - covered;
                }
            }

            let rows = store.transactions_for(account.account_id).await;
            let credit: Decimal = rows
                .iter()
                .filter(|tx| tx.operation_type.is_credit())
                .map(|tx| tx.balance)
                .sum();
            let remainders: Decimal = rows
                .iter()
                .filter(|tx| tx.operation_type.is_debit())
                .map(|tx| tx.balance)
                .sum();

            prop_assert_eq!(credit, available);
            prop_assert_eq!(remainders, uncovered);
            prop_assert!(rows.iter().all(|tx| tx.balance >= Decimal::ZERO));
            for tx in rows.iter().filter(|tx| tx.operation_type.is_credit()) {
                prop_assert!(tx.balance <= tx.amount);
            }
            Ok(())
        })?;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_never_overdraw_credit() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let account = AccountService::new(Arc::clone(&store))
        .create(1, deadline())
        .await
        .unwrap();
    let recorder = TransactionRecorder::new(Arc::clone(&store));

    for amount in [Decimal::new(30, 0), Decimal::new(20, 0), Decimal::new(50, 0)] {
        recorder
            .record(
                RecordTransactionInput {
                    account_id: account.account_id,
                    operation_type_id: 4,
                    amount,
                },
                deadline(),
            )
            .await
            .unwrap();
    }

    let debits = (0..40).map(|i| {
        let recorder = recorder.clone();
        let account_id = account.account_id;
        tokio::spawn(async move {
            recorder
                .record(
                    RecordTransactionInput {
                        account_id,
                        operation_type_id: 1 + (i % 3),
                        amount: Decimal::new(-7, 0),
                    },
                    deadline(),
                )
                .await
        })
    });

    for result in futures::future::join_all(debits).await {
        result.unwrap().unwrap();
    }

    let rows = store.transactions_for(account.account_id).await;
    let remaining: Decimal = rows
        .iter()
        .filter(|tx| tx.operation_type.is_credit())
        .map(|tx| tx.balance)
        .sum();
    let uncovered: Decimal = rows
        .iter()
        .filter(|tx| tx.operation_type.is_debit())
        .map(|tx| tx.balance)
        .sum();

    // 100 paid in, 280 debited: all credit consumed exactly once.
    assert_eq!(rows.len(), 43);
    assert_eq!(remaining, Decimal::ZERO);
    assert_eq!(uncovered, Decimal::new(180, 0));
    assert!(rows.iter().all(|tx| tx.balance >= Decimal::ZERO));
}
