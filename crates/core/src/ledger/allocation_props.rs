//! Property-based tests for the balance consumption engine.
//!
//! - Consumption equals `min(debit, total credit)`
//! - Remainder equals `max(debit - total credit, 0)`
//! - No balance goes negative and consumed rows follow recency order

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::TransactionId;

use super::allocation::BalanceConsumptionEngine;
use super::types::CreditRow;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate credit rows with unique ids and possibly equal timestamps.
fn credit_rows(max_len: usize) -> impl Strategy<Value = Vec<CreditRow>> {
    prop::collection::vec((positive_amount(), 0i64..10), 0..=max_len).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (balance, minute))| CreditRow {
                transaction_id: TransactionId::new(i64::try_from(index).unwrap_or(0) + 1),
                balance,
                event_date: base_time() + Duration::minutes(minute),
            })
            .collect()
    })
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1: the engine consumes exactly min(D, sum of balances).
    #[test]
    fn prop_consumes_min_of_debit_and_credit(
        rows in credit_rows(12),
        debit in positive_amount(),
    ) {
        let available: Decimal = rows.iter().map(|r| r.balance).sum();
        let allocation = BalanceConsumptionEngine::allocate(rows, debit).unwrap();

        prop_assert_eq!(allocation.consumed(), debit.min(available));
        prop_assert_eq!(allocation.consumed() + allocation.remainder, debit);
    }

    /// Property 2: the remainder is never negative and is zero when credit suffices.
    #[test]
    fn prop_remainder_non_negative(
        rows in credit_rows(12),
        debit in positive_amount(),
    ) {
        let available: Decimal = rows.iter().map(|r| r.balance).sum();
        let allocation = BalanceConsumptionEngine::allocate(rows, debit).unwrap();

        prop_assert!(allocation.remainder >= Decimal::ZERO);
        if available >= debit {
            prop_assert!(allocation.is_fully_covered());
        } else {
            prop_assert_eq!(allocation.remainder, debit - available);
        }
    }

    /// Property 3: updated balances stay in [0, previous] and every row but the
    /// last consumed one is drained to zero.
    #[test]
    fn prop_updates_drain_in_order(
        rows in credit_rows(12),
        debit in positive_amount(),
    ) {
        let allocation = BalanceConsumptionEngine::allocate(rows.clone(), debit).unwrap();

        for update in &allocation.updates {
            prop_assert!(update.new_balance >= Decimal::ZERO);
            prop_assert!(update.new_balance < update.previous_balance);
        }
        if let Some((_, drained)) = allocation.updates.split_last() {
            prop_assert!(drained.iter().all(|u| u.new_balance.is_zero()));
        }

        // Consumed rows are a prefix of the recency order.
        let mut expected = rows;
        expected.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then_with(|| b.transaction_id.cmp(&a.transaction_id))
        });
        let consumed_ids: Vec<_> = allocation.updates.iter().map(|u| u.transaction_id).collect();
        let prefix_ids: Vec<_> = expected
            .iter()
            .take(consumed_ids.len())
            .map(|r| r.transaction_id)
            .collect();
        prop_assert_eq!(consumed_ids, prefix_ids);
    }
}
