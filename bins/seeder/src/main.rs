//! Database seeder for Tally development and testing.
//!
//! Creates two demo accounts and records the worked consumption examples
//! through the transaction recorder, so the seeded balances are exactly
//! what the service itself would produce.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tally_core::ledger::{
    Account, AccountService, Deadline, RecordTransactionInput, TransactionRecorder,
};
use tally_db::PgLedgerStore;
use tally_shared::AppConfig;

/// Document numbers of the demo accounts.
const DEMO_DOCUMENTS: [i64; 2] = [12_345_678_900, 98_765_432_100];

/// (operation type id, amount in cents) recorded against the first account.
const PARTIAL_CONSUMPTION: [(i32, i64); 2] = [(4, 5_000), (3, -3_000)];

/// (operation type id, amount in cents) recorded against the second account.
const NEWEST_FIRST: [(i32, i64); 4] = [(4, 1_000), (4, 2_000), (1, -2_500), (2, -1_000)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = tally_db::connect(&config.database).await?;
    let store = Arc::new(PgLedgerStore::new(db, config.ledger.store_timeout()));
    let accounts = AccountService::new(Arc::clone(&store));
    let recorder = TransactionRecorder::new(store);
    let budget = config.ledger.request_timeout();

    println!("Seeding demo accounts...");
    let mut created = Vec::with_capacity(DEMO_DOCUMENTS.len());
    for document_number in DEMO_DOCUMENTS {
        let account = accounts
            .create(document_number, Deadline::after(budget))
            .await?;
        println!(
            "  Account {} (document {})",
            account.account_id, account.document_number
        );
        created.push(account);
    }

    println!("Seeding transactions...");
    for (account, script) in created
        .iter()
        .zip([&PARTIAL_CONSUMPTION[..], &NEWEST_FIRST[..]])
    {
        seed_transactions(&recorder, account, script, budget).await?;
    }

    println!("Seeding complete!");
    Ok(())
}

/// Records each scripted transaction in order.
async fn seed_transactions(
    recorder: &TransactionRecorder<PgLedgerStore>,
    account: &Account,
    script: &[(i32, i64)],
    budget: Duration,
) -> anyhow::Result<()> {
    for &(operation_type_id, cents) in script {
        let tx = recorder
            .record(
                RecordTransactionInput {
                    account_id: account.account_id,
                    operation_type_id,
                    amount: Decimal::new(cents, 2),
                },
                Deadline::after(budget),
            )
            .await?;
        println!(
            "  Transaction {} on account {}: {} {} (balance {})",
            tx.transaction_id, tx.account_id, tx.operation_type, tx.amount, tx.balance
        );
    }
    Ok(())
}
