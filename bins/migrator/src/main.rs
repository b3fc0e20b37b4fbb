//! Applies Tally's schema to the database named by `DATABASE_URL`.
//!
//! The single migration creates `accounts`, `operation_types` seeded with
//! ids 1-4, and `transactions` with `NUMERIC(18, 2)` amounts, a non-negative
//! `balance` check and a partial index over open payment rows
//! (`balance <> 0`) keyed by `account_id, event_date DESC, transaction_id DESC`.
//! `down` drops all three tables.
//!
//! Subcommands come from sea-orm-migration: `up`, `down`, `status`,
//! `fresh`, `refresh`, `reset`.

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
