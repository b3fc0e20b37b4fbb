//! API route definitions.

use axum::Router;
use tally_core::ledger::LedgerStore;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(transactions::routes())
}
