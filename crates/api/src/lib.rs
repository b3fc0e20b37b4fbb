//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/v1`
//! - Request and response bodies
//! - Error to HTTP response mapping

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tally_core::ledger::{AccountService, Deadline, LedgerStore, TransactionRecorder};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S> {
    /// Account creation and lookup.
    pub accounts: AccountService<S>,
    /// Transaction recording and lookup.
    pub transactions: TransactionRecorder<S>,
    /// Budget for each request's store work.
    pub request_timeout: Duration,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            transactions: self.transactions.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    /// Builds the state over one shared store.
    pub fn new(store: Arc<S>, request_timeout: Duration) -> Self {
        Self {
            accounts: AccountService::new(Arc::clone(&store)),
            transactions: TransactionRecorder::new(store),
            request_timeout,
        }
    }

    /// A fresh deadline for one request.
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/v1", routes::api_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
