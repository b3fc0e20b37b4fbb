//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{LedgerStore, RecordTransactionInput, Transaction};
use tally_shared::types::{AccountId, TransactionId};

use crate::{AppState, error::ApiError};

/// Creates the transaction routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/transactions", post(create_transaction::<S>))
        .route("/transactions/{transaction_id}", get(get_transaction::<S>))
}

/// Request body for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account to record against.
    pub account_id: AccountId,
    /// Operation type: 1 purchase, 2 installment purchase, 3 withdrawal, 4 payment.
    pub operation_type_id: i32,
    /// Signed amount, as a JSON number or string.
    pub amount: Decimal,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub transaction_id: i64,
    /// Account ID.
    pub account_id: i64,
    /// Operation type ID.
    pub operation_type_id: i32,
    /// Signed amount.
    pub amount: Decimal,
    /// Remaining balance.
    pub balance: Decimal,
    /// Recording time.
    pub event_date: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.into_inner(),
            account_id: tx.account_id.into_inner(),
            operation_type_id: tx.operation_type.id(),
            amount: tx.amount,
            balance: tx.balance,
            event_date: tx.event_date,
        }
    }
}

/// POST `/transactions` - Record a transaction.
async fn create_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(payload) = payload?;

    let input = RecordTransactionInput {
        account_id: payload.account_id,
        operation_type_id: payload.operation_type_id,
        amount: payload.amount,
    };
    let transaction = state.transactions.record(input, state.deadline()).await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// GET `/transactions/{transaction_id}` - Get a transaction.
async fn get_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction_id = transaction_id.parse::<TransactionId>().map_err(|_| {
        ApiError::bad_request("INVALID_TRANSACTION_ID", "error in parsing transactionId")
    })?;
    let transaction = state
        .transactions
        .get(transaction_id, state.deadline())
        .await?;

    Ok(Json(transaction.into()))
}
