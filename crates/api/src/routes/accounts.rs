//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tally_core::ledger::{Account, LedgerStore};
use tally_shared::types::AccountId;

use crate::{AppState, error::ApiError};

/// Creates the account routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/accounts", post(create_account::<S>))
        .route("/accounts/{account_id}", get(get_account::<S>))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Document number of the holder (positive).
    pub document_number: i64,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub account_id: i64,
    /// Document number of the holder.
    pub document_number: i64,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.account_id.into_inner(),
            document_number: account.document_number,
        }
    }
}

/// Parses an `{account_id}` path segment.
pub(crate) fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse::<AccountId>()
        .map_err(|_| ApiError::bad_request("INVALID_ACCOUNT_ID", "error in parsing accountId"))
}

/// POST `/accounts` - Create an account.
async fn create_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(payload) = payload?;

    let account = state
        .accounts
        .create(payload.document_number, state.deadline())
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/accounts/{account_id}` - Get an account.
async fn get_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;
    let account = state.accounts.get(account_id, state.deadline()).await?;

    Ok(Json(account.into()))
}
