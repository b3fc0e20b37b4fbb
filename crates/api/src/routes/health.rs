//! Liveness endpoint.
//!
//! Reports the build version and the operation type catalog the recorder
//! accepts, so clients can check which `operation_type_id` values are live.

use axum::{Json, Router, routing::get};
use serde::Serialize;
use tally_core::ledger::{LedgerStore, OperationKind, OperationType};

use crate::AppState;

/// One entry of the operation type catalog.
#[derive(Serialize)]
pub struct OperationTypeEntry {
    /// Value clients send as `operation_type_id`.
    pub operation_type_id: i32,
    /// Catalog label.
    pub description: &'static str,
    /// `"debit"` or `"credit"`.
    pub kind: &'static str,
}

impl From<OperationType> for OperationTypeEntry {
    fn from(operation: OperationType) -> Self {
        Self {
            operation_type_id: operation.id(),
            description: operation.description(),
            kind: match operation.kind() {
                OperationKind::Debit => "debit",
                OperationKind::Credit => "credit",
            },
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process answers.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Accepted operation types, in id order.
    pub operation_types: Vec<OperationTypeEntry>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "tally",
        version: env!("CARGO_PKG_VERSION"),
        operation_types: OperationType::ALL.into_iter().map(Into::into).collect(),
    })
}

/// Creates health check routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health_check))
}
