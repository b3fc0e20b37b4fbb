//! Error responses.
//!
//! Every failure leaves the API as `{"error": "<code>", "message": "<text>"}`.
//! Storage detail is logged and never sent to the caller.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::ledger::LedgerError;
use tally_shared::AppError;
use tracing::{error, warn};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// A 400 response with an explicit code and message.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    /// The response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_app(code: &'static str, err: &AppError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message: err.public_message(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if matches!(err, AppError::Database(_) | AppError::Internal(_)) {
            error!(error = %err, "Request failed");
        }
        Self::from_app(err.error_code(), &err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::Storage { step, message } => {
                error!(step = %step, error = %message, "Store operation failed");
            }
            LedgerError::Timeout { step } => {
                warn!(step = %step, "Store operation timed out");
            }
            _ => {}
        }
        let code = err.error_code();
        Self::from_app(code, &AppError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_REQUEST_BODY", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.code, "message": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ledger::RecordStep;
    use tally_shared::types::AccountId;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::from(LedgerError::InvalidOperationType(8));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_OPERATION_TYPE");
    }

    #[test]
    fn test_unknown_account_is_bad_request() {
        let err = ApiError::from(LedgerError::UnknownAccount(AccountId::new(4)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "no account found for the provided account ID");
    }

    #[test]
    fn test_not_found() {
        let err = ApiError::from(LedgerError::AccountNotFound(AccountId::new(4)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_timeout_message() {
        let err = ApiError::from(LedgerError::Timeout {
            step: RecordStep::Insert,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(err.message, "timeout during operation. Try Again");
    }

    #[test]
    fn test_storage_detail_hidden() {
        let err = ApiError::from(LedgerError::Storage {
            step: RecordStep::Commit,
            message: "connection reset by peer".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("connection reset"));
    }
}
