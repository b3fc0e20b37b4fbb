//! Ledger error types for validation, lookup, and storage failures.
//!
//! Storage failures always carry the [`RecordStep`] that failed so the HTTP
//! boundary can log precise context while keeping the response generic.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{AccountId, TransactionId};
use thiserror::Error;

use super::store::StoreError;
use super::types::OperationType;

/// Message shown to callers when a store call runs out of time.
pub const TIMEOUT_MESSAGE: &str = "timeout during operation. Try Again";

/// The step of a ledger operation that touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStep {
    /// Opening the unit of work and locking the account.
    Begin,
    /// Inserting the new transaction row.
    Insert,
    /// Reading the account's credit rows.
    AllocationRead,
    /// Writing consumed balances back.
    AllocationWrite,
    /// Committing the unit of work.
    Commit,
    /// Re-reading the inserted transaction.
    Reload,
    /// Inserting an account.
    AccountInsert,
    /// A plain read outside a unit of work.
    Lookup,
}

impl std::fmt::Display for RecordStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            Self::Begin => "begin",
            Self::Insert => "insert",
            Self::AllocationRead => "allocation-read",
            Self::AllocationWrite => "allocation-write",
            Self::Commit => "commit",
            Self::Reload => "reload",
            Self::AccountInsert => "account-insert",
            Self::Lookup => "lookup",
        };
        f.write_str(step)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Debit amount handed to the engine was not positive.
    #[error("the debit amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Operation type id is not one of the known values.
    #[error("the operation_type_id must be one of the following valid values: 1, 2, 3, 4")]
    InvalidOperationType(i32),

    /// Amount sign does not match the operation type.
    #[error(
        "purchases and withdraw operations must have a negative amount. Payment operations must have a positive amount. Got {amount} for {operation_type}"
    )]
    InvalidAmountSign {
        /// The requested operation type.
        operation_type: OperationType,
        /// The offending amount.
        amount: Decimal,
    },

    /// Amount magnitude does not fit the stored `NUMERIC(18, 2)` column.
    #[error("the amount must be between -9999999999999999.99 and 9999999999999999.99, got {0}")]
    AmountOutOfRange(Decimal),

    /// Several fields of one request are invalid.
    #[error("{}", join_messages(.0))]
    InvalidInput(Vec<LedgerError>),

    /// Document number is not positive.
    #[error("the document_number must be a valid positive integer")]
    InvalidDocumentNumber(i64),

    /// Account id is not positive.
    #[error("the account_id must be a valid positive integer")]
    InvalidAccountId(i64),

    /// Transaction id is not positive.
    #[error("the transaction_id must be a valid positive integer")]
    InvalidTransactionId(i64),

    /// A transaction referenced an account that does not exist.
    #[error("no account found for the provided account ID")]
    UnknownAccount(AccountId),

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("no account found for the provided account ID")]
    AccountNotFound(AccountId),

    /// Transaction not found.
    #[error("no transaction found for the provided transaction ID")]
    TransactionNotFound(TransactionId),

    // ========== Storage Errors ==========
    /// A store call exceeded its deadline.
    #[error("store operation timed out during {step}")]
    Timeout {
        /// The step that timed out.
        step: RecordStep,
    },

    /// Any other store failure.
    #[error("store operation failed during {step}: {message}")]
    Storage {
        /// The step that failed.
        step: RecordStep,
        /// Backend detail (never shown to API callers).
        message: String,
    },
}

fn join_messages(errors: &[LedgerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LedgerError {
    /// Annotates a store failure with the step that produced it.
    #[must_use]
    pub fn from_store(step: RecordStep, err: StoreError) -> Self {
        match err {
            StoreError::Timeout => Self::Timeout { step },
            StoreError::AccountMissing(account_id) => Self::UnknownAccount(account_id),
            StoreError::Backend(message) => Self::Storage { step, message },
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidOperationType(_) => "INVALID_OPERATION_TYPE",
            Self::InvalidAmountSign { .. } => "INVALID_AMOUNT_SIGN",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::InvalidDocumentNumber(_) => "INVALID_DOCUMENT_NUMBER",
            Self::InvalidAccountId(_) => "INVALID_ACCOUNT_ID",
            Self::InvalidTransactionId(_) => "INVALID_TRANSACTION_ID",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Storage { .. } => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_)
            | Self::InvalidOperationType(_)
            | Self::InvalidAmountSign { .. }
            | Self::AmountOutOfRange(_)
            | Self::InvalidInput(_)
            | Self::InvalidDocumentNumber(_)
            | Self::InvalidAccountId(_)
            | Self::InvalidTransactionId(_)
            | Self::UnknownAccount(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => 404,

            // 500 Internal Server Error
            Self::Timeout { .. } | Self::Storage { .. } => 500,
        }
    }

    /// Returns true if the caller caused this error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.http_status_code() == 400
    }

    /// Returns the step for storage failures.
    #[must_use]
    pub fn step(&self) -> Option<RecordStep> {
        match self {
            Self::Timeout { step } | Self::Storage { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LedgerError::Timeout { .. } => Self::Timeout(TIMEOUT_MESSAGE.to_string()),
            LedgerError::Storage { .. } => Self::Database(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
