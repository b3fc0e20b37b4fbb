//! Account ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Operation types and their debit/credit classification
//! - Input validation and amount normalization
//! - The balance consumption engine (debits consume prior credit)
//! - The store contract and deadlines for every store call
//! - The transaction recorder (one atomic unit of work per transaction)
//! - The account service
//! - An in-memory store implementing the same contract

pub mod accounts;
pub mod allocation;
pub mod deadline;
pub mod error;
pub mod memory;
pub mod recorder;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod allocation_props;
#[cfg(test)]
mod recorder_props;

pub use accounts::AccountService;
pub use allocation::{Allocation, BalanceConsumptionEngine};
pub use deadline::Deadline;
pub use error::{LedgerError, RecordStep};
pub use memory::{FailurePoint, InMemoryLedgerStore};
pub use recorder::{RecordTransactionInput, TransactionRecorder};
pub use store::{LedgerStore, LedgerUnit, StoreError};
pub use types::{
    Account, BalanceUpdate, CreditRow, NewTransaction, OperationKind, OperationType, Transaction,
};
