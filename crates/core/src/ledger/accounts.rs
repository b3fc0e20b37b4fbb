//! Account service: create and read accounts.

use std::sync::Arc;

use tally_shared::types::AccountId;
use tracing::info;

use super::deadline::Deadline;
use super::error::{LedgerError, RecordStep};
use super::store::LedgerStore;
use super::types::Account;
use super::validation::{validate_account_id, validate_document_number};

/// Creates and retrieves accounts.
pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> AccountService<S> {
    /// Creates a service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates an account for a document number.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocumentNumber` (before any store write) when the
    /// number is not positive, or a store error.
    pub async fn create(
        &self,
        document_number: i64,
        deadline: Deadline,
    ) -> Result<Account, LedgerError> {
        let document_number = validate_document_number(document_number)?;

        let account = self
            .store
            .insert_account(document_number, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::AccountInsert, e))?;

        info!(
            account_id = %account.account_id,
            document_number = account.document_number,
            "Account created"
        );

        Ok(account)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountId`, `AccountNotFound`, or a store error.
    pub async fn get(&self, account_id: AccountId, deadline: Deadline) -> Result<Account, LedgerError> {
        let account_id = validate_account_id(account_id)?;

        self.store
            .find_account(account_id, deadline)
            .await
            .map_err(|e| LedgerError::from_store(RecordStep::Lookup, e))?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }
}
