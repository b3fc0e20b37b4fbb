//! Initial database migration.
//!
//! Creates the accounts, operation types, and transactions tables, plus the
//! index that serves credit-row lookups.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(OPERATION_TYPES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(SEED_OPERATION_TYPES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    account_id      BIGSERIAL PRIMARY KEY,
    document_number BIGINT NOT NULL CHECK (document_number > 0),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const OPERATION_TYPES_SQL: &str = r"
CREATE TABLE operation_types (
    operation_type_id SMALLINT PRIMARY KEY,
    description       VARCHAR(64) NOT NULL
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    transaction_id    BIGSERIAL PRIMARY KEY,
    account_id        BIGINT NOT NULL REFERENCES accounts (account_id),
    operation_type_id SMALLINT NOT NULL REFERENCES operation_types (operation_type_id),
    amount            NUMERIC(18, 2) NOT NULL CHECK (amount <> 0),
    balance           NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    event_date        TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_account ON transactions (account_id);

-- Credit rows still holding balance, newest first
CREATE INDEX idx_transactions_open_credit
    ON transactions (account_id, event_date DESC, transaction_id DESC)
    WHERE operation_type_id = 4 AND balance <> 0;
";

const SEED_OPERATION_TYPES_SQL: &str = r"
INSERT INTO operation_types (operation_type_id, description) VALUES
    (1, 'PURCHASE'),
    (2, 'INSTALLMENT PURCHASE'),
    (3, 'WITHDRAWAL'),
    (4, 'PAYMENT');
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS operation_types;
DROP TABLE IF EXISTS accounts;
";
