//! Transaction queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use tally_core::ledger::OperationType;

use crate::entities::transactions;

/// Operation type ids whose rows carry credit that later debits consume.
#[must_use]
pub fn credit_operation_type_ids() -> Vec<i16> {
    OperationType::ALL
        .iter()
        .filter(|operation| operation.is_credit())
        .filter_map(|operation| i16::try_from(operation.id()).ok())
        .collect()
}

/// Values for a new transaction row.
#[derive(Debug, Clone)]
pub struct InsertTransaction {
    /// Owning account.
    pub account_id: i64,
    /// Operation type id (1-4).
    pub operation_type_id: i16,
    /// Signed amount.
    pub amount: Decimal,
    /// Initial balance.
    pub balance: Decimal,
    /// Recording time.
    pub event_date: DateTime<Utc>,
}

/// Inserts a transaction and returns the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    input: InsertTransaction,
) -> Result<transactions::Model, DbErr> {
    transactions::ActiveModel {
        account_id: Set(input.account_id),
        operation_type_id: Set(input.operation_type_id),
        amount: Set(input.amount),
        balance: Set(input.balance),
        event_date: Set(input.event_date.into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Finds a transaction by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
) -> Result<Option<transactions::Model>, DbErr> {
    transactions::Entity::find_by_id(transaction_id).one(db).await
}

/// Lists an account's credit rows with a nonzero balance, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn open_credit_rows<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> Result<Vec<transactions::Model>, DbErr> {
    transactions::Entity::find()
        .filter(transactions::Column::AccountId.eq(account_id))
        .filter(transactions::Column::OperationTypeId.is_in(credit_operation_type_ids()))
        .filter(transactions::Column::Balance.ne(Decimal::ZERO))
        .order_by_desc(transactions::Column::EventDate)
        .order_by_desc(transactions::Column::TransactionId)
        .all(db)
        .await
}

/// Sets one transaction's balance. Returns the number of rows updated.
///
/// # Errors
///
/// Returns an error if the update fails (including the non-negative
/// `balance` check).
pub async fn update_balance<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
    balance: Decimal,
) -> Result<u64, DbErr> {
    let result = transactions::Entity::update_many()
        .col_expr(transactions::Column::Balance, Expr::value(balance))
        .filter(transactions::Column::TransactionId.eq(transaction_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
