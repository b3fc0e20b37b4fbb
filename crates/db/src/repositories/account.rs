//! Account queries.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QuerySelect, Set};

use crate::entities::accounts;

/// Inserts an account and returns the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails (including the positive
/// `document_number` check).
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    document_number: i64,
) -> Result<accounts::Model, DbErr> {
    accounts::ActiveModel {
        document_number: Set(document_number),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Finds an account by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> Result<Option<accounts::Model>, DbErr> {
    accounts::Entity::find_by_id(account_id).one(db).await
}

/// Reads an account with `FOR UPDATE`, holding its row lock until the
/// surrounding database transaction ends.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn lock<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> Result<Option<accounts::Model>, DbErr> {
    accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(db)
        .await
}
