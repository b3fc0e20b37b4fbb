//! Repository abstractions for data access.
//!
//! `account` and `transaction` hold plain queries generic over
//! [`sea_orm::ConnectionTrait`], so they run the same on a pooled connection
//! or inside an open database transaction. `ledger` composes them into the
//! store the ledger core drives.

pub mod account;
pub mod ledger;
pub mod transaction;
