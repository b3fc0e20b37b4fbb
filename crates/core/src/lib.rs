//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, validation rules, the balance consumption engine, and the
//! orchestration that records transactions atomically all live here. Storage is
//! reached only through the [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions, credit consumption, and the store contract

pub mod ledger;
