//! Shared-expense ledger: weighted expense splitting, net balances and the
//! payments that settle a group.

pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod requests;
pub mod routes;
pub mod schemas;
pub mod shares;
pub mod store;
pub mod summary;
