//! Data models: ledger records, parse results and configuration.

pub mod config;
pub mod transaction;
