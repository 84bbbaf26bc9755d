//! Core library for bank statement recovery.
//!
//! This crate provides:
//! - Layout reconstruction (positioned text fragments to rows, columns and table regions)
//! - Institution detection and a registry of statement parsers with a generic fallback
//! - Exact decimal arithmetic for every money figure
//! - Keyword-based transaction categorization
//! - An in-memory ledger store implementing the batch merge boundary

pub mod categorize;
pub mod decimal;
pub mod error;
pub mod institutions;
pub mod layout;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod store;

pub use categorize::{categorize, Category, CategoryInfo};
pub use decimal::{Calculator, DecimalPolicy, Rounding};
pub use error::{BankflowError, DocumentError, ExtractionError, Result};
pub use institutions::{InstitutionId, InstitutionProfile, ParserRegistry};
pub use layout::{PositionedFragment, TableRegionMarkers};
pub use models::config::BankflowConfig;
pub use models::transaction::{
    AccountInfo, Diagnostic, ParseResult, StatementPeriod, Summary, Transaction, TransactionType,
};
pub use pipeline::{ReconstructedDocument, StatementDocument, StatementPipeline};
pub use store::{ParseInfo, TransactionStore};
