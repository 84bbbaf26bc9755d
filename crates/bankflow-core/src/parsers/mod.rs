//! Statement parsers: per-institution formats plus a generic fallback.
//!
//! A parser owns an ordered list of [`ExtractionStrategy`] values. Parsing
//! tries them in order and keeps the first non-empty result, then
//! categorizes every transaction and computes the summary.

pub mod column;
pub mod common;
pub mod generic;
pub mod icbc;
pub mod minsheng;
pub mod patterns;
pub mod row;

pub use column::{ColumnHeaders, ColumnStrategy};
pub use generic::GenericParser;
pub use icbc::IcbcParser;
pub use minsheng::MinshengParser;
pub use row::{RowFormat, RowStrategy};

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::categorize::categorize;
use crate::decimal::Calculator;
use crate::models::transaction::{
    AccountInfo, Diagnostic, ParseResult, Summary, Transaction, TransactionType,
};

/// Per-call inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Document name, folded into transaction ids.
    pub source_file: Option<&'a str>,
    /// Unfiltered first page, searched for account details.
    pub header_text: Option<&'a str>,
    pub calculator: Calculator,
    pub currency: &'a str,
    /// Line the reconstructor places between pages.
    pub page_separator: &'a str,
}

impl Default for ParseContext<'_> {
    fn default() -> Self {
        Self {
            source_file: None,
            header_text: None,
            calculator: Calculator::default(),
            currency: "CNY",
            page_separator: "--- PAGE BREAK ---",
        }
    }
}

impl<'a> ParseContext<'a> {
    pub fn with_source_file(mut self, source_file: &'a str) -> Self {
        self.source_file = Some(source_file);
        self
    }

    pub fn with_header_text(mut self, header_text: &'a str) -> Self {
        self.header_text = Some(header_text);
        self
    }

    pub fn with_calculator(mut self, calculator: Calculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_currency(mut self, currency: &'a str) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_page_separator(mut self, page_separator: &'a str) -> Self {
        self.page_separator = page_separator;
        self
    }

    fn is_page_separator(&self, line: &str) -> bool {
        !self.page_separator.is_empty() && line.trim() == self.page_separator.trim()
    }
}

/// A transaction as read by a strategy, before categorization and ids.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub counterparty: String,
    pub counterparty_bank: String,
    pub voucher_number: Option<String>,
    /// Absolute amount.
    pub amount: Decimal,
    pub balance: Option<Decimal>,
    pub transaction_type: TransactionType,
    pub raw_line: String,
}

impl TransactionDraft {
    fn into_transaction(self, ctx: &ParseContext<'_>, strategy: &str, index: usize) -> Transaction {
        let category_info = categorize(&self.description, &self.counterparty);
        let amount = ctx.calculator.abs(self.amount);
        let content = format!(
            "{}|{}|{}|{}|{}|{}",
            self.date,
            self.time,
            amount,
            self.transaction_type.as_str(),
            self.description,
            self.raw_line
        );

        Transaction {
            id: common::transaction_id(ctx.source_file, strategy, index, self.date, &content),
            date: self.date,
            time: self.time,
            datetime: self.date.and_time(self.time),
            description: self.description,
            counterparty: self.counterparty,
            counterparty_bank: self.counterparty_bank,
            voucher_number: self.voucher_number,
            amount,
            balance: self.balance.map(|b| ctx.calculator.round(b)),
            transaction_type: self.transaction_type,
            category: category_info.id,
            category_info,
            source_file: ctx.source_file.map(str::to_string),
            raw_line: self.raw_line,
            user_note: None,
        }
    }
}

/// One way of reading transactions out of assembled statement text.
pub trait ExtractionStrategy: Send + Sync {
    /// Name recorded on the ParseResult when this strategy wins.
    fn name(&self) -> &'static str;

    /// Extract transactions. Lines that cannot be read are skipped and
    /// recorded in `diagnostics`; this never fails.
    fn extract(
        &self,
        text: &str,
        ctx: &ParseContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<TransactionDraft>;
}

/// Trait for statement parsing.
pub trait StatementParser: Send + Sync {
    /// Display name of the institution.
    fn institution_name(&self) -> &str;

    /// Read account holder details.
    fn extract_account_info(&self, text: &str) -> AccountInfo;

    /// Extraction strategies, in the order they are tried.
    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>];

    /// Parse statement text into a ParseResult.
    fn parse(&self, text: &str, ctx: &ParseContext<'_>) -> ParseResult {
        let mut account_info = match ctx.header_text {
            Some(header) => self.extract_account_info(&format!("{}\n{}", header, text)),
            None => self.extract_account_info(text),
        };
        account_info.currency = ctx.currency.to_string();

        let mut diagnostics = Vec::new();
        let mut drafts = Vec::new();
        let mut strategy = None;

        for candidate in self.strategies() {
            drafts = candidate.extract(text, ctx, &mut diagnostics);
            if !drafts.is_empty() {
                strategy = Some(candidate.name());
                break;
            }
            debug!("{}: strategy '{}' found no transactions", self.institution_name(), candidate.name());
        }

        let strategy_name = strategy.unwrap_or_default();
        let transactions: Vec<Transaction> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| draft.into_transaction(ctx, strategy_name, index))
            .collect();

        let summary = Summary::from_transactions(&transactions, &ctx.calculator);

        info!(
            "Parsed {} transactions from {} statement (strategy: {})",
            transactions.len(),
            self.institution_name(),
            strategy.unwrap_or("none")
        );

        ParseResult {
            institution: None,
            institution_name: self.institution_name().to_string(),
            account_info,
            transactions,
            summary,
            raw_text: text.to_string(),
            strategy: strategy.map(str::to_string),
            diagnostics,
        }
    }
}

/// Description used when a row carries none.
pub(crate) const DEFAULT_DESCRIPTION: &str = "银行交易";
