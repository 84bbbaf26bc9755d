//! Ledger data models.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::categorize::{Category, CategoryInfo};
use crate::decimal::Calculator;
use crate::institutions::InstitutionId;

/// Direction of a transaction. The amount itself is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Direction implied by a signed amount; zero counts as income.
    pub fn from_signed(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// One normalized ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Deterministic identifier, unique within a parse.
    pub id: String,

    pub date: NaiveDate,

    /// Time of day, midnight when the statement gives none.
    pub time: NaiveTime,

    /// `date` combined with `time`.
    pub datetime: NaiveDateTime,

    pub description: String,

    /// Counterparty name, empty when unknown.
    #[serde(default)]
    pub counterparty: String,

    /// Payment channel or counterparty bank, empty when unknown.
    #[serde(default)]
    pub counterparty_bank: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_number: Option<String>,

    /// Absolute amount, two decimal places.
    pub amount: Decimal,

    /// Running balance after this transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub category: Category,

    pub category_info: CategoryInfo,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Text the transaction was read from.
    #[serde(default)]
    pub raw_line: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_note: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Key used when merging ledgers: the same instant and amount is the
    /// same transaction.
    pub fn dedup_key(&self) -> (NaiveDate, NaiveTime, Decimal) {
        (self.date, self.time, self.amount.normalize())
    }

    /// Replace the category and its denormalized descriptor together.
    pub fn set_category(&mut self, category: Category) {
        self.category = category;
        self.category_info = category.info();
    }
}

/// Statement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Account holder details read from the statement header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub account_name: String,

    /// May be masked, e.g. `6226****1234`.
    #[serde(default)]
    pub account_number: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<StatementPeriod>,
}

fn default_currency() -> String {
    "CNY".to_string()
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            account_number: String::new(),
            currency: default_currency(),
            period: None,
        }
    }
}

/// Ledger totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub balance: Decimal,
    pub transaction_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
}

impl Default for Summary {
    fn default() -> Self {
        Self::from_transactions(&[], &Calculator::default())
    }
}

impl Summary {
    /// Compute totals with the given calculator.
    pub fn from_transactions(transactions: &[Transaction], calc: &Calculator) -> Self {
        let (income, expense): (Vec<&Transaction>, Vec<&Transaction>) =
            transactions.iter().partition(|t| t.is_income());

        let total_income = calc.sum(income.iter().map(|t| t.amount));
        let total_expense = calc.sum(expense.iter().map(|t| t.amount));

        Self {
            total_income,
            total_expense,
            balance: calc.subtract(total_income, total_expense),
            transaction_count: transactions.len(),
            income_count: income.len(),
            expense_count: expense.len(),
        }
    }
}

/// Non-fatal findings recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A line looked like a transaction but could not be read.
    SkippedLine { line: String, reason: String },

    /// The column strategy's parallel arrays disagree in length.
    ColumnCountMismatch {
        dates: usize,
        times: usize,
        descriptions: usize,
        balances: usize,
        counterparties: usize,
    },

    /// A balance delta disagrees with the signed amount printed on the statement.
    BalanceDeltaMismatch {
        index: usize,
        stated: Decimal,
        computed: Decimal,
    },
}

/// Everything recovered from one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Institution key, absent for the generic parser.
    pub institution: Option<InstitutionId>,

    /// Display name of the institution that parsed the statement.
    pub institution_name: String,

    pub account_info: AccountInfo,

    pub transactions: Vec<Transaction>,

    pub summary: Summary,

    /// Assembled text the parser read.
    pub raw_text: String,

    /// Name of the extraction strategy that produced the ledger.
    pub strategy: Option<String>,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Stamp every transaction with the document it came from.
    pub fn with_source_file(mut self, source_file: &str) -> Self {
        for transaction in &mut self.transactions {
            transaction.source_file = Some(source_file.to_string());
        }
        self
    }
}
