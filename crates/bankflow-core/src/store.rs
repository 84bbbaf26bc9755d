//! In-memory ledger: the boundary where parse results from one or more
//! documents are merged.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorize::Category;
use crate::decimal::Calculator;
use crate::institutions::InstitutionId;
use crate::models::transaction::{AccountInfo, ParseResult, Summary, Transaction};

/// Institution and account of the last loaded parse result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseInfo {
    pub institution: Option<InstitutionId>,
    pub institution_name: String,
    pub account_info: AccountInfo,
}

/// Merged ledger across documents.
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
    parse_info: Option<ParseInfo>,
    calculator: Calculator,
}

impl TransactionStore {
    pub fn new(calculator: Calculator) -> Self {
        Self {
            calculator,
            ..Self::default()
        }
    }

    /// Replace all held state with `result`.
    pub fn load_parse_result(&mut self, result: ParseResult) {
        self.parse_info = Some(ParseInfo {
            institution: result.institution,
            institution_name: result.institution_name,
            account_info: result.account_info,
        });
        self.transactions = result.transactions;
        debug!("Loaded {} transactions", self.transactions.len());
    }

    /// Merge `transactions`, skipping any whose (date, time, amount) is
    /// already held, then sort newest first. Returns how many were added.
    pub fn append_transactions(&mut self, transactions: Vec<Transaction>) -> usize {
        let existing: HashSet<_> = self.transactions.iter().map(Transaction::dedup_key).collect();

        let before = self.transactions.len();
        self.transactions.extend(
            transactions
                .into_iter()
                .filter(|t| !existing.contains(&t.dedup_key())),
        );
        self.transactions.sort_by(|a, b| b.datetime.cmp(&a.datetime));

        let added = self.transactions.len() - before;
        debug!("Appended {} transactions ({} held)", added, self.transactions.len());
        added
    }

    /// Drop every transaction read from `source_file`. Returns how many went.
    pub fn remove_transactions_by_file(&mut self, source_file: &str) -> usize {
        let before = self.transactions.len();
        self.transactions
            .retain(|t| t.source_file.as_deref() != Some(source_file));
        before - self.transactions.len()
    }

    /// Recategorize one transaction. Returns false when the id is unknown.
    pub fn update_transaction_category(&mut self, id: &str, category: Category) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.set_category(category);
                true
            }
            None => false,
        }
    }

    /// Attach (or with `None`, remove) a user note.
    pub fn update_transaction_note(&mut self, id: &str, note: Option<String>) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.user_note = note;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
        self.parse_info = None;
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn parse_info(&self) -> Option<&ParseInfo> {
        self.parse_info.as_ref()
    }

    /// Totals over the held ledger.
    pub fn summary(&self) -> Summary {
        Summary::from_transactions(&self.transactions, &self.calculator)
    }

    /// Earliest and latest transaction dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.transactions.iter().map(|t| t.date).min()?;
        let last = self.transactions.iter().map(|t| t.date).max()?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionType;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn tx(id: &str, day: u32, hour: u32, amount: &str, file: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        Transaction {
            id: id.to_string(),
            date,
            time,
            datetime: date.and_time(time),
            description: "消费".to_string(),
            counterparty: String::new(),
            counterparty_bank: String::new(),
            voucher_number: None,
            amount: Decimal::from_str(amount).unwrap(),
            balance: None,
            transaction_type: TransactionType::Expense,
            category: Category::Shopping,
            category_info: Category::Shopping.info(),
            source_file: Some(file.to_string()),
            raw_line: String::new(),
            user_note: None,
        }
    }

    fn result(transactions: Vec<Transaction>) -> ParseResult {
        ParseResult {
            institution: Some(InstitutionId::ICBC),
            institution_name: "中国工商银行".to_string(),
            account_info: AccountInfo::default(),
            summary: Summary::default(),
            transactions,
            raw_text: String::new(),
            strategy: Some("rows".to_string()),
            diagnostics: Vec::new(),
        }
    }

    fn ids(store: &TransactionStore) -> Vec<&str> {
        store.transactions().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_load_replaces_state() {
        let mut store = TransactionStore::default();
        store.load_parse_result(result(vec![tx("a", 1, 9, "1.00", "a.pdf")]));
        store.load_parse_result(result(vec![tx("b", 2, 9, "2.00", "b.pdf")]));
        assert_eq!(ids(&store), vec!["b"]);
        assert_eq!(store.parse_info().unwrap().institution, Some(InstitutionId::ICBC));
    }

    #[test]
    fn test_append_dedups_and_sorts() {
        let mut store = TransactionStore::default();
        store.load_parse_result(result(vec![tx("a", 1, 9, "1.00", "a.pdf")]));

        let added = store.append_transactions(vec![
            tx("dup", 1, 9, "1.0", "b.pdf"),
            tx("c", 3, 9, "3.00", "b.pdf"),
            tx("b", 2, 9, "2.00", "b.pdf"),
        ]);

        assert_eq!(added, 2);
        assert_eq!(ids(&store), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_append_twice_equals_once() {
        let batch = vec![tx("x", 4, 10, "5.00", "x.pdf"), tx("y", 4, 11, "6.00", "x.pdf")];

        let mut once = TransactionStore::default();
        once.append_transactions(batch.clone());

        let mut twice = TransactionStore::default();
        twice.append_transactions(batch.clone());
        assert_eq!(twice.append_transactions(batch), 0);

        assert_eq!(once.transactions(), twice.transactions());
    }

    #[test]
    fn test_remove_by_file() {
        let mut store = TransactionStore::default();
        store.append_transactions(vec![
            tx("a", 1, 9, "1.00", "a.pdf"),
            tx("b", 2, 9, "2.00", "b.pdf"),
        ]);
        assert_eq!(store.remove_transactions_by_file("a.pdf"), 1);
        assert_eq!(ids(&store), vec!["b"]);
        assert_eq!(store.remove_transactions_by_file("missing.pdf"), 0);
    }

    #[test]
    fn test_updates() {
        let mut store = TransactionStore::default();
        store.append_transactions(vec![tx("a", 1, 9, "1.00", "a.pdf")]);

        assert!(store.update_transaction_category("a", Category::Dining));
        assert!(store.update_transaction_note("a", Some("lunch".to_string())));
        assert!(!store.update_transaction_note("zz", None));

        let t = &store.transactions()[0];
        assert_eq!(t.category_info.label, "餐饮美食");
        assert_eq!(t.user_note.as_deref(), Some("lunch"));
    }

    #[test]
    fn test_summary_and_clear() {
        let mut store = TransactionStore::default();
        store.append_transactions(vec![
            tx("a", 1, 9, "1.10", "a.pdf"),
            tx("b", 2, 9, "2.20", "a.pdf"),
        ]);
        assert_eq!(store.summary().total_expense.to_string(), "3.30");
        assert_eq!(
            store.date_range(),
            Some((
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
            ))
        );

        store.clear();
        assert!(store.is_empty());
        assert!(store.parse_info().is_none());
        assert_eq!(store.summary().transaction_count, 0);
    }
}
