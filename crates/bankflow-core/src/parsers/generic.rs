//! Best-effort parser for statements from unregistered institutions.

use chrono::{NaiveDate, NaiveTime};
use regex::Captures;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::transaction::{AccountInfo, Diagnostic, TransactionType};

use super::common::{content_lines, find_amounts, parse_hms, parse_ymd};
use super::patterns::{GENERIC_DATE_DMY, GENERIC_DATE_YMD};
use super::{DEFAULT_DESCRIPTION, ExtractionStrategy, ParseContext, StatementParser, TransactionDraft};

/// Any line with a recognisable date and at least one amount beside it.
pub struct GenericLineStrategy;

impl GenericLineStrategy {
    fn parse_line(&self, line: &str) -> Result<Option<TransactionDraft>, ExtractionError> {
        let (caps, day_first) = match GENERIC_DATE_YMD.captures(line) {
            Some(caps) => (caps, false),
            None => match GENERIC_DATE_DMY.captures(line) {
                Some(caps) => (caps, true),
                None => return Ok(None),
            },
        };
        let Some(whole) = caps.get(0) else {
            return Ok(None);
        };

        // Amounts may sit on either side of the date.
        let amounts: Vec<_> = find_amounts(line)
            .into_iter()
            .filter(|a| a.end <= whole.start() || a.start >= whole.end())
            .collect();
        let Some(first) = amounts.first() else {
            return Ok(None);
        };

        let date = if day_first {
            parse_dmy(&caps[1])?
        } else {
            parse_ymd(&caps[1])?
        };
        let time = optional_time(&caps)?;

        let signed = first.value()?;
        let balance = match amounts.get(1) {
            Some(token) => Some(token.value()?),
            None => None,
        };

        let gap = if first.start >= whole.end() {
            &line[whole.end()..first.start]
        } else {
            &line[first.end..whole.start()]
        };
        let description = gap.trim();

        Ok(Some(TransactionDraft {
            date,
            time,
            description: if description.is_empty() {
                DEFAULT_DESCRIPTION.to_string()
            } else {
                description.to_string()
            },
            counterparty: String::new(),
            counterparty_bank: String::new(),
            voucher_number: None,
            amount: signed.abs(),
            balance,
            transaction_type: TransactionType::from_signed(signed),
            raw_line: line.to_string(),
        }))
    }
}

/// `DD-MM-YYYY`, falling back to `MM-DD-YYYY` when the day-first reading is
/// not a valid date.
fn parse_dmy(token: &str) -> Result<NaiveDate, ExtractionError> {
    let normalized = token.replace('/', "-");
    NaiveDate::parse_from_str(&normalized, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%m-%d-%Y"))
        .map_err(|_| ExtractionError::InvalidDate(token.to_string()))
}

fn optional_time(caps: &Captures<'_>) -> Result<NaiveTime, ExtractionError> {
    match caps.get(2) {
        Some(m) => parse_hms(m.as_str()),
        None => Ok(NaiveTime::MIN),
    }
}

impl ExtractionStrategy for GenericLineStrategy {
    fn name(&self) -> &'static str {
        "generic_lines"
    }

    fn extract(
        &self,
        text: &str,
        _ctx: &ParseContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<TransactionDraft> {
        let mut drafts = Vec::new();

        for line in content_lines(text) {
            match self.parse_line(line) {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping line '{}' (unknown institution): {}", line, e);
                    diagnostics.push(Diagnostic::SkippedLine {
                        line: line.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!("Generic strategy read {} transactions", drafts.len());
        drafts
    }
}

/// Fallback parser used when no institution is detected.
pub struct GenericParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl GenericParser {
    pub fn new() -> Self {
        Self {
            strategies: vec![Box::new(GenericLineStrategy)],
        }
    }
}

impl Default for GenericParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for GenericParser {
    fn institution_name(&self) -> &str {
        "未知银行"
    }

    fn extract_account_info(&self, _text: &str) -> AccountInfo {
        AccountInfo::default()
    }

    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>] {
        &self.strategies
    }
}
