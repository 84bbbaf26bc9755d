//! Helpers shared by every extraction strategy.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::decimal::parse_amount;
use crate::error::ExtractionError;

use super::patterns::AMOUNT_TOKEN;

/// Explicit sign printed in front of an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// An amount found in a line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountToken<'a> {
    /// Matched text, sign and grouping included.
    pub text: &'a str,
    /// Byte offset of the match within the searched text.
    pub start: usize,
    pub end: usize,
    pub sign: Option<Sign>,
}

impl AmountToken<'_> {
    /// Signed value of the token.
    pub fn value(&self) -> Result<Decimal, ExtractionError> {
        parse_amount(self.text).ok_or_else(|| ExtractionError::InvalidAmount(self.text.to_string()))
    }

    pub fn is_signed(&self) -> bool {
        self.sign.is_some()
    }
}

/// Find every amount token in `text`.
///
/// A match immediately followed by another digit (`12.345`) is not an amount.
pub fn find_amounts(text: &str) -> Vec<AmountToken<'_>> {
    AMOUNT_TOKEN
        .find_iter(text)
        .filter(|m| {
            !text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .map(|m| {
            let sign = match m.as_str().as_bytes().first() {
                Some(b'+') => Some(Sign::Plus),
                Some(b'-') => Some(Sign::Minus),
                _ => None,
            };
            AmountToken {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
                sign,
            }
        })
        .collect()
}

/// Parse a `YYYY-MM-DD` or `YYYY/MM/DD` date.
pub fn parse_ymd(token: &str) -> Result<NaiveDate, ExtractionError> {
    let normalized = token.trim().replace('/', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| ExtractionError::InvalidDate(token.to_string()))
}

/// Parse an `HH:MM:SS` time.
pub fn parse_hms(token: &str) -> Result<NaiveTime, ExtractionError> {
    NaiveTime::parse_from_str(token.trim(), "%H:%M:%S")
        .map_err(|_| ExtractionError::InvalidTime(token.to_string()))
}

/// Trimmed, non-empty lines of `text`.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Deterministic transaction id.
///
/// Same document, strategy, position and content always give the same id;
/// the position keeps otherwise identical rows apart.
pub fn transaction_id(
    source: Option<&str>,
    strategy: &str,
    index: usize,
    date: NaiveDate,
    content: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.unwrap_or_default().as_bytes());
    hasher.update(b"|");
    hasher.update(strategy.as_bytes());
    hasher.update(b"|");
    hasher.update(index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(content.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", date.format("%Y%m%d"), &digest[..12])
}
