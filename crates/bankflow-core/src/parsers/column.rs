//! Column reconstruction: statements whose table comes out column by column.
//!
//! Some renderers emit a statement table as one long line per field (all
//! dates, then all times, then all balances). The fields are collected into
//! parallel arrays and zipped by index. Amounts are not read from the text
//! at all; they are reconstructed from consecutive running balances.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::transaction::{Diagnostic, TransactionType};

use super::common::{AmountToken, content_lines, find_amounts, parse_hms, parse_ymd};
use super::patterns::{ISO_DATE_TOKEN, TIME_TOKEN};
use super::{DEFAULT_DESCRIPTION, ExtractionStrategy, ParseContext, TransactionDraft};

/// Tokens on a line before it counts as a date or time column.
const MIN_COLUMN_TOKENS: usize = 3;

/// Header labels that open and close each column section.
#[derive(Debug, Clone, Copy)]
pub struct ColumnHeaders {
    /// Lines starting with this carry descriptions.
    pub description: &'static str,
    /// Opens the counterparty section.
    pub counterparty: &'static str,
    /// Any of these closes the counterparty section.
    pub counterparty_end: &'static [&'static str],
    /// Opens the balance section.
    pub balance: &'static str,
    /// Printed in place of an empty cell.
    pub empty_placeholder: &'static str,
    /// Per-page total lines, never part of the stated amounts.
    pub summation_markers: &'static [&'static str],
}

/// Parallel arrays read from a column-wise table.
#[derive(Debug, Default)]
struct Columns<'t> {
    dates: Vec<&'t str>,
    times: Vec<&'t str>,
    descriptions: Vec<&'t str>,
    counterparties: Vec<String>,
    balances: Vec<Decimal>,
    stated: Vec<Decimal>,
}

/// Balance-delta column strategy.
pub struct ColumnStrategy {
    headers: ColumnHeaders,
}

impl ColumnStrategy {
    pub fn new(headers: ColumnHeaders) -> Self {
        Self { headers }
    }

    fn collect<'t>(
        &self,
        text: &'t str,
        ctx: &ParseContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Columns<'t> {
        let lines: Vec<&str> = content_lines(text).collect();
        let mut columns = Columns::default();

        for &line in &lines {
            let times: Vec<&str> = TIME_TOKEN.find_iter(line).map(|m| m.as_str()).collect();
            if times.len() >= MIN_COLUMN_TOKENS {
                columns.times.extend(times);
            }

            let dates: Vec<&str> = ISO_DATE_TOKEN.find_iter(line).map(|m| m.as_str()).collect();
            if dates.len() >= MIN_COLUMN_TOKENS {
                columns.dates.extend(dates);
            }

            if line.starts_with(self.headers.description) {
                columns.descriptions.extend(
                    line.split_whitespace()
                        .filter(|part| *part != self.headers.description),
                );
            }
        }

        columns.counterparties = self.collect_counterparties(&lines, ctx);
        columns.balances = self.collect_balances(&lines, diagnostics);
        columns.stated = self.collect_stated(&lines, diagnostics);
        columns
    }

    fn collect_counterparties(&self, lines: &[&str], ctx: &ParseContext<'_>) -> Vec<String> {
        let headers = &self.headers;
        let cell = |part: &str| {
            if part == headers.empty_placeholder {
                String::new()
            } else {
                part.to_string()
            }
        };

        let mut counterparties = Vec::new();
        let mut in_section = false;

        for line in lines {
            if ctx.is_page_separator(line) {
                continue;
            }
            if line.starts_with(headers.counterparty) {
                in_section = true;
                counterparties.extend(
                    line.split_whitespace()
                        .filter(|part| *part != headers.counterparty)
                        .map(cell),
                );
                continue;
            }
            if headers.counterparty_end.iter().any(|h| line.starts_with(h)) {
                in_section = false;
                continue;
            }
            if in_section {
                counterparties.extend(
                    line.split_whitespace()
                        .filter(|part| {
                            !is_whole(&ISO_DATE_TOKEN, part)
                                && !is_whole(&TIME_TOKEN, part)
                                && !part.starts_with("下单时间")
                                && part.chars().count() > 1
                        })
                        .map(cell),
                );
            }
        }

        counterparties
    }

    /// Balances: the balance header line, then every following line with
    /// enough amounts, up to the first line carrying signed amounts.
    fn collect_balances(&self, lines: &[&str], diagnostics: &mut Vec<Diagnostic>) -> Vec<Decimal> {
        let mut balances = Vec::new();
        let mut in_section = false;

        for line in lines {
            let tokens = find_amounts(line);

            if line.starts_with(self.headers.balance) {
                in_section = true;
                push_values(&mut balances, line, tokens.iter(), diagnostics, true);
                continue;
            }

            let signed = tokens.iter().filter(|t| t.is_signed()).count();
            if signed > 0 {
                if in_section {
                    let unsigned: Vec<&AmountToken<'_>> =
                        tokens.iter().filter(|t| !t.is_signed()).collect();
                    if unsigned.len() > signed {
                        push_values(&mut balances, line, unsigned.into_iter(), diagnostics, true);
                    }
                }
                in_section = false;
                continue;
            }

            if in_section && tokens.len() >= MIN_COLUMN_TOKENS {
                push_values(&mut balances, line, tokens.iter(), diagnostics, true);
            }
        }

        balances
    }

    /// Signed amounts as printed, ignoring per-page totals.
    fn collect_stated(&self, lines: &[&str], diagnostics: &mut Vec<Diagnostic>) -> Vec<Decimal> {
        let mut stated = Vec::new();

        for line in lines {
            if self.headers.summation_markers.iter().any(|m| line.contains(m)) {
                continue;
            }
            let tokens = find_amounts(line);
            push_values(
                &mut stated,
                line,
                tokens.iter().filter(|t| t.is_signed()),
                diagnostics,
                false,
            );
        }

        stated
    }
}

fn is_whole(pattern: &regex::Regex, text: &str) -> bool {
    pattern
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

fn push_values<'a, 't: 'a>(
    out: &mut Vec<Decimal>,
    line: &str,
    tokens: impl Iterator<Item = &'a AmountToken<'t>>,
    diagnostics: &mut Vec<Diagnostic>,
    unsigned: bool,
) {
    for token in tokens {
        match token.value() {
            Ok(value) if unsigned => out.push(value.abs()),
            Ok(value) => out.push(value),
            Err(e) => diagnostics.push(Diagnostic::SkippedLine {
                line: line.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl ExtractionStrategy for ColumnStrategy {
    fn name(&self) -> &'static str {
        "columns"
    }

    fn extract(
        &self,
        text: &str,
        ctx: &ParseContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<TransactionDraft> {
        let calc = &ctx.calculator;
        let columns = self.collect(text, ctx, diagnostics);

        debug!(
            "Column arrays: {} dates, {} times, {} descriptions, {} balances, {} counterparties, {} stated amounts",
            columns.dates.len(),
            columns.times.len(),
            columns.descriptions.len(),
            columns.balances.len(),
            columns.counterparties.len(),
            columns.stated.len()
        );

        let count = columns
            .dates
            .len()
            .min(columns.times.len())
            .min(columns.balances.len());
        if count == 0 {
            return Vec::new();
        }

        let lengths = [
            columns.dates.len(),
            columns.times.len(),
            columns.descriptions.len(),
            columns.balances.len(),
            columns.counterparties.len(),
        ];
        if lengths.iter().any(|len| *len != lengths[0]) {
            warn!(
                "Column arrays disagree: {} dates, {} times, {} descriptions, {} balances, {} counterparties",
                lengths[0], lengths[1], lengths[2], lengths[3], lengths[4]
            );
            diagnostics.push(Diagnostic::ColumnCountMismatch {
                dates: lengths[0],
                times: lengths[1],
                descriptions: lengths[2],
                balances: lengths[3],
                counterparties: lengths[4],
            });
        }

        let validate = columns.stated.len() == count;
        let mut drafts = Vec::with_capacity(count);

        for i in 0..count {
            let balance = columns.balances[i];
            let previous = if i > 0 { columns.balances[i - 1] } else { Decimal::ZERO };
            let delta = calc.subtract(balance, previous);

            if validate && !calc.eq(columns.stated[i], delta) {
                warn!(
                    "Balance delta at index {} is {} but the statement shows {}",
                    i, delta, columns.stated[i]
                );
                diagnostics.push(Diagnostic::BalanceDeltaMismatch {
                    index: i,
                    stated: calc.round(columns.stated[i]),
                    computed: delta,
                });
            }

            let description = columns
                .descriptions
                .get(i)
                .filter(|d| !d.is_empty())
                .copied()
                .unwrap_or(DEFAULT_DESCRIPTION);
            let counterparty = columns.counterparties.get(i).cloned().unwrap_or_default();
            let raw_line = format!(
                "{} {} {} {} {}",
                columns.dates[i], columns.times[i], description, counterparty, balance
            );

            let parsed = parse_ymd(columns.dates[i])
                .and_then(|date| parse_hms(columns.times[i]).map(|time| (date, time)));
            let (date, time) = match parsed {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Skipping column row {}: {}", i, e);
                    diagnostics.push(Diagnostic::SkippedLine {
                        line: raw_line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            drafts.push(TransactionDraft {
                date,
                time,
                description: description.to_string(),
                counterparty,
                counterparty_bank: String::new(),
                voucher_number: None,
                amount: calc.abs(delta),
                balance: Some(balance),
                transaction_type: if calc.gte(balance, previous) {
                    TransactionType::Income
                } else {
                    TransactionType::Expense
                },
                raw_line,
            });
        }

        debug!("Column strategy reconstructed {} transactions", drafts.len());
        drafts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::icbc::ICBC_COLUMNS;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extract(text: &str) -> (Vec<TransactionDraft>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let drafts = ColumnStrategy::new(ICBC_COLUMNS).extract(text, &ParseContext::default(), &mut diagnostics);
        (drafts, diagnostics)
    }

    const STATEMENT: &str = "\
交易日期 10:00:00 11:00:00 12:00:00
卡号 6222021234567890123 2024-01-01 2024-01-02 2024-01-03
摘要 工资 转账 消费
对方户名 某某科技有限公司 （空） 京东商城
--- PAGE BREAK ---
对方账号 1234
余额 100.00 150.00 130.00
收入/支出金额 +100.00 +50.00 -20.00
本页收入算术合计 +150.00
";

    #[test]
    fn test_balance_deltas() {
        let (drafts, diagnostics) = extract(STATEMENT);
        assert_eq!(diagnostics, vec![]);
        assert_eq!(drafts.len(), 3);

        let amounts: Vec<(String, TransactionType)> = drafts
            .iter()
            .map(|t| (t.amount.to_string(), t.transaction_type))
            .collect();
        assert_eq!(
            amounts,
            vec![
                ("100.00".to_string(), TransactionType::Income),
                ("50.00".to_string(), TransactionType::Income),
                ("20.00".to_string(), TransactionType::Expense),
            ]
        );
        assert_eq!(drafts[2].balance, Some(d("130.00")));
        assert_eq!(drafts[0].description, "工资");
        assert_eq!(drafts[0].counterparty, "某某科技有限公司");
        assert_eq!(drafts[1].counterparty, "");
        assert_eq!(drafts[2].counterparty, "京东商城");
    }

    #[test]
    fn test_stated_amount_mismatch_is_flagged() {
        let text = STATEMENT.replace("-20.00", "-25.00");
        let (drafts, diagnostics) = extract(&text);
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[2].amount, d("20.00"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::BalanceDeltaMismatch {
                index: 2,
                stated: d("-25.00"),
                computed: d("-20.00"),
            }]
        );
    }

    #[test]
    fn test_length_mismatch_is_flagged() {
        let text = STATEMENT.replace("摘要 工资 转账 消费", "摘要 工资 转账");
        let (drafts, diagnostics) = extract(&text);
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[2].description, DEFAULT_DESCRIPTION);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::ColumnCountMismatch {
                dates: 3,
                times: 3,
                descriptions: 2,
                balances: 3,
                counterparties: 3,
            }]
        );
    }

    #[test]
    fn test_balance_continues_across_lines() {
        let text = "\
交易日期 10:00:00 11:00:00 12:00:00 13:00:00
2024-01-01 2024-01-02 2024-01-03 2024-01-04
余额 0.00
5,818.18 5,818.41 5,793.68
收入/支出金额 +0.00 +5,818.18 +0.23 -24.73
";
        let (drafts, _) = extract(text);
        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[1].amount, d("5818.18"));
        assert_eq!(drafts[2].amount, d("0.23"));
        assert_eq!(drafts[3].amount, d("24.73"));
        assert_eq!(drafts[3].transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_tokens_glued_to_labels() {
        let text = "\
交易时间10:00:00 11:00:00 12:00:00
日期2024-01-01 2024-01-02 2024-01-03
余额 100.00 150.00 130.00
";
        let (drafts, _) = extract(text);
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].date.to_string(), "2024-01-01");
        assert_eq!(drafts[0].time.to_string(), "10:00:00");
        assert_eq!(drafts[2].amount, d("20.00"));
    }

    #[test]
    fn test_no_columns_yields_nothing() {
        let (drafts, diagnostics) = extract("2024-05-14 14:37:43 消费 -24.73 5,793.68");
        assert!(drafts.is_empty());
        assert!(diagnostics.is_empty());
    }
}
