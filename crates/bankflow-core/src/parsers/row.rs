//! Row-based extraction: one printed line per transaction.

use regex::{Regex, RegexSet};
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::transaction::{Diagnostic, TransactionType};

use super::common::{content_lines, find_amounts, parse_hms, parse_ymd};
use super::patterns::{COUNTERPARTY_NAME, COUNTERPARTY_NOISE, VOUCHER_NUMBER};
use super::{DEFAULT_DESCRIPTION, ExtractionStrategy, ParseContext, TransactionDraft};

/// Institution-specific shape of a transaction row.
#[derive(Debug, Clone, Copy)]
pub struct RowFormat {
    /// Date+time locator; group 1 is the date, group 2 the time.
    pub datetime: &'static Regex,
    /// Header/footer lines to ignore.
    pub skip: &'static RegexSet,
    /// Payment channels looked for after the last amount.
    pub channels: &'static [&'static str],
}

/// Row strategy: a line is a transaction when it carries a date+time
/// followed by at least one amount.
pub struct RowStrategy {
    format: RowFormat,
}

impl RowStrategy {
    pub fn new(format: RowFormat) -> Self {
        Self { format }
    }

    fn parse_line(
        &self,
        line: &str,
        ctx: &ParseContext<'_>,
    ) -> Result<Option<TransactionDraft>, ExtractionError> {
        let Some(caps) = self.format.datetime.captures(line) else {
            return Ok(None);
        };
        let Some(whole) = caps.get(0) else {
            return Ok(None);
        };

        let before = &line[..whole.start()];
        let after = &line[whole.end()..];

        let amounts = find_amounts(after);
        let Some(first) = amounts.first() else {
            return Ok(None);
        };

        let date = parse_ymd(caps.get(1).map_or("", |m| m.as_str()))?;
        let time = parse_hms(caps.get(2).map_or("", |m| m.as_str()))?;

        let signed = first.value()?;
        let transaction_type = TransactionType::from_signed(signed);
        let amount = ctx.calculator.abs(signed);
        let balance = match amounts.get(1) {
            Some(token) => Some(token.value()?),
            None => None,
        };

        let voucher_number = VOUCHER_NUMBER
            .captures(before)
            .map(|c| c[1].to_string());

        let mut description = after[..first.start].trim().to_string();

        let tail = amounts
            .last()
            .map_or("", |last| &after[last.end..]);
        let counterparty_bank = self
            .format
            .channels
            .iter()
            .find(|channel| tail.contains(*channel))
            .map(|channel| channel.to_string())
            .unwrap_or_default();

        let mut counterparty = counterparty_from_tail(tail, &counterparty_bank, &description);

        if description.is_empty() && !counterparty_bank.is_empty() {
            description = format!("{}交易", counterparty_bank);
        }

        if counterparty.is_empty() && !description.is_empty() {
            counterparty = counterparty_from_description(&description);
        }
        if counterparty.is_empty() {
            counterparty = counterparty_bank.clone();
        }
        if description.is_empty() {
            description = DEFAULT_DESCRIPTION.to_string();
        }

        Ok(Some(TransactionDraft {
            date,
            time,
            description,
            counterparty,
            counterparty_bank,
            voucher_number,
            amount,
            balance,
            transaction_type,
            raw_line: line.to_string(),
        }))
    }
}

/// Name printed after the last amount, with channel noise removed.
///
/// When that is only the channel (or too short to mean anything) the
/// merchant segment of a dash-separated description is used instead:
/// `网银在线-快捷支付-京东大药房` gives `京东大药房`.
fn counterparty_from_tail(tail: &str, channel: &str, description: &str) -> String {
    let cleaned = COUNTERPARTY_NOISE.replace_all(tail, "");
    let Some(name) = COUNTERPARTY_NAME.find(cleaned.trim()) else {
        return String::new();
    };

    let name = name.as_str().trim();
    if name == channel || name.chars().count() < 3 {
        let parts: Vec<&str> = description.split('-').collect();
        if parts.len() >= 3 {
            return parts[2..].join("-").trim().to_string();
        }
    }
    name.to_string()
}

/// Fallback counterparty read from the description alone.
fn counterparty_from_description(description: &str) -> String {
    let parts: Vec<&str> = description.split('-').map(str::trim).collect();
    if parts.len() >= 3 {
        let last = parts[parts.len() - 1];
        let name = if last.is_empty() { parts[0] } else { last };
        name.to_string()
    } else {
        parts.first().copied().unwrap_or_default().to_string()
    }
}

impl ExtractionStrategy for RowStrategy {
    fn name(&self) -> &'static str {
        "rows"
    }

    fn extract(
        &self,
        text: &str,
        ctx: &ParseContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<TransactionDraft> {
        let mut drafts = Vec::new();

        for line in content_lines(text) {
            if self.format.skip.is_match(line) {
                continue;
            }

            match self.parse_line(line, ctx) {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping line '{}': {}", line, e);
                    diagnostics.push(Diagnostic::SkippedLine {
                        line: line.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!("Row strategy read {} transactions", drafts.len());
        drafts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::patterns::{ISO_DATETIME, MINSHENG_SKIP, PAYMENT_CHANNELS, SLASH_DATETIME, ICBC_SKIP};
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn minsheng_rows() -> RowStrategy {
        RowStrategy::new(RowFormat {
            datetime: &SLASH_DATETIME,
            skip: &MINSHENG_SKIP,
            channels: PAYMENT_CHANNELS,
        })
    }

    fn extract(strategy: &RowStrategy, text: &str) -> (Vec<TransactionDraft>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let drafts = strategy.extract(text, &ParseContext::default(), &mut diagnostics);
        (drafts, diagnostics)
    }

    #[test]
    fn test_repayment_line() {
        let (drafts, diagnostics) =
            extract(&minsheng_rows(), "2019/05/01 15:36:01 支付宝-快捷支付-还款 -1,316.78 25.66");
        assert!(diagnostics.is_empty());
        assert_eq!(drafts.len(), 1);

        let t = &drafts[0];
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2019, 5, 1).unwrap());
        assert_eq!(t.time, NaiveTime::from_hms_opt(15, 36, 1).unwrap());
        assert_eq!(t.amount.to_string(), "1316.78");
        assert_eq!(t.transaction_type, TransactionType::Expense);
        assert_eq!(t.balance, Some(Decimal::from_str("25.66").unwrap()));
        assert_eq!(t.description, "支付宝-快捷支付-还款");
    }

    #[test]
    fn test_voucher_and_counterparty() {
        let line = "3130120190501123 2019/05/03 10:00:00 网银在线-快捷支付-京东大药房 -56.80 1,200.00 网银在线";
        let (drafts, _) = extract(&minsheng_rows(), line);
        let t = &drafts[0];
        assert_eq!(t.voucher_number.as_deref(), Some("3130120190501123"));
        assert_eq!(t.counterparty_bank, "网银在线");
        assert_eq!(t.counterparty, "京东大药房");
        assert_eq!(t.balance, Some(Decimal::from_str("1200.00").unwrap()));
    }

    #[test]
    fn test_counterparty_after_amount_with_noise() {
        let line = "2019/05/04 09:12:00 跨行转入 +2,000.00 3,200.00 转账 张三丰有限公司/6222001234* 银联";
        let (drafts, _) = extract(&minsheng_rows(), line);
        let t = &drafts[0];
        assert_eq!(t.transaction_type, TransactionType::Income);
        assert_eq!(t.amount.to_string(), "2000.00");
        assert_eq!(t.counterparty, "张三丰有限公司");
        assert_eq!(t.counterparty_bank, "银联");
    }

    #[test]
    fn test_empty_description_uses_channel() {
        let line = "2019/05/05 20:00:00 -6.00 19.66 财付通";
        let (drafts, _) = extract(&minsheng_rows(), line);
        assert_eq!(drafts[0].description, "财付通交易");
    }

    #[test]
    fn test_unsigned_amount_is_income() {
        let (drafts, _) = extract(&minsheng_rows(), "2019/05/06 08:00:00 利息 0.23 19.89");
        assert_eq!(drafts[0].transaction_type, TransactionType::Income);
        assert_eq!(drafts[0].counterparty, "利息");
    }

    #[test]
    fn test_headers_and_non_rows_skipped() {
        let text = "中国民生银行个人账户对账单\n凭证类型 凭证号码 摘要 交易时间\n2019/05/07 12:00:00 no amount here\nrandom text";
        let (drafts, diagnostics) = extract(&minsheng_rows(), text);
        assert!(drafts.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_date_recorded_and_skipped() {
        let text = "2019/02/30 10:00:00 消费 -1.00 2.00\n2019/03/01 10:00:00 消费 -1.00 1.00";
        let (drafts, diagnostics) = extract(&minsheng_rows(), text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(&diagnostics[0], Diagnostic::SkippedLine { reason, .. } if reason.contains("2019/02/30")));
    }

    #[test]
    fn test_iso_rows() {
        let strategy = RowStrategy::new(RowFormat {
            datetime: &ISO_DATETIME,
            skip: &ICBC_SKIP,
            channels: PAYMENT_CHANNELS,
        });
        let (drafts, _) = extract(&strategy, "2024-05-14 14:37:43 消费 -24.73 5,793.68");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].amount.to_string(), "24.73");
        assert_eq!(drafts[0].transaction_type, TransactionType::Expense);
    }
}
