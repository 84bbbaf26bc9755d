//! ICBC (中国工商银行) debit account history statements.
//!
//! The electronic statement renders its table column by column, so the
//! balance-delta column strategy runs first with a row strategy behind it.

use crate::models::transaction::{AccountInfo, StatementPeriod};

use super::column::{ColumnHeaders, ColumnStrategy};
use super::common::parse_ymd;
use super::patterns::{
    ICBC_ACCOUNT_NAME, ICBC_CARD_NUMBER, ICBC_PERIOD, ICBC_SKIP, ISO_DATETIME, PAYMENT_CHANNELS,
};
use super::row::{RowFormat, RowStrategy};
use super::{ExtractionStrategy, StatementParser};

/// Column section labels printed on ICBC statements.
pub const ICBC_COLUMNS: ColumnHeaders = ColumnHeaders {
    description: "摘要",
    counterparty: "对方户名",
    counterparty_end: &["余额", "对方账号"],
    balance: "余额",
    empty_placeholder: "（空）",
    summation_markers: &["本页收入算术合计", "本页支出算术合计"],
};

pub struct IcbcParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl IcbcParser {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(ColumnStrategy::new(ICBC_COLUMNS)),
                Box::new(RowStrategy::new(RowFormat {
                    datetime: &ISO_DATETIME,
                    skip: &ICBC_SKIP,
                    channels: PAYMENT_CHANNELS,
                })),
            ],
        }
    }
}

impl Default for IcbcParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for IcbcParser {
    fn institution_name(&self) -> &str {
        "中国工商银行"
    }

    fn extract_account_info(&self, text: &str) -> AccountInfo {
        let mut info = AccountInfo::default();

        if let Some(caps) = ICBC_CARD_NUMBER.captures(text) {
            info.account_number = caps[1].to_string();
        }
        if let Some(caps) = ICBC_ACCOUNT_NAME.captures(text) {
            info.account_name = caps[1].to_string();
        }
        if let Some(caps) = ICBC_PERIOD.captures(text) {
            if let (Ok(start), Ok(end)) = (parse_ymd(&caps[1]), parse_ymd(&caps[2])) {
                info.period = Some(StatementPeriod { start, end });
            }
        }

        info
    }

    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>] {
        &self.strategies
    }
}
