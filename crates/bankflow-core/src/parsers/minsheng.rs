//! China Minsheng Bank (中国民生银行) personal account statements.

use chrono::NaiveDate;

use crate::models::transaction::{AccountInfo, StatementPeriod};

use super::patterns::{
    MINSHENG_ACCOUNT_NAME, MINSHENG_ACCOUNT_NUMBER, MINSHENG_PERIOD, MINSHENG_SKIP,
    PAYMENT_CHANNELS, SLASH_DATETIME,
};
use super::row::{RowFormat, RowStrategy};
use super::{ExtractionStrategy, StatementParser};

pub struct MinshengParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl MinshengParser {
    pub fn new() -> Self {
        Self {
            strategies: vec![Box::new(RowStrategy::new(RowFormat {
                datetime: &SLASH_DATETIME,
                skip: &MINSHENG_SKIP,
                channels: PAYMENT_CHANNELS,
            }))],
        }
    }
}

impl Default for MinshengParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for MinshengParser {
    fn institution_name(&self) -> &str {
        "中国民生银行"
    }

    fn extract_account_info(&self, text: &str) -> AccountInfo {
        let mut info = AccountInfo::default();

        if let Some(caps) = MINSHENG_ACCOUNT_NAME.captures(text) {
            info.account_name = caps[1].to_string();
        }
        if let Some(caps) = MINSHENG_ACCOUNT_NUMBER.captures(text) {
            info.account_number = caps[1].to_string();
        }
        if let Some(caps) = MINSHENG_PERIOD.captures(text) {
            let start = NaiveDate::parse_from_str(&caps[1], "%Y/%m/%d");
            let end = NaiveDate::parse_from_str(&caps[2], "%Y/%m/%d");
            if let (Ok(start), Ok(end)) = (start, end) {
                info.period = Some(StatementPeriod { start, end });
            }
        }

        info
    }

    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>] {
        &self.strategies
    }
}
