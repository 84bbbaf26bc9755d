//! Common regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::{Regex, RegexSet};

lazy_static! {
    // Amounts: optional sign, digits with comma grouping, exactly two decimals
    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"[+-]?\d[\d,]*\.\d{2}"
    ).unwrap();

    // Voucher number: a long digit run printed before the transaction date
    pub static ref VOUCHER_NUMBER: Regex = Regex::new(
        r"(\d{10,})"
    ).unwrap();

    // Counterparty candidate: two or more chars that are not digits, slashes or spaces
    pub static ref COUNTERPARTY_NAME: Regex = Regex::new(
        r"[^\d/\s]{2,}"
    ).unwrap();

    pub static ref COUNTERPARTY_NOISE: Regex = Regex::new(
        r"转账|跨行支付|0001|现转标志|交易渠道|交易机构"
    ).unwrap();

    // Column tokens. ASCII word boundaries: a token glued to CJK text
    // (`交易时间10:00:00`) still counts.
    pub static ref TIME_TOKEN: Regex = Regex::new(
        r"(?-u:\b)\d{2}:\d{2}:\d{2}(?-u:\b)"
    ).unwrap();

    pub static ref ISO_DATE_TOKEN: Regex = Regex::new(
        r"(?-u:\b)\d{4}-\d{2}-\d{2}(?-u:\b)"
    ).unwrap();

    // Row date+time
    pub static ref ISO_DATETIME: Regex = Regex::new(
        r"(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2})"
    ).unwrap();

    pub static ref SLASH_DATETIME: Regex = Regex::new(
        r"(\d{4}/\d{2}/\d{2})\s+(\d{2}:\d{2}:\d{2})"
    ).unwrap();

    // Generic dates with optional time
    pub static ref GENERIC_DATE_YMD: Regex = Regex::new(
        r"(\d{4}[-/]\d{2}[-/]\d{2})\s*(\d{2}:\d{2}:\d{2})?"
    ).unwrap();

    pub static ref GENERIC_DATE_DMY: Regex = Regex::new(
        r"(\d{2}[-/]\d{2}[-/]\d{4})\s*(\d{2}:\d{2}:\d{2})?"
    ).unwrap();

    // ICBC account header
    pub static ref ICBC_CARD_NUMBER: Regex = Regex::new(
        r"卡号[：:\s]*(\d{16,19})"
    ).unwrap();

    pub static ref ICBC_ACCOUNT_NAME: Regex = Regex::new(
        r"户名[：:\s]*([^\s]+)"
    ).unwrap();

    pub static ref ICBC_PERIOD: Regex = Regex::new(
        r"起止日期[：:\s]*(\d{4}-\d{2}-\d{2})\s*[-—~至]\s*(\d{4}-\d{2}-\d{2})"
    ).unwrap();

    // Minsheng account header
    pub static ref MINSHENG_ACCOUNT_NAME: Regex = Regex::new(
        r"客户姓名[：:]\s*(\S+)"
    ).unwrap();

    pub static ref MINSHENG_ACCOUNT_NUMBER: Regex = Regex::new(
        r"客户账号[：:]\s*(\d+\*+\d*)"
    ).unwrap();

    pub static ref MINSHENG_PERIOD: Regex = Regex::new(
        r"起止日期[：:]\s*(\d{4}/\d{2}/\d{2})\s*[-~至]\s*(\d{4}/\d{2}/\d{2})"
    ).unwrap();

    // Header/footer lines that never carry a transaction
    pub static ref ICBC_SKIP: RegexSet = RegexSet::new([
        r"中国工商银行",
        r"借记账户历史明细",
        r"电子版",
        r"交易日期",
        r"收入/支出金额",
        r"对方户名",
        r"对方账号",
        r"渠道",
        r"起止日期",
        r"第.*页",
        r"共.*页",
        r"请扫描二维码",
    ]).unwrap();

    pub static ref MINSHENG_SKIP: RegexSet = RegexSet::new([
        r"中国民生银行",
        r"个人账户对账单",
        r"客户姓名",
        r"客户账号",
        r"开户机构",
        r"凭证类型",
        r"凭证号码",
        r"摘要",
        r"交易时间",
        r"交易金额",
        r"账户余额",
        r"对方户名",
        r"对方行名",
        r"温馨提示",
        r"打印渠道",
        r"打印时间",
        r"起止日期",
        r"产品名称",
        r"币种",
        r"证件号码",
        r"第.*页",
        r"Page",
    ]).unwrap();
}

/// Payment channels recognised after the last amount on a row.
pub const PAYMENT_CHANNELS: &[&str] = &[
    "支付宝",
    "财付通",
    "网银在线",
    "抖音支付",
    "微信",
    "京东支付",
    "银联",
    "云闪付",
    "美团支付",
    "快钱",
    "易宝支付",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_token() {
        let found: Vec<&str> = AMOUNT_TOKEN
            .find_iter("收入 +5,818.18 支出 -24.73 余额 0.23")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["+5,818.18", "-24.73", "0.23"]);
    }

    #[test]
    fn test_column_tokens_next_to_cjk() {
        let times: Vec<&str> = TIME_TOKEN
            .find_iter("交易时间10:00:00 11:00:00 12:00:00")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(times, vec!["10:00:00", "11:00:00", "12:00:00"]);

        let dates: Vec<&str> = ISO_DATE_TOKEN
            .find_iter("日期2024-01-01 2024-01-02记账")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);

        assert!(!TIME_TOKEN.is_match("110:00:001"));
    }

    #[test]
    fn test_skip_sets() {
        assert!(ICBC_SKIP.is_match("第 1 页 共 3 页"));
        assert!(ICBC_SKIP.is_match("交易日期 摘要"));
        assert!(!ICBC_SKIP.is_match("2024-05-14 14:37:43 消费 -24.73"));
        assert!(MINSHENG_SKIP.is_match("Page 2/5"));
        assert!(!MINSHENG_SKIP.is_match("2019/05/01 15:36:01 支付宝-快捷支付-还款 -1,316.78 25.66"));
    }

    #[test]
    fn test_account_patterns() {
        let caps = MINSHENG_ACCOUNT_NUMBER.captures("客户账号：6226****1234").unwrap();
        assert_eq!(&caps[1], "6226****1234");

        let caps = ICBC_PERIOD.captures("起止日期：2024-01-01 — 2024-03-31").unwrap();
        assert_eq!(&caps[1], "2024-01-01");
        assert_eq!(&caps[2], "2024-03-31");
    }
}
