//! End-to-end scenarios: fragments or text in, ledger out.

use bankflow_core::{
    Calculator, Category, InstitutionId, ParserRegistry, PositionedFragment, StatementDocument,
    StatementPipeline, TableRegionMarkers, TransactionStore, TransactionType,
};
use bankflow_core::layout::filter_table_region;
use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const MINSHENG_LINE: &str = "2019/05/01 15:36:01 支付宝-快捷支付-还款 -1,316.78 25.66";

#[test]
fn minsheng_repayment_line() {
    let registry = ParserRegistry::default();
    let result = registry.parse_statement(MINSHENG_LINE, Some(&InstitutionId::MINSHENG));

    assert_eq!(result.transactions.len(), 1);
    let t = &result.transactions[0];
    assert_eq!(t.date, NaiveDate::from_ymd_opt(2019, 5, 1).unwrap());
    assert_eq!(t.time, NaiveTime::from_hms_opt(15, 36, 1).unwrap());
    assert_eq!(t.amount, dec("1316.78"));
    assert_eq!(t.balance, Some(dec("25.66")));
    assert_eq!(t.transaction_type, TransactionType::Expense);
    assert_eq!(t.category, Category::Repayment);
}

#[test]
fn icbc_balances_become_deltas() {
    let text = "\
中国工商银行借记账户历史明细
交易日期 10:00:00 11:00:00 12:00:00
2024-01-01 2024-01-02 2024-01-03
摘要 工资 利息 消费
对方户名 某某科技有限公司 （空） 京东商城
余额 100.00 150.00 130.00
";
    let result = ParserRegistry::default().parse_statement(text, None);

    assert_eq!(result.institution, Some(InstitutionId::ICBC));
    assert_eq!(result.strategy.as_deref(), Some("columns"));
    let amounts: Vec<(Decimal, TransactionType)> = result
        .transactions
        .iter()
        .map(|t| (t.amount, t.transaction_type))
        .collect();
    assert_eq!(
        amounts,
        vec![
            (dec("100.00"), TransactionType::Income),
            (dec("50.00"), TransactionType::Income),
            (dec("20.00"), TransactionType::Expense),
        ]
    );
    assert_eq!(result.transactions[1].counterparty, "");
    assert_eq!(result.transactions[2].counterparty, "京东商城");
}

#[test]
fn icbc_without_columns_falls_back_to_rows() {
    let text = "\
中国工商银行借记账户历史明细
2024-05-14 14:37:43 消费 -24.73 5,793.68
";
    let result = ParserRegistry::default().parse_statement(text, None);
    assert_eq!(result.strategy.as_deref(), Some("rows"));
    assert_eq!(result.transactions[0].amount, dec("24.73"));
}

#[test]
fn amounts_are_never_negative() {
    let text = "\
中国民生银行
2019/05/01 15:36:01 还款 -1,316.78 25.66
2019/05/02 10:00:00 工资 8,000.00 8,025.66
2019/05/03 10:00:00 退款 0.00 8,025.66
";
    let result = ParserRegistry::default().parse_statement(text, None);
    assert_eq!(result.transactions.len(), 3);
    assert!(result.transactions.iter().all(|t| t.amount >= Decimal::ZERO));
}

#[test]
fn appending_twice_is_idempotent() {
    let pipeline = StatementPipeline::default();
    let result = pipeline
        .process_text(Some("may.txt"), MINSHENG_LINE, Some(&InstitutionId::MINSHENG))
        .unwrap();

    let mut store = TransactionStore::default();
    store.append_transactions(result.transactions.clone());
    let after_once = store.transactions().to_vec();
    assert_eq!(store.append_transactions(result.transactions), 0);
    assert_eq!(store.transactions(), after_once.as_slice());
}

#[test]
fn region_without_start_marker_is_identity() {
    let fragments = vec![
        PositionedFragment::new("a", 0.0, 10.0),
        PositionedFragment::new("b", 0.0, 5.0),
    ];
    let markers = TableRegionMarkers::new(&["交易日期"], &["合计"]);
    assert_eq!(filter_table_region(&fragments, &markers), fragments);
}

#[test]
fn exact_decimal_sums() {
    let calc = Calculator::default();
    assert_eq!(calc.add(dec("0.1"), dec("0.2")).to_string(), "0.30");
    assert_eq!(
        calc.sum([dec("10.10"), dec("20.20"), dec("30.30")]).to_string(),
        "60.60"
    );
}

#[test]
fn batch_of_documents_merges_into_one_ledger() {
    let pipeline = StatementPipeline::default();
    let page = |line: &str| {
        vec![
            PositionedFragment::new("中国民生银行个人账户对账单", 0.0, 800.0),
            PositionedFragment::new("凭证类型", 0.0, 760.0),
            PositionedFragment::new(line, 0.0, 740.0),
        ]
    };
    let may = StatementDocument {
        name: "may.pdf".to_string(),
        pages: vec![page("2019/05/01 15:36:01 消费 -1.00 2.00")],
    };
    let june = StatementDocument {
        name: "june.pdf".to_string(),
        pages: vec![page("2019/06/01 08:00:00 工资 +100.00 102.00")],
    };

    let mut store = TransactionStore::default();
    store.load_parse_result(pipeline.process(&may).unwrap());
    store.append_transactions(pipeline.process(&june).unwrap().transactions);

    assert_eq!(store.len(), 2);
    assert_eq!(store.transactions()[0].source_file.as_deref(), Some("june.pdf"));
    assert_eq!(store.summary().balance, dec("99.00"));

    store.remove_transactions_by_file("june.pdf");
    assert_eq!(store.len(), 1);
}
