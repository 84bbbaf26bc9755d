//! Deterministic keyword categorization of statement transactions.
//!
//! Rules are evaluated in order against the description and counterparty;
//! the first rule with a matching keyword wins. No state, no learning.

use serde::{Deserialize, Serialize};

/// Transaction category identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Salary,
    Repayment,
    Transfer,
    RedPacket,
    Dining,
    Groceries,
    Shopping,
    Transport,
    Housing,
    Utilities,
    Telecom,
    Medical,
    Education,
    Entertainment,
    Investment,
    Interest,
    Fees,
    Cash,
    Other,
}

impl Category {
    /// Every category in rule order, `Other` last.
    pub const ALL: [Category; 19] = [
        Category::Salary,
        Category::Repayment,
        Category::Transfer,
        Category::RedPacket,
        Category::Dining,
        Category::Groceries,
        Category::Shopping,
        Category::Transport,
        Category::Housing,
        Category::Utilities,
        Category::Telecom,
        Category::Medical,
        Category::Education,
        Category::Entertainment,
        Category::Investment,
        Category::Interest,
        Category::Fees,
        Category::Cash,
        Category::Other,
    ];

    /// Stable identifier, matching the serde representation.
    pub fn id(&self) -> &'static str {
        match self {
            Category::Salary => "salary",
            Category::Repayment => "repayment",
            Category::Transfer => "transfer",
            Category::RedPacket => "red_packet",
            Category::Dining => "dining",
            Category::Groceries => "groceries",
            Category::Shopping => "shopping",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Telecom => "telecom",
            Category::Medical => "medical",
            Category::Education => "education",
            Category::Entertainment => "entertainment",
            Category::Investment => "investment",
            Category::Interest => "interest",
            Category::Fees => "fees",
            Category::Cash => "cash",
            Category::Other => "other",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Salary => "工资收入",
            Category::Repayment => "信用还款",
            Category::Transfer => "转账",
            Category::RedPacket => "红包",
            Category::Dining => "餐饮美食",
            Category::Groceries => "日用超市",
            Category::Shopping => "购物消费",
            Category::Transport => "交通出行",
            Category::Housing => "住房物业",
            Category::Utilities => "水电燃气",
            Category::Telecom => "通讯网络",
            Category::Medical => "医疗健康",
            Category::Education => "教育培训",
            Category::Entertainment => "休闲娱乐",
            Category::Investment => "投资理财",
            Category::Interest => "利息收入",
            Category::Fees => "手续费",
            Category::Cash => "现金存取",
            Category::Other => "其他",
        }
    }

    /// Look a category up by its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.id() == id)
    }

    /// Denormalized descriptor stored on each transaction.
    pub fn info(&self) -> CategoryInfo {
        CategoryInfo {
            id: *self,
            label: self.label().to_string(),
        }
    }
}

/// Category descriptor: identifier plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub label: String,
}

struct CategoryRule {
    category: Category,
    keywords: &'static [&'static str],
}

// Order matters: repayments mention payment channels that would otherwise
// hit transfer or shopping, and salary lines often carry 代发 + 转账.
const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Salary,
        keywords: &["工资", "薪资", "薪金", "代发", "奖金", "绩效", "salary", "payroll"],
    },
    CategoryRule {
        category: Category::Repayment,
        keywords: &["还款", "信用卡", "花呗", "借呗", "白条", "贷款", "房贷", "个贷"],
    },
    CategoryRule {
        category: Category::RedPacket,
        keywords: &["红包"],
    },
    CategoryRule {
        category: Category::Interest,
        keywords: &["利息", "结息", "interest"],
    },
    CategoryRule {
        category: Category::Investment,
        keywords: &["理财", "基金", "证券", "股票", "余额宝", "朝朝宝", "申购", "赎回", "定期"],
    },
    CategoryRule {
        category: Category::Fees,
        keywords: &["手续费", "年费", "管理费", "工本费", "短信费"],
    },
    CategoryRule {
        category: Category::Cash,
        keywords: &["ATM", "取款", "存款", "现金"],
    },
    CategoryRule {
        category: Category::Dining,
        keywords: &[
            "餐", "饭", "食堂", "外卖", "美团", "饿了么", "肯德基", "麦当劳", "星巴克", "瑞幸",
            "咖啡", "奶茶", "茶饮", "面馆", "火锅", "烧烤", "kfc", "starbucks",
        ],
    },
    CategoryRule {
        category: Category::Groceries,
        keywords: &["超市", "便利店", "盒马", "永辉", "沃尔玛", "家乐福", "菜市场", "生鲜", "果蔬"],
    },
    CategoryRule {
        category: Category::Transport,
        keywords: &[
            "滴滴", "出行", "地铁", "公交", "铁路", "12306", "航空", "机票", "加油", "石化", "石油",
            "停车", "高速", "ETC", "打车", "单车",
        ],
    },
    CategoryRule {
        category: Category::Housing,
        keywords: &["房租", "租金", "物业", "公积金", "住房"],
    },
    CategoryRule {
        category: Category::Utilities,
        keywords: &["水费", "电费", "燃气", "供电", "自来水", "暖气", "电力"],
    },
    CategoryRule {
        category: Category::Telecom,
        keywords: &["话费", "移动", "联通", "电信", "宽带", "流量"],
    },
    CategoryRule {
        category: Category::Medical,
        keywords: &["医院", "药房", "药店", "大药房", "诊所", "医疗", "卫生", "体检"],
    },
    CategoryRule {
        category: Category::Education,
        keywords: &["学费", "培训", "教育", "课程", "学校", "书店"],
    },
    CategoryRule {
        category: Category::Entertainment,
        keywords: &["电影", "影城", "游戏", "视频", "音乐", "会员", "KTV", "旅游", "酒店", "门票"],
    },
    CategoryRule {
        category: Category::Shopping,
        keywords: &[
            "京东", "淘宝", "天猫", "拼多多", "唯品会", "商城", "旗舰店", "店铺", "专卖", "百货",
            "购物", "消费",
        ],
    },
    CategoryRule {
        category: Category::Transfer,
        keywords: &["转账", "汇款", "转入", "转出", "跨行", "汇入", "汇出"],
    },
];

/// Categorize a transaction from its description and counterparty.
pub fn categorize(description: &str, counterparty: &str) -> CategoryInfo {
    let haystack = format!("{} {}", description, counterparty).to_lowercase();

    RULES
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| haystack.contains(&keyword.to_lowercase()))
        })
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
        .info()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repayment_beats_channel() {
        assert_eq!(categorize("支付宝-快捷支付-还款", "支付宝").id, Category::Repayment);
    }

    #[test]
    fn test_counterparty_is_considered() {
        let info = categorize("网银在线-快捷支付", "京东大药房");
        assert_eq!(info.id, Category::Medical);
        assert_eq!(info.label, "医疗健康");
    }

    #[test]
    fn test_transfer() {
        assert_eq!(categorize("财付通-快捷支付-微信转账", "").id, Category::Transfer);
    }

    #[test]
    fn test_icbc_summaries() {
        assert_eq!(categorize("工资", "").id, Category::Salary);
        assert_eq!(categorize("利息", "").id, Category::Interest);
        assert_eq!(categorize("消费", "").id, Category::Shopping);
    }

    #[test]
    fn test_case_insensitive_ascii() {
        assert_eq!(categorize("KFC BEIJING", "").id, Category::Dining);
        assert_eq!(categorize("atm withdrawal", "").id, Category::Cash);
    }

    #[test]
    fn test_no_match_is_other() {
        let info = categorize("开户", "");
        assert_eq!(info.id, Category::Other);
        assert_eq!(info.label, "其他");
    }

    #[test]
    fn test_ids_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
        assert_eq!(Category::from_id("nope"), None);
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Category::RedPacket).unwrap();
        assert_eq!(json, "\"red_packet\"");
    }
}
