//! Institution profiles, detection and the parser registry.
//!
//! The registry is built once and never mutated. Detection evaluates each
//! profile's patterns in registration order against first-page text; the
//! first hit wins. Text no profile claims goes to the generic parser.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decimal::Calculator;
use crate::layout::TableRegionMarkers;
use crate::models::transaction::ParseResult;
use crate::parsers::{GenericParser, IcbcParser, MinshengParser, ParseContext, StatementParser};

/// Stable institution key such as `icbc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstitutionId(Cow<'static, str>);

impl InstitutionId {
    pub const ICBC: InstitutionId = InstitutionId(Cow::Borrowed("icbc"));
    pub const MINSHENG: InstitutionId = InstitutionId(Cow::Borrowed("minsheng"));

    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the pipeline needs to know about one statement format.
pub struct InstitutionProfile {
    pub id: InstitutionId,
    /// Display name.
    pub name: &'static str,
    /// Any of these in the first page identifies the institution.
    pub detect_patterns: &'static [&'static str],
    /// Table region markers.
    pub markers: TableRegionMarkers,
    /// Row grouping tolerance for this institution's pages.
    pub row_tolerance: f64,
    pub parser: Box<dyn StatementParser>,
}

impl InstitutionProfile {
    /// Whether `text` looks like this institution's statement.
    pub fn detects(&self, text: &str) -> bool {
        self.detect_patterns.iter().any(|p| text.contains(p))
    }

    /// China Minsheng Bank personal account statement.
    pub fn minsheng() -> Self {
        Self {
            id: InstitutionId::MINSHENG,
            name: "中国民生银行",
            detect_patterns: &["中国民生银行", "民生银行", "CHINA MINSHENG BANK"],
            markers: TableRegionMarkers::new(&["凭证类型"], &["____", "支出交易总额"]),
            row_tolerance: 5.0,
            parser: Box::new(MinshengParser::new()),
        }
    }

    /// ICBC debit account history (electronic edition).
    ///
    /// Its cells sit on slightly different baselines, so rows use a much
    /// wider tolerance to keep each column's values together.
    pub fn icbc() -> Self {
        Self {
            id: InstitutionId::ICBC,
            name: "中国工商银行",
            detect_patterns: &["中国工商银行", "工商银行", "借记账户历史明细", "ICBC"],
            markers: TableRegionMarkers::new(&["交易日期"], &["本页支出算术合计"]),
            row_tolerance: 25.0,
            parser: Box::new(IcbcParser::new()),
        }
    }
}

impl fmt::Debug for InstitutionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstitutionProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("row_tolerance", &self.row_tolerance)
            .finish_non_exhaustive()
    }
}

/// Immutable table of institution profiles plus the generic fallback.
pub struct ParserRegistry {
    profiles: Vec<InstitutionProfile>,
    generic: GenericParser,
    calculator: Calculator,
    currency: String,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(vec![InstitutionProfile::minsheng(), InstitutionProfile::icbc()])
    }
}

impl ParserRegistry {
    /// Build a registry from profiles, in detection order.
    pub fn new(profiles: Vec<InstitutionProfile>) -> Self {
        Self {
            profiles,
            generic: GenericParser::new(),
            calculator: Calculator::default(),
            currency: "CNY".to_string(),
        }
    }

    /// Set the calculator used for every money figure.
    pub fn with_calculator(mut self, calculator: Calculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Set the currency reported on account info.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn calculator(&self) -> Calculator {
        self.calculator
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Registered profiles in detection order.
    pub fn profiles(&self) -> &[InstitutionProfile] {
        &self.profiles
    }

    /// Look a profile up by id.
    pub fn profile(&self, id: &InstitutionId) -> Option<&InstitutionProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    /// Look a profile up by key string, e.g. `"icbc"`.
    pub fn profile_by_key(&self, key: &str) -> Option<&InstitutionProfile> {
        self.profiles.iter().find(|p| p.id.as_str() == key)
    }

    /// Detect the institution a statement comes from.
    pub fn detect_institution(&self, text: &str) -> Option<InstitutionId> {
        let found = self.profiles.iter().find(|p| p.detects(text)).map(|p| p.id.clone());
        match &found {
            Some(id) => debug!("Detected institution: {}", id),
            None => debug!("No institution detected"),
        }
        found
    }

    /// Display names of supported institutions, in registration order.
    pub fn supported_institutions(&self) -> Vec<&'static str> {
        self.profiles.iter().map(|p| p.name).collect()
    }

    /// Parse statement text, dispatching to `known` when given, else to the
    /// detected institution, else to the generic parser.
    pub fn parse_statement(&self, text: &str, known: Option<&InstitutionId>) -> ParseResult {
        self.parse_with_context(text, known, self.context())
    }

    /// Like [`parse_statement`](Self::parse_statement) with document name and
    /// header text available to the parser.
    pub fn parse_with_context(
        &self,
        text: &str,
        known: Option<&InstitutionId>,
        ctx: ParseContext<'_>,
    ) -> ParseResult {
        let profile = match known {
            Some(id) => match self.profile(id) {
                Some(profile) => Some(profile),
                None => {
                    warn!("Institution '{}' is not registered, detecting instead", id);
                    self.detect(text)
                }
            },
            None => self.detect(text),
        };

        match profile {
            Some(profile) => {
                info!("Parsing {} statement", profile.name);
                let mut result = profile.parser.parse(text, &ctx);
                result.institution = Some(profile.id.clone());
                result
            }
            None => {
                info!("Unknown institution, using generic parser");
                self.generic.parse(text, &ctx)
            }
        }
    }

    /// Base parse context carrying this registry's calculator and currency.
    pub fn context(&self) -> ParseContext<'_> {
        ParseContext::default()
            .with_calculator(self.calculator)
            .with_currency(&self.currency)
    }

    fn detect(&self, text: &str) -> Option<&InstitutionProfile> {
        self.detect_institution(text).and_then(|id| self.profile(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_registry_is_shareable() {
        assert_send_sync::<ParserRegistry>();
    }

    #[test]
    fn test_detection_order() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.detect_institution("中国民生银行个人账户对账单"), Some(InstitutionId::MINSHENG));
        assert_eq!(registry.detect_institution("ICBC 借记账户历史明细"), Some(InstitutionId::ICBC));
        // Both names present: the first registered profile wins.
        assert_eq!(
            registry.detect_institution("工商银行 转入 民生银行"),
            Some(InstitutionId::MINSHENG)
        );
        assert_eq!(registry.detect_institution("招商银行"), None);
    }

    #[test]
    fn test_supported_institutions() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.supported_institutions(), vec!["中国民生银行", "中国工商银行"]);
        assert!(registry.profile_by_key("icbc").is_some());
        assert!(registry.profile_by_key("cmb").is_none());
    }

    #[test]
    fn test_known_institution_skips_detection() {
        let registry = ParserRegistry::default();
        let text = "2024-05-14 14:37:43 消费 -24.73 5,793.68";
        let result = registry.parse_statement(text, Some(&InstitutionId::ICBC));
        assert_eq!(result.institution, Some(InstitutionId::ICBC));
        assert_eq!(result.transactions.len(), 1);
    }

    #[test]
    fn test_unknown_key_falls_back_to_detection() {
        let registry = ParserRegistry::default();
        let result = registry.parse_statement(
            "中国民生银行\n2019/05/01 15:36:01 消费 -1.00 2.00",
            Some(&InstitutionId::new("cmb")),
        );
        assert_eq!(result.institution, Some(InstitutionId::MINSHENG));
    }

    #[test]
    fn test_undetected_uses_generic() {
        let registry = ParserRegistry::default();
        let result = registry.parse_statement("2024-03-01 午餐 -32.00", None);
        assert_eq!(result.institution, None);
        assert_eq!(result.institution_name, "未知银行");
        assert_eq!(result.strategy.as_deref(), Some("generic_lines"));
    }

    #[test]
    fn test_id_serializes_as_key() {
        assert_eq!(serde_json::to_string(&InstitutionId::ICBC).unwrap(), "\"icbc\"");
        let id: InstitutionId = serde_json::from_str("\"minsheng\"").unwrap();
        assert_eq!(id, InstitutionId::MINSHENG);
    }
}
