//! Document pipeline: pages of fragments in, one ParseResult out.
//!
//! The first page is assembled with the default row tolerance and used for
//! detection. Every page is then cropped to the detected institution's table
//! region and regrouped with that institution's tolerance.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decimal::Calculator;
use crate::error::{DocumentError, Result};
use crate::institutions::{InstitutionId, InstitutionProfile, ParserRegistry};
use crate::layout::{assemble_rows, filter_table_region, group_into_rows, reading_order, PositionedFragment};
use crate::models::config::{BankflowConfig, LayoutConfig};
use crate::models::transaction::ParseResult;

/// A statement as handed over by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementDocument {
    /// Document name, usually the file name.
    pub name: String,
    /// Fragments per page, in page order. No order is assumed within a page.
    pub pages: Vec<Vec<PositionedFragment>>,
}

/// Assembled text of a document, ready for parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedDocument {
    /// All pages, region-filtered, each followed by the page separator.
    pub text: String,
    /// Unfiltered first page.
    pub header_text: String,
    pub institution: Option<InstitutionId>,
    pub page_count: usize,
}

/// Layout reconstruction plus parsing.
pub struct StatementPipeline {
    registry: ParserRegistry,
    layout: LayoutConfig,
}

impl Default for StatementPipeline {
    fn default() -> Self {
        Self::new(ParserRegistry::default(), LayoutConfig::default())
    }
}

impl StatementPipeline {
    pub fn new(registry: ParserRegistry, layout: LayoutConfig) -> Self {
        Self { registry, layout }
    }

    /// Build the builtin registry configured from `config`.
    pub fn from_config(config: &BankflowConfig) -> Self {
        let registry = ParserRegistry::default()
            .with_calculator(Calculator::new(config.decimal))
            .with_currency(config.extraction.default_currency.clone());
        Self::new(registry, config.layout.clone())
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Assemble page text, detecting the institution from page one.
    pub fn reconstruct(&self, pages: &[Vec<PositionedFragment>]) -> Result<ReconstructedDocument> {
        self.reconstruct_as(pages, None)
    }

    /// Assemble page text for a known institution; detection runs only when
    /// `known` is absent or unregistered.
    pub fn reconstruct_as(
        &self,
        pages: &[Vec<PositionedFragment>],
        known: Option<&InstitutionId>,
    ) -> Result<ReconstructedDocument> {
        let Some(first_page) = pages.first() else {
            return Err(DocumentError::NoPages.into());
        };
        if pages.iter().flatten().all(|f| f.text.trim().is_empty()) {
            return Err(DocumentError::NoText.into());
        }

        let header_rows = group_into_rows(first_page, self.layout.default_row_tolerance);
        let header_text = assemble_rows(&header_rows);

        let profile: Option<&InstitutionProfile> = known
            .and_then(|id| self.registry.profile(id))
            .or_else(|| {
                self.registry
                    .detect_institution(&header_text)
                    .and_then(|id| self.registry.profile(&id))
            });

        let tolerance = profile.map_or(self.layout.default_row_tolerance, |p| p.row_tolerance);
        let markers = profile
            .filter(|_| self.layout.apply_region_filter)
            .map(|p| &p.markers);

        let mut text = String::new();
        for (index, page) in pages.iter().enumerate() {
            let rows = match markers {
                Some(markers) => {
                    let ordered = reading_order(page, tolerance);
                    let region = filter_table_region(&ordered, markers);
                    group_into_rows(&region, tolerance)
                }
                None => group_into_rows(page, tolerance),
            };
            debug!("Page {}: {} rows", index + 1, rows.len());

            text.push_str(&assemble_rows(&rows));
            text.push('\n');
            text.push_str(&self.layout.page_separator);
            text.push('\n');
        }

        Ok(ReconstructedDocument {
            text,
            header_text,
            institution: profile.map(|p| p.id.clone()),
            page_count: pages.len(),
        })
    }

    /// Reconstruct and parse a document.
    pub fn process(&self, document: &StatementDocument) -> Result<ParseResult> {
        self.process_as(document, None)
    }

    /// Reconstruct and parse a document as a known institution.
    pub fn process_as(
        &self,
        document: &StatementDocument,
        known: Option<&InstitutionId>,
    ) -> Result<ParseResult> {
        let reconstructed = self.reconstruct_as(&document.pages, known)?;

        let ctx = self
            .registry
            .context()
            .with_source_file(&document.name)
            .with_header_text(&reconstructed.header_text)
            .with_page_separator(&self.layout.page_separator);
        let result = self.registry.parse_with_context(
            &reconstructed.text,
            reconstructed.institution.as_ref(),
            ctx,
        );

        info!(
            "{}: {} pages, {} transactions ({})",
            document.name,
            reconstructed.page_count,
            result.transactions.len(),
            result.institution_name
        );
        Ok(result.with_source_file(&document.name))
    }

    /// Parse already assembled statement text.
    pub fn process_text(
        &self,
        name: Option<&str>,
        text: &str,
        known: Option<&InstitutionId>,
    ) -> Result<ParseResult> {
        if text.trim().is_empty() {
            return Err(DocumentError::NoText.into());
        }

        let mut ctx = self
            .registry
            .context()
            .with_page_separator(&self.layout.page_separator);
        if let Some(name) = name {
            ctx = ctx.with_source_file(name);
        }
        Ok(self.registry.parse_with_context(text, known, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BankflowError;

    fn frag(text: &str, x: f64, y: f64) -> PositionedFragment {
        PositionedFragment::new(text, x, y)
    }

    #[test]
    fn test_no_pages() {
        let err = StatementPipeline::default().reconstruct(&[]).unwrap_err();
        assert!(matches!(err, BankflowError::Document(DocumentError::NoPages)));
    }

    #[test]
    fn test_blank_pages() {
        let pages = vec![vec![frag("  ", 0.0, 0.0)], vec![]];
        let err = StatementPipeline::default().reconstruct(&pages).unwrap_err();
        assert!(matches!(err, BankflowError::Document(DocumentError::NoText)));
    }

    #[test]
    fn test_page_separator_after_each_page() {
        let pages = vec![
            vec![frag("2024-01-01 a -1.00", 0.0, 700.0)],
            vec![frag("2024-01-02 b -2.00", 0.0, 700.0)],
        ];
        let doc = StatementPipeline::default().reconstruct(&pages).unwrap();
        assert_eq!(
            doc.text,
            "2024-01-01 a -1.00\n\n--- PAGE BREAK ---\n2024-01-02 b -2.00\n\n--- PAGE BREAK ---\n"
        );
        assert_eq!(doc.institution, None);
        assert_eq!(doc.page_count, 2);
    }

    #[test]
    fn test_region_filter_applies_to_detected_institution() {
        let page = vec![
            frag("中国民生银行个人账户对账单", 0.0, 800.0),
            frag("客户姓名：李四", 0.0, 780.0),
            frag("凭证类型", 0.0, 760.0),
            frag("2019/05/01 15:36:01", 0.0, 740.0),
            frag("消费", 150.0, 740.0),
            frag("-1.00", 250.0, 740.0),
            frag("2.00", 300.0, 740.0),
            frag("______________", 0.0, 720.0),
            frag("温馨提示", 0.0, 700.0),
        ];
        let doc = StatementPipeline::default().reconstruct(&[page]).unwrap();

        assert_eq!(doc.institution, Some(InstitutionId::MINSHENG));
        assert!(doc.text.starts_with("凭证类型\n2019/05/01 15:36:01 消费 -1.00 2.00\n"));
        assert!(!doc.text.contains("温馨提示"));
        assert!(doc.header_text.contains("客户姓名：李四"));
    }

    #[test]
    fn test_process_uses_header_for_account() {
        let page = vec![
            frag("中国民生银行个人账户对账单", 0.0, 800.0),
            frag("客户姓名：李四", 0.0, 780.0),
            frag("凭证类型", 0.0, 760.0),
            frag("2019/05/01 15:36:01 消费 -1.00 2.00", 0.0, 740.0),
        ];
        let document = StatementDocument {
            name: "may.pdf".to_string(),
            pages: vec![page],
        };
        let result = StatementPipeline::default().process(&document).unwrap();

        assert_eq!(result.account_info.account_name, "李四");
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].source_file.as_deref(), Some("may.pdf"));
    }

    #[test]
    fn test_detected_institution_tolerance_regroups_rows() {
        // ICBC cells of one row sit up to 20 points apart vertically.
        let page = vec![
            frag("中国工商银行借记账户历史明细", 0.0, 800.0),
            frag("交易日期", 0.0, 760.0),
            frag("2024-05-14 14:37:43", 0.0, 700.0),
            frag("消费", 150.0, 690.0),
            frag("-24.73", 250.0, 710.0),
            frag("5,793.68", 300.0, 695.0),
        ];
        assert_eq!(group_into_rows(&page, 5.0).len(), 6);

        let pipeline = StatementPipeline::default();
        let doc = pipeline.reconstruct(std::slice::from_ref(&page)).unwrap();
        assert_eq!(doc.institution, Some(InstitutionId::ICBC));
        assert!(doc.text.starts_with("交易日期\n2024-05-14 14:37:43 消费 -24.73 5,793.68\n"));
        assert!(!doc.text.contains("借记账户历史明细"));

        let document = StatementDocument {
            name: "icbc.pdf".to_string(),
            pages: vec![page],
        };
        let result = pipeline.process(&document).unwrap();
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].amount, rust_decimal::Decimal::new(2473, 2));
        assert_eq!(result.strategy.as_deref(), Some("rows"));
    }

    #[test]
    fn test_process_text_rejects_blank() {
        let err = StatementPipeline::default().process_text(None, " \n ", None).unwrap_err();
        assert!(matches!(err, BankflowError::Document(DocumentError::NoText)));
    }
}
