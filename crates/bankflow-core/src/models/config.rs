//! Configuration structures for the statement pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decimal::DecimalPolicy;
use crate::error::{BankflowError, Result};

/// Main configuration for the bankflow pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankflowConfig {
    /// Layout reconstruction settings.
    pub layout: LayoutConfig,

    /// Precision and rounding for every money figure.
    pub decimal: DecimalPolicy,

    /// Transaction extraction settings.
    pub extraction: ExtractionConfig,
}

/// Layout reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Row tolerance used before the institution is known.
    pub default_row_tolerance: f64,

    /// Crop each page to the institution's transaction table.
    pub apply_region_filter: bool,

    /// Line appended after every page of assembled text.
    pub page_separator: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_row_tolerance: 5.0,
            apply_region_filter: true,
            page_separator: "--- PAGE BREAK ---".to_string(),
        }
    }
}

/// Transaction extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Currency reported when the statement does not name one.
    pub default_currency: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_currency: "CNY".to_string(),
        }
    }
}

impl BankflowConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.layout.default_row_tolerance) {
            return Err(BankflowError::Config(format!(
                "layout.default_row_tolerance must be positive, got {}",
                self.layout.default_row_tolerance
            )));
        }
        // rust_decimal carries at most 28 fractional digits.
        if self.decimal.scale > 28 {
            return Err(BankflowError::Config(format!(
                "decimal.scale must be at most 28, got {}",
                self.decimal.scale
            )));
        }
        if self.extraction.default_currency.trim().is_empty() {
            return Err(BankflowError::Config(
                "extraction.default_currency must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
