//! Exact fixed-point money arithmetic.
//!
//! Every summary figure, balance delta and percentage in the crate goes
//! through a [`Calculator`], so rounding happens in one place under one
//! [`DecimalPolicy`]. Absent operands count as zero and division by zero
//! yields zero.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounding mode applied to every calculator result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest neighbour, ties away from zero.
    #[default]
    HalfUp,
    /// Nearest neighbour, ties to even (banker's rounding).
    HalfEven,
    /// Truncate towards zero.
    Down,
    /// Away from zero.
    Up,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
            Rounding::Down => RoundingStrategy::ToZero,
            Rounding::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// Precision and rounding used by a [`Calculator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimalPolicy {
    /// Number of fractional digits kept on every result.
    pub scale: u32,
    /// Rounding mode.
    pub rounding: Rounding,
}

impl Default for DecimalPolicy {
    fn default() -> Self {
        Self {
            scale: 2,
            rounding: Rounding::HalfUp,
        }
    }
}

/// Decimal calculator bound to a [`DecimalPolicy`].
///
/// Operands are `impl Into<Option<Decimal>>`, so both `calc.add(a, b)` and
/// `calc.add(a, None)` work; `None` is treated as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calculator {
    policy: DecimalPolicy,
}

impl Calculator {
    /// Create a calculator with an explicit policy.
    pub fn new(policy: DecimalPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect.
    pub fn policy(&self) -> DecimalPolicy {
        self.policy
    }

    /// Round to the policy scale.
    pub fn round(&self, value: impl Into<Option<Decimal>>) -> Decimal {
        self.round_dp(value, self.policy.scale)
    }

    /// Round to `dp` fractional digits with the policy's rounding mode.
    ///
    /// The result always carries exactly `dp` fractional digits, so `0.3`
    /// rounded to 2 places renders as `0.30`.
    pub fn round_dp(&self, value: impl Into<Option<Decimal>>, dp: u32) -> Decimal {
        let value = operand(value);
        let mut rounded = value.round_dp_with_strategy(dp, self.policy.rounding.strategy());
        rounded.rescale(dp);
        rounded
    }

    pub fn add(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> Decimal {
        self.round(operand(a).saturating_add(operand(b)))
    }

    pub fn subtract(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> Decimal {
        self.round(operand(a).saturating_sub(operand(b)))
    }

    pub fn multiply(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> Decimal {
        self.round(operand(a).saturating_mul(operand(b)))
    }

    /// Divide `a` by `b`; a zero divisor yields zero.
    pub fn divide(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> Decimal {
        let b = operand(b);
        if b.is_zero() {
            return self.round(Decimal::ZERO);
        }
        self.round(operand(a).checked_div(b).unwrap_or_default())
    }

    /// Sum a sequence of (possibly absent) values.
    pub fn sum<I, T>(&self, values: I) -> Decimal
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Decimal>>,
    {
        values
            .into_iter()
            .fold(self.round(Decimal::ZERO), |acc, value| self.add(acc, value))
    }

    /// `part / total * 100`, rounded to the policy scale.
    pub fn percentage(
        &self,
        part: impl Into<Option<Decimal>>,
        total: impl Into<Option<Decimal>>,
    ) -> Decimal {
        self.percentage_dp(part, total, self.policy.scale)
    }

    /// `part / total * 100`, rounded to `dp` places. Zero total yields zero.
    pub fn percentage_dp(
        &self,
        part: impl Into<Option<Decimal>>,
        total: impl Into<Option<Decimal>>,
        dp: u32,
    ) -> Decimal {
        let total = operand(total);
        if total.is_zero() {
            return self.round_dp(Decimal::ZERO, dp);
        }
        let ratio = operand(part).checked_div(total).unwrap_or_default();
        self.round_dp(ratio.saturating_mul(Decimal::ONE_HUNDRED), dp)
    }

    pub fn abs(&self, value: impl Into<Option<Decimal>>) -> Decimal {
        self.round(operand(value).abs())
    }

    pub fn compare(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> Ordering {
        operand(a).cmp(&operand(b))
    }

    pub fn gt(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    pub fn gte(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> bool {
        self.compare(a, b) != Ordering::Less
    }

    pub fn lt(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    pub fn lte(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> bool {
        self.compare(a, b) != Ordering::Greater
    }

    pub fn eq(&self, a: impl Into<Option<Decimal>>, b: impl Into<Option<Decimal>>) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

fn operand(value: impl Into<Option<Decimal>>) -> Decimal {
    value.into().unwrap_or(Decimal::ZERO)
}

/// Parse a statement amount token such as `-1,316.78`, `+0.23` or `5 818.18`.
///
/// Group separators (ASCII and full-width commas, spaces) are stripped and a
/// leading `+` is dropped. Returns `None` for anything that is still not a
/// number afterwards.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | ' ' | '\u{00a0}' | '¥' | '￥'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    Decimal::from_str(cleaned).ok()
}
