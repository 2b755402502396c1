//! Progressive income tax scale.
//!
//! Every withholding estimate in the engine (bonus strategies and the child
//! support formula) goes through [`TaxScale::tax_on_annual_income`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One bracket of a progressive scale.
///
/// Income above `threshold` (up to the next bracket's threshold) is taxed at
/// `rate`, expressed as a fraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the bracket.
    pub threshold: Decimal,
    /// Marginal rate as a fraction (e.g. 0.325).
    pub rate: Decimal,
}

/// A progressive income tax scale, brackets sorted by threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxScale {
    brackets: Vec<TaxBracket>,
}

impl TaxScale {
    /// Builds a scale from brackets in any order.
    ///
    /// The lowest threshold must be zero, thresholds must be distinct and
    /// non-negative, and rates must lie in `[0, 1]`.
    pub fn new(mut brackets: Vec<TaxBracket>) -> EngineResult<Self> {
        brackets.sort_by(|a, b| a.threshold.cmp(&b.threshold));

        let invalid = |message: String| EngineError::CalculationError { message };

        match brackets.first() {
            None => return Err(invalid("tax scale has no brackets".to_string())),
            Some(first) if !first.threshold.is_zero() => {
                return Err(invalid(format!(
                    "lowest tax bracket must start at 0, found {}",
                    first.threshold
                )));
            }
            Some(_) => {}
        }
        if let Some(pair) = brackets.windows(2).find(|w| w[0].threshold == w[1].threshold) {
            return Err(invalid(format!(
                "duplicate tax bracket threshold {}",
                pair[0].threshold
            )));
        }
        if let Some(bracket) = brackets
            .iter()
            .find(|b| b.rate < Decimal::ZERO || b.rate > Decimal::ONE)
        {
            return Err(invalid(format!(
                "tax rate {} at threshold {} must be between 0 and 1",
                bracket.rate, bracket.threshold
            )));
        }

        Ok(Self { brackets })
    }

    /// Returns the brackets in ascending threshold order.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Returns the unrounded tax on an annual income.
    ///
    /// Negative incomes are treated as zero.
    ///
    /// # Example
    ///
    /// ```
    /// use compensation_engine::calculation::TaxScale;
    /// use rust_decimal::Decimal;
    ///
    /// let scale = TaxScale::default();
    /// // (45,000 - 18,200) * 19% = 5,092
    /// assert_eq!(scale.tax_on_annual_income(Decimal::new(45000, 0)), Decimal::new(5092, 0));
    /// ```
    pub fn tax_on_annual_income(&self, annual_income: Decimal) -> Decimal {
        let income = annual_income.max(Decimal::ZERO);
        let mut tax = Decimal::ZERO;

        for (i, bracket) in self.brackets.iter().enumerate() {
            if income <= bracket.threshold {
                break;
            }
            let upper = self
                .brackets
                .get(i + 1)
                .map_or(income, |next| income.min(next.threshold));
            tax += (upper - bracket.threshold) * bracket.rate;
        }

        tax
    }

    /// Returns the rate applied to the next dollar earned above `annual_income`.
    pub fn marginal_rate(&self, annual_income: Decimal) -> Decimal {
        self.brackets
            .iter()
            .rev()
            .find(|b| b.threshold <= annual_income)
            .map_or(Decimal::ZERO, |b| b.rate)
    }
}

impl Default for TaxScale {
    /// Resident individual rates for the 2024-25 income year, excluding Medicare.
    fn default() -> Self {
        let bracket = |threshold: i64, rate: Decimal| TaxBracket {
            threshold: Decimal::new(threshold, 0),
            rate,
        };
        Self {
            brackets: vec![
                bracket(0, Decimal::ZERO),
                bracket(18_200, Decimal::new(19, 2)),
                bracket(45_000, Decimal::new(325, 3)),
                bracket(120_000, Decimal::new(37, 2)),
                bracket(180_000, Decimal::new(45, 2)),
            ],
        }
    }
}
