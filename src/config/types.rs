//! Configuration types for statutory rates.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Each settings struct has a
//! `Default` carrying the 2024-25 statutory values so the calculation
//! functions can be exercised without a configuration directory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{LedgerFailurePolicy, TaxBracket, TaxScale};
use crate::models::PerformanceThreshold;

/// Metadata about the rate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleMetadata {
    /// Income year the rates apply to (e.g., "2024-25").
    pub financial_year: String,
    /// Jurisdiction (e.g., "AU").
    pub jurisdiction: String,
    /// URL to the published rates.
    pub source_url: String,
}

impl Default for ScaleMetadata {
    fn default() -> Self {
        Self {
            financial_year: "2024-25".to_string(),
            jurisdiction: "AU".to_string(),
            source_url: "https://www.ato.gov.au/tax-rates-and-codes".to_string(),
        }
    }
}

/// Structure of `tax_scale.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxScaleConfig {
    /// Rate set metadata.
    pub metadata: ScaleMetadata,
    /// Progressive brackets.
    pub brackets: Vec<TaxBracket>,
}

/// Child support percentages of disposable income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSupportRates {
    /// Rate for one child.
    pub one_child: Decimal,
    /// Rate for two children.
    pub two_children: Decimal,
    /// Rate for three or more children.
    pub three_or_more: Decimal,
}

impl ChildSupportRates {
    /// Returns the rate for a number of children; zero children pays nothing.
    pub fn rate_for(&self, children_count: u32) -> Decimal {
        match children_count {
            0 => Decimal::ZERO,
            1 => self.one_child,
            2 => self.two_children,
            _ => self.three_or_more,
        }
    }
}

/// Union fee defaults applied when a deduction leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionFeeDefaults {
    /// Rate as a fraction of gross pay.
    pub default_rate: Decimal,
    /// Minimum fee per period.
    pub minimum_fee: Decimal,
}

/// Structure of `deductions.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSettings {
    /// Child support assessment rates.
    pub child_support: ChildSupportRates,
    /// Union fee defaults.
    pub union_fees: UnionFeeDefaults,
    /// Annual meal entertainment packaging limit.
    pub meal_entertainment_annual_limit: Decimal,
    /// Policy used when a request does not choose one.
    #[serde(default)]
    pub ledger_failure_policy: LedgerFailurePolicy,
}

impl Default for DeductionSettings {
    fn default() -> Self {
        Self {
            child_support: ChildSupportRates {
                one_child: Decimal::new(18, 2),
                two_children: Decimal::new(27, 2),
                three_or_more: Decimal::new(32, 2),
            },
            union_fees: UnionFeeDefaults {
                default_rate: Decimal::new(1, 2),
                minimum_fee: Decimal::new(10, 0),
            },
            meal_entertainment_annual_limit: Decimal::new(2650, 0),
            ledger_failure_policy: LedgerFailurePolicy::default(),
        }
    }
}

/// Employment termination payment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtpSettings {
    /// Portion of the payment that is tax free.
    pub tax_free_cap: Decimal,
    /// Taxable amounts up to this figure get the lower rate.
    pub lower_rate_cap: Decimal,
    /// Concessional rate.
    pub lower_rate: Decimal,
    /// Rate above the cap.
    pub upper_rate: Decimal,
    /// Age from which the lower rate applies regardless of amount.
    pub preservation_age: u32,
    /// Years of service required alongside `preservation_age`.
    pub minimum_service_years: u32,
}

/// Structure of `bonuses.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusSettings {
    /// Superannuation guarantee rate used when neither the request nor the employee sets one.
    pub default_superannuation_rate: Decimal,
    /// Medicare levy as a fraction of the bonus.
    pub medicare_levy_rate: Decimal,
    /// Flat rate for the fixed-rate method.
    pub fixed_rate: Decimal,
    /// ETP parameters.
    pub etp: EtpSettings,
    /// Default performance multiplier table.
    pub performance_thresholds: Vec<PerformanceThreshold>,
}

impl Default for BonusSettings {
    fn default() -> Self {
        let threshold = |score: i64, multiplier: Decimal| PerformanceThreshold {
            threshold: Decimal::new(score, 0),
            multiplier,
        };
        Self {
            default_superannuation_rate: Decimal::new(115, 3),
            medicare_levy_rate: Decimal::new(2, 2),
            fixed_rate: Decimal::new(47, 2),
            etp: EtpSettings {
                tax_free_cap: Decimal::new(12_524, 0),
                lower_rate_cap: Decimal::new(245_000, 0),
                lower_rate: Decimal::new(17, 2),
                upper_rate: Decimal::new(32, 2),
                preservation_age: 55,
                minimum_service_years: 12,
            },
            performance_thresholds: vec![
                threshold(90, Decimal::new(12, 1)),
                threshold(80, Decimal::new(11, 1)),
                threshold(70, Decimal::ONE),
                threshold(60, Decimal::new(8, 1)),
                threshold(0, Decimal::new(5, 1)),
            ],
        }
    }
}

/// The complete engine configuration loaded from YAML files.
///
/// This struct aggregates all configuration loaded from the files in a
/// rate configuration directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    metadata: ScaleMetadata,
    tax_scale: TaxScale,
    deductions: DeductionSettings,
    bonuses: BonusSettings,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        metadata: ScaleMetadata,
        tax_scale: TaxScale,
        deductions: DeductionSettings,
        bonuses: BonusSettings,
    ) -> Self {
        Self {
            metadata,
            tax_scale,
            deductions,
            bonuses,
        }
    }

    /// Returns the rate set metadata.
    pub fn metadata(&self) -> &ScaleMetadata {
        &self.metadata
    }

    /// Returns the income tax scale.
    pub fn tax_scale(&self) -> &TaxScale {
        &self.tax_scale
    }

    /// Returns the deduction settings.
    pub fn deductions(&self) -> &DeductionSettings {
        &self.deductions
    }

    /// Returns the bonus settings.
    pub fn bonuses(&self) -> &BonusSettings {
        &self.bonuses
    }
}
