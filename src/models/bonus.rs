//! Bonus payment models.
//!
//! This module holds the input shapes for the bonus entry points
//! ([`BonusRequest`], [`CommissionRequest`], [`PerformanceRequest`]) and the
//! [`BonusPayment`] record the orchestrator hands back for persistence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationStep;

/// The kind of one-off payment being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    /// Individual performance bonus.
    Performance,
    /// Retention bonus.
    Retention,
    /// Sign-on bonus.
    SignOn,
    /// Sales commission.
    Commission,
    /// Staff referral bonus.
    Referral,
    /// Profit-sharing distribution.
    ProfitSharing,
    /// Employment termination payment.
    Termination,
    /// Expense reimbursement paid through payroll.
    Reimbursement,
    /// One-off allowance.
    Allowance,
    /// Anything else.
    Other,
}

impl BonusType {
    /// Returns the tax method used when the caller does not override it.
    ///
    /// # Example
    ///
    /// ```
    /// use compensation_engine::models::{BonusTaxMethod, BonusType};
    ///
    /// assert_eq!(BonusType::Commission.default_tax_method(), BonusTaxMethod::Schedule5);
    /// assert_eq!(BonusType::Referral.default_tax_method(), BonusTaxMethod::FixedRate);
    /// ```
    pub fn default_tax_method(self) -> BonusTaxMethod {
        match self {
            BonusType::Performance | BonusType::Retention | BonusType::SignOn => {
                BonusTaxMethod::MarginalRates
            }
            BonusType::Commission => BonusTaxMethod::Schedule5,
            BonusType::Referral => BonusTaxMethod::FixedRate,
            BonusType::ProfitSharing => BonusTaxMethod::AverageRates,
            BonusType::Termination => BonusTaxMethod::Etp,
            BonusType::Reimbursement | BonusType::Allowance | BonusType::Other => {
                BonusTaxMethod::MarginalRates
            }
        }
    }

    /// Length of the qualifying period used for proration, in days.
    pub fn full_period_days(self) -> u32 {
        match self {
            BonusType::Commission => 91,
            _ => 365,
        }
    }

    /// Whether the payment is reported as income.
    pub fn is_reportable(self) -> bool {
        !matches!(self, BonusType::Reimbursement | BonusType::Allowance)
    }
}

/// Withholding method applied to a bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusTaxMethod {
    /// Tax on regular income plus bonus, less tax on regular income.
    MarginalRates,
    /// Periodic withholding schedule applied to one period plus the bonus.
    #[serde(rename = "schedule_5")]
    Schedule5,
    /// Regular income's average tax rate applied to the bonus.
    AverageRates,
    /// Flat rate including Medicare.
    FixedRate,
    /// Employment termination payment concessional rates.
    Etp,
}

impl BonusTaxMethod {
    /// Returns the wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            BonusTaxMethod::MarginalRates => "marginal_rates",
            BonusTaxMethod::Schedule5 => "schedule_5",
            BonusTaxMethod::AverageRates => "average_rates",
            BonusTaxMethod::FixedRate => "fixed_rate",
            BonusTaxMethod::Etp => "etp",
        }
    }

    /// Whether a Medicare levy line item is reported alongside the withholding.
    pub fn reports_medicare_levy(self) -> bool {
        matches!(
            self,
            BonusTaxMethod::MarginalRates | BonusTaxMethod::AverageRates | BonusTaxMethod::FixedRate
        )
    }
}

/// Processing status of a bonus payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusStatus {
    /// Calculated, not yet approved.
    Calculated,
    /// Approved for payment.
    Approved,
    /// Paid out.
    Paid,
    /// Cancelled.
    Cancelled,
}

/// Approval state of a bonus payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for an approver.
    Pending,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
}

/// Options shared by every bonus entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusOptions {
    /// Overrides the bonus type's default tax method.
    #[serde(default)]
    pub tax_method: Option<BonusTaxMethod>,
    /// Days of the qualifying period actually served.
    #[serde(default)]
    pub pro_rata_days: Option<u32>,
    /// Skip the employer superannuation calculation.
    #[serde(default)]
    pub exclude_superannuation: bool,
    /// Overrides the employee's superannuation rate (fraction).
    #[serde(default)]
    pub superannuation_rate: Option<Decimal>,
    /// Start of the pay period the bonus is paid in.
    #[serde(default)]
    pub pay_period_start: Option<NaiveDate>,
    /// End of the pay period the bonus is paid in.
    #[serde(default)]
    pub pay_period_end: Option<NaiveDate>,
}

/// Input for the general bonus entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRequest {
    /// The kind of payment.
    pub bonus_type: BonusType,
    /// Nominal gross amount before proration.
    pub gross_amount: Decimal,
    /// Date the bonus is paid.
    pub payment_date: NaiveDate,
    /// Sales figure backing a commission.
    #[serde(default)]
    pub sales_amount: Option<Decimal>,
    /// Commission rate as a fraction (e.g. 0.05).
    #[serde(default)]
    pub commission_rate: Option<Decimal>,
    /// Individual performance score, 0 to 100.
    #[serde(default)]
    pub performance_score: Option<Decimal>,
    /// Shared options.
    #[serde(default)]
    pub options: BonusOptions,
}

/// A single commission tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    /// Sales above this figure earn this tier's rate.
    pub threshold: Decimal,
    /// Rate as a fraction (e.g. 0.05).
    pub rate: Decimal,
}

/// Input for the commission entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRequest {
    /// Total sales for the commission period.
    pub sales_amount: Decimal,
    /// Flat commission rate as a fraction; used when no tiers are given.
    #[serde(default)]
    pub commission_rate: Option<Decimal>,
    /// Tiered rates; take precedence over `commission_rate`.
    #[serde(default)]
    pub tiers: Option<Vec<CommissionTier>>,
    /// Sales below this figure are rejected.
    #[serde(default)]
    pub minimum_sales: Option<Decimal>,
    /// Commission above this figure is clamped.
    #[serde(default)]
    pub maximum_commission: Option<Decimal>,
    /// Date the commission is paid.
    pub payment_date: NaiveDate,
    /// Shared options.
    #[serde(default)]
    pub options: BonusOptions,
}

/// A performance threshold and the multiplier it earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceThreshold {
    /// Minimum score to earn the multiplier.
    pub threshold: Decimal,
    /// Multiplier applied to the target amount.
    pub multiplier: Decimal,
}

/// Input for the performance entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRequest {
    /// Target bonus before multipliers.
    pub base_amount: Decimal,
    /// Individual performance score, 0 to 100.
    pub performance_score: Decimal,
    /// Team score, 0 to 100.
    #[serde(default)]
    pub team_score: Option<Decimal>,
    /// Company score, 0 to 100.
    #[serde(default)]
    pub company_score: Option<Decimal>,
    /// Custom threshold table; the configured default is used when absent.
    #[serde(default)]
    pub thresholds: Option<Vec<PerformanceThreshold>>,
    /// Date the bonus is paid.
    pub payment_date: NaiveDate,
    /// Shared options.
    #[serde(default)]
    pub options: BonusOptions,
}

/// Proration applied to a bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProRataAdjustment {
    /// Days served.
    pub pro_rata_days: u32,
    /// Length of the full qualifying period.
    pub full_period_days: u32,
    /// Fraction applied, never above 1.
    pub factor: Decimal,
    /// Amount before proration.
    pub original_amount: Decimal,
}

/// Commission earned in one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCommission {
    /// Tier threshold.
    pub threshold: Decimal,
    /// Tier rate.
    pub rate: Decimal,
    /// Sales falling in this tier.
    pub sales_in_tier: Decimal,
    /// Commission earned in this tier.
    pub commission: Decimal,
}

/// How a commission figure was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    /// Total sales.
    pub sales_amount: Decimal,
    /// Flat rate used, if any.
    pub commission_rate: Option<Decimal>,
    /// Per-tier results, if tiered.
    pub tiers: Vec<TierCommission>,
    /// Commission before the ceiling.
    pub uncapped_commission: Decimal,
    /// Whether `maximum_commission` clamped the result.
    pub capped: bool,
}

/// How a performance bonus multiplier was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceBreakdown {
    /// Target amount.
    pub base_amount: Decimal,
    /// Individual score.
    pub performance_score: Decimal,
    /// Multiplier from the threshold table.
    pub base_multiplier: Decimal,
    /// Team factor, when a team score was given.
    pub team_factor: Option<Decimal>,
    /// Company factor, when a company score was given.
    pub company_factor: Option<Decimal>,
    /// Product of all factors.
    pub final_multiplier: Decimal,
}

/// Details recorded on a bonus payment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusCalculationDetails {
    /// Proration, when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_rata: Option<ProRataAdjustment>,
    /// Commission breakdown, for the commission entry point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<CommissionBreakdown>,
    /// Performance breakdown, for the performance entry point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceBreakdown>,
    /// Superannuation rate applied, if any.
    #[serde(default)]
    pub superannuation_rate: Option<Decimal>,
    /// Ordered calculation trace.
    #[serde(default)]
    pub steps: Vec<CalculationStep>,
}

/// A calculated bonus payment awaiting approval.
///
/// `net_amount` is always `gross_amount - tax_withheld`; superannuation is an
/// employer contribution and is not taken from the net amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusPayment {
    /// The employee being paid.
    pub employee_id: String,
    /// The kind of payment.
    pub bonus_type: BonusType,
    /// Gross amount after proration.
    pub gross_amount: Decimal,
    /// Withholding method applied.
    pub tax_method: BonusTaxMethod,
    /// Tax withheld.
    pub tax_withheld: Decimal,
    /// Employer superannuation contribution.
    pub superannuation_amount: Decimal,
    /// Amount paid to the employee.
    pub net_amount: Decimal,
    /// Date of payment.
    pub payment_date: NaiveDate,
    /// Processing status.
    pub status: BonusStatus,
    /// How the figures were reached.
    pub calculation_details: BonusCalculationDetails,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// Whether the payment is reportable income.
    pub is_reportable: bool,
    /// Start of the pay period the bonus belongs to.
    pub pay_period_start: Option<NaiveDate>,
    /// End of the pay period the bonus belongs to.
    pub pay_period_end: Option<NaiveDate>,
}
