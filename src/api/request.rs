//! Request types for the compensation engine API.
//!
//! This module defines the JSON request bodies for the deduction and bonus
//! endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{LedgerFailurePolicy, YtdSnapshot};
use crate::error::EngineResult;
use crate::models::{
    BonusRequest, CommissionRequest, Deduction, DeductionRecord, EmployeeSnapshot, LedgerEntry,
    PayPeriod, PerformanceRequest,
};

/// Request body for the `/deductions/calculate` endpoint.
///
/// Carries the deductions and the year-to-date ledger inline; the engine
/// keeps no store of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionCalculationRequest {
    /// The employee being paid.
    pub employee: EmployeeSnapshot,
    /// The period being processed.
    pub pay_period: PayPeriod,
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// Taxable income before any deduction.
    pub taxable_income: Decimal,
    /// The employee's deduction records, in fetch order.
    #[serde(default)]
    pub deductions: Vec<DeductionRecord>,
    /// Amounts already applied this year.
    #[serde(default)]
    pub ytd_ledger: Vec<LedgerEntry>,
    /// Overrides the configured ledger failure policy.
    #[serde(default)]
    pub ledger_failure_policy: Option<LedgerFailurePolicy>,
}

impl DeductionCalculationRequest {
    /// Validates every deduction record, preserving order.
    pub fn validated_deductions(&self) -> EngineResult<Vec<Deduction>> {
        self.deductions
            .iter()
            .cloned()
            .map(Deduction::try_from)
            .collect()
    }

    /// Builds the in-memory ledger from the supplied rows.
    pub fn ledger(&self) -> YtdSnapshot {
        YtdSnapshot::new(self.ytd_ledger.clone())
    }
}

/// Request body for the `/bonuses/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusCalculationRequest {
    /// The employee receiving the bonus.
    pub employee: EmployeeSnapshot,
    /// The bonus to calculate.
    pub bonus: BonusRequest,
}

/// Request body for the `/bonuses/commission` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionCalculationRequest {
    /// The employee earning the commission.
    pub employee: EmployeeSnapshot,
    /// Sales figures and commission terms.
    pub commission: CommissionRequest,
}

/// Request body for the `/bonuses/performance` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceCalculationRequest {
    /// The employee being rewarded.
    pub employee: EmployeeSnapshot,
    /// Target amount and scores.
    pub performance: PerformanceRequest,
}
