//! Calculation result models.
//!
//! This module contains the values returned by the two entry points: the
//! [`DeductionCalculationResult`] produced once per employee per pay period,
//! and the [`BonusCalculationResult`] produced for each one-off payment. Both
//! carry an ordered trace of [`CalculationStep`]s and any
//! [`CalculationWarning`]s raised along the way.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BonusPayment, BonusTaxMethod, Deduction};

/// A single step in the calculation trace recording a decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation but may
/// require attention from a payroll officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium" or "high").
    pub severity: String,
}

impl CalculationWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// One applied deduction amount, as appended to the year-to-date ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The employee the amount was deducted from.
    pub employee_id: String,
    /// The deduction that was applied.
    pub deduction_id: String,
    /// The date the amount counts towards (the pay period start).
    pub date: NaiveDate,
    /// The amount deducted.
    pub amount: Decimal,
}

/// A deduction applied in a pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    /// The deduction that was applied.
    pub deduction: Deduction,
    /// The amount deducted this period, after clamping, capping and rounding.
    pub current_amount: Decimal,
    /// Year-to-date total including this period; `None` when the deduction
    /// is not tracked against the ledger.
    pub ytd_amount_after_this_period: Option<Decimal>,
}

/// The result of running the deduction pipeline for one pay period.
///
/// # Example
///
/// ```
/// use compensation_engine::models::DeductionCalculationResult;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let result = DeductionCalculationResult {
///     employee_id: "emp_001".to_string(),
///     period_start: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
///     pre_tax_deductions: vec![],
///     post_tax_deductions: vec![],
///     total_pre_tax_deductions: Decimal::ZERO,
///     total_post_tax_deductions: Decimal::ZERO,
///     taxable_income_after_deductions: Decimal::new(3000, 0),
///     net_pay_reduction: Decimal::ZERO,
///     warnings: vec![],
///     steps: vec![],
/// };
/// assert!(result.ledger_entries().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionCalculationResult {
    /// The employee the calculation is for.
    pub employee_id: String,
    /// Start of the pay period processed.
    pub period_start: NaiveDate,
    /// Pre-tax deductions applied, in application order.
    pub pre_tax_deductions: Vec<DeductionResult>,
    /// Post-tax deductions applied, in application order.
    pub post_tax_deductions: Vec<DeductionResult>,
    /// Sum of `pre_tax_deductions` amounts.
    pub total_pre_tax_deductions: Decimal,
    /// Sum of `post_tax_deductions` amounts.
    pub total_post_tax_deductions: Decimal,
    /// Taxable income after every pre-tax deduction.
    pub taxable_income_after_deductions: Decimal,
    /// Total taken from the employee's pay.
    pub net_pay_reduction: Decimal,
    /// Non-fatal conditions raised during processing.
    pub warnings: Vec<CalculationWarning>,
    /// Ordered calculation trace.
    pub steps: Vec<CalculationStep>,
}

impl DeductionCalculationResult {
    /// Returns the ledger rows the caller must append once the result is persisted.
    ///
    /// Rows are dated at the pay period start so they count towards the
    /// calendar year the period falls in.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.pre_tax_deductions
            .iter()
            .chain(&self.post_tax_deductions)
            .map(|applied| LedgerEntry {
                employee_id: self.employee_id.clone(),
                deduction_id: applied.deduction.id.clone(),
                date: self.period_start,
                amount: applied.current_amount,
            })
            .collect()
    }
}

/// Tax withheld on a bonus and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculation {
    /// Method applied.
    pub method: BonusTaxMethod,
    /// Bonus amount the method was applied to.
    pub taxable_amount: Decimal,
    /// Amount withheld, rounded to the cent.
    pub tax_withheld: Decimal,
    /// Medicare levy line item, for methods that report one.
    pub medicare_levy: Option<Decimal>,
    /// `tax_withheld` plus any Medicare levy line item.
    pub total_tax_liability: Decimal,
    /// `tax_withheld / taxable_amount`.
    pub effective_rate: Decimal,
    /// Method-specific figures.
    pub details: serde_json::Value,
    /// Human-readable explanation.
    pub reasoning: String,
}

/// The result of a bonus calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusCalculationResult {
    /// The payment record to persist.
    pub bonus_payment: BonusPayment,
    /// Withholding breakdown.
    pub tax_calculation: TaxCalculation,
    /// Non-fatal conditions raised during calculation.
    pub warnings: Vec<CalculationWarning>,
    /// Always empty on success; failures are returned as errors.
    pub validation_errors: Vec<String>,
}
