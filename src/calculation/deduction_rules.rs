//! Raw deduction amount evaluation.
//!
//! This module computes what a single deduction would take before the
//! pipeline clamps it to its minimum and maximum, caps it against the annual
//! limit, and rounds it.

use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::models::{
    CalculationStep, Deduction, DeductionRule, DeductionTier, FormulaRule, PayPeriod,
    PercentageBase,
};

/// Inputs a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// Taxable income at this point in the pipeline.
    pub taxable_income: Decimal,
    /// The period being processed.
    pub pay_period: &'a PayPeriod,
    /// Amount of this deduction already applied this year.
    pub ytd_amount: Decimal,
}

impl RuleContext<'_> {
    fn base_for(&self, base: PercentageBase) -> Decimal {
        match base {
            PercentageBase::Gross => self.gross_pay,
            PercentageBase::Taxable => self.taxable_income,
        }
    }
}

/// The result of evaluating a deduction rule.
#[derive(Debug, Clone)]
pub struct RawAmountResult {
    /// The unclamped, unrounded amount.
    pub amount: Decimal,
    /// The calculation step recording this evaluation.
    pub step: CalculationStep,
}

/// Evaluates a deduction's rule and returns its raw amount.
///
/// # Arguments
///
/// * `deduction` - The validated deduction
/// * `context` - Gross pay, current taxable income, period and year-to-date amount
/// * `config` - Statutory settings (tax scale, formula defaults)
/// * `step_number` - The step number for trace sequencing
///
/// # Example
///
/// ```
/// use compensation_engine::calculation::{RuleContext, evaluate_raw_amount};
/// use compensation_engine::config::EngineConfig;
/// use compensation_engine::models::{Deduction, DeductionRecord, PayFrequency, PayPeriod};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let record: DeductionRecord = serde_json::from_str(r#"{
///     "id": "ded_001",
///     "employee_id": "emp_001",
///     "name": "Voluntary super",
///     "deduction_type": "pre_tax",
///     "category": "superannuation",
///     "calculation_method": "percentage",
///     "percentage": "5",
///     "start_date": "2025-01-01",
///     "status": "active"
/// }"#).unwrap();
/// let deduction = Deduction::try_from(record).unwrap();
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
///     frequency: PayFrequency::Fortnightly,
/// };
/// let context = RuleContext {
///     gross_pay: Decimal::new(4000, 0),
///     taxable_income: Decimal::new(4000, 0),
///     pay_period: &period,
///     ytd_amount: Decimal::ZERO,
/// };
///
/// let result = evaluate_raw_amount(&deduction, &context, &EngineConfig::default(), 1);
/// assert_eq!(result.amount, Decimal::new(200, 0));
/// ```
pub fn evaluate_raw_amount(
    deduction: &Deduction,
    context: &RuleContext<'_>,
    config: &EngineConfig,
    step_number: u32,
) -> RawAmountResult {
    let base = context.base_for(deduction.base_for_percentage);

    let (amount, rule_id, input, reasoning) = match &deduction.rule {
        DeductionRule::Fixed { amount } => (
            *amount,
            "fixed_deduction",
            serde_json::json!({ "amount": amount.normalize().to_string() }),
            format!("Fixed amount ${}", amount.normalize()),
        ),
        DeductionRule::Percentage { percentage } => {
            let amount = base * *percentage / Decimal::ONE_HUNDRED;
            (
                amount,
                "percentage_deduction",
                serde_json::json!({
                    "base": base.normalize().to_string(),
                    "base_for_percentage": deduction.base_for_percentage,
                    "percentage": percentage.normalize().to_string(),
                }),
                format!(
                    "{}% of ${} = ${}",
                    percentage.normalize(),
                    base.normalize(),
                    amount.normalize()
                ),
            )
        }
        DeductionRule::Tiered { tiers } => {
            let amount = tiered_amount(base, tiers);
            (
                amount,
                "tiered_deduction",
                serde_json::json!({
                    "base": base.normalize().to_string(),
                    "tiers": tiers.len(),
                }),
                format!(
                    "{} tiers over ${} = ${}",
                    tiers.len(),
                    base.normalize(),
                    amount.normalize()
                ),
            )
        }
        DeductionRule::Formula(formula) => {
            let (amount, input, reasoning) = formula_amount(formula, context, config);
            (amount, formula.name(), input, reasoning)
        }
    };

    let step = CalculationStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: format!("Evaluate {}", deduction.name),
        input,
        output: serde_json::json!({
            "deduction_id": deduction.id,
            "raw_amount": amount.normalize().to_string(),
        }),
        reasoning,
    };

    RawAmountResult { amount, step }
}

/// Sums each tier's charge on the portion of `base` above its threshold.
fn tiered_amount(base: Decimal, tiers: &[DeductionTier]) -> Decimal {
    let mut sorted: Vec<&DeductionTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.threshold.cmp(&b.threshold));

    sorted
        .into_iter()
        .filter(|tier| base > tier.threshold)
        .map(|tier| {
            let portion = base - tier.threshold;
            let portion = tier.max_amount.map_or(portion, |max| portion.min(max));
            portion * tier.rate / Decimal::ONE_HUNDRED
        })
        .sum()
}

fn formula_amount(
    formula: &FormulaRule,
    context: &RuleContext<'_>,
    config: &EngineConfig,
) -> (Decimal, serde_json::Value, String) {
    let settings = config.deductions();

    match formula {
        FormulaRule::ChildSupport { children_count } => {
            let frequency = context.pay_period.frequency;
            let annual_tax = config
                .tax_scale()
                .tax_on_annual_income(frequency.annualize(context.taxable_income));
            let estimated_tax = frequency.de_annualize(annual_tax);
            let disposable = (context.gross_pay - estimated_tax).max(Decimal::ZERO);
            let rate = settings.child_support.rate_for(*children_count);
            let amount = disposable * rate;
            (
                amount,
                serde_json::json!({
                    "children_count": children_count,
                    "gross_pay": context.gross_pay.normalize().to_string(),
                    "estimated_tax": estimated_tax.round_dp(2).normalize().to_string(),
                    "disposable_income": disposable.round_dp(2).normalize().to_string(),
                    "rate": rate.normalize().to_string(),
                }),
                format!(
                    "Child support for {} children: {}% of disposable income ${}",
                    children_count,
                    (rate * Decimal::ONE_HUNDRED).normalize(),
                    disposable.round_dp(2).normalize()
                ),
            )
        }
        FormulaRule::UnionFees { rate, minimum_fee } => {
            let rate = rate.unwrap_or(settings.union_fees.default_rate);
            let minimum_fee = minimum_fee.unwrap_or(settings.union_fees.minimum_fee);
            let amount = (context.gross_pay * rate).max(minimum_fee);
            (
                amount,
                serde_json::json!({
                    "gross_pay": context.gross_pay.normalize().to_string(),
                    "rate": rate.normalize().to_string(),
                    "minimum_fee": minimum_fee.normalize().to_string(),
                }),
                format!(
                    "Union fees: greater of {}% of ${} and ${} minimum",
                    (rate * Decimal::ONE_HUNDRED).normalize(),
                    context.gross_pay.normalize(),
                    minimum_fee.normalize()
                ),
            )
        }
        FormulaRule::NovatedLease { amount } => (
            *amount,
            serde_json::json!({ "amount": amount.normalize().to_string() }),
            format!("Novated lease packaging ${} per period", amount.normalize()),
        ),
        FormulaRule::MealEntertainment { package_amount } => {
            let limit = settings.meal_entertainment_annual_limit;
            let remaining_limit = (limit - context.ytd_amount).max(Decimal::ZERO);
            let remaining_periods = context.pay_period.remaining_periods_in_year();
            let per_period = remaining_limit / Decimal::from(remaining_periods);
            let amount = per_period.min(*package_amount);
            (
                amount,
                serde_json::json!({
                    "annual_limit": limit.normalize().to_string(),
                    "ytd_amount": context.ytd_amount.normalize().to_string(),
                    "remaining_periods": remaining_periods,
                    "package_amount": package_amount.normalize().to_string(),
                }),
                format!(
                    "Meal entertainment: ${} of ${} limit left over {} periods, capped at ${} package",
                    remaining_limit.normalize(),
                    limit.normalize(),
                    remaining_periods,
                    package_amount.normalize()
                ),
            )
        }
    }
}
