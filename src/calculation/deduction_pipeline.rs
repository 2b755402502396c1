//! Deduction processing pipeline.
//!
//! Applies an employee's effective deductions for one pay period in priority
//! order. Pre-tax deductions cascade: each one is evaluated against the
//! taxable income left after the ones before it. Post-tax deductions are
//! evaluated against gross pay or the final taxable income and do not reduce
//! taxable income further.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationStep, CalculationWarning, Deduction, DeductionCalculationResult, DeductionResult,
    EmployeeSnapshot, PayPeriod,
};

use super::cap_tracker::{
    AnnualCapTracker, DeductionSource, LedgerFailurePolicy, YtdLedger, remaining_cap,
};
use super::deduction_rules::{RuleContext, evaluate_raw_amount};

/// The pay figures a deduction run starts from.
#[derive(Debug, Clone, Copy)]
pub struct PayContext<'a> {
    /// The employee being paid.
    pub employee: &'a EmployeeSnapshot,
    /// The period being processed.
    pub pay_period: &'a PayPeriod,
    /// Gross pay for the period.
    pub gross_pay: Decimal,
    /// Taxable income before any deduction.
    pub taxable_income: Decimal,
}

/// Runs the deduction pipeline for one employee and pay period.
///
/// # Arguments
///
/// * `context` - Employee, pay period, gross pay and starting taxable income
/// * `source` - Where effective deductions are fetched from
/// * `ledger` - Year-to-date totals for annual caps
/// * `policy` - What to do when the ledger cannot be read
/// * `config` - Statutory settings
///
/// # Returns
///
/// The applied deductions and totals. Nothing is written anywhere; the
/// caller appends [`DeductionCalculationResult::ledger_entries`] to its
/// ledger after persisting the result.
///
/// # Errors
///
/// Returns an error if the source fails, if the ledger fails under
/// [`LedgerFailurePolicy::Propagate`], or if gross pay or taxable income is
/// negative.
pub fn process_deductions<S, L>(
    context: &PayContext<'_>,
    source: &S,
    ledger: &L,
    policy: LedgerFailurePolicy,
    config: &EngineConfig,
) -> EngineResult<DeductionCalculationResult>
where
    S: DeductionSource + ?Sized,
    L: YtdLedger + ?Sized,
{
    if context.gross_pay < Decimal::ZERO || context.taxable_income < Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: format!(
                "gross pay ({}) and taxable income ({}) must not be negative",
                context.gross_pay, context.taxable_income
            ),
        });
    }

    let employee_id = context.employee.id.as_str();
    let period_start = context.pay_period.start_date;

    let mut deductions = source.effective_deductions(employee_id, period_start)?;
    // Stable: equal priorities keep fetch order.
    deductions.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut run = PipelineRun {
        context,
        tracker: AnnualCapTracker::new(ledger, policy),
        config,
        steps: Vec::new(),
        warnings: Vec::new(),
        step_number: 1,
    };

    run.push_step(
        "select_deductions",
        "Select Effective Deductions",
        serde_json::json!({
            "employee_id": employee_id,
            "period_start": period_start.to_string(),
        }),
        serde_json::json!({
            "order": deductions.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
        }),
        format!(
            "{} effective deductions, ordered by priority (highest first)",
            deductions.len()
        ),
    );

    let mut taxable_income = context.taxable_income;
    let mut pre_tax_deductions = Vec::new();
    for deduction in deductions.iter().filter(|d| d.is_pre_tax()) {
        if let Some(applied) = run.apply(deduction, taxable_income)? {
            // Floored so later taxable-base deductions never see a negative base.
            taxable_income = (taxable_income - applied.current_amount).max(Decimal::ZERO);
            pre_tax_deductions.push(applied);
        }
    }

    let mut post_tax_deductions = Vec::new();
    for deduction in deductions.iter().filter(|d| !d.is_pre_tax()) {
        if let Some(applied) = run.apply(deduction, taxable_income)? {
            post_tax_deductions.push(applied);
        }
    }

    let total_pre_tax_deductions: Decimal =
        pre_tax_deductions.iter().map(|d| d.current_amount).sum();
    let total_post_tax_deductions: Decimal =
        post_tax_deductions.iter().map(|d| d.current_amount).sum();
    let net_pay_reduction = total_pre_tax_deductions + total_post_tax_deductions;

    run.push_step(
        "deduction_totals",
        "Deduction Totals",
        serde_json::json!({
            "taxable_income": context.taxable_income.normalize().to_string(),
        }),
        serde_json::json!({
            "total_pre_tax_deductions": total_pre_tax_deductions.normalize().to_string(),
            "total_post_tax_deductions": total_post_tax_deductions.normalize().to_string(),
            "taxable_income_after_deductions": taxable_income.normalize().to_string(),
            "net_pay_reduction": net_pay_reduction.normalize().to_string(),
        }),
        format!(
            "Pre-tax ${} + post-tax ${} = ${} taken from pay",
            total_pre_tax_deductions.normalize(),
            total_post_tax_deductions.normalize(),
            net_pay_reduction.normalize()
        ),
    );

    info!(
        employee_id = %employee_id,
        period_start = %period_start,
        pre_tax_count = pre_tax_deductions.len(),
        post_tax_count = post_tax_deductions.len(),
        net_pay_reduction = %net_pay_reduction,
        warnings = run.warnings.len(),
        "Deductions processed"
    );

    Ok(DeductionCalculationResult {
        employee_id: employee_id.to_string(),
        period_start,
        pre_tax_deductions,
        post_tax_deductions,
        total_pre_tax_deductions,
        total_post_tax_deductions,
        taxable_income_after_deductions: taxable_income,
        net_pay_reduction,
        warnings: run.warnings,
        steps: run.steps,
    })
}

/// Mutable state threaded through one pipeline run.
struct PipelineRun<'a, L: YtdLedger + ?Sized> {
    context: &'a PayContext<'a>,
    tracker: AnnualCapTracker<'a, L>,
    config: &'a EngineConfig,
    steps: Vec<CalculationStep>,
    warnings: Vec<CalculationWarning>,
    step_number: u32,
}

impl<L: YtdLedger + ?Sized> PipelineRun<'_, L> {
    fn push_step(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        self.steps.push(CalculationStep {
            step_number: self.step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning,
        });
        self.step_number += 1;
    }

    /// Evaluates, clamps, caps and rounds one deduction; `None` if nothing is taken.
    fn apply(
        &mut self,
        deduction: &Deduction,
        taxable_income: Decimal,
    ) -> EngineResult<Option<DeductionResult>> {
        let period_start = self.context.pay_period.start_date;
        let tracked_ytd = if deduction.tracks_ytd() {
            let lookup =
                self.tracker
                    .ytd_amount(&self.context.employee.id, &deduction.id, period_start)?;
            if let Some(warning) = lookup.warning {
                self.warnings.push(warning);
            }
            Some(lookup.amount)
        } else {
            None
        };
        let ytd_amount = tracked_ytd.unwrap_or(Decimal::ZERO);

        let rule_context = RuleContext {
            gross_pay: self.context.gross_pay,
            taxable_income,
            pay_period: self.context.pay_period,
            ytd_amount,
        };
        let raw = evaluate_raw_amount(deduction, &rule_context, self.config, self.step_number);
        self.steps.push(raw.step);
        self.step_number += 1;

        let mut amount = raw.amount;
        if let Some(minimum) = deduction.minimum_amount {
            amount = amount.max(minimum);
        }
        if let Some(maximum) = deduction.maximum_amount {
            amount = amount.min(maximum);
        }
        let clamped = amount;

        let remaining = deduction
            .annual_cap
            .map(|cap| remaining_cap(cap, ytd_amount));
        if let Some(remaining) = remaining {
            amount = amount.min(remaining);
        }

        // Rounding up must not push past the cap.
        let mut current_amount = deduction.rounding_method.apply(amount);
        if let Some(remaining) = remaining {
            current_amount = current_amount.min(remaining);
        }

        debug!(
            deduction_id = %deduction.id,
            raw_amount = %raw.amount,
            ytd_amount = %ytd_amount,
            current_amount = %current_amount,
            "Deduction evaluated"
        );

        self.push_step(
            "apply_limits",
            "Apply Limits and Rounding",
            serde_json::json!({
                "deduction_id": deduction.id,
                "raw_amount": raw.amount.normalize().to_string(),
                "minimum_amount": deduction.minimum_amount.map(|m| m.normalize().to_string()),
                "maximum_amount": deduction.maximum_amount.map(|m| m.normalize().to_string()),
                "annual_cap": deduction.annual_cap.map(|c| c.normalize().to_string()),
                "ytd_amount": tracked_ytd.map(|y| y.normalize().to_string()),
                "rounding_method": deduction.rounding_method,
            }),
            serde_json::json!({
                "clamped_amount": clamped.normalize().to_string(),
                "remaining_cap": remaining.map(|r| r.normalize().to_string()),
                "current_amount": current_amount.normalize().to_string(),
                "applied": current_amount > Decimal::ZERO,
            }),
            match remaining {
                Some(remaining) if clamped > remaining => format!(
                    "{}: ${} limited to ${} left under the annual cap, rounded to ${}",
                    deduction.name,
                    clamped.normalize(),
                    remaining.normalize(),
                    current_amount.normalize()
                ),
                _ => format!(
                    "{}: ${} after limits, rounded to ${}",
                    deduction.name,
                    clamped.normalize(),
                    current_amount.normalize()
                ),
            },
        );

        if current_amount <= Decimal::ZERO {
            return Ok(None);
        }

        Ok(Some(DeductionResult {
            deduction: deduction.clone(),
            current_amount,
            ytd_amount_after_this_period: tracked_ytd.map(|ytd| ytd + current_amount),
        }))
    }
}
