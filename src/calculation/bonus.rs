//! Bonus calculation orchestrator.
//!
//! Three entry points share one tail: validate, prorate, resolve the tax
//! method, withhold, compute employer superannuation and assemble the
//! [`BonusPayment`]. [`calculate_commission_bonus`] and
//! [`calculate_performance_bonus`] first derive the gross amount from sales
//! figures or performance scores.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ApprovalStatus, BonusCalculationDetails, BonusCalculationResult, BonusOptions, BonusPayment,
    BonusRequest, BonusStatus, BonusType, CalculationStep, CalculationWarning,
    CommissionBreakdown, CommissionRequest, CommissionTier, EmployeeSnapshot,
    PerformanceBreakdown, PerformanceRequest, PerformanceThreshold, ProRataAdjustment,
    RoundingMethod, TierCommission,
};

use super::bonus_tax::withhold;

/// Team factor floor; a team score of 100 adds the full weight.
const TEAM_FACTOR_BASE: Decimal = Decimal::from_parts(7, 0, 0, false, 1);
const TEAM_FACTOR_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
/// Company factor floor; a company score of 100 adds the full weight.
const COMPANY_FACTOR_BASE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);
const COMPANY_FACTOR_WEIGHT: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Calculates a bonus from a nominal gross amount.
///
/// Commission bonuses take their gross from `sales_amount * commission_rate`
/// rather than `gross_amount`; a mismatch is reported as a warning.
///
/// # Errors
///
/// Returns [`EngineError::InvalidBonus`] listing every validation failure
/// when the request is invalid.
///
/// # Example
///
/// ```
/// use compensation_engine::calculation::calculate_bonus;
/// use compensation_engine::config::EngineConfig;
/// use compensation_engine::models::{
///     BonusOptions, BonusRequest, BonusTaxMethod, BonusType, EmployeeSnapshot, EmploymentType,
///     PayFrequency,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let employee = EmployeeSnapshot {
///     id: "emp_001".to_string(),
///     company_id: "co_001".to_string(),
///     base_salary: Decimal::new(80000, 0),
///     pay_frequency: PayFrequency::Fortnightly,
///     employment_type: EmploymentType::FullTime,
///     date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 2).unwrap(),
///     start_date: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
///     superannuation_rate: None,
/// };
/// let request = BonusRequest {
///     bonus_type: BonusType::Referral,
///     gross_amount: Decimal::new(2000, 0),
///     payment_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
///     sales_amount: None,
///     commission_rate: None,
///     performance_score: None,
///     options: BonusOptions::default(),
/// };
///
/// let result = calculate_bonus(&employee, &request, &EngineConfig::default()).unwrap();
/// assert_eq!(result.bonus_payment.tax_method, BonusTaxMethod::FixedRate);
/// assert_eq!(result.bonus_payment.tax_withheld, Decimal::new(940, 0));
/// ```
pub fn calculate_bonus(
    employee: &EmployeeSnapshot,
    request: &BonusRequest,
    config: &EngineConfig,
) -> EngineResult<BonusCalculationResult> {
    let mut errors = Vec::new();
    if request.gross_amount <= Decimal::ZERO {
        errors.push("gross_amount must be greater than zero".to_string());
    }
    if request.bonus_type == BonusType::Commission {
        if request.sales_amount.is_none_or(|s| s <= Decimal::ZERO) {
            errors.push("sales_amount must be greater than zero for commission bonuses".to_string());
        }
        if request.commission_rate.is_none_or(|r| r <= Decimal::ZERO) {
            errors.push(
                "commission_rate must be greater than zero for commission bonuses".to_string(),
            );
        }
    }
    if let Some(score) = request.performance_score {
        check_score("performance_score", score, &mut errors);
    }
    check_options(&request.options, &mut errors);
    reject_if_any(errors)?;

    if let (BonusType::Commission, Some(sales_amount), Some(commission_rate)) = (
        request.bonus_type,
        request.sales_amount,
        request.commission_rate,
    ) {
        let commission = CommissionRequest {
            sales_amount,
            commission_rate: Some(commission_rate),
            tiers: None,
            minimum_sales: None,
            maximum_commission: None,
            payment_date: request.payment_date,
            options: request.options.clone(),
        };
        let mut result = calculate_commission_bonus(employee, &commission, config)?;
        let derived = result
            .bonus_payment
            .calculation_details
            .pro_rata
            .as_ref()
            .map_or(result.bonus_payment.gross_amount, |p| p.original_amount);
        if derived != request.gross_amount {
            result.warnings.push(CalculationWarning::new(
                "COMMISSION_GROSS_RECALCULATED",
                format!(
                    "gross_amount ${} replaced by commission ${} on sales of ${}",
                    request.gross_amount.normalize(),
                    derived.normalize(),
                    sales_amount.normalize()
                ),
                "medium",
            ));
        }
        return Ok(result);
    }

    let details = BonusCalculationDetails::default();
    finalize(
        employee,
        request.bonus_type,
        request.gross_amount,
        request.payment_date,
        &request.options,
        details,
        config,
    )
}

/// Calculates a commission from sales, flat or tiered.
///
/// Tiers take precedence over a flat `commission_rate`. Sales below
/// `minimum_sales` are rejected; commission above `maximum_commission` is
/// clamped.
///
/// # Errors
///
/// Returns [`EngineError::BelowMinimumSales`] when sales fall short of the
/// floor, or [`EngineError::InvalidBonus`] for invalid input.
pub fn calculate_commission_bonus(
    employee: &EmployeeSnapshot,
    request: &CommissionRequest,
    config: &EngineConfig,
) -> EngineResult<BonusCalculationResult> {
    let mut errors = Vec::new();
    if request.sales_amount <= Decimal::ZERO {
        errors.push("sales_amount must be greater than zero".to_string());
    }
    match &request.tiers {
        Some(tiers) => {
            if tiers.iter().any(|t| t.rate < Decimal::ZERO) {
                errors.push("commission tier rates must not be negative".to_string());
            }
            if tiers.iter().any(|t| t.threshold < Decimal::ZERO) {
                errors.push("commission tier thresholds must not be negative".to_string());
            }
        }
        None => {
            if request.commission_rate.is_none_or(|r| r <= Decimal::ZERO) {
                errors.push("commission_rate must be greater than zero".to_string());
            }
        }
    }
    if request.maximum_commission.is_some_and(|m| m <= Decimal::ZERO) {
        errors.push("maximum_commission must be greater than zero".to_string());
    }
    check_options(&request.options, &mut errors);
    reject_if_any(errors)?;

    if let Some(minimum_sales) = request.minimum_sales {
        if request.sales_amount < minimum_sales {
            return Err(EngineError::BelowMinimumSales {
                sales_amount: request.sales_amount,
                minimum_sales,
            });
        }
    }

    let (uncapped, tiers, rate) = match &request.tiers {
        Some(tiers) => {
            let (commission, breakdown) = tiered_commission(request.sales_amount, tiers);
            (commission, breakdown, None)
        }
        None => {
            let rate = request.commission_rate.unwrap_or(Decimal::ZERO);
            (request.sales_amount * rate, Vec::new(), Some(rate))
        }
    };
    let commission = request
        .maximum_commission
        .map_or(uncapped, |max| uncapped.min(max));
    let gross = RoundingMethod::NearestCent.apply(commission);

    if gross <= Decimal::ZERO {
        return Err(EngineError::InvalidBonus {
            errors: vec!["calculated commission must be greater than zero".to_string()],
        });
    }

    let breakdown = CommissionBreakdown {
        sales_amount: request.sales_amount,
        commission_rate: rate,
        tiers,
        uncapped_commission: uncapped,
        capped: commission < uncapped,
    };
    let step = CalculationStep {
        step_number: 1,
        rule_id: "commission".to_string(),
        rule_name: "Commission Calculation".to_string(),
        input: serde_json::json!({
            "sales_amount": request.sales_amount.normalize().to_string(),
            "commission_rate": rate.map(|r| r.normalize().to_string()),
            "tiers": breakdown.tiers.len(),
            "minimum_sales": request.minimum_sales.map(|m| m.normalize().to_string()),
            "maximum_commission": request.maximum_commission.map(|m| m.normalize().to_string()),
        }),
        output: serde_json::json!({
            "uncapped_commission": uncapped.normalize().to_string(),
            "commission": gross.normalize().to_string(),
            "capped": breakdown.capped,
        }),
        reasoning: if breakdown.capped {
            format!(
                "Commission ${} on sales of ${} clamped to ${}",
                uncapped.normalize(),
                request.sales_amount.normalize(),
                gross.normalize()
            )
        } else {
            format!(
                "Commission ${} on sales of ${}",
                gross.normalize(),
                request.sales_amount.normalize()
            )
        },
    };

    let details = BonusCalculationDetails {
        commission: Some(breakdown),
        steps: vec![step],
        ..Default::default()
    };
    finalize(
        employee,
        BonusType::Commission,
        gross,
        request.payment_date,
        &request.options,
        details,
        config,
    )
}

/// Calculates a performance bonus from a target amount and scores.
///
/// # Errors
///
/// Returns [`EngineError::InvalidBonus`] for scores outside `[0, 100]`, a
/// non-positive target, or a threshold table that awards nothing.
pub fn calculate_performance_bonus(
    employee: &EmployeeSnapshot,
    request: &PerformanceRequest,
    config: &EngineConfig,
) -> EngineResult<BonusCalculationResult> {
    let mut errors = Vec::new();
    if request.base_amount <= Decimal::ZERO {
        errors.push("base_amount must be greater than zero".to_string());
    }
    check_score("performance_score", request.performance_score, &mut errors);
    if let Some(team) = request.team_score {
        check_score("team_score", team, &mut errors);
    }
    if let Some(company) = request.company_score {
        check_score("company_score", company, &mut errors);
    }
    check_options(&request.options, &mut errors);
    reject_if_any(errors)?;

    let table = request
        .thresholds
        .as_deref()
        .unwrap_or(&config.bonuses().performance_thresholds);
    let breakdown = performance_multiplier(
        request.base_amount,
        request.performance_score,
        request.team_score,
        request.company_score,
        table,
    );
    let gross = RoundingMethod::NearestCent.apply(request.base_amount * breakdown.final_multiplier);

    if gross <= Decimal::ZERO {
        return Err(EngineError::InvalidBonus {
            errors: vec![format!(
                "performance score {} earns no bonus under the threshold table",
                request.performance_score
            )],
        });
    }

    let step = CalculationStep {
        step_number: 1,
        rule_id: "performance_multiplier".to_string(),
        rule_name: "Performance Multiplier".to_string(),
        input: serde_json::json!({
            "base_amount": request.base_amount.normalize().to_string(),
            "performance_score": request.performance_score.normalize().to_string(),
            "team_score": request.team_score.map(|s| s.normalize().to_string()),
            "company_score": request.company_score.map(|s| s.normalize().to_string()),
        }),
        output: serde_json::json!({
            "base_multiplier": breakdown.base_multiplier.normalize().to_string(),
            "team_factor": breakdown.team_factor.map(|f| f.normalize().to_string()),
            "company_factor": breakdown.company_factor.map(|f| f.normalize().to_string()),
            "final_multiplier": breakdown.final_multiplier.normalize().to_string(),
            "gross_amount": gross.normalize().to_string(),
        }),
        reasoning: format!(
            "${} × {} = ${}",
            request.base_amount.normalize(),
            breakdown.final_multiplier.normalize(),
            gross.normalize()
        ),
    };

    let details = BonusCalculationDetails {
        performance: Some(breakdown),
        steps: vec![step],
        ..Default::default()
    };
    finalize(
        employee,
        BonusType::Performance,
        gross,
        request.payment_date,
        &request.options,
        details,
        config,
    )
}

/// Sums commission over ascending tiers, each charging its rate on the
/// sales falling between its threshold and the next one.
///
/// # Example
///
/// ```
/// use compensation_engine::calculation::tiered_commission;
/// use compensation_engine::models::CommissionTier;
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     CommissionTier { threshold: Decimal::ZERO, rate: Decimal::new(2, 2) },
///     CommissionTier { threshold: Decimal::new(50000, 0), rate: Decimal::new(5, 2) },
///     CommissionTier { threshold: Decimal::new(100000, 0), rate: Decimal::new(8, 2) },
/// ];
/// let (commission, _) = tiered_commission(Decimal::new(150000, 0), &tiers);
/// assert_eq!(commission, Decimal::new(7500, 0));
/// ```
pub fn tiered_commission(
    sales_amount: Decimal,
    tiers: &[CommissionTier],
) -> (Decimal, Vec<TierCommission>) {
    let mut sorted: Vec<&CommissionTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.threshold.cmp(&b.threshold));

    let mut total = Decimal::ZERO;
    let mut breakdown = Vec::new();
    for (i, tier) in sorted.iter().enumerate() {
        if sales_amount <= tier.threshold {
            break;
        }
        let above = sales_amount - tier.threshold;
        let sales_in_tier = sorted
            .get(i + 1)
            .map_or(above, |next| above.min(next.threshold - tier.threshold));
        let commission = sales_in_tier * tier.rate;
        total += commission;
        breakdown.push(TierCommission {
            threshold: tier.threshold,
            rate: tier.rate,
            sales_in_tier,
            commission,
        });
    }

    (total, breakdown)
}

/// Combines the threshold table multiplier with optional team and company factors.
///
/// The table entry with the highest threshold the score meets wins; a table
/// with no such entry gives a multiplier of zero.
pub fn performance_multiplier(
    base_amount: Decimal,
    performance_score: Decimal,
    team_score: Option<Decimal>,
    company_score: Option<Decimal>,
    table: &[PerformanceThreshold],
) -> PerformanceBreakdown {
    let base_multiplier = table
        .iter()
        .filter(|t| performance_score >= t.threshold)
        .max_by(|a, b| a.threshold.cmp(&b.threshold))
        .map_or(Decimal::ZERO, |t| t.multiplier);

    let team_factor =
        team_score.map(|s| TEAM_FACTOR_BASE + TEAM_FACTOR_WEIGHT * s / Decimal::ONE_HUNDRED);
    let company_factor = company_score
        .map(|s| COMPANY_FACTOR_BASE + COMPANY_FACTOR_WEIGHT * s / Decimal::ONE_HUNDRED);

    let final_multiplier = base_multiplier
        * team_factor.unwrap_or(Decimal::ONE)
        * company_factor.unwrap_or(Decimal::ONE);

    PerformanceBreakdown {
        base_amount,
        performance_score,
        base_multiplier,
        team_factor,
        company_factor,
        final_multiplier,
    }
}

/// Scales `gross` by `min(1, pro_rata_days / full_period_days)`.
///
/// The result is rounded to the cent and never exceeds `gross`.
pub fn prorate(gross: Decimal, pro_rata_days: u32, full_period_days: u32) -> (Decimal, Decimal) {
    if full_period_days == 0 || pro_rata_days >= full_period_days {
        return (gross, Decimal::ONE);
    }
    let factor = Decimal::from(pro_rata_days) / Decimal::from(full_period_days);
    let prorated = (gross * factor)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .min(gross);
    (prorated, factor)
}

fn check_score(field: &str, score: Decimal, errors: &mut Vec<String>) {
    if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
        errors.push(format!("{} must be between 0 and 100, got {}", field, score));
    }
}

fn check_options(options: &BonusOptions, errors: &mut Vec<String>) {
    if options.pro_rata_days == Some(0) {
        errors.push("pro_rata_days must be greater than zero".to_string());
    }
    if options
        .superannuation_rate
        .is_some_and(|r| r < Decimal::ZERO || r > Decimal::ONE)
    {
        errors.push("superannuation_rate must be between 0 and 1".to_string());
    }
    if let (Some(start), Some(end)) = (options.pay_period_start, options.pay_period_end) {
        if start > end {
            errors.push(format!(
                "pay_period_start {} is after pay_period_end {}",
                start, end
            ));
        }
    }
}

fn reject_if_any(errors: Vec<String>) -> EngineResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidBonus { errors })
    }
}

/// Shared tail: prorate, withhold, superannuation, assemble.
fn finalize(
    employee: &EmployeeSnapshot,
    bonus_type: BonusType,
    nominal_amount: Decimal,
    payment_date: NaiveDate,
    options: &BonusOptions,
    mut details: BonusCalculationDetails,
    config: &EngineConfig,
) -> EngineResult<BonusCalculationResult> {
    let mut step_number = details.steps.len() as u32 + 1;

    let mut gross_amount = nominal_amount;
    if let Some(days) = options.pro_rata_days {
        let full_period_days = bonus_type.full_period_days();
        let (prorated, factor) = prorate(nominal_amount, days, full_period_days);
        gross_amount = prorated;
        details.steps.push(CalculationStep {
            step_number,
            rule_id: "pro_rata".to_string(),
            rule_name: "Pro-Rata Adjustment".to_string(),
            input: serde_json::json!({
                "amount": nominal_amount.normalize().to_string(),
                "pro_rata_days": days,
                "full_period_days": full_period_days,
            }),
            output: serde_json::json!({
                "factor": factor.round_dp(6).normalize().to_string(),
                "gross_amount": prorated.normalize().to_string(),
            }),
            reasoning: format!(
                "${} × {}/{} days = ${}",
                nominal_amount.normalize(),
                days.min(full_period_days),
                full_period_days,
                prorated.normalize()
            ),
        });
        step_number += 1;
        details.pro_rata = Some(ProRataAdjustment {
            pro_rata_days: days,
            full_period_days,
            factor,
            original_amount: nominal_amount,
        });
    }

    if gross_amount <= Decimal::ZERO {
        return Err(EngineError::InvalidBonus {
            errors: vec!["gross_amount after proration must be greater than zero".to_string()],
        });
    }

    let tax_method = options
        .tax_method
        .unwrap_or_else(|| bonus_type.default_tax_method());
    let withholding = withhold(
        tax_method,
        employee,
        gross_amount,
        payment_date,
        config,
        step_number,
    );
    details.steps.push(withholding.step);
    step_number += 1;
    let tax_withheld = withholding.tax_calculation.tax_withheld;

    let superannuation_amount = if options.exclude_superannuation {
        details.superannuation_rate = None;
        Decimal::ZERO
    } else {
        let rate = options
            .superannuation_rate
            .or(employee.superannuation_rate)
            .unwrap_or(config.bonuses().default_superannuation_rate);
        details.superannuation_rate = Some(rate);
        RoundingMethod::NearestCent.apply(gross_amount * rate)
    };
    details.steps.push(CalculationStep {
        step_number,
        rule_id: "superannuation".to_string(),
        rule_name: "Employer Superannuation".to_string(),
        input: serde_json::json!({
            "gross_amount": gross_amount.normalize().to_string(),
            "excluded": options.exclude_superannuation,
            "rate": details.superannuation_rate.map(|r| r.normalize().to_string()),
        }),
        output: serde_json::json!({
            "superannuation_amount": superannuation_amount.normalize().to_string(),
        }),
        reasoning: match details.superannuation_rate {
            Some(rate) => format!(
                "${} × {}% = ${}",
                gross_amount.normalize(),
                (rate * Decimal::ONE_HUNDRED).normalize(),
                superannuation_amount.normalize()
            ),
            None => "Superannuation excluded".to_string(),
        },
    });

    let net_amount = gross_amount - tax_withheld;

    info!(
        employee_id = %employee.id,
        bonus_type = ?bonus_type,
        tax_method = tax_method.as_str(),
        gross_amount = %gross_amount,
        tax_withheld = %tax_withheld,
        net_amount = %net_amount,
        "Bonus calculated"
    );

    Ok(BonusCalculationResult {
        bonus_payment: BonusPayment {
            employee_id: employee.id.clone(),
            bonus_type,
            gross_amount,
            tax_method,
            tax_withheld,
            superannuation_amount,
            net_amount,
            payment_date,
            status: BonusStatus::Calculated,
            calculation_details: details,
            approval_status: ApprovalStatus::Pending,
            is_reportable: bonus_type.is_reportable(),
            pay_period_start: options.pay_period_start,
            pay_period_end: options.pay_period_end,
        },
        tax_calculation: withholding.tax_calculation,
        warnings: withholding.warnings,
        validation_errors: Vec::new(),
    })
}
