//! Bonus withholding strategies.
//!
//! Each [`BonusTaxMethod`] maps to a pure function over the employee's
//! regular pay and the bonus amount. [`withhold`] dispatches to the chosen
//! method, rounds the result to the cent, and reports the Medicare levy as a
//! separate line item for the methods that carry one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{EngineConfig, EtpSettings};
use crate::models::{
    BonusTaxMethod, CalculationStep, CalculationWarning, EmployeeSnapshot, PayFrequency,
    RoundingMethod, TaxCalculation,
};

use super::tax_scale::TaxScale;

/// Unrounded output of a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    /// Tax to withhold before rounding.
    pub tax: Decimal,
    /// Method-specific figures.
    pub details: serde_json::Value,
    /// Human-readable explanation.
    pub reasoning: String,
}

/// The result of applying a withholding method to a bonus.
#[derive(Debug, Clone)]
pub struct WithholdingResult {
    /// Withholding breakdown.
    pub tax_calculation: TaxCalculation,
    /// Warnings raised by the method.
    pub warnings: Vec<CalculationWarning>,
    /// The calculation step recording this decision.
    pub step: CalculationStep,
}

/// Marginal rates: tax on regular income plus the bonus, less tax on regular income.
pub fn marginal_rates(scale: &TaxScale, annual_regular: Decimal, bonus: Decimal) -> StrategyOutcome {
    let tax_without = scale.tax_on_annual_income(annual_regular);
    let tax_with = scale.tax_on_annual_income(annual_regular + bonus);
    let tax = (tax_with - tax_without).max(Decimal::ZERO);

    StrategyOutcome {
        tax,
        details: serde_json::json!({
            "annual_regular_income": annual_regular.normalize().to_string(),
            "tax_without_bonus": tax_without.normalize().to_string(),
            "tax_with_bonus": tax_with.normalize().to_string(),
            "top_marginal_rate": scale.marginal_rate(annual_regular + bonus).normalize().to_string(),
        }),
        reasoning: format!(
            "Tax on ${} less tax on ${} = ${}",
            (annual_regular + bonus).normalize(),
            annual_regular.normalize(),
            tax.round_dp(2).normalize()
        ),
    }
}

/// Periodic schedule: the bonus is added to one period's pay and both figures
/// are annualized at the employee's pay frequency.
///
/// `annual_regular` is one period's pay times the periods per year, so the
/// combined figure is `annual_regular + bonus * n`.
pub fn schedule_5(
    scale: &TaxScale,
    frequency: PayFrequency,
    annual_regular: Decimal,
    bonus: Decimal,
) -> StrategyOutcome {
    let periods = Decimal::from(frequency.periods_per_year());
    let period_tax_without = scale.tax_on_annual_income(annual_regular) / periods;
    let period_tax_with = scale.tax_on_annual_income(annual_regular + bonus * periods) / periods;
    let tax = (period_tax_with - period_tax_without).max(Decimal::ZERO);

    StrategyOutcome {
        tax,
        details: serde_json::json!({
            "pay_frequency": frequency.as_str(),
            "periods_per_year": frequency.periods_per_year(),
            "period_regular_pay": frequency.de_annualize(annual_regular).round_dp(2).normalize().to_string(),
            "period_tax_without_bonus": period_tax_without.round_dp(2).normalize().to_string(),
            "period_tax_with_bonus": period_tax_with.round_dp(2).normalize().to_string(),
        }),
        reasoning: format!(
            "{} withholding on regular pay plus bonus (${}) less withholding on regular pay (${})",
            frequency.as_str(),
            period_tax_with.round_dp(2).normalize(),
            period_tax_without.round_dp(2).normalize()
        ),
    }
}

/// Average rates: the regular income's average tax rate applied to the bonus.
pub fn average_rates(scale: &TaxScale, annual_regular: Decimal, bonus: Decimal) -> StrategyOutcome {
    if annual_regular <= Decimal::ZERO {
        return StrategyOutcome {
            tax: Decimal::ZERO,
            details: serde_json::json!({
                "annual_regular_income": annual_regular.normalize().to_string(),
                "average_rate": "0",
            }),
            reasoning: "No regular income, average rate is zero".to_string(),
        };
    }

    let regular_tax = scale.tax_on_annual_income(annual_regular);
    let average_rate = regular_tax / annual_regular;
    let tax = bonus * average_rate;

    StrategyOutcome {
        tax,
        details: serde_json::json!({
            "annual_regular_income": annual_regular.normalize().to_string(),
            "regular_tax": regular_tax.normalize().to_string(),
            "average_rate": average_rate.round_dp(6).normalize().to_string(),
        }),
        reasoning: format!(
            "${} at average rate {}% = ${}",
            bonus.normalize(),
            (average_rate * Decimal::ONE_HUNDRED).round_dp(4).normalize(),
            tax.round_dp(2).normalize()
        ),
    }
}

/// Fixed rate: a flat percentage of the bonus.
pub fn fixed_rate(rate: Decimal, bonus: Decimal) -> StrategyOutcome {
    let tax = bonus * rate;
    StrategyOutcome {
        tax,
        details: serde_json::json!({ "rate": rate.normalize().to_string() }),
        reasoning: format!(
            "${} at flat {}% = ${}",
            bonus.normalize(),
            (rate * Decimal::ONE_HUNDRED).normalize(),
            tax.round_dp(2).normalize()
        ),
    }
}

/// Employment termination payment: a tax-free portion, then a concessional or
/// top rate on the rest.
pub fn etp(settings: &EtpSettings, age: u32, years_of_service: u32, bonus: Decimal) -> StrategyOutcome {
    let tax_free = bonus.min(settings.tax_free_cap).max(Decimal::ZERO);
    let taxable = bonus - tax_free;
    let concessional = (age >= settings.preservation_age
        && years_of_service >= settings.minimum_service_years)
        || taxable <= settings.lower_rate_cap;
    let rate = if concessional {
        settings.lower_rate
    } else {
        settings.upper_rate
    };
    let tax = taxable * rate;

    StrategyOutcome {
        tax,
        details: serde_json::json!({
            "tax_free_component": tax_free.normalize().to_string(),
            "taxable_component": taxable.normalize().to_string(),
            "age": age,
            "years_of_service": years_of_service,
            "rate": rate.normalize().to_string(),
        }),
        reasoning: format!(
            "${} tax free, ${} taxable at {}%",
            tax_free.normalize(),
            taxable.normalize(),
            (rate * Decimal::ONE_HUNDRED).normalize()
        ),
    }
}

/// Applies a withholding method to a bonus.
///
/// # Arguments
///
/// * `method` - The withholding method
/// * `employee` - The employee; regular pay is the annualized base salary
/// * `gross_bonus` - Bonus amount after proration
/// * `payment_date` - Date of payment, used for age and service
/// * `config` - Statutory settings
/// * `step_number` - The step number for trace sequencing
///
/// # Example
///
/// ```
/// use compensation_engine::calculation::withhold;
/// use compensation_engine::config::EngineConfig;
/// use compensation_engine::models::{BonusTaxMethod, EmployeeSnapshot, EmploymentType, PayFrequency};
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
///
/// let result = withhold(
///     BonusTaxMethod::MarginalRates,
///     &employee,
///     Decimal::new(5000, 0),
///     NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
///     &EngineConfig::default(),
///     1,
/// );
/// // 5,000 falls entirely in the 32.5% bracket
/// assert_eq!(result.tax_calculation.tax_withheld, Decimal::new(162500, 2));
/// ```
pub fn withhold(
    method: BonusTaxMethod,
    employee: &EmployeeSnapshot,
    gross_bonus: Decimal,
    payment_date: NaiveDate,
    config: &EngineConfig,
    step_number: u32,
) -> WithholdingResult {
    let scale = config.tax_scale();
    let settings = config.bonuses();
    let annual_regular = employee.regular_gross_pay();

    let outcome = match method {
        BonusTaxMethod::MarginalRates => marginal_rates(scale, annual_regular, gross_bonus),
        BonusTaxMethod::Schedule5 => {
            schedule_5(scale, employee.pay_frequency, annual_regular, gross_bonus)
        }
        BonusTaxMethod::AverageRates => average_rates(scale, annual_regular, gross_bonus),
        BonusTaxMethod::FixedRate => fixed_rate(settings.fixed_rate, gross_bonus),
        BonusTaxMethod::Etp => etp(
            &settings.etp,
            employee.age_on(payment_date),
            employee.years_of_service_on(payment_date),
            gross_bonus,
        ),
    };

    let tax_withheld = RoundingMethod::NearestCent
        .apply(outcome.tax.max(Decimal::ZERO))
        .min(gross_bonus.max(Decimal::ZERO));
    let medicare_levy = method
        .reports_medicare_levy()
        .then(|| RoundingMethod::NearestCent.apply(gross_bonus * settings.medicare_levy_rate));
    let total_tax_liability = tax_withheld + medicare_levy.unwrap_or(Decimal::ZERO);
    let effective_rate = if gross_bonus > Decimal::ZERO {
        (tax_withheld / gross_bonus).round_dp(4)
    } else {
        Decimal::ZERO
    };

    let mut warnings = Vec::new();
    if method == BonusTaxMethod::FixedRate {
        warnings.push(CalculationWarning::new(
            "FIXED_RATE_APPLIED",
            format!(
                "Flat {}% withholding applied; this method may not suit all bonus types",
                (settings.fixed_rate * Decimal::ONE_HUNDRED).normalize()
            ),
            "medium",
        ));
        if let Some(levy) = medicare_levy {
            warnings.push(CalculationWarning::new(
                "MEDICARE_LEVY_DOUBLE_COUNTED",
                format!(
                    "The flat rate already includes the Medicare levy; the separate ${} Medicare line item counts it twice in total_tax_liability",
                    levy.normalize()
                ),
                "medium",
            ));
        }
    }

    debug!(
        employee_id = %employee.id,
        method = method.as_str(),
        gross_bonus = %gross_bonus,
        tax_withheld = %tax_withheld,
        "Bonus withholding calculated"
    );

    let step = CalculationStep {
        step_number,
        rule_id: format!("bonus_tax_{}", method.as_str()),
        rule_name: "Bonus Tax Withholding".to_string(),
        input: serde_json::json!({
            "method": method.as_str(),
            "gross_bonus": gross_bonus.normalize().to_string(),
            "annual_regular_income": annual_regular.normalize().to_string(),
        }),
        output: serde_json::json!({
            "tax_withheld": tax_withheld.normalize().to_string(),
            "medicare_levy": medicare_levy.map(|m| m.normalize().to_string()),
            "total_tax_liability": total_tax_liability.normalize().to_string(),
        }),
        reasoning: outcome.reasoning.clone(),
    };

    WithholdingResult {
        tax_calculation: TaxCalculation {
            method,
            taxable_amount: gross_bonus,
            tax_withheld,
            medicare_levy,
            total_tax_liability,
            effective_rate,
            details: outcome.details,
            reasoning: outcome.reasoning,
        },
        warnings,
        step,
    }
}
