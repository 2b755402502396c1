//! Deduction models.
//!
//! Deductions arrive from the record store in a flat shape
//! ([`DeductionRecord`]) where method parameters are optional fields. They
//! are converted into a validated [`Deduction`] whose [`DeductionRule`] is a
//! closed variant, so a deduction that cannot be evaluated is rejected when it
//! is built rather than when it is applied.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Whether a deduction is taken before or after tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// Reduces taxable income before tax is computed.
    PreTax,
    /// Taken from pay after tax; does not affect taxable income.
    PostTax,
}

/// Broad grouping of a deduction, used to pick formula rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionCategory {
    /// Voluntary superannuation contributions.
    Superannuation,
    /// Salary sacrifice arrangements.
    SalarySacrifice,
    /// Salary packaging (novated lease, meal entertainment).
    SalaryPackaging,
    /// Child support garnishee.
    ChildSupport,
    /// Union membership fees.
    UnionFees,
    /// Private health insurance.
    HealthInsurance,
    /// Court-ordered garnishment other than child support.
    Garnishment,
    /// Employee loan repayment.
    Loan,
    /// Workplace giving.
    Charity,
    /// Anything else.
    Other,
}

/// The calculation method named on a deduction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// A fixed amount per period.
    Fixed,
    /// A percentage of gross pay or taxable income.
    Percentage,
    /// A category-specific closed-form rule.
    Formula,
    /// Threshold tiers charged at individual rates.
    Tiered,
}

impl CalculationMethod {
    /// Returns the wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMethod::Fixed => "fixed",
            CalculationMethod::Percentage => "percentage",
            CalculationMethod::Formula => "formula",
            CalculationMethod::Tiered => "tiered",
        }
    }
}

/// Which figure a percentage or tiered deduction is calculated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageBase {
    /// Gross pay for the period.
    #[default]
    Gross,
    /// Taxable income at the point the deduction is applied.
    Taxable,
}

/// How the final deduction amount is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMethod {
    /// Round half away from zero to 2 decimal places.
    #[default]
    NearestCent,
    /// Round half away from zero to a whole dollar.
    NearestDollar,
    /// Round up to the next whole dollar.
    RoundUpDollar,
    /// Round down to the whole dollar.
    RoundDownDollar,
}

impl RoundingMethod {
    /// Applies this rounding method to an amount.
    ///
    /// # Example
    ///
    /// ```
    /// use compensation_engine::models::RoundingMethod;
    /// use rust_decimal::Decimal;
    ///
    /// let amount = Decimal::new(12345, 3); // 12.345
    /// assert_eq!(RoundingMethod::NearestCent.apply(amount), Decimal::new(1235, 2));
    /// assert_eq!(RoundingMethod::RoundUpDollar.apply(amount), Decimal::new(13, 0));
    /// assert_eq!(RoundingMethod::RoundDownDollar.apply(amount), Decimal::new(12, 0));
    /// ```
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            RoundingMethod::NearestCent => {
                amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            }
            RoundingMethod::NearestDollar => {
                amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
            RoundingMethod::RoundUpDollar => amount.ceil(),
            RoundingMethod::RoundDownDollar => amount.floor(),
        }
    }
}

/// Lifecycle status of a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionStatus {
    /// Applied to pay runs.
    Active,
    /// Switched off.
    Inactive,
    /// Awaiting approval.
    Pending,
}

/// A single tier of a tiered deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionTier {
    /// The portion of the base above this threshold is charged.
    pub threshold: Decimal,
    /// Rate for this tier, as a percentage (e.g. 2.5 for 2.5%).
    pub rate: Decimal,
    /// Maximum portion of the base charged in this tier.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
}

/// Closed set of category-specific formula rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaRule {
    /// Percentage of disposable income by number of children.
    ChildSupport {
        /// Number of children covered by the assessment.
        children_count: u32,
    },
    /// Percentage of gross with a minimum fee; `None` falls back to configured defaults.
    UnionFees {
        /// Rate as a fraction of gross pay.
        rate: Option<Decimal>,
        /// Minimum fee per period.
        minimum_fee: Option<Decimal>,
    },
    /// Novated lease packaging: a fixed per-period amount.
    NovatedLease {
        /// Amount packaged each period.
        amount: Decimal,
    },
    /// Meal entertainment packaging, spread over the rest of the year.
    MealEntertainment {
        /// Nominal per-period package amount.
        package_amount: Decimal,
    },
}

impl FormulaRule {
    /// Returns the formula's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            FormulaRule::ChildSupport { .. } => "child_support",
            FormulaRule::UnionFees { .. } => "union_fees",
            FormulaRule::NovatedLease { .. } => "novated_lease",
            FormulaRule::MealEntertainment { .. } => "meal_entertainment",
        }
    }
}

/// How a deduction's raw amount is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeductionRule {
    /// A fixed amount each period.
    Fixed {
        /// The amount.
        amount: Decimal,
    },
    /// A percentage of the configured base.
    Percentage {
        /// The percentage (e.g. 5 for 5%).
        percentage: Decimal,
    },
    /// Tiers summed over the configured base.
    Tiered {
        /// Tiers in caller-supplied order.
        tiers: Vec<DeductionTier>,
    },
    /// A category-specific formula.
    Formula(FormulaRule),
}

impl DeductionRule {
    /// Returns the calculation method this rule implements.
    pub fn method(&self) -> CalculationMethod {
        match self {
            DeductionRule::Fixed { .. } => CalculationMethod::Fixed,
            DeductionRule::Percentage { .. } => CalculationMethod::Percentage,
            DeductionRule::Tiered { .. } => CalculationMethod::Tiered,
            DeductionRule::Formula(_) => CalculationMethod::Formula,
        }
    }
}

/// A deduction as stored by the record store.
///
/// Every method parameter is optional here; [`Deduction::try_from`] checks
/// that the ones the method needs are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRecord {
    /// Unique identifier for the deduction.
    pub id: String,
    /// The employee the deduction belongs to.
    pub employee_id: String,
    /// Display name (e.g. "Meal Entertainment").
    pub name: String,
    /// Pre-tax or post-tax.
    pub deduction_type: DeductionType,
    /// Broad grouping.
    pub category: DeductionCategory,
    /// How the amount is calculated.
    pub calculation_method: CalculationMethod,
    /// Fixed amount, or the packaged amount for salary packaging formulas.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Percentage for the percentage method (e.g. 5 for 5%).
    #[serde(default)]
    pub percentage: Option<Decimal>,
    /// Base for percentage and tiered methods.
    #[serde(default)]
    pub base_for_percentage: PercentageBase,
    /// Floor applied to the raw amount.
    #[serde(default)]
    pub minimum_amount: Option<Decimal>,
    /// Ceiling applied to the raw amount.
    #[serde(default)]
    pub maximum_amount: Option<Decimal>,
    /// Maximum total per calendar year.
    #[serde(default)]
    pub annual_cap: Option<Decimal>,
    /// Rounding applied to the final amount.
    #[serde(default)]
    pub rounding_method: RoundingMethod,
    /// Higher priorities are applied first.
    #[serde(default)]
    pub priority: i32,
    /// Formula name for the formula method (e.g. "meal_entertainment").
    #[serde(default)]
    pub formula: Option<String>,
    /// Named numeric parameters for the formula.
    #[serde(default)]
    pub formula_parameters: BTreeMap<String, Decimal>,
    /// Tiers for the tiered method.
    #[serde(default)]
    pub tiers: Option<Vec<DeductionTier>>,
    /// First date the deduction applies.
    pub start_date: NaiveDate,
    /// Last date the deduction applies.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: DeductionStatus,
}

/// A validated deduction ready for the pipeline.
///
/// Serializes to and from the flat [`DeductionRecord`] shape; deserializing
/// runs the same validation as [`Deduction::try_from`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DeductionRecord", into = "DeductionRecord")]
pub struct Deduction {
    /// Unique identifier for the deduction.
    pub id: String,
    /// The employee the deduction belongs to.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Pre-tax or post-tax.
    pub deduction_type: DeductionType,
    /// Broad grouping.
    pub category: DeductionCategory,
    /// How the raw amount is computed.
    pub rule: DeductionRule,
    /// Base for percentage and tiered rules.
    pub base_for_percentage: PercentageBase,
    /// Floor applied to the raw amount.
    pub minimum_amount: Option<Decimal>,
    /// Ceiling applied to the raw amount.
    pub maximum_amount: Option<Decimal>,
    /// Maximum total per calendar year.
    pub annual_cap: Option<Decimal>,
    /// Rounding applied to the final amount.
    pub rounding_method: RoundingMethod,
    /// Higher priorities are applied first.
    pub priority: i32,
    /// First date the deduction applies.
    pub start_date: NaiveDate,
    /// Last date the deduction applies.
    pub end_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: DeductionStatus,
}

impl Deduction {
    /// Returns true if the deduction applies to a period starting on `period_start`.
    ///
    /// A deduction is effective when it is active, has started on or before
    /// the period start, and has not ended before it.
    pub fn is_effective_for(&self, period_start: NaiveDate) -> bool {
        self.status == DeductionStatus::Active
            && self.start_date <= period_start
            && self.end_date.is_none_or(|end| end >= period_start)
    }

    /// Returns true for pre-tax deductions.
    pub fn is_pre_tax(&self) -> bool {
        self.deduction_type == DeductionType::PreTax
    }

    /// Returns true if the amount depends on the year-to-date ledger.
    ///
    /// Only capped deductions and meal entertainment packaging read it.
    pub fn tracks_ytd(&self) -> bool {
        self.annual_cap.is_some()
            || matches!(
                self.rule,
                DeductionRule::Formula(FormulaRule::MealEntertainment { .. })
            )
    }
}

impl TryFrom<DeductionRecord> for Deduction {
    type Error = EngineError;

    fn try_from(record: DeductionRecord) -> Result<Self, Self::Error> {
        let invalid = |message: String| EngineError::InvalidDeduction {
            deduction_id: record.id.clone(),
            message,
        };

        if let Some(end) = record.end_date {
            if record.start_date > end {
                return Err(invalid(format!(
                    "start_date {} is after end_date {}",
                    record.start_date, end
                )));
            }
        }
        if let (Some(min), Some(max)) = (record.minimum_amount, record.maximum_amount) {
            if min > max {
                return Err(invalid(format!(
                    "minimum_amount {} exceeds maximum_amount {}",
                    min, max
                )));
            }
        }
        if record.annual_cap.is_some_and(|cap| cap < Decimal::ZERO) {
            return Err(invalid("annual_cap cannot be negative".to_string()));
        }

        let rule = build_rule(&record)?;

        Ok(Deduction {
            id: record.id,
            employee_id: record.employee_id,
            name: record.name,
            deduction_type: record.deduction_type,
            category: record.category,
            rule,
            base_for_percentage: record.base_for_percentage,
            minimum_amount: record.minimum_amount,
            maximum_amount: record.maximum_amount,
            annual_cap: record.annual_cap,
            rounding_method: record.rounding_method,
            priority: record.priority,
            start_date: record.start_date,
            end_date: record.end_date,
            status: record.status,
        })
    }
}

fn missing(record: &DeductionRecord, field: &str) -> EngineError {
    EngineError::MissingParameter {
        deduction_id: record.id.clone(),
        method: record.calculation_method.as_str().to_string(),
        field: field.to_string(),
    }
}

fn build_rule(record: &DeductionRecord) -> Result<DeductionRule, EngineError> {
    match record.calculation_method {
        CalculationMethod::Fixed => {
            let amount = record.amount.ok_or_else(|| missing(record, "amount"))?;
            if amount < Decimal::ZERO {
                return Err(EngineError::InvalidDeduction {
                    deduction_id: record.id.clone(),
                    message: "amount cannot be negative".to_string(),
                });
            }
            Ok(DeductionRule::Fixed { amount })
        }
        CalculationMethod::Percentage => {
            let percentage = record
                .percentage
                .ok_or_else(|| missing(record, "percentage"))?;
            if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                return Err(EngineError::InvalidDeduction {
                    deduction_id: record.id.clone(),
                    message: format!("percentage {} must be between 0 and 100", percentage),
                });
            }
            Ok(DeductionRule::Percentage { percentage })
        }
        CalculationMethod::Tiered => {
            let tiers = record.tiers.clone().ok_or_else(|| missing(record, "tiers"))?;
            Ok(DeductionRule::Tiered { tiers })
        }
        CalculationMethod::Formula => Ok(DeductionRule::Formula(build_formula(record)?)),
    }
}

fn build_formula(record: &DeductionRecord) -> Result<FormulaRule, EngineError> {
    let name = match (&record.formula, record.category) {
        (Some(formula), _) => formula.trim().to_lowercase().replace('-', "_"),
        (None, DeductionCategory::ChildSupport) => "child_support".to_string(),
        (None, DeductionCategory::UnionFees) => "union_fees".to_string(),
        (None, _) => return Err(missing(record, "formula")),
    };

    match name.as_str() {
        "child_support" => {
            let count = record
                .formula_parameters
                .get("children_count")
                .ok_or_else(|| missing(record, "formula_parameters.children_count"))?;
            let whole = if count.fract().is_zero() {
                count.to_u32()
            } else {
                None
            };
            let children_count = whole.ok_or_else(|| EngineError::InvalidDeduction {
                deduction_id: record.id.clone(),
                message: format!("children_count {} must be a whole number", count),
            })?;
            Ok(FormulaRule::ChildSupport { children_count })
        }
        "union_fees" => Ok(FormulaRule::UnionFees {
            rate: record.formula_parameters.get("union_rate").copied(),
            minimum_fee: record.formula_parameters.get("minimum_fee").copied(),
        }),
        "novated_lease" => Ok(FormulaRule::NovatedLease {
            amount: record.amount.ok_or_else(|| missing(record, "amount"))?,
        }),
        "meal_entertainment" => Ok(FormulaRule::MealEntertainment {
            package_amount: record.amount.ok_or_else(|| missing(record, "amount"))?,
        }),
        other => Err(EngineError::InvalidDeduction {
            deduction_id: record.id.clone(),
            message: format!("unknown formula '{}'", other),
        }),
    }
}

impl From<Deduction> for DeductionRecord {
    fn from(deduction: Deduction) -> Self {
        let calculation_method = deduction.rule.method();
        let mut amount = None;
        let mut percentage = None;
        let mut formula = None;
        let mut formula_parameters = BTreeMap::new();
        let mut tiers = None;

        match deduction.rule {
            DeductionRule::Fixed { amount: a } => amount = Some(a),
            DeductionRule::Percentage { percentage: p } => percentage = Some(p),
            DeductionRule::Tiered { tiers: t } => tiers = Some(t),
            DeductionRule::Formula(rule) => {
                formula = Some(rule.name().to_string());
                match rule {
                    FormulaRule::ChildSupport { children_count } => {
                        formula_parameters
                            .insert("children_count".to_string(), Decimal::from(children_count));
                    }
                    FormulaRule::UnionFees { rate, minimum_fee } => {
                        if let Some(rate) = rate {
                            formula_parameters.insert("union_rate".to_string(), rate);
                        }
                        if let Some(fee) = minimum_fee {
                            formula_parameters.insert("minimum_fee".to_string(), fee);
                        }
                    }
                    FormulaRule::NovatedLease { amount: a } => amount = Some(a),
                    FormulaRule::MealEntertainment { package_amount } => {
                        amount = Some(package_amount)
                    }
                }
            }
        }

        DeductionRecord {
            id: deduction.id,
            employee_id: deduction.employee_id,
            name: deduction.name,
            deduction_type: deduction.deduction_type,
            category: deduction.category,
            calculation_method,
            amount,
            percentage,
            base_for_percentage: deduction.base_for_percentage,
            minimum_amount: deduction.minimum_amount,
            maximum_amount: deduction.maximum_amount,
            annual_cap: deduction.annual_cap,
            rounding_method: deduction.rounding_method,
            priority: deduction.priority,
            formula,
            formula_parameters,
            tiers,
            start_date: deduction.start_date,
            end_date: deduction.end_date,
            status: deduction.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_record(method: CalculationMethod) -> DeductionRecord {
        DeductionRecord {
            id: "ded_001".to_string(),
            employee_id: "emp_001".to_string(),
            name: "Test Deduction".to_string(),
            deduction_type: DeductionType::PreTax,
            category: DeductionCategory::Other,
            calculation_method: method,
            amount: None,
            percentage: None,
            base_for_percentage: PercentageBase::Gross,
            minimum_amount: None,
            maximum_amount: None,
            annual_cap: None,
            rounding_method: RoundingMethod::NearestCent,
            priority: 10,
            formula: None,
            formula_parameters: BTreeMap::new(),
            tiers: None,
            start_date: date(2025, 1, 1),
            end_date: None,
            status: DeductionStatus::Active,
        }
    }

    #[test]
    fn test_fixed_requires_amount() {
        let record = base_record(CalculationMethod::Fixed);
        match Deduction::try_from(record) {
            Err(EngineError::MissingParameter { method, field, .. }) => {
                assert_eq!(method, "fixed");
                assert_eq!(field, "amount");
            }
            other => panic!("Expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_percentage_requires_percentage() {
        let record = base_record(CalculationMethod::Percentage);
        match Deduction::try_from(record) {
            Err(EngineError::MissingParameter { field, .. }) => assert_eq!(field, "percentage"),
            other => panic!("Expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_percentage_out_of_range_is_invalid() {
        let mut record = base_record(CalculationMethod::Percentage);
        record.percentage = Some(dec("150"));
        assert!(matches!(
            Deduction::try_from(record),
            Err(EngineError::InvalidDeduction { .. })
        ));
    }

    #[test]
    fn test_start_after_end_is_invalid() {
        let mut record = base_record(CalculationMethod::Fixed);
        record.amount = Some(dec("50"));
        record.end_date = Some(date(2024, 12, 31));
        match Deduction::try_from(record) {
            Err(EngineError::InvalidDeduction { message, .. }) => {
                assert!(message.contains("after end_date"))
            }
            other => panic!("Expected InvalidDeduction, got {:?}", other),
        }
    }

    #[test]
    fn test_minimum_above_maximum_is_invalid() {
        let mut record = base_record(CalculationMethod::Fixed);
        record.amount = Some(dec("50"));
        record.minimum_amount = Some(dec("100"));
        record.maximum_amount = Some(dec("20"));
        assert!(matches!(
            Deduction::try_from(record),
            Err(EngineError::InvalidDeduction { .. })
        ));
    }

    #[test]
    fn test_child_support_formula_from_category() {
        let mut record = base_record(CalculationMethod::Formula);
        record.category = DeductionCategory::ChildSupport;
        record
            .formula_parameters
            .insert("children_count".to_string(), dec("2"));
        let deduction = Deduction::try_from(record).unwrap();
        assert_eq!(
            deduction.rule,
            DeductionRule::Formula(FormulaRule::ChildSupport { children_count: 2 })
        );
    }

    #[test]
    fn test_child_support_requires_children_count() {
        let mut record = base_record(CalculationMethod::Formula);
        record.category = DeductionCategory::ChildSupport;
        match Deduction::try_from(record) {
            Err(EngineError::MissingParameter { field, .. }) => {
                assert_eq!(field, "formula_parameters.children_count")
            }
            other => panic!("Expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_salary_packaging_requires_formula_name() {
        let mut record = base_record(CalculationMethod::Formula);
        record.category = DeductionCategory::SalaryPackaging;
        record.amount = Some(dec("500"));
        match Deduction::try_from(record) {
            Err(EngineError::MissingParameter { field, .. }) => assert_eq!(field, "formula"),
            other => panic!("Expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_meal_entertainment_accepts_hyphenated_name() {
        let mut record = base_record(CalculationMethod::Formula);
        record.category = DeductionCategory::SalaryPackaging;
        record.formula = Some("meal-entertainment".to_string());
        record.amount = Some(dec("500"));
        let deduction = Deduction::try_from(record).unwrap();
        assert_eq!(
            deduction.rule,
            DeductionRule::Formula(FormulaRule::MealEntertainment {
                package_amount: dec("500")
            })
        );
    }

    #[test]
    fn test_unknown_formula_is_invalid() {
        let mut record = base_record(CalculationMethod::Formula);
        record.formula = Some("lottery".to_string());
        assert!(matches!(
            Deduction::try_from(record),
            Err(EngineError::InvalidDeduction { .. })
        ));
    }

    #[test]
    fn test_is_effective_for() {
        let mut record = base_record(CalculationMethod::Fixed);
        record.amount = Some(dec("50"));
        record.start_date = date(2025, 2, 1);
        record.end_date = Some(date(2025, 6, 30));
        let deduction = Deduction::try_from(record).unwrap();

        assert!(!deduction.is_effective_for(date(2025, 1, 15)));
        assert!(deduction.is_effective_for(date(2025, 2, 1)));
        assert!(deduction.is_effective_for(date(2025, 6, 30)));
        assert!(!deduction.is_effective_for(date(2025, 7, 1)));
    }

    #[test]
    fn test_inactive_deduction_is_not_effective() {
        let mut record = base_record(CalculationMethod::Fixed);
        record.amount = Some(dec("50"));
        record.status = DeductionStatus::Pending;
        let deduction = Deduction::try_from(record).unwrap();
        assert!(!deduction.is_effective_for(date(2025, 3, 1)));
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let json = r#"{
            "id": "ded_002",
            "employee_id": "emp_001",
            "name": "Union",
            "deduction_type": "post_tax",
            "category": "union_fees",
            "calculation_method": "percentage",
            "start_date": "2025-01-01",
            "status": "active"
        }"#;
        let err = serde_json::from_str::<Deduction>(json).unwrap_err();
        assert!(err.to_string().contains("missing 'percentage'"));
    }

    #[test]
    fn test_deserialize_tiered_deduction_with_defaults() {
        let json = r#"{
            "id": "ded_003",
            "employee_id": "emp_001",
            "name": "Garnishee",
            "deduction_type": "post_tax",
            "category": "garnishment",
            "calculation_method": "tiered",
            "tiers": [
                {"threshold": "1000", "rate": "10"},
                {"threshold": "500", "rate": "5", "max_amount": "500"}
            ],
            "start_date": "2025-01-01",
            "status": "active"
        }"#;
        let deduction: Deduction = serde_json::from_str(json).unwrap();
        assert_eq!(deduction.rounding_method, RoundingMethod::NearestCent);
        assert_eq!(deduction.base_for_percentage, PercentageBase::Gross);
        assert_eq!(deduction.priority, 0);
        match deduction.rule {
            DeductionRule::Tiered { tiers } => assert_eq!(tiers.len(), 2),
            other => panic!("Expected tiered rule, got {:?}", other),
        }
    }

    #[test]
    fn test_serializes_back_to_flat_record() {
        let mut record = base_record(CalculationMethod::Formula);
        record.category = DeductionCategory::UnionFees;
        record
            .formula_parameters
            .insert("union_rate".to_string(), dec("0.015"));
        let deduction = Deduction::try_from(record).unwrap();

        let json = serde_json::to_value(&deduction).unwrap();
        assert_eq!(json["calculation_method"], "formula");
        assert_eq!(json["formula"], "union_fees");
        assert_eq!(json["formula_parameters"]["union_rate"], "0.015");
    }

    #[test]
    fn test_rounding_methods() {
        assert_eq!(RoundingMethod::NearestCent.apply(dec("10.005")), dec("10.01"));
        assert_eq!(RoundingMethod::NearestDollar.apply(dec("10.50")), dec("11"));
        assert_eq!(RoundingMethod::NearestDollar.apply(dec("10.49")), dec("10"));
        assert_eq!(RoundingMethod::RoundUpDollar.apply(dec("10.01")), dec("11"));
        assert_eq!(RoundingMethod::RoundDownDollar.apply(dec("10.99")), dec("10"));
    }
}
