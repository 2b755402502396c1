//! Year-to-date tracking for annual deduction caps.
//!
//! The engine never owns the ledger. Callers supply a read snapshot through
//! [`YtdLedger`] and append [`LedgerEntry`] rows after persisting a result.
//! Two calculations reading the same stale snapshot can jointly exceed a cap;
//! callers must serialize per `(employee_id, deduction_id, year)`.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationWarning, Deduction, LedgerEntry};

/// Read contract for deductions applied so far this calendar year.
pub trait YtdLedger {
    /// Sum of amounts applied from January 1 through `as_of`, inclusive,
    /// in the calendar year containing `as_of`.
    fn ytd_deduction_amount(
        &self,
        employee_id: &str,
        deduction_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<Decimal>;
}

/// Read contract for an employee's deductions.
pub trait DeductionSource {
    /// Deductions effective for a period starting `as_of`, in fetch order.
    fn effective_deductions(&self, employee_id: &str, as_of: NaiveDate)
    -> EngineResult<Vec<Deduction>>;
}

impl DeductionSource for [Deduction] {
    fn effective_deductions(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<Vec<Deduction>> {
        Ok(self
            .iter()
            .filter(|d| d.employee_id == employee_id && d.is_effective_for(as_of))
            .cloned()
            .collect())
    }
}

/// An in-memory ledger built from supplied entries.
///
/// # Example
///
/// ```
/// use compensation_engine::calculation::{YtdLedger, YtdSnapshot};
/// use compensation_engine::models::LedgerEntry;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut ledger = YtdSnapshot::default();
/// ledger.record([LedgerEntry {
///     employee_id: "emp_001".to_string(),
///     deduction_id: "ded_super".to_string(),
///     date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
///     amount: Decimal::new(500, 0),
/// }]);
///
/// let ytd = ledger
///     .ytd_deduction_amount("emp_001", "ded_super", NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
///     .unwrap();
/// assert_eq!(ytd, Decimal::new(500, 0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdSnapshot {
    entries: Vec<LedgerEntry>,
}

impl YtdSnapshot {
    /// Creates a snapshot from existing ledger rows.
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Appends rows, typically from [`crate::models::DeductionCalculationResult::ledger_entries`].
    pub fn record(&mut self, entries: impl IntoIterator<Item = LedgerEntry>) {
        self.entries.extend(entries);
    }

    /// Returns every row held.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }
}

impl YtdLedger for YtdSnapshot {
    fn ytd_deduction_amount(
        &self,
        employee_id: &str,
        deduction_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<Decimal> {
        Ok(self
            .entries
            .iter()
            .filter(|e| {
                e.employee_id == employee_id
                    && e.deduction_id == deduction_id
                    && e.date.year() == as_of.year()
                    && e.date <= as_of
            })
            .map(|e| e.amount)
            .sum())
    }
}

/// What to do when the ledger cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFailurePolicy {
    /// Treat the year-to-date total as zero and record a warning.
    #[default]
    FailOpen,
    /// Return the ledger error to the caller.
    Propagate,
}

/// A year-to-date lookup, with the warning raised if the ledger failed open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtdLookup {
    /// Amount applied so far this year.
    pub amount: Decimal,
    /// Set when the ledger was unavailable and the policy allowed zero.
    pub warning: Option<CalculationWarning>,
}

/// Applies a [`LedgerFailurePolicy`] around a [`YtdLedger`].
#[derive(Debug)]
pub struct AnnualCapTracker<'a, L: YtdLedger + ?Sized> {
    ledger: &'a L,
    policy: LedgerFailurePolicy,
}

impl<'a, L: YtdLedger + ?Sized> AnnualCapTracker<'a, L> {
    /// Creates a tracker over `ledger`.
    pub fn new(ledger: &'a L, policy: LedgerFailurePolicy) -> Self {
        Self { ledger, policy }
    }

    /// Looks up the year-to-date amount for a deduction.
    ///
    /// Only [`EngineError::LedgerUnavailable`] is subject to the failure
    /// policy; any other error is returned unchanged.
    pub fn ytd_amount(
        &self,
        employee_id: &str,
        deduction_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<YtdLookup> {
        match self.ledger.ytd_deduction_amount(employee_id, deduction_id, as_of) {
            Ok(amount) => Ok(YtdLookup {
                amount,
                warning: None,
            }),
            Err(err) if err.is_ledger_failure() && self.policy == LedgerFailurePolicy::FailOpen => {
                warn!(
                    employee_id = %employee_id,
                    deduction_id = %deduction_id,
                    as_of = %as_of,
                    error = %err,
                    "YTD ledger unavailable, treating year-to-date amount as zero"
                );
                Ok(YtdLookup {
                    amount: Decimal::ZERO,
                    warning: Some(CalculationWarning::new(
                        "YTD_LEDGER_UNAVAILABLE",
                        format!(
                            "Year-to-date total for deduction '{}' could not be read; annual cap applied as if nothing had been deducted this year ({})",
                            deduction_id, err
                        ),
                        "high",
                    )),
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Headroom left under an annual cap; never negative.
pub fn remaining_cap(annual_cap: Decimal, ytd_amount: Decimal) -> Decimal {
    (annual_cap - ytd_amount).max(Decimal::ZERO)
}
