//! Pay period and pay frequency models.
//!
//! This module contains the [`PayPeriod`] and [`PayFrequency`] types used to
//! define the calculation context, plus the annualization helpers that every
//! tax estimate in the engine goes through.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Paid every week (52 periods per year).
    Weekly,
    /// Paid every two weeks (26 periods per year).
    Fortnightly,
    /// Paid every calendar month (12 periods per year).
    Monthly,
    /// Paid every quarter (4 periods per year).
    Quarterly,
    /// Paid once per year.
    Annually,
}

impl PayFrequency {
    /// Returns the number of pay periods in a year.
    ///
    /// # Example
    ///
    /// ```
    /// use compensation_engine::models::PayFrequency;
    ///
    /// assert_eq!(PayFrequency::Fortnightly.periods_per_year(), 26);
    /// ```
    pub fn periods_per_year(self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Fortnightly => 26,
            PayFrequency::Monthly => 12,
            PayFrequency::Quarterly => 4,
            PayFrequency::Annually => 1,
        }
    }

    /// Scales a per-period amount up to a yearly amount.
    pub fn annualize(self, period_amount: Decimal) -> Decimal {
        period_amount * Decimal::from(self.periods_per_year())
    }

    /// Scales a yearly amount down to a per-period amount.
    pub fn de_annualize(self, annual_amount: Decimal) -> Decimal {
        annual_amount / Decimal::from(self.periods_per_year())
    }

    /// Returns the wire name of the frequency (e.g. "fortnightly").
    pub fn as_str(self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Fortnightly => "fortnightly",
            PayFrequency::Monthly => "monthly",
            PayFrequency::Quarterly => "quarterly",
            PayFrequency::Annually => "annually",
        }
    }
}

/// Represents a pay period with its date range and frequency.
///
/// # Example
///
/// ```
/// use compensation_engine::models::{PayFrequency, PayPeriod};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
///     frequency: PayFrequency::Fortnightly,
/// };
///
/// assert_eq!(period.frequency.periods_per_year(), 26);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// How often this pay cycle recurs.
    pub frequency: PayFrequency,
}

impl PayPeriod {
    /// Counts the pay periods left in the calendar year, including this one.
    ///
    /// Weekly and fortnightly cycles count the days from `start_date` through
    /// December 31 and round up; monthly and quarterly cycles count calendar
    /// months and quarters. The result is never less than 1.
    ///
    /// # Example
    ///
    /// ```
    /// use compensation_engine::models::{PayFrequency, PayPeriod};
    /// use chrono::NaiveDate;
    ///
    /// let period = PayPeriod {
    ///     start_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
    ///     frequency: PayFrequency::Monthly,
    /// };
    ///
    /// assert_eq!(period.remaining_periods_in_year(), 3);
    /// ```
    pub fn remaining_periods_in_year(&self) -> u32 {
        let start = self.start_date;
        let remaining = match self.frequency {
            PayFrequency::Weekly => days_left_in_year(start).div_ceil(7),
            PayFrequency::Fortnightly => days_left_in_year(start).div_ceil(14),
            PayFrequency::Monthly => 13 - start.month(),
            PayFrequency::Quarterly => 4 - (start.month() - 1) / 3,
            PayFrequency::Annually => 1,
        };
        remaining.max(1)
    }
}

/// Days from `date` through December 31 of the same year, inclusive.
fn days_left_in_year(date: NaiveDate) -> u32 {
    let year_end = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);
    ((year_end - date).num_days() + 1).max(1) as u32
}
