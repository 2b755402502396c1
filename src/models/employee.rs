//! Employee snapshot model and related types.
//!
//! The engine never owns employee records; callers hand it an immutable
//! [`EmployeeSnapshot`] taken from the employee record store for each call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayFrequency;

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Full-time employment.
    FullTime,
    /// Part-time employment.
    PartTime,
    /// Casual employment.
    Casual,
    /// Fixed-term contract.
    Contract,
}

/// A read-only view of an employee at calculation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSnapshot {
    /// Unique identifier for the employee.
    pub id: String,
    /// The employing company.
    pub company_id: String,
    /// Annualized base salary.
    pub base_salary: Decimal,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// The type of employment arrangement.
    pub employment_type: EmploymentType,
    /// The employee's date of birth.
    pub date_of_birth: NaiveDate,
    /// The date the employee started employment.
    pub start_date: NaiveDate,
    /// Employer superannuation guarantee rate as a fraction (e.g. 0.115).
    #[serde(default)]
    pub superannuation_rate: Option<Decimal>,
}

impl EmployeeSnapshot {
    /// Returns the employee's regular gross pay, annualized.
    pub fn regular_gross_pay(&self) -> Decimal {
        self.base_salary
    }

    /// Returns the employee's age in whole years on `date`.
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.date_of_birth).unwrap_or(0)
    }

    /// Returns completed years of service on `date`; zero before the start date.
    pub fn years_of_service_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.start_date).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee() -> EmployeeSnapshot {
        EmployeeSnapshot {
            id: "emp_001".to_string(),
            company_id: "co_001".to_string(),
            base_salary: Decimal::new(80000, 0),
            pay_frequency: PayFrequency::Fortnightly,
            employment_type: EmploymentType::FullTime,
            date_of_birth: NaiveDate::from_ymd_opt(1968, 6, 15).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2010, 2, 1).unwrap(),
            superannuation_rate: None,
        }
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let employee = create_test_employee();
        assert_eq!(employee.age_on(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 56);
        assert_eq!(employee.age_on(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 57);
    }

    #[test]
    fn test_age_for_leap_day_birthday() {
        let mut employee = create_test_employee();
        employee.date_of_birth = NaiveDate::from_ymd_opt(1968, 2, 29).unwrap();
        assert_eq!(employee.age_on(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()), 56);
        assert_eq!(employee.age_on(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()), 57);
    }

    #[test]
    fn test_years_of_service() {
        let employee = create_test_employee();
        assert_eq!(
            employee.years_of_service_on(NaiveDate::from_ymd_opt(2022, 1, 31).unwrap()),
            11
        );
        assert_eq!(
            employee.years_of_service_on(NaiveDate::from_ymd_opt(2022, 2, 1).unwrap()),
            12
        );
    }

    #[test]
    fn test_years_of_service_before_start_is_zero() {
        let employee = create_test_employee();
        assert_eq!(
            employee.years_of_service_on(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap()),
            0
        );
    }

    #[test]
    fn test_regular_gross_pay_is_base_salary() {
        let employee = create_test_employee();
        assert_eq!(employee.regular_gross_pay(), Decimal::new(80000, 0));
    }

    #[test]
    fn test_deserialize_employee_without_super_rate() {
        let json = r#"{
            "id": "emp_002",
            "company_id": "co_001",
            "base_salary": "95000",
            "pay_frequency": "monthly",
            "employment_type": "part_time",
            "date_of_birth": "1990-01-15",
            "start_date": "2021-03-01"
        }"#;

        let employee: EmployeeSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(employee.employment_type, EmploymentType::PartTime);
        assert_eq!(employee.pay_frequency, PayFrequency::Monthly);
        assert_eq!(employee.base_salary, Decimal::new(95000, 0));
        assert!(employee.superannuation_rate.is_none());
    }

    #[test]
    fn test_employment_type_serialization() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::FullTime).unwrap(),
            "\"full_time\""
        );
        assert_eq!(
            serde_json::to_string(&EmploymentType::Contract).unwrap(),
            "\"contract\""
        );
    }
}
