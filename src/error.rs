//! Error types for the compensation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while processing deductions
//! and calculating bonus withholding.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the compensation engine.
///
/// Configuration errors (missing parameters, invalid bonus input) are caller
/// bugs and are never recovered locally. Ledger read failures are the only
/// errors that may be downgraded to a warning, and only when the caller
/// delegates that policy.
///
/// # Example
///
/// ```
/// use compensation_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A deduction is missing a parameter its calculation method requires.
    #[error("Deduction '{deduction_id}' uses {method} calculation but is missing '{field}'")]
    MissingParameter {
        /// The ID of the misconfigured deduction.
        deduction_id: String,
        /// The calculation method that needs the parameter.
        method: String,
        /// The missing field.
        field: String,
    },

    /// A deduction record violates one of its invariants.
    #[error("Invalid deduction '{deduction_id}': {message}")]
    InvalidDeduction {
        /// The ID of the invalid deduction.
        deduction_id: String,
        /// A description of what made the deduction invalid.
        message: String,
    },

    /// One or more bonus parameters failed validation.
    #[error("Bonus validation failed: {}", errors.join("; "))]
    InvalidBonus {
        /// Every validation failure found, in check order.
        errors: Vec<String>,
    },

    /// Sales fell below the configured commission floor.
    #[error("Sales amount {sales_amount} is below the minimum of {minimum_sales}")]
    BelowMinimumSales {
        /// The sales amount supplied.
        sales_amount: Decimal,
        /// The configured minimum.
        minimum_sales: Decimal,
    },

    /// An employee snapshot was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The year-to-date ledger could not be read.
    #[error("YTD ledger unavailable for deduction '{deduction_id}' as of {as_of}: {message}")]
    LedgerUnavailable {
        /// The deduction whose ledger lookup failed.
        deduction_id: String,
        /// The lookup date.
        as_of: NaiveDate,
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors raised by the YTD ledger boundary.
    pub fn is_ledger_failure(&self) -> bool {
        matches!(self, EngineError::LedgerUnavailable { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_missing_parameter_displays_method_and_field() {
        let error = EngineError::MissingParameter {
            deduction_id: "ded_001".to_string(),
            method: "percentage".to_string(),
            field: "percentage".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Deduction 'ded_001' uses percentage calculation but is missing 'percentage'"
        );
    }

    #[test]
    fn test_invalid_bonus_joins_all_errors() {
        let error = EngineError::InvalidBonus {
            errors: vec![
                "gross_amount must be greater than zero".to_string(),
                "sales_amount must be greater than zero".to_string(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "Bonus validation failed: gross_amount must be greater than zero; sales_amount must be greater than zero"
        );
    }

    #[test]
    fn test_below_minimum_sales_displays_amounts() {
        let error = EngineError::BelowMinimumSales {
            sales_amount: Decimal::new(9000, 0),
            minimum_sales: Decimal::new(10000, 0),
        };
        assert_eq!(
            error.to_string(),
            "Sales amount 9000 is below the minimum of 10000"
        );
    }

    #[test]
    fn test_ledger_unavailable_is_ledger_failure() {
        let error = EngineError::LedgerUnavailable {
            deduction_id: "ded_001".to_string(),
            as_of: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            message: "connection refused".to_string(),
        };
        assert!(error.is_ledger_failure());
        assert_eq!(
            error.to_string(),
            "YTD ledger unavailable for deduction 'ded_001' as of 2025-03-01: connection refused"
        );

        let other = EngineError::CalculationError {
            message: "overflow".to_string(),
        };
        assert!(!other.is_ledger_failure());
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_config_not_found() -> EngineResult<()> {
            Err(EngineError::ConfigNotFound {
                path: "/test".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_config_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
