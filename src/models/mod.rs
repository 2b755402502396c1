//! Core data models for the compensation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod bonus;
mod calculation_result;
mod deduction;
mod employee;
mod pay_period;

pub use bonus::{
    ApprovalStatus, BonusCalculationDetails, BonusOptions, BonusPayment, BonusRequest,
    BonusStatus, BonusTaxMethod, BonusType, CommissionBreakdown, CommissionRequest,
    CommissionTier, PerformanceBreakdown, PerformanceRequest, PerformanceThreshold,
    ProRataAdjustment, TierCommission,
};
pub use calculation_result::{
    BonusCalculationResult, CalculationStep, CalculationWarning, DeductionCalculationResult,
    DeductionResult, LedgerEntry, TaxCalculation,
};
pub use deduction::{
    CalculationMethod, Deduction, DeductionCategory, DeductionRecord, DeductionRule,
    DeductionStatus, DeductionTier, DeductionType, FormulaRule, PercentageBase, RoundingMethod,
};
pub use employee::{EmployeeSnapshot, EmploymentType};
pub use pay_period::{PayFrequency, PayPeriod};
