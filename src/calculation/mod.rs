//! Calculation logic for the compensation engine.
//!
//! The progressive tax scale is the shared leaf. The deduction side
//! evaluates raw rule amounts, tracks annual caps against a year-to-date
//! ledger and runs the priority-ordered pipeline. The bonus side dispatches
//! withholding strategies and orchestrates proration, commission tiering,
//! performance scoring and superannuation.

mod bonus;
mod bonus_tax;
mod cap_tracker;
mod deduction_pipeline;
mod deduction_rules;
mod tax_scale;

pub use bonus::{
    calculate_bonus, calculate_commission_bonus, calculate_performance_bonus,
    performance_multiplier, prorate, tiered_commission,
};
pub use bonus_tax::{
    StrategyOutcome, WithholdingResult, average_rates, etp, fixed_rate, marginal_rates,
    schedule_5, withhold,
};
pub use cap_tracker::{
    AnnualCapTracker, DeductionSource, LedgerFailurePolicy, YtdLedger, YtdLookup, YtdSnapshot,
    remaining_cap,
};
pub use deduction_pipeline::{PayContext, process_deductions};
pub use deduction_rules::{RawAmountResult, RuleContext, evaluate_raw_amount};
pub use tax_scale::{TaxBracket, TaxScale};
