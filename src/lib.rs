//! Compensation Adjustment Engine for Australian payroll
//!
//! This crate turns a raw gross pay figure into a taxed, capped and
//! prioritized net adjustment. It applies an employee's pre-tax and post-tax
//! deductions in priority order against annual caps, and computes
//! withholding on one-off bonus, commission and termination payments.
//!
//! Both entry points, [`calculation::process_deductions`] and
//! [`calculation::calculate_bonus`], are pure computations over supplied
//! snapshots. The [`api`] module wraps them as JSON endpoints.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
