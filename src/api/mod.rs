//! HTTP API module for the compensation engine.
//!
//! This module exposes the deduction pipeline and the bonus calculators as
//! JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BonusCalculationRequest, CommissionCalculationRequest, DeductionCalculationRequest,
    PerformanceCalculationRequest,
};
pub use response::{ApiError, CalculationResponse};
pub use state::AppState;
