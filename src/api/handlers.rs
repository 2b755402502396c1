//! HTTP request handlers for the compensation engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::{Duration, Instant};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    PayContext, calculate_bonus, calculate_commission_bonus, calculate_performance_bonus,
    process_deductions,
};
use crate::error::EngineResult;

use super::request::{
    BonusCalculationRequest, CommissionCalculationRequest, DeductionCalculationRequest,
    PerformanceCalculationRequest,
};
use super::response::{ApiError, ApiErrorResponse, CalculationResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/deductions/calculate", post(calculate_deductions_handler))
        .route("/bonuses/calculate", post(calculate_bonus_handler))
        .route("/bonuses/commission", post(calculate_commission_handler))
        .route("/bonuses/performance", post(calculate_performance_handler))
        .with_state(state)
}

/// Handler for POST /deductions/calculate.
///
/// Runs the deduction pipeline against the deductions and ledger rows
/// supplied in the body.
async fn calculate_deductions_handler(
    State(state): State<AppState>,
    payload: Result<Json<DeductionCalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing deduction request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    if request.gross_pay < Decimal::ZERO || request.taxable_income < Decimal::ZERO {
        warn!(
            correlation_id = %correlation_id,
            gross_pay = %request.gross_pay,
            taxable_income = %request.taxable_income,
            "Negative pay rejected"
        );
        return error_response(ApiErrorResponse::bad_request(ApiError::validation_error(
            "gross_pay and taxable_income must not be negative",
        )));
    }

    let started = Instant::now();
    let outcome = request.validated_deductions().and_then(|deductions| {
        let config = state.engine_config();
        let policy = request
            .ledger_failure_policy
            .unwrap_or(config.deductions().ledger_failure_policy);
        let context = PayContext {
            employee: &request.employee,
            pay_period: &request.pay_period,
            gross_pay: request.gross_pay,
            taxable_income: request.taxable_income,
        };
        process_deductions(
            &context,
            deductions.as_slice(),
            &request.ledger(),
            policy,
            config,
        )
    });

    finish(outcome, started, correlation_id)
}

/// Handler for POST /bonuses/calculate.
async fn calculate_bonus_handler(
    State(state): State<AppState>,
    payload: Result<Json<BonusCalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing bonus request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let started = Instant::now();
    let outcome = calculate_bonus(&request.employee, &request.bonus, state.engine_config());
    finish(outcome, started, correlation_id)
}

/// Handler for POST /bonuses/commission.
async fn calculate_commission_handler(
    State(state): State<AppState>,
    payload: Result<Json<CommissionCalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing commission request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let started = Instant::now();
    let outcome = calculate_commission_bonus(
        &request.employee,
        &request.commission,
        state.engine_config(),
    );
    finish(outcome, started, correlation_id)
}

/// Handler for POST /bonuses/performance.
async fn calculate_performance_handler(
    State(state): State<AppState>,
    payload: Result<Json<PerformanceCalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing performance bonus request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let started = Instant::now();
    let outcome = calculate_performance_bonus(
        &request.employee,
        &request.performance,
        state.engine_config(),
    );
    finish(outcome, started, correlation_id)
}

/// Wraps a calculation outcome in the success envelope or an error body.
fn finish<T: Serialize>(outcome: EngineResult<T>, started: Instant, correlation_id: Uuid) -> Response {
    match outcome {
        Ok(result) => {
            let duration_us = micros(started.elapsed());
            info!(
                correlation_id = %correlation_id,
                duration_us,
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(CalculationResponse::new(result, duration_us)),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Calculation failed"
            );
            error_response(err.into())
        }
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn rejection_response(rejection: JsonRejection, correlation_id: Uuid) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    error_response(ApiErrorResponse::bad_request(error))
}

fn error_response(api_error: ApiErrorResponse) -> Response {
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}
