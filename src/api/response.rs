//! Response types for the compensation engine API.
//!
//! This module defines the success envelope, the error body, and the mapping
//! from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Success envelope wrapping a calculation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse<T> {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine that produced the result.
    pub engine_version: String,
    /// Time spent calculating, in microseconds.
    pub duration_us: u64,
    /// The calculation result.
    pub result: T,
}

impl<T> CalculationResponse<T> {
    /// Wraps a result with a fresh calculation id and timestamp.
    pub fn new(result: T, duration_us: u64) -> Self {
        Self {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            duration_us,
            result,
        }
    }
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
            EngineError::MissingParameter { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("MISSING_PARAMETER", message))
            }
            EngineError::InvalidDeduction { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("INVALID_DEDUCTION", message))
            }
            EngineError::InvalidBonus { errors } => {
                ApiErrorResponse::bad_request(ApiError::with_details(
                    "INVALID_BONUS",
                    "Bonus validation failed",
                    errors.join("; "),
                ))
            }
            EngineError::BelowMinimumSales { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("BELOW_MINIMUM_SALES", message))
            }
            EngineError::InvalidEmployee { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("INVALID_EMPLOYEE", message))
            }
            EngineError::LedgerUnavailable { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "LEDGER_UNAVAILABLE",
                    "Year-to-date ledger could not be read",
                    message,
                ),
            },
            EngineError::CalculationError { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            },
        }
    }
}
