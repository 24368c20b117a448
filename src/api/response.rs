//! Response types for the Settlement Reconciliation Engine API.
//!
//! This module defines the error response structures, the status mapping
//! from engine errors, and the mutation responses that carry link warnings.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CommitOutcome;
use crate::error::{EngineError, LinkError};
use crate::models::Settlement;

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

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::DriverNotFound { driver_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "DRIVER_NOT_FOUND",
                    format!("Driver not found: {}", driver_id),
                ),
            },
            EngineError::SettlementNotFound { settlement_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "SETTLEMENT_NOT_FOUND",
                    format!("Settlement not found: {}", settlement_id),
                ),
            },
            EngineError::LoadNotFound { load_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("LOAD_NOT_FOUND", format!("Load not found: {}", load_id)),
            },
            EngineError::Validation { field, message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "VALIDATION_ERROR",
                    format!("Validation failed for '{}'", field),
                    message,
                ),
            },
            EngineError::NoPriorDeductions { driver_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "NO_PRIOR_DEDUCTIONS",
                    format!(
                        "No previous settlement with deductions found for driver {}",
                        driver_id
                    ),
                ),
            },
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
        }
    }
}

/// Mutation response: the settlement plus rendered link warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResponse {
    /// The committed settlement.
    pub settlement: Settlement,
    /// Link-propagation failures for the operator to reconcile manually.
    pub warnings: Vec<String>,
}

impl From<CommitOutcome> for SettlementResponse {
    fn from(outcome: CommitOutcome) -> Self {
        Self {
            settlement: outcome.settlement,
            warnings: render_warnings(&outcome.warnings),
        }
    }
}

/// Response for `DELETE /settlements/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// The deleted settlement's id.
    pub settlement_id: Uuid,
    /// Unlink failures for the operator to reconcile manually.
    pub warnings: Vec<String>,
}

pub(crate) fn render_warnings(warnings: &[LinkError]) -> Vec<String> {
    warnings.iter().map(LinkError::to_string).collect()
}
