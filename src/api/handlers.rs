//! HTTP request handlers for the Settlement Reconciliation Engine API.
//!
//! This module contains the handler functions for all settlement endpoints
//! and the router wiring them together.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{SettlementBuilder, SettlementInput};
use crate::error::EngineError;
use crate::models::SettlementPeriod;

use super::request::{
    AddAdjustmentRequest, EligibleLoadsQuery, ListSettlementsQuery, SettlementRequest, YtdQuery,
};
use super::response::{
    ApiError, ApiErrorResponse, DeleteResponse, SettlementResponse, render_warnings,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/settlements", post(commit_handler).get(list_handler))
        .route("/settlements/preview", post(preview_handler))
        .route(
            "/settlements/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/settlements/:id/deductions", post(add_deduction_handler))
        .route(
            "/settlements/:id/additional-pay",
            post(add_additional_pay_handler),
        )
        .route(
            "/settlements/:id/clone-deductions",
            post(clone_deductions_handler),
        )
        .route(
            "/drivers/:driver_id/eligible-loads",
            get(eligible_loads_handler),
        )
        .route("/drivers/:driver_id/ytd", get(ytd_handler))
        .route("/links/audit", get(audit_links_handler))
        .route("/links/repair", post(repair_links_handler))
        .with_state(state)
}

/// Unwraps a JSON body, converting rejections into error responses.
fn parse_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
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
                JsonRejection::MissingJsonContentType(_) => ApiError::new(
                    "MISSING_CONTENT_TYPE",
                    "Content-Type must be application/json",
                ),
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err((StatusCode::BAD_REQUEST, Json(error)).into_response())
        }
    }
}

fn engine_error(correlation_id: Uuid, context: &str, err: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "{}", context);
    ApiErrorResponse::from(err).into_response()
}

/// Handler for `POST /settlements`: commits a new settlement.
async fn commit_handler(
    State(state): State<AppState>,
    payload: Result<Json<SettlementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        driver_id = %request.driver_id,
        loads = request.load_ids.len(),
        "Processing settlement commit"
    );

    let input: SettlementInput = request.into();
    let mut engine = state.engine().write().await;
    match engine.commit(input) {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(SettlementResponse::from(outcome)),
        )
            .into_response(),
        Err(err) => engine_error(correlation_id, "Settlement commit failed", err),
    }
}

/// Handler for `GET /settlements`: lists committed settlements.
async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListSettlementsQuery>,
) -> Response {
    let engine = state.engine().read().await;
    let settlements = engine.list_settlements(&query.filter(), query.sort.into());
    Json(settlements).into_response()
}

/// Handler for `GET /settlements/{id}`.
async fn get_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let engine = state.engine().read().await;
    match engine.get_settlement(id) {
        Ok(settlement) => Json(settlement.clone()).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for `PUT /settlements/{id}`: applies a full edit.
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SettlementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        settlement_id = %id,
        loads = request.load_ids.len(),
        "Processing settlement update"
    );

    let input: SettlementInput = request.into();
    let mut engine = state.engine().write().await;
    match engine.update(id, input) {
        Ok(outcome) => Json(SettlementResponse::from(outcome)).into_response(),
        Err(err) => engine_error(correlation_id, "Settlement update failed", err),
    }
}

/// Handler for `DELETE /settlements/{id}`.
async fn delete_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    let mut engine = state.engine().write().await;
    match engine.delete(id) {
        Ok(warnings) => Json(DeleteResponse {
            settlement_id: id,
            warnings: render_warnings(&warnings),
        })
        .into_response(),
        Err(err) => engine_error(correlation_id, "Settlement delete failed", err),
    }
}

/// Handler for `POST /settlements/{id}/deductions`.
async fn add_deduction_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddAdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut engine = state.engine().write().await;
    match engine.add_deduction(id, &request.category, request.amount) {
        Ok(settlement) => Json(settlement).into_response(),
        Err(err) => engine_error(correlation_id, "Add deduction failed", err),
    }
}

/// Handler for `POST /settlements/{id}/additional-pay`.
async fn add_additional_pay_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddAdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut engine = state.engine().write().await;
    match engine.add_additional_pay(id, &request.category, request.amount) {
        Ok(settlement) => Json(settlement).into_response(),
        Err(err) => engine_error(correlation_id, "Add additional pay failed", err),
    }
}

/// Handler for `POST /settlements/{id}/clone-deductions`.
async fn clone_deductions_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    let mut engine = state.engine().write().await;
    match engine.clone_previous_deductions(id) {
        Ok(settlement) => Json(settlement).into_response(),
        Err(err) => engine_error(correlation_id, "Clone deductions failed", err),
    }
}

/// Handler for `POST /settlements/preview`: draft totals without committing.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<SettlementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let engine = state.engine().read().await;
    let driver = match engine.driver(&request.driver_id) {
        Ok(driver) => driver.clone(),
        Err(err) => return engine_error(correlation_id, "Settlement preview failed", err),
    };

    let period = SettlementPeriod::new(request.period_start, request.period_end);
    let mut builder = SettlementBuilder::new(driver, period);
    if let Some(paid_on) = request.paid_on {
        builder.paid_on(paid_on);
    }
    builder.notes(request.notes.clone());
    for load_id in &request.load_ids {
        match engine.ledger().get(load_id) {
            Some(load) => builder.select_load(load.clone()),
            None => {
                return engine_error(
                    correlation_id,
                    "Settlement preview failed",
                    EngineError::LoadNotFound {
                        load_id: load_id.clone(),
                    },
                );
            }
        }
    }
    for item in request.deductions {
        builder.add_deduction(item.into());
    }
    for item in request.additional_pay {
        builder.add_additional_pay(item.into());
    }

    match builder.totals(engine.policy()) {
        Ok(totals) => Json(totals).into_response(),
        Err(err) => engine_error(correlation_id, "Settlement preview failed", err),
    }
}

/// Handler for `GET /drivers/{id}/eligible-loads`.
async fn eligible_loads_handler(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
    Query(query): Query<EligibleLoadsQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let engine = state.engine().read().await;
    match engine.find_eligible_loads(
        &driver_id,
        query.period_start,
        query.period_end,
        query.editing_settlement_id,
        query.order.into(),
    ) {
        Ok(loads) => Json(loads).into_response(),
        Err(err) => engine_error(correlation_id, "Eligible-load query failed", err),
    }
}

/// Handler for `GET /drivers/{id}/ytd`.
async fn ytd_handler(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
    Query(query): Query<YtdQuery>,
) -> Response {
    let engine = state.engine().read().await;
    Json(engine.ytd_summary(&driver_id, query.year)).into_response()
}

/// Handler for `GET /links/audit`: reports backref inconsistencies.
async fn audit_links_handler(State(state): State<AppState>) -> Response {
    let engine = state.engine().read().await;
    Json(engine.audit_links()).into_response()
}

/// Handler for `POST /links/repair`: applies the settlement-is-authoritative
/// fix and reports what was found.
async fn repair_links_handler(State(state): State<AppState>) -> Response {
    let mut engine = state.engine().write().await;
    Json(engine.repair_links()).into_response()
}
