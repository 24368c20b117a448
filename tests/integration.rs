//! Comprehensive integration tests for the Settlement Reconciliation Engine.
//!
//! This test suite covers the full settlement lifecycle over HTTP:
//! - Eligible-load queries (date window, exclusivity, edit mode)
//! - Commit with deductions and additional pay
//! - Draft preview totals
//! - Full edits with load relinking
//! - Incremental adjustments and deduction cloning
//! - Deletion with load release
//! - Year-to-date summaries
//! - Link audit and repair
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use settlement_engine::api::{AppState, create_router};
use settlement_engine::engine::ReconciliationEngine;
use settlement_engine::models::{CompensationModel, Driver, Load, LoadStatus};

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Normalize decimal string by removing trailing zeros after decimal point
fn normalize_decimal(s: &str) -> String {
    Decimal::from_str(s).unwrap().normalize().to_string()
}

fn create_driver(id: &str, name: &str) -> Driver {
    Driver {
        id: id.to_string(),
        name: name.to_string(),
        compensation: CompensationModel::Company,
        pay_percentage: Some(decimal("25")),
    }
}

fn create_load(id: &str, driver: &str, delivery: &str, base_pay: &str, miles: &str) -> Load {
    Load {
        id: id.to_string(),
        driver_id: Some(driver.to_string()),
        status: LoadStatus::Delivered,
        delivery_date: Some(delivery.to_string()),
        pickup_date: None,
        rate: decimal("2000"),
        driver_base_pay: Some(decimal(base_pay)),
        driver_detention_pay: None,
        driver_layover_pay: None,
        detention_amount: None,
        layover_amount: None,
        short_pay_fee: None,
        dispatch_fee: None,
        miles: decimal(miles),
        settlement_id: None,
    }
}

/// Seeds the standard fixture: one company driver with three delivered
/// January/February loads, plus a second driver with one load.
fn create_test_state() -> AppState {
    let mut engine = ReconciliationEngine::default();
    engine.register_driver(create_driver("drv_001", "J. Harlan"));
    engine.register_driver(create_driver("drv_002", "M. Okafor"));
    engine.upsert_load(create_load("load_001", "drv_001", "2024-01-10", "500", "480"));
    engine.upsert_load(create_load("load_002", "drv_001", "2024-01-20", "700", "520"));
    engine.upsert_load(create_load("load_003", "drv_001", "2024-02-05", "650", "410"));
    engine.upsert_load(create_load("load_b1", "drv_002", "2024-01-12", "900", "600"));
    AppState::new(engine)
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

async fn send_json(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(router, "POST", uri, Some(body)).await
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    send_json(router, "GET", uri, None).await
}

fn create_commit_request(driver_id: &str, load_ids: Vec<&str>) -> Value {
    json!({
        "driver_id": driver_id,
        "period_start": "2024-01-01",
        "period_end": "2024-01-31",
        "load_ids": load_ids,
        "paid_on": "2024-02-02"
    })
}

/// Commits a settlement and returns its id.
async fn commit_settlement(router: &Router, request: Value) -> String {
    let (status, result) = post_json(router.clone(), "/settlements", request).await;
    assert_eq!(status, StatusCode::CREATED);
    result["settlement"]["id"].as_str().unwrap().to_string()
}

fn assert_money(value: &Value, expected: &str) {
    let actual = value.as_str().unwrap();
    assert_eq!(
        normalize_decimal(actual),
        normalize_decimal(expected),
        "Expected {}, got {}",
        expected,
        actual
    );
}

// =============================================================================
// SECTION 1: Eligible-Load Queries
// =============================================================================

#[tokio::test]
async fn test_eligible_loads_within_period() {
    let router = create_router_for_test();

    let (status, result) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let loads = result.as_array().unwrap();
    let ids: Vec<_> = loads.iter().map(|l| l["id"].as_str().unwrap()).collect();
    // load_003 delivered in February; load_b1 belongs to the other driver.
    assert_eq!(ids, vec!["load_001", "load_002"]);
}

#[tokio::test]
async fn test_eligible_loads_descending_order() {
    let router = create_router_for_test();

    let (status, result) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-02-28&order=desc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["load_003", "load_002", "load_001"]);
}

#[tokio::test]
async fn test_eligible_loads_period_bounds_are_inclusive() {
    let router = create_router_for_test();

    let (status, result) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-10&period_end=2024-01-20",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_eligible_loads_unknown_driver() {
    let router = create_router_for_test();

    let (status, error) = get_json(
        router,
        "/drivers/drv_404/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "DRIVER_NOT_FOUND");
}

#[tokio::test]
async fn test_eligible_loads_exclude_committed() {
    let router = create_router_for_test();
    commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, result) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["load_002"]);
}

#[tokio::test]
async fn test_eligible_loads_edit_mode_keeps_own_loads() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let uri = format!(
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31&editing_settlement_id={}",
        id
    );
    let (status, result) = get_json(router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["load_001", "load_002"]);
}

// =============================================================================
// SECTION 2: Commit
// =============================================================================

#[tokio::test]
async fn test_commit_computes_totals() {
    let router = create_router_for_test();
    let mut request = create_commit_request("drv_001", vec!["load_001", "load_002"]);
    request["deductions"] = json!([{"category": "Tolls", "amount": "50"}]);
    request["additional_pay"] = json!([{"category": "Bonus", "memo": "Safety", "amount": "100"}]);

    let (status, result) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::CREATED);
    let settlement = &result["settlement"];
    assert_money(&settlement["gross_pay"], "1300");
    assert_money(&settlement["total_deductions"], "50");
    assert_money(&settlement["net_pay"], "1250");
    assert_money(&settlement["total_miles"], "1000");
    assert_eq!(settlement["status"], "pending");
    assert_eq!(settlement["driver_name"], "J. Harlan");
    assert_eq!(settlement["number"], "SET-2024-0001");
    assert!(result["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_uses_policy_when_load_has_no_precomputed_pay() {
    let state = create_test_state();
    {
        let mut engine = state.engine().write().await;
        let mut raw = create_load("load_raw", "drv_001", "2024-01-15", "0", "350");
        raw.driver_base_pay = None;
        engine.upsert_load(raw);
    }
    let router = create_router(state);

    let request = create_commit_request("drv_001", vec!["load_raw"]);
    let (status, result) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::CREATED);
    // 25% of the $2000 rate.
    assert_money(&result["settlement"]["gross_pay"], "500");
}

#[tokio::test]
async fn test_commit_pays_repeated_load_id_once() {
    let router = create_router_for_test();
    let request = create_commit_request("drv_001", vec!["load_001", "load_001"]);

    let (status, result) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::CREATED);
    let settlement = &result["settlement"];
    assert_money(&settlement["gross_pay"], "500");
    assert_eq!(settlement["load_ids"], json!(["load_001"]));
    assert_eq!(settlement["pay_snapshots"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_commit_net_pay_floors_at_zero() {
    let router = create_router_for_test();
    let mut request = create_commit_request("drv_001", vec!["load_001"]);
    request["deductions"] = json!([{"category": "Escrow", "amount": "900"}]);

    let (status, result) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::CREATED);
    let settlement = &result["settlement"];
    assert_money(&settlement["gross_pay"], "500");
    assert_money(&settlement["total_deductions"], "900");
    assert_money(&settlement["net_pay"], "0");
}

#[tokio::test]
async fn test_commit_merges_deduction_categories() {
    let router = create_router_for_test();
    let mut request = create_commit_request("drv_001", vec!["load_001"]);
    request["deductions"] = json!([
        {"category": "Fuel Advance", "amount": "20"},
        {"category": "fuel advance", "amount": "30"}
    ]);

    let (status, result) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::CREATED);
    let deductions = result["settlement"]["deductions"].as_object().unwrap();
    assert_eq!(deductions.len(), 1);
    assert_money(&deductions["fueladvance"], "50");
}

#[tokio::test]
async fn test_commit_rejects_claimed_load() {
    let router = create_router_for_test();
    commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, error) = post_json(
        router.clone(),
        "/settlements",
        create_commit_request("drv_001", vec!["load_001", "load_002"]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");

    // The rejected commit must not exist.
    let (_, list) = get_json(router, "/settlements").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_commit_unknown_driver() {
    let router = create_router_for_test();
    let (status, error) = post_json(
        router,
        "/settlements",
        create_commit_request("drv_404", vec!["load_001"]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "DRIVER_NOT_FOUND");
}

#[tokio::test]
async fn test_commit_unknown_load() {
    let router = create_router_for_test();
    let (status, error) = post_json(
        router,
        "/settlements",
        create_commit_request("drv_001", vec!["ghost"]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "LOAD_NOT_FOUND");
}

#[tokio::test]
async fn test_commit_empty_selection() {
    let router = create_router_for_test();
    let (status, error) = post_json(
        router,
        "/settlements",
        create_commit_request("drv_001", vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_commit_negative_deduction_rejected() {
    let router = create_router_for_test();
    let mut request = create_commit_request("drv_001", vec!["load_001"]);
    request["deductions"] = json!([{"category": "Tolls", "amount": "-5"}]);

    let (status, error) = post_json(router, "/settlements", request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

// =============================================================================
// SECTION 3: Preview
// =============================================================================

#[tokio::test]
async fn test_preview_returns_totals_without_committing() {
    let router = create_router_for_test();
    let mut request = create_commit_request("drv_001", vec!["load_001", "load_002"]);
    request["deductions"] = json!([{"category": "Tolls", "amount": "50"}]);

    let (status, totals) = post_json(router.clone(), "/settlements/preview", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_money(&totals["gross_pay"], "1200");
    assert_money(&totals["total_deductions"], "50");
    assert_money(&totals["net_pay"], "1150");
    assert_money(&totals["total_miles"], "1000");

    // Nothing was committed and no loads were claimed.
    let (_, list) = get_json(router.clone(), "/settlements").await;
    assert!(list.as_array().unwrap().is_empty());
    let (_, eligible) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;
    assert_eq!(eligible.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_preview_unknown_load() {
    let router = create_router_for_test();
    let (status, error) = post_json(
        router,
        "/settlements/preview",
        create_commit_request("drv_001", vec!["ghost"]),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "LOAD_NOT_FOUND");
}

// =============================================================================
// SECTION 4: Get / List
// =============================================================================

#[tokio::test]
async fn test_get_settlement_by_id() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, settlement) = get_json(router, &format!("/settlements/{}", id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(settlement["id"], id);
    assert_eq!(settlement["load_ids"], json!(["load_001"]));
    assert_eq!(settlement["period"]["label"], "Jan 01, 2024 - Jan 31, 2024");
}

#[tokio::test]
async fn test_get_unknown_settlement() {
    let router = create_router_for_test();
    let (status, error) = get_json(
        router,
        "/settlements/00000000-0000-0000-0000-000000000000",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "SETTLEMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_list_settlements_filters_by_driver() {
    let router = create_router_for_test();
    commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;
    commit_settlement(&router, create_commit_request("drv_002", vec!["load_b1"])).await;

    let (status, result) = get_json(router, "/settlements?driver_id=drv_001").await;

    assert_eq!(status, StatusCode::OK);
    let list = result.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["driver_id"], "drv_001");
}

#[tokio::test]
async fn test_list_settlements_sorts_by_paid_on_descending() {
    let router = create_router_for_test();
    let mut early = create_commit_request("drv_001", vec!["load_001"]);
    early["paid_on"] = json!("2024-01-15");
    commit_settlement(&router, early).await;
    let mut late = create_commit_request("drv_001", vec!["load_002"]);
    late["paid_on"] = json!("2024-02-15");
    commit_settlement(&router, late).await;

    let (status, result) = get_json(router, "/settlements").await;

    assert_eq!(status, StatusCode::OK);
    let list = result.as_array().unwrap();
    assert_eq!(list[0]["paid_on"], "2024-02-15");
    assert_eq!(list[1]["paid_on"], "2024-01-15");
}

// =============================================================================
// SECTION 5: Update
// =============================================================================

#[tokio::test]
async fn test_update_recomputes_and_relinks() {
    let router = create_router_for_test();
    let id = commit_settlement(
        &router,
        create_commit_request("drv_001", vec!["load_001", "load_002"]),
    )
    .await;

    let mut request = create_commit_request("drv_001", vec!["load_002", "load_003"]);
    request["period_end"] = json!("2024-02-28");
    let (status, result) = send_json(
        router.clone(),
        "PUT",
        &format!("/settlements/{}", id),
        Some(request),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let settlement = &result["settlement"];
    assert_money(&settlement["gross_pay"], "1350");
    assert_eq!(settlement["load_ids"], json!(["load_002", "load_003"]));

    // load_001 was released and is selectable again.
    let (_, eligible) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;
    let ids: Vec<_> = eligible
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["load_001"]);
}

#[tokio::test]
async fn test_update_rejects_load_owned_by_other_settlement() {
    let router = create_router_for_test();
    let first = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;
    commit_settlement(&router, create_commit_request("drv_001", vec!["load_002"])).await;

    let (status, error) = send_json(
        router,
        "PUT",
        &format!("/settlements/{}", first),
        Some(create_commit_request("drv_001", vec!["load_001", "load_002"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_unknown_settlement() {
    let router = create_router_for_test();
    let (status, error) = send_json(
        router,
        "PUT",
        "/settlements/00000000-0000-0000-0000-000000000000",
        Some(create_commit_request("drv_001", vec!["load_001"])),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "SETTLEMENT_NOT_FOUND");
}

// =============================================================================
// SECTION 6: Incremental Adjustments
// =============================================================================

#[tokio::test]
async fn test_add_deduction_merges_and_recomputes() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let uri = format!("/settlements/{}/deductions", id);
    post_json(
        router.clone(),
        &uri,
        json!({"category": "Fuel Advance", "amount": "20"}),
    )
    .await;
    let (status, settlement) = post_json(
        router,
        &uri,
        json!({"category": "FUEL ADVANCE", "amount": "30"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let deductions = settlement["deductions"].as_object().unwrap();
    assert_eq!(deductions.len(), 1);
    assert_money(&deductions["fueladvance"], "50");
    assert_money(&settlement["net_pay"], "450");
}

#[tokio::test]
async fn test_add_additional_pay_raises_gross() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, settlement) = post_json(
        router,
        &format!("/settlements/{}/additional-pay", id),
        json!({"category": "Bonus", "amount": "100"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_money(&settlement["gross_pay"], "600");
    assert_money(&settlement["net_pay"], "600");
}

#[tokio::test]
async fn test_add_deduction_rejects_zero_amount() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, error) = post_json(
        router,
        &format!("/settlements/{}/deductions", id),
        json!({"category": "Tolls", "amount": "0"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_add_deduction_rejects_blank_category() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, error) = post_json(
        router,
        &format!("/settlements/{}/deductions", id),
        json!({"category": "   ", "amount": "10"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_clone_previous_deductions() {
    let router = create_router_for_test();
    let first = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;
    post_json(
        router.clone(),
        &format!("/settlements/{}/deductions", first),
        json!({"category": "Insurance", "amount": "120"}),
    )
    .await;

    let mut later = create_commit_request("drv_001", vec!["load_002"]);
    later["paid_on"] = json!("2024-03-01");
    let second = commit_settlement(&router, later).await;

    let (status, settlement) = post_json(
        router,
        &format!("/settlements/{}/clone-deductions", second),
        json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_money(&settlement["deductions"]["insurance"], "120");
    assert_money(&settlement["total_deductions"], "120");
}

#[tokio::test]
async fn test_clone_deductions_without_history() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    let (status, error) = post_json(
        router,
        &format!("/settlements/{}/clone-deductions", id),
        json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NO_PRIOR_DEDUCTIONS");
}

// =============================================================================
// SECTION 7: Delete
// =============================================================================

#[tokio::test]
async fn test_delete_releases_loads() {
    let router = create_router_for_test();
    let id = commit_settlement(
        &router,
        create_commit_request("drv_001", vec!["load_001", "load_002"]),
    )
    .await;

    let (status, result) = send_json(
        router.clone(),
        "DELETE",
        &format!("/settlements/{}", id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["settlement_id"], id);
    assert!(result["warnings"].as_array().unwrap().is_empty());

    let (get_status, _) = get_json(router.clone(), &format!("/settlements/{}", id)).await;
    assert_eq!(get_status, StatusCode::NOT_FOUND);

    let (_, eligible) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;
    assert_eq!(eligible.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_unknown_settlement() {
    let router = create_router_for_test();
    let (status, error) = send_json(
        router,
        "DELETE",
        "/settlements/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "SETTLEMENT_NOT_FOUND");
}

// =============================================================================
// SECTION 8: Year-to-Date Summaries
// =============================================================================

#[tokio::test]
async fn test_ytd_summary_aggregates_by_paid_on_year() {
    let router = create_router_for_test();
    let first = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;
    post_json(
        router.clone(),
        &format!("/settlements/{}/deductions", first),
        json!({"category": "Fuel", "amount": "40"}),
    )
    .await;

    let mut second = create_commit_request("drv_001", vec!["load_002"]);
    second["paid_on"] = json!("2024-06-01");
    let second = commit_settlement(&router, second).await;
    post_json(
        router.clone(),
        &format!("/settlements/{}/deductions", second),
        json!({"category": "Fuel", "amount": "60"}),
    )
    .await;

    // Prior-year settlement must not count.
    let mut prior = create_commit_request("drv_001", vec!["load_003"]);
    prior["paid_on"] = json!("2023-12-29");
    commit_settlement(&router, prior).await;

    let (status, summary) = get_json(router, "/drivers/drv_001/ytd?year=2024").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["year"], 2024);
    assert_money(&summary["gross_ytd"], "1200");
    assert_money(&summary["total_deductions_ytd"], "100");
    assert_money(&summary["net_ytd"], "1100");
    assert_money(&summary["deductions_by_category_ytd"]["fuel"], "100");
}

#[tokio::test]
async fn test_ytd_net_can_go_negative() {
    let router = create_router_for_test();
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;
    post_json(
        router.clone(),
        &format!("/settlements/{}/deductions", id),
        json!({"category": "Escrow", "amount": "900"}),
    )
    .await;

    let (status, summary) = get_json(router, "/drivers/drv_001/ytd?year=2024").await;

    assert_eq!(status, StatusCode::OK);
    assert_money(&summary["net_ytd"], "-400");
}

// =============================================================================
// SECTION 9: Link Audit & Repair
// =============================================================================

#[tokio::test]
async fn test_audit_links_consistent_after_lifecycle() {
    let router = create_router_for_test();
    let id = commit_settlement(
        &router,
        create_commit_request("drv_001", vec!["load_001", "load_002"]),
    )
    .await;
    send_json(
        router.clone(),
        "PUT",
        &format!("/settlements/{}", id),
        Some(create_commit_request("drv_001", vec!["load_001"])),
    )
    .await;
    send_json(router.clone(), "DELETE", &format!("/settlements/{}", id), None).await;

    let (status, report) = get_json(router, "/links/audit").await;

    assert_eq!(status, StatusCode::OK);
    assert!(report["stale_backrefs"].as_array().unwrap().is_empty());
    assert!(report["missing_backrefs"].as_array().unwrap().is_empty());
    assert!(report["missing_loads"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_repair_links_restores_missing_backref() {
    let state = create_test_state();
    let router = create_router(state.clone());
    let id = commit_settlement(&router, create_commit_request("drv_001", vec!["load_001"])).await;

    // Simulate an upstream re-import wiping the backref.
    {
        let mut engine = state.engine().write().await;
        engine.upsert_load(create_load("load_001", "drv_001", "2024-01-10", "500", "480"));
    }

    let (status, report) = post_json(router.clone(), "/links/repair", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let missing = report["missing_backrefs"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["load_id"], "load_001");
    assert_eq!(missing[0]["settlement_id"], id);

    // The load is claimed again and no longer eligible elsewhere.
    let (_, eligible) = get_json(
        router,
        "/drivers/drv_001/eligible-loads?period_start=2024-01-01&period_end=2024-01-31",
    )
    .await;
    let ids: Vec<_> = eligible
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["load_002"]);
}

// =============================================================================
// SECTION 10: Request Parsing Errors
// =============================================================================

#[tokio::test]
async fn test_error_malformed_json() {
    let router = create_router_for_test();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/settlements")
                .header("Content-Type", "application/json")
                .body(Body::from("{invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_error_missing_driver_id() {
    let router = create_router_for_test();

    let body = json!({
        "period_start": "2024-01-01",
        "period_end": "2024-01-31",
        "load_ids": ["load_001"]
    });
    let (status, error) = post_json(router, "/settlements", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"].as_str().unwrap().contains("missing field"));
}

#[tokio::test]
async fn test_error_period_inverted() {
    let router = create_router_for_test();

    let body = json!({
        "driver_id": "drv_001",
        "period_start": "2024-01-31",
        "period_end": "2024-01-01",
        "load_ids": ["load_001"]
    });
    let (status, error) = post_json(router, "/settlements", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}
