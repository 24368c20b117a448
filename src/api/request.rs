//! Request types for the Settlement Reconciliation Engine API.
//!
//! This module defines the JSON request bodies and query parameters for the
//! settlement endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::SettlementInput;
use crate::ledger::{DateOrder, SettlementFilter, SettlementSort};
use crate::models::{AdditionalPayItem, DeductionItem};

/// Request body for committing (`POST /settlements`), updating
/// (`PUT /settlements/{id}`), and previewing (`POST /settlements/preview`)
/// a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// The driver being settled.
    pub driver_id: String,
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// The selected loads, in selection order.
    pub load_ids: Vec<String>,
    /// Operator-entered deduction lines.
    #[serde(default)]
    pub deductions: Vec<AdjustmentRequest>,
    /// Operator-entered additional-pay lines.
    #[serde(default)]
    pub additional_pay: Vec<AdjustmentRequest>,
    /// The date the settlement is paid on; defaults to the period end.
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
    /// Free-text operator notes.
    #[serde(default)]
    pub notes: String,
}

/// One adjustment line (deduction or additional pay) in a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// Free-text category (e.g., "Fuel Advance").
    pub category: String,
    /// Optional memo.
    #[serde(default)]
    pub memo: Option<String>,
    /// Non-negative amount.
    pub amount: Decimal,
}

/// Request body for `POST /settlements/{id}/deductions` and
/// `POST /settlements/{id}/additional-pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAdjustmentRequest {
    /// Free-text category.
    pub category: String,
    /// Positive amount.
    pub amount: Decimal,
}

/// Sort direction parameter for eligible-load queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrderParam {
    /// Earliest effective date first.
    #[default]
    Asc,
    /// Latest effective date first.
    Desc,
}

impl From<SortOrderParam> for DateOrder {
    fn from(param: SortOrderParam) -> Self {
        match param {
            SortOrderParam::Asc => DateOrder::Ascending,
            SortOrderParam::Desc => DateOrder::Descending,
        }
    }
}

/// Query parameters for `GET /drivers/{id}/eligible-loads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibleLoadsQuery {
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// The settlement being edited, when the selection surface is in edit
    /// mode. Loads claimed by it stay selectable.
    #[serde(default)]
    pub editing_settlement_id: Option<Uuid>,
    /// Sort direction; ascending by default.
    #[serde(default)]
    pub order: SortOrderParam,
}

/// Sort parameter for `GET /settlements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortParam {
    /// Most recent paid-on date first.
    #[default]
    PaidOnDesc,
    /// Earliest paid-on date first.
    PaidOnAsc,
    /// Most recently created first.
    CreatedDesc,
}

impl From<SortParam> for SettlementSort {
    fn from(param: SortParam) -> Self {
        match param {
            SortParam::PaidOnDesc => SettlementSort::PaidOnDescending,
            SortParam::PaidOnAsc => SettlementSort::PaidOnAscending,
            SortParam::CreatedDesc => SettlementSort::CreatedDescending,
        }
    }
}

/// Query parameters for `GET /settlements`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSettlementsQuery {
    /// Restrict to one driver.
    #[serde(default)]
    pub driver_id: Option<String>,
    /// Sort order; most recent paid-on first by default.
    #[serde(default)]
    pub sort: SortParam,
}

impl ListSettlementsQuery {
    /// The store filter equivalent of this query.
    pub fn filter(&self) -> SettlementFilter {
        SettlementFilter {
            driver_id: self.driver_id.clone(),
            settlement_type: None,
        }
    }
}

/// Query parameters for `GET /drivers/{id}/ytd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtdQuery {
    /// The calendar year to aggregate.
    pub year: i32,
}

impl From<AdjustmentRequest> for DeductionItem {
    fn from(req: AdjustmentRequest) -> Self {
        DeductionItem {
            category: req.category,
            memo: req.memo,
            amount: req.amount,
        }
    }
}

impl From<AdjustmentRequest> for AdditionalPayItem {
    fn from(req: AdjustmentRequest) -> Self {
        AdditionalPayItem {
            category: req.category,
            memo: req.memo,
            amount: req.amount,
        }
    }
}

impl From<SettlementRequest> for SettlementInput {
    fn from(req: SettlementRequest) -> Self {
        let paid_on = req.paid_on.unwrap_or(req.period_end);
        SettlementInput {
            driver_id: req.driver_id,
            period_start: req.period_start,
            period_end: req.period_end,
            load_ids: req.load_ids,
            deductions: req.deductions.into_iter().map(Into::into).collect(),
            additional_pay: req.additional_pay.into_iter().map(Into::into).collect(),
            paid_on,
            notes: req.notes,
        }
    }
}
