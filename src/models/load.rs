//! Load model and related types.
//!
//! Loads arrive from an upstream dispatch/import pipeline. Their dates are
//! kept as the raw strings that pipeline produced; parsing happens lazily at
//! query time and a load whose date cannot be parsed is simply not eligible
//! for settlement.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion status of a load.
///
/// Only [`LoadStatus::Delivered`] and [`LoadStatus::Completed`] loads are
/// eligible for settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Booked but not yet picked up.
    Pending,
    /// Picked up and moving.
    InTransit,
    /// Delivered to the consignee.
    Delivered,
    /// Delivered and fully papered (POD received).
    Completed,
    /// Cancelled; may still owe the driver a short-pay/TONU fee.
    Cancelled,
}

/// A load as seen by the settlement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Unique identifier for the load, owned by the dispatch system.
    pub id: String,
    /// The driver assigned to the load, if any.
    #[serde(default)]
    pub driver_id: Option<String>,
    /// Completion status.
    pub status: LoadStatus,
    /// Raw delivery date string from the upstream pipeline, if recorded.
    #[serde(default)]
    pub delivery_date: Option<String>,
    /// Raw pickup date string from the upstream pipeline, if recorded.
    #[serde(default)]
    pub pickup_date: Option<String>,
    /// The linehaul rate billed for the load.
    pub rate: Decimal,
    /// Precomputed driver base pay. When present it bypasses the pay policy.
    #[serde(default)]
    pub driver_base_pay: Option<Decimal>,
    /// Precomputed driver detention pay, paired with `driver_base_pay`.
    #[serde(default)]
    pub driver_detention_pay: Option<Decimal>,
    /// Precomputed driver layover pay, paired with `driver_base_pay`.
    #[serde(default)]
    pub driver_layover_pay: Option<Decimal>,
    /// Load-level detention amount used on the policy-derived pay path.
    #[serde(default)]
    pub detention_amount: Option<Decimal>,
    /// Load-level layover amount used on the policy-derived pay path.
    #[serde(default)]
    pub layover_amount: Option<Decimal>,
    /// Short-pay ("truck order not used") fee owed to the driver.
    #[serde(default)]
    pub short_pay_fee: Option<Decimal>,
    /// Dispatch fee carried onto the settlement snapshot for documents.
    #[serde(default)]
    pub dispatch_fee: Option<Decimal>,
    /// Total distance for the load, in miles.
    pub miles: Decimal,
    /// Backref to the settlement that paid this load, if any. A load is
    /// linked to at most one settlement at a time.
    #[serde(default)]
    pub settlement_id: Option<Uuid>,
}

impl Load {
    /// Returns true if the load is in a settleable status.
    pub fn is_settleable(&self) -> bool {
        matches!(self.status, LoadStatus::Delivered | LoadStatus::Completed)
    }

    /// The date used for period matching: delivery date when present,
    /// otherwise pickup date. Returns `None` when neither parses.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use settlement_engine::models::{Load, LoadStatus};
    /// use rust_decimal::Decimal;
    ///
    /// let mut load = Load {
    ///     id: "load_001".to_string(),
    ///     driver_id: None,
    ///     status: LoadStatus::Delivered,
    ///     delivery_date: Some("2024-01-15".to_string()),
    ///     pickup_date: Some("01/13/2024".to_string()),
    ///     rate: Decimal::new(2000, 0),
    ///     driver_base_pay: None,
    ///     driver_detention_pay: None,
    ///     driver_layover_pay: None,
    ///     detention_amount: None,
    ///     layover_amount: None,
    ///     short_pay_fee: None,
    ///     dispatch_fee: None,
    ///     miles: Decimal::new(480, 0),
    ///     settlement_id: None,
    /// };
    /// assert_eq!(
    ///     load.effective_date(),
    ///     Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    /// );
    ///
    /// load.delivery_date = None;
    /// assert_eq!(
    ///     load.effective_date(),
    ///     Some(NaiveDate::from_ymd_opt(2024, 1, 13).unwrap())
    /// );
    /// ```
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.delivery_date
            .as_deref()
            .and_then(parse_load_date)
            .or_else(|| self.pickup_date.as_deref().and_then(parse_load_date))
    }
}

/// Leniently parses a date string from the upstream pipeline.
///
/// Accepts ISO dates (`2024-01-15`), US-style dates (`01/15/2024`), and
/// RFC 3339 / ISO timestamps (`2024-01-15T08:30:00Z`). Anything else is
/// `None`; callers treat unparsable dates as "not in any period".
pub(crate) fn parse_load_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    None
}
